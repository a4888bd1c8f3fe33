//! panorama-tour binary
//!
//! Runs a destination headlessly and logs every frame and event as JSON, or
//! encodes/decodes share links.
//!
//! ## Configuration (defaults → `--config` TOML → `TOUR_*` env)
//!
//! | Key                        | Default                    | Description                  |
//! |----------------------------|----------------------------|------------------------------|
//! | `TOUR_POLL_INTERVAL_MS`    | `100`                      | Orientation sampling cadence |
//! | `TOUR_VERTICAL_ASPECT`     | `0.67`                     | vfov / hfov                  |
//! | `TOUR_FRUSTUM_MARGIN_DEG`  | `5.0`                      | Culling slack in degrees     |
//! | `TOUR_DEFAULT_HFOV`        | `90.0`                     | hfov when zoom is unusable   |
//! | `TOUR_SHARE_BASE_URL`      | `https://example.com/tour` | Base page for share links    |

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use panorama_tour::{
    catalog::Catalog,
    controller::TourController,
    driver::{LogSink, TourDriver},
    share,
    types::{TourConfig, ViewState},
    HeadlessRenderer, MemoryAudioBackend,
};
use std::path::PathBuf;
use std::sync::Arc;

/// Built-in catalog used when `--catalog` is not given.
const DEMO_CATALOG: &str = r#"{
  "destinations": [
    {
      "id": "kyoto",
      "title": "Kyoto",
      "time_variants": [
        { "id": "dawn", "label": "Dawn", "hour_of_day": 6, "image_url": "kyoto-dawn.jpg" },
        { "id": "noon", "label": "Noon", "hour_of_day": 12, "image_url": "kyoto-noon.jpg" },
        { "id": "night", "label": "Night", "hour_of_day": 22, "image_url": "kyoto-night.jpg" }
      ],
      "points": [
        { "id": "gate", "yaw": 30, "pitch": 5, "kind": "hotspot", "title": "Torii gate" },
        { "id": "pagoda", "yaw": -120, "pitch": 12, "kind": "ar-point", "title": "Pagoda" },
        { "id": "hill", "yaw": 175, "pitch": -3, "kind": "viewpoint", "title": "Hillside" }
      ],
      "ambient_tracks": [
        { "id": "birds", "source_url": "birds.ogg", "volume": 0.4 },
        { "id": "bells", "source_url": "bells.ogg", "volume": 0.2, "loop": false }
      ]
    },
    {
      "id": "paris",
      "title": "Paris",
      "panorama_url": "paris.jpg",
      "points": [
        { "id": "tower", "yaw": 0, "pitch": 20, "kind": "hotspot", "title": "Eiffel Tower" }
      ]
    }
  ]
}"#;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "panorama-tour", about = "Headless 360° tour runtime", version)]
struct Args {
    /// TOML file layered over the built-in defaults
    #[arg(long, global = true, env = "TOUR_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enter a destination and stream frames to the log
    Run {
        /// Destination catalog (JSON); the demo catalog when omitted
        #[arg(long, env = "TOUR_CATALOG")]
        catalog: Option<PathBuf>,

        /// Destination id, or a share link to open
        #[arg(long, default_value = "kyoto")]
        destination: String,

        /// Stop after this many polls (runs until ctrl-c otherwise)
        #[arg(long)]
        ticks: Option<u64>,

        /// Pick the time variant nearest to this hour
        #[arg(long)]
        hour: Option<f64>,

        /// Start ambient audio
        #[arg(long)]
        audio: bool,

        /// Degrees the headless camera turns per poll
        #[arg(long, default_value_t = 3.0)]
        rotate: f64,
    },
    /// Print the share link for a view
    Share {
        destination: String,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        yaw: f64,
        #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
        pitch: f64,
        /// Overrides `share_base_url`
        #[arg(long)]
        base: Option<String>,
    },
    /// Decode a share link or query string to JSON
    Decode { link: String },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("panorama_tour=debug".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_ref())?;

    match args.command {
        Command::Run {
            catalog,
            destination,
            ticks,
            hour,
            audio,
            rotate,
        } => run(config, catalog, &destination, ticks, hour, audio, rotate).await,
        Command::Share {
            destination,
            yaw,
            pitch,
            base,
        } => {
            let base = base.unwrap_or(config.share_base_url);
            println!(
                "{}",
                share::share_url(&base, &ViewState::new(destination, yaw, pitch))
            );
            Ok(())
        }
        Command::Decode { link } => {
            let view = share::decode_link(&link)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<TourConfig> {
    let mut builder = config::Config::builder()
        .add_source(config::Config::try_from(&TourConfig::default())?);
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path.as_path()).required(true));
    }
    let config = builder
        .add_source(config::Environment::with_prefix("TOUR").try_parsing(true))
        .build()
        .context("failed to assemble configuration")?
        .try_deserialize::<TourConfig>()
        .context("invalid configuration")?;
    Ok(config)
}

async fn run(
    config: TourConfig,
    catalog_path: Option<PathBuf>,
    destination: &str,
    ticks: Option<u64>,
    hour: Option<f64>,
    audio: bool,
    rotate: f64,
) -> Result<()> {
    let catalog = match &catalog_path {
        Some(path) => Catalog::from_path(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => Catalog::from_json(DEMO_CATALOG)?,
    };

    log::info!(
        "Starting panorama-tour ({} destinations, poll={:?})",
        catalog.len(),
        config.poll_interval(),
    );

    let renderer = HeadlessRenderer::new()
        .with_auto_ready(true)
        .with_auto_rotate(rotate);
    let mut controller =
        TourController::new(config, renderer, Box::new(MemoryAudioBackend::new()));

    if destination.contains('?') || destination.contains('=') {
        controller.open_shared(destination, &catalog)?;
    } else {
        let dest = catalog
            .get(destination)
            .cloned()
            .ok_or_else(|| anyhow!("unknown destination '{}'", destination))?;
        controller.select_destination(dest)?;
    }
    if let Some(hour) = hour {
        controller.select_time_variant_by_hour(hour)?;
    }
    controller.set_audio_enabled(audio);

    let controller = Arc::new(parking_lot::Mutex::new(controller));
    let mut driver = TourDriver::new(controller.clone());
    if let Some(ticks) = ticks {
        driver = driver.with_tick_limit(ticks);
    }

    let reason = driver.run(&mut LogSink).await?;
    log::info!(
        "Stopped ({:?}): {}",
        reason,
        serde_json::to_string(&controller.lock().stats())?
    );
    Ok(())
}
