//! TourDriver – runs a [`TourController`] on a tokio interval.
//!
//! ## Loop contract
//!
//! | Step                  | Effect                                         |
//! |-----------------------|------------------------------------------------|
//! | interval tick         | `controller.tick()` under the lock             |
//! | lock released         | frame (if any) and drained events go to sink   |
//! | shutdown future fires | loop exits, controller is unmounted            |
//! | tick limit reached    | loop exits, controller is unmounted            |
//!
//! The lock is held only for the tick itself so UI handlers can call user
//! actions on the same controller between polls.

use crate::controller::TourController;
use crate::protocol::{TourEnvelope, TourEvent, ViewFrame};
use crate::renderer::Renderer;
use anyhow::Result;
use log::info;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

/// Receives everything the driver publishes.
pub trait FrameSink {
    fn frame(&mut self, frame: &ViewFrame);
    fn event(&mut self, event: &TourEnvelope<TourEvent>);
}

/// Sink that keeps everything in memory.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub frames: Vec<ViewFrame>,
    pub events: Vec<TourEnvelope<TourEvent>>,
}

impl FrameSink for CollectingSink {
    fn frame(&mut self, frame: &ViewFrame) {
        self.frames.push(frame.clone());
    }

    fn event(&mut self, event: &TourEnvelope<TourEvent>) {
        self.events.push(event.clone());
    }
}

/// Sink that logs frames as JSON lines.
#[derive(Debug, Default)]
pub struct LogSink;

impl FrameSink for LogSink {
    fn frame(&mut self, frame: &ViewFrame) {
        match serde_json::to_string(frame) {
            Ok(json) => info!("frame {}", json),
            Err(e) => log::warn!("Failed to serialise frame {}: {}", frame.tick, e),
        }
    }

    fn event(&mut self, event: &TourEnvelope<TourEvent>) {
        match serde_json::to_string(event) {
            Ok(json) => info!("event {}", json),
            Err(e) => log::warn!("Failed to serialise event: {}", e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    TickLimit,
}

pub struct TourDriver<R: Renderer> {
    controller: Arc<Mutex<TourController<R>>>,
    tick_limit: Option<u64>,
}

impl<R: Renderer> TourDriver<R> {
    pub fn new(controller: Arc<Mutex<TourController<R>>>) -> Self {
        Self {
            controller,
            tick_limit: None,
        }
    }

    /// Stop after this many polls.
    pub fn with_tick_limit(mut self, ticks: u64) -> Self {
        self.tick_limit = Some(ticks);
        self
    }

    pub fn controller(&self) -> Arc<Mutex<TourController<R>>> {
        self.controller.clone()
    }

    /// Run until ctrl-c (or the tick limit).
    pub async fn run<S: FrameSink>(self, sink: &mut S) -> Result<StopReason> {
        self.run_until(sink, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                log::error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run until `shutdown` resolves (or the tick limit). The controller is
    /// unmounted on the way out.
    pub async fn run_until<S, F>(self, sink: &mut S, shutdown: F) -> Result<StopReason>
    where
        S: FrameSink,
        F: Future<Output = ()>,
    {
        let interval = self.controller.lock().config().poll_interval();
        info!("TourDriver polling every {:?}", interval);

        let controller = self.controller.clone();
        let tick_limit = self.tick_limit;
        let loop_sink = &mut *sink;
        let poll_loop = async move {
            let mut timer = tokio::time::interval(interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut ticks = 0u64;
            loop {
                timer.tick().await;

                // Hold the lock only long enough to tick, then release before publishing.
                let (frame, events) = {
                    let mut c = controller.lock();
                    let frame = c.tick();
                    (frame, c.drain_events())
                };

                for event in &events {
                    loop_sink.event(event);
                }
                if let Some(frame) = &frame {
                    loop_sink.frame(frame);
                }

                ticks += 1;
                if tick_limit.is_some_and(|limit| ticks >= limit) {
                    return StopReason::TickLimit;
                }
            }
        }
        .instrument(tracing::info_span!("tour_poll"));

        let reason = tokio::select! {
            reason = poll_loop => reason,
            _ = shutdown => {
                info!("TourDriver shutting down");
                StopReason::Shutdown
            }
        };

        let events = {
            let mut c = self.controller.lock();
            c.unmount();
            c.drain_events()
        };
        for event in &events {
            sink.event(event);
        }
        Ok(reason)
    }
}
