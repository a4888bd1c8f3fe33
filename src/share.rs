//! ViewStateCodec – canonical share-link query strings.
//!
//! Canonical form:
//!
//! ```text
//! destination=<form-urlencoded id>&yaw=<n.nn>&pitch=<n.nn>
//! ```
//!
//! Yaw is rounded to two decimals and then wrapped into `(-180, 180]`, pitch
//! is rounded and clamped, and `-0.00` prints as `0.00`. Decoding applies the
//! same canonicalisation, so `encode(decode(encode(v)))` is byte-identical to
//! `encode(v)`.

use crate::types::{clamp_pitch, normalize_yaw, ViewState};
use thiserror::Error;
use url::form_urlencoded;

pub const DESTINATION_KEY: &str = "destination";
pub const YAW_KEY: &str = "yaw";
pub const PITCH_KEY: &str = "pitch";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DecodeError {
    #[error("share link is missing '{0}'")]
    MissingField(&'static str),
    #[error("'{field}' is not a number: {raw:?}")]
    MalformedNumber { field: &'static str, raw: String },
    #[error("'{field}' out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

pub fn encode(view_state: &ViewState) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair(DESTINATION_KEY, &view_state.destination_id)
        .append_pair(YAW_KEY, &format_angle(canonical_yaw(view_state.yaw)))
        .append_pair(PITCH_KEY, &format_angle(canonical_pitch(view_state.pitch)))
        .finish()
}

/// Append the canonical query to `base_url`.
pub fn share_url(base_url: &str, view_state: &ViewState) -> String {
    let query = encode(view_state);
    if base_url.ends_with('?') || base_url.ends_with('&') {
        format!("{base_url}{query}")
    } else if base_url.contains('?') {
        format!("{base_url}&{query}")
    } else {
        format!("{base_url}?{query}")
    }
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

/// Decode a canonical query (leading `?` optional, key order free, unknown
/// keys ignored, first occurrence of a key wins).
pub fn decode(query: &str) -> Result<ViewState, DecodeError> {
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut destination = None;
    let mut yaw = None;
    let mut pitch = None;
    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let slot = match key.as_ref() {
            DESTINATION_KEY => &mut destination,
            YAW_KEY => &mut yaw,
            PITCH_KEY => &mut pitch,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }

    let destination_id = destination
        .filter(|d| !d.is_empty())
        .ok_or(DecodeError::MissingField(DESTINATION_KEY))?;
    let yaw = parse_angle(YAW_KEY, yaw, 180.0)?;
    let pitch = parse_angle(PITCH_KEY, pitch, 90.0)?;

    Ok(ViewState {
        destination_id,
        yaw: canonical_yaw(yaw),
        pitch: canonical_pitch(pitch),
    })
}

/// Decode the query part of a full link (`https://…/tour?destination=…#x`).
pub fn decode_link(link: &str) -> Result<ViewState, DecodeError> {
    let without_fragment = link.split('#').next().unwrap_or(link);
    let query = without_fragment
        .split_once('?')
        .map(|(_, q)| q)
        .unwrap_or(without_fragment);
    decode(query)
}

fn parse_angle(field: &'static str, raw: Option<String>, limit: f64) -> Result<f64, DecodeError> {
    let raw = raw.ok_or(DecodeError::MissingField(field))?;
    let value: f64 = raw
        .trim()
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| DecodeError::MalformedNumber {
            field,
            raw: raw.clone(),
        })?;
    if value < -limit || value > limit {
        return Err(DecodeError::OutOfRange { field, value });
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// Canonical numbers
// ---------------------------------------------------------------------------

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn canonical_yaw(yaw: f64) -> f64 {
    normalize_yaw(round2(yaw))
}

fn canonical_pitch(pitch: f64) -> f64 {
    clamp_pitch(round2(pitch))
}

fn format_angle(value: f64) -> String {
    let s = format!("{value:.2}");
    if s == "-0.00" {
        "0.00".to_string()
    } else {
        s
    }
}
