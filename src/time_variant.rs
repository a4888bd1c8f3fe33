//! Time-of-day variant selection.

use crate::types::TimeVariant;
use log::warn;

/// Circular distance between two hours on a 24h clock (`23` and `1` are 2 apart).
pub fn circular_hour_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(24.0);
    d.min(24.0 - d)
}

/// Tracks which of a destination's time variants is current.
///
/// Starts on the first declared variant. Selection methods return `true`
/// only when the current variant actually changed.
#[derive(Debug, Clone, Default)]
pub struct TimeVariantSelector {
    variants: Vec<TimeVariant>,
    current: Option<usize>,
}

impl TimeVariantSelector {
    pub fn new(variants: Vec<TimeVariant>) -> Self {
        let current = if variants.is_empty() { None } else { Some(0) };
        Self { variants, current }
    }

    pub fn variants(&self) -> &[TimeVariant] {
        &self.variants
    }

    pub fn current(&self) -> Option<&TimeVariant> {
        self.current.and_then(|i| self.variants.get(i))
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current().map(|v| v.id.as_str())
    }

    /// Unknown ids are a data-integrity warning, not an error.
    pub fn select_by_id(&mut self, id: &str) -> bool {
        match self.variants.iter().position(|v| v.id == id) {
            Some(idx) => self.set_current(idx),
            None => {
                warn!("Ignoring unknown time variant '{}'", id);
                false
            }
        }
    }

    /// Select the variant nearest to `hour` on the 24h circle.
    ///
    /// Ties go to the variant declared first.
    pub fn select_by_hour(&mut self, hour: f64) -> bool {
        if !hour.is_finite() {
            warn!("Ignoring non-finite hour {}", hour);
            return false;
        }
        match self.nearest_to_hour(hour) {
            Some(idx) => self.set_current(idx),
            None => false,
        }
    }

    /// Index of the nearest variant without changing selection.
    pub fn nearest_to_hour(&self, hour: f64) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, variant) in self.variants.iter().enumerate() {
            let distance = circular_hour_distance(hour, variant.hour_of_day);
            if !distance.is_finite() {
                warn!("Time variant '{}' has a non-finite hour", variant.id);
                continue;
            }
            match best {
                Some((_, d)) if distance >= d => {}
                _ => best = Some((idx, distance)),
            }
        }
        best.map(|(idx, _)| idx)
    }

    fn set_current(&mut self, idx: usize) -> bool {
        if self.current == Some(idx) {
            return false;
        }
        self.current = Some(idx);
        true
    }
}
