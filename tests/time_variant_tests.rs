//! TimeVariantSelector unit tests

#[cfg(test)]
mod tests {
    use panorama_tour::{
        time_variant::{circular_hour_distance, TimeVariantSelector},
        types::TimeVariant,
    };

    fn variants(hours: &[f64]) -> Vec<TimeVariant> {
        hours
            .iter()
            .map(|h| {
                TimeVariant::new(
                    format!("h{h}"),
                    format!("{h}:00"),
                    *h,
                    format!("pano-{h}.jpg"),
                )
            })
            .collect()
    }

    // -----------------------------------------------------------------------
    // Circular distance
    // -----------------------------------------------------------------------

    #[test]
    fn distance_wraps_midnight() {
        assert_eq!(circular_hour_distance(23.0, 1.0), 2.0);
        assert_eq!(circular_hour_distance(1.0, 23.0), 2.0);
        assert_eq!(circular_hour_distance(6.0, 18.0), 12.0);
        assert_eq!(circular_hour_distance(5.0, 5.0), 0.0);
    }

    // -----------------------------------------------------------------------
    // Selection by hour
    // -----------------------------------------------------------------------

    #[test]
    fn late_evening_picks_nearest_across_midnight() {
        let mut selector = TimeVariantSelector::new(variants(&[6.0, 12.0, 18.0, 21.0]));
        assert!(selector.select_by_hour(23.0));
        assert_eq!(selector.current_id(), Some("h21"));
    }

    #[test]
    fn early_morning_prefers_dawn_over_late_night() {
        let mut selector = TimeVariantSelector::new(variants(&[6.0, 12.0, 18.0, 21.0]));
        selector.select_by_hour(23.0);
        assert!(selector.select_by_hour(2.0));
        assert_eq!(selector.current_id(), Some("h6"));
    }

    #[test]
    fn ties_go_to_first_declared() {
        let selector = TimeVariantSelector::new(variants(&[10.0, 14.0]));
        assert_eq!(selector.nearest_to_hour(12.0), Some(0));

        let reversed = TimeVariantSelector::new(variants(&[14.0, 10.0]));
        assert_eq!(reversed.nearest_to_hour(12.0), Some(0));
    }

    #[test]
    fn unchanged_selection_reports_false() {
        let mut selector = TimeVariantSelector::new(variants(&[6.0, 18.0]));
        assert_eq!(selector.current_id(), Some("h6"));
        assert!(!selector.select_by_hour(7.0));
        assert!(!selector.select_by_hour(f64::NAN));
    }

    #[test]
    fn empty_selector_never_selects() {
        let mut selector = TimeVariantSelector::default();
        assert!(selector.current().is_none());
        assert!(!selector.select_by_hour(12.0));
        assert!(!selector.select_by_id("anything"));
    }

    // -----------------------------------------------------------------------
    // Selection by id
    // -----------------------------------------------------------------------

    #[test]
    fn unknown_id_is_ignored() {
        let mut selector = TimeVariantSelector::new(variants(&[6.0, 18.0]));
        assert!(!selector.select_by_id("noon"));
        assert_eq!(selector.current_id(), Some("h6"));
        assert!(selector.select_by_id("h18"));
        assert_eq!(selector.current().map(|v| v.image_url.as_str()), Some("pano-18.jpg"));
    }
}
