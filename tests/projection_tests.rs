//! Projection, culling and mini-map unit tests

#[cfg(test)]
mod tests {
    use panorama_tour::{
        minimap::{self, MapCoords},
        projection::{self, Projector},
        types::{AnnotatedPoint, Orientation, PointKind},
    };

    fn point(id: &str, yaw: f64, pitch: f64) -> AnnotatedPoint {
        AnnotatedPoint::new(id, yaw, pitch, PointKind::Hotspot)
    }

    // -----------------------------------------------------------------------
    // Projection
    // -----------------------------------------------------------------------

    #[test]
    fn project_is_pure() {
        let projector = Projector::default();
        let view = Orientation::new(12.5, -4.0, 75.0);
        let a = projector.project(40.0, 3.0, &view, 75.0);
        let b = projector.project(40.0, 3.0, &view, 75.0);
        assert_eq!(a, b);
    }

    #[test]
    fn offsets_scale_with_field_of_view() {
        let view = Orientation::new(0.0, 0.0, 90.0);
        let p = projection::project(&point("p", 45.0, 0.0), &view, 90.0);
        assert!((p.x - 75.0).abs() < 1e-9);
        assert!((p.y - 50.0).abs() < 1e-9);

        let up = projection::project(&point("up", 0.0, 10.0), &view, 90.0);
        let expected = 10.0 / (90.0 * projection::VERTICAL_ASPECT) * 50.0 + 50.0;
        assert!((up.y - expected).abs() < 1e-9);
    }

    #[test]
    fn frustum_includes_margin() {
        let view = Orientation::new(0.0, 0.0, 90.0);
        // hfov/2 + margin = 50
        assert!(projection::project(&point("edge", 50.0, 0.0), &view, 90.0).in_frustum);
        assert!(!projection::project(&point("out", 51.0, 0.0), &view, 90.0).in_frustum);
    }

    #[test]
    fn projection_wraps_across_the_seam() {
        let view = Orientation::new(170.0, 0.0, 90.0);
        let p = projection::project(&point("seam", -170.0, 0.0), &view, 90.0);
        assert!(p.in_frustum);
        assert!((p.x - (20.0 / 90.0 * 50.0 + 50.0)).abs() < 1e-9);
    }

    #[test]
    fn point_behind_viewer_is_off_screen() {
        let view = Orientation::new(0.0, 0.0, 90.0);
        let p = projection::project(&point("behind", 180.0, 0.0), &view, 90.0);
        assert!(!p.in_frustum);
        assert!(p.x > 100.0);
    }

    #[test]
    fn non_positive_fov_culls_everything() {
        let view = Orientation::new(0.0, 0.0, 0.0);
        assert!(!projection::project(&point("c", 0.0, 0.0), &view, -10.0).in_frustum);
    }

    // -----------------------------------------------------------------------
    // Culling
    // -----------------------------------------------------------------------

    #[test]
    fn cull_keeps_only_in_frustum_points_in_order() {
        let points = vec![
            point("left", -30.0, 0.0),
            point("behind", 170.0, 0.0),
            point("right", 30.0, 5.0),
            point("sky", 0.0, 80.0),
        ];
        let view = Orientation::new(0.0, 0.0, 90.0);
        let visible = projection::cull(&points, &view, 90.0);
        let ids: Vec<&str> = visible.iter().map(|c| c.point.id.as_str()).collect();
        assert_eq!(ids, vec!["left", "right"]);

        let projector = Projector::default();
        for c in &visible {
            assert!(projector.project_point(c.point, &view, 90.0).in_frustum);
        }
    }

    #[test]
    fn cull_skips_nan_points_without_panicking() {
        let points = vec![
            point("nan-yaw", f64::NAN, 0.0),
            point("inf-pitch", 0.0, f64::INFINITY),
            point("ok", 0.0, 0.0),
        ];
        let view = Orientation::new(0.0, 0.0, 90.0);
        let visible = projection::cull(&points, &view, 90.0);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].point.id, "ok");
    }

    #[test]
    fn cull_iter_is_lazy_and_matches_cull() {
        let points: Vec<AnnotatedPoint> = (0..36)
            .map(|i| point(&format!("p{i}"), i as f64 * 10.0 - 180.0, 0.0))
            .collect();
        let view = Orientation::new(90.0, 0.0, 60.0);
        let projector = Projector::default();
        let eager = projector.cull(&points, &view, 60.0);
        let first_two: Vec<_> = projector.cull_iter(&points, &view, 60.0).take(2).collect();
        assert_eq!(&eager[..2], &first_two[..]);
    }

    // -----------------------------------------------------------------------
    // Mini-map
    // -----------------------------------------------------------------------

    #[test]
    fn map_corners() {
        assert_eq!(minimap::to_map_coords(-180.0, -90.0), MapCoords::new(0.0, 0.0));
        assert_eq!(minimap::to_map_coords(180.0, 90.0), MapCoords::new(100.0, 100.0));
        assert_eq!(minimap::to_map_coords(0.0, 0.0), MapCoords::new(50.0, 50.0));
    }

    #[test]
    fn map_round_trip_recovers_direction() {
        let mut yaw = -180.0;
        while yaw <= 180.0 {
            let mut pitch = -90.0;
            while pitch <= 90.0 {
                let (y2, p2) = minimap::from_map_coords(minimap::to_map_coords(yaw, pitch));
                assert!((y2 - yaw).abs() < 1e-9, "yaw {yaw} -> {y2}");
                assert!((p2 - pitch).abs() < 1e-9, "pitch {pitch} -> {p2}");
                pitch += 7.5;
            }
            yaw += 12.5;
        }
    }

    #[test]
    fn map_ignores_current_view() {
        let a = minimap::camera_marker(&Orientation::new(45.0, 10.0, 30.0));
        let b = minimap::camera_marker(&Orientation::new(45.0, 10.0, 120.0));
        assert_eq!(a, b);
    }

    #[test]
    fn map_click_outside_bounds_is_clamped() {
        let o = minimap::orientation_at(MapCoords::new(150.0, -20.0), 90.0);
        assert_eq!(o.yaw, 180.0);
        assert_eq!(o.pitch, -90.0);
    }
}
