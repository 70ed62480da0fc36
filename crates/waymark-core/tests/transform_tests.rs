use proptest::prelude::*;
use waymark_core::{MapPoint, Viewport, ViewportPoint, MAX_ZOOM, MIN_ZOOM};

fn viewport_with(zoom_steps_in: u8, zoom_steps_out: u8, pan_x: f64, pan_y: f64) -> Viewport {
    let mut vp = Viewport::new();
    for _ in 0..zoom_steps_in {
        vp.zoom_in();
    }
    for _ in 0..zoom_steps_out {
        vp.zoom_out();
    }
    vp.pan_by(pan_x, pan_y);
    vp
}

proptest! {
    #[test]
    fn prop_viewport_roundtrip(
        zoom_in in 0u8..12,
        zoom_out in 0u8..12,
        pan_x in -2000.0f64..2000.0,
        pan_y in -2000.0f64..2000.0,
        px in -5000.0f64..5000.0,
        py in -5000.0f64..5000.0,
    ) {
        let vp = viewport_with(zoom_in, zoom_out, pan_x, pan_y);
        let p = ViewportPoint::new(px, py);
        let back = vp.to_viewport(vp.to_map_space(p));
        prop_assert!((back.x - p.x).abs() < 1e-6);
        prop_assert!((back.y - p.y).abs() < 1e-6);
    }

    #[test]
    fn prop_map_space_roundtrip(
        zoom_in in 0u8..12,
        zoom_out in 0u8..12,
        pan_x in -2000.0f64..2000.0,
        pan_y in -2000.0f64..2000.0,
        mx in -5000.0f64..5000.0,
        my in -5000.0f64..5000.0,
    ) {
        let vp = viewport_with(zoom_in, zoom_out, pan_x, pan_y);
        let m = MapPoint::new(mx, my);
        let back = vp.to_map_space(vp.to_viewport(m));
        prop_assert!((back.x - m.x).abs() < 1e-6);
        prop_assert!((back.y - m.y).abs() < 1e-6);
    }

    #[test]
    fn prop_zoom_stays_in_bounds(steps in proptest::collection::vec(any::<bool>(), 0..64)) {
        let mut vp = Viewport::new();
        for zoom_in in steps {
            let z = if zoom_in { vp.zoom_in() } else { vp.zoom_out() };
            prop_assert!((MIN_ZOOM..=MAX_ZOOM).contains(&z));
        }
    }
}

#[test]
fn pointer_to_map_space_matches_contract() {
    // mapX = (viewportX - originX) / z
    let mut vp = Viewport::new();
    vp.zoom_in(); // z = 1.2
    vp.pan_by(30.0, 40.0);
    let m = vp.to_map_space(ViewportPoint::new(150.0, 160.0));
    assert!((m.x - 100.0).abs() < 1e-9);
    assert!((m.y - 100.0).abs() < 1e-9);
}
