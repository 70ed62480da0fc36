//! Viewport <-> map-space coordinate transform.
//!
//! Map space is the coordinate system of the map surface itself, independent
//! of how the rendering surface is zoomed or panned. Waypoints are stored in
//! map space; pointer events arrive in viewport pixels.

use serde::{Deserialize, Serialize};

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 3.0;
pub const ZOOM_STEP: f64 = 1.2;

/// A point in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportPoint {
    pub x: f64,
    pub y: f64,
}

impl ViewportPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A point in map space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

impl MapPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Current zoom and pan of the map surface. The origin is the top-left of
/// the map surface in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    zoom: f64,
    origin: ViewportPoint,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    pub fn new() -> Self {
        Self {
            zoom: 1.0,
            origin: ViewportPoint::new(0.0, 0.0),
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn origin(&self) -> ViewportPoint {
        self.origin
    }

    /// Viewport pixels -> map space.
    pub fn to_map_space(&self, p: ViewportPoint) -> MapPoint {
        MapPoint {
            x: (p.x - self.origin.x) / self.zoom,
            y: (p.y - self.origin.y) / self.zoom,
        }
    }

    /// Map space -> viewport pixels, used when rendering waypoint markers.
    pub fn to_viewport(&self, p: MapPoint) -> ViewportPoint {
        ViewportPoint {
            x: p.x * self.zoom + self.origin.x,
            y: p.y * self.zoom + self.origin.y,
        }
    }

    pub fn zoom_in(&mut self) -> f64 {
        self.zoom = (self.zoom * ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
        self.zoom
    }

    pub fn zoom_out(&mut self) -> f64 {
        self.zoom = (self.zoom / ZOOM_STEP).clamp(MIN_ZOOM, MAX_ZOOM);
        self.zoom
    }

    /// Translate the map surface by a delta in viewport pixels.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.origin.x += dx;
        self.origin.y += dy;
    }

    /// Restore zoom 1.0 and origin (0, 0).
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_viewport_is_identity() {
        let vp = Viewport::new();
        let m = vp.to_map_space(ViewportPoint::new(120.0, 340.0));
        assert_eq!(m, MapPoint::new(120.0, 340.0));
    }

    #[test]
    fn zoom_and_pan_applied() {
        let mut vp = Viewport::new();
        vp.zoom_in(); // 1.2
        vp.pan_by(50.0, -10.0);
        let m = vp.to_map_space(ViewportPoint::new(170.0, 110.0));
        assert!((m.x - 100.0).abs() < 1e-9);
        assert!((m.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn zoom_clamps_at_bounds() {
        let mut vp = Viewport::new();
        for _ in 0..50 {
            vp.zoom_in();
        }
        assert_eq!(vp.zoom(), MAX_ZOOM);
        for _ in 0..50 {
            vp.zoom_out();
        }
        assert_eq!(vp.zoom(), MIN_ZOOM);
    }

    #[test]
    fn reset_restores_defaults() {
        let mut vp = Viewport::new();
        vp.zoom_in();
        vp.pan_by(5.0, 5.0);
        vp.reset();
        assert_eq!(vp.zoom(), 1.0);
        assert_eq!(vp.origin(), ViewportPoint::new(0.0, 0.0));
    }
}
