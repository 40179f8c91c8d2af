//! Motion math for turn playback: easing, angle arithmetic, camera shake

use crate::hex::Vec2;

/// Area under the speed profile that ramps linearly from `y1` to `y2`
/// over t in [0, 1], evaluated at `t`. Used as an easing integral:
/// dividing by the full area yields a 0..1 distance fraction that
/// accelerates (y1 < y2) or decelerates (y1 > y2).
pub fn area_under_line(y1: f64, y2: f64, t: f64) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    let low = y1.min(y2);
    let diff = (y1 - y2).abs();
    let rect = low * t;
    if t >= 1.0 {
        return low + diff / 2.0;
    }
    if y1 <= y2 {
        rect + t * t * diff / 2.0
    } else {
        rect + (1.0 - (1.0 - t) * (1.0 - t)) * diff / 2.0
    }
}

/// Wrap an angle into [0, 360)
pub fn normalize_360(angle: f64) -> f64 {
    let mut angle = angle;
    while angle < 0.0 {
        angle += 360.0;
    }
    while angle >= 360.0 {
        angle -= 360.0;
    }
    angle
}

/// Wrap an angle into [-180, 180), the shortest signed rotation
pub fn normalize_180(angle: f64) -> f64 {
    let mut angle = angle;
    while angle < -180.0 {
        angle += 360.0;
    }
    while angle >= 180.0 {
        angle -= 360.0;
    }
    angle
}

/// Euclidean distance between two axial-frame points after plane
/// projection
pub fn plane_distance(a: Vec2, b: Vec2) -> f64 {
    a.to_plane().sub(b.to_plane()).length()
}

/// Deterministic camera shake offset for a playback fraction.
/// Three summed sines per axis under a triangular envelope peaking at
/// frac 0.25; identically zero outside (0, 1).
pub fn camera_shake(frac: f64) -> Vec2 {
    if frac <= 0.0 || frac >= 1.0 {
        return Vec2::zero();
    }
    let mid = 0.25;
    let pi = std::f64::consts::PI;
    let x = 5.5 * (20.8 * pi * frac + 2.3).sin()
        + 2.2 * (5.6 * pi * frac + 5.0).sin()
        + 1.8 * (11.2 * pi * frac + 1.0).sin();
    let y = 4.0 * (17.6 * pi * frac - 2.5).sin()
        + 2.8 * (9.6 * pi * frac + 4.0).sin()
        + 1.6 * (1.6 * pi * frac).sin();
    let lim = if frac <= mid {
        frac / mid
    } else {
        1.0 - (frac - mid) / (1.0 - mid)
    };
    Vec2::new(x, y).mul(lim)
}
