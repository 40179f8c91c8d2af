//! Hex grid geometry: axial coordinates and float-space vectors
//!
//! Grid cells use integer axial coordinates. Interpolated render
//! positions use float vectors in the same axial frame and are
//! projected to "plane coords" (an unskewed euclidean frame) whenever
//! a real distance is needed.

use serde::{Deserialize, Serialize};

/// The 6 unit direction offsets, indexed clockwise starting east
pub const UNIT_VECTORS: [Axial; 6] = [
    Axial { x: 1, y: 0 },
    Axial { x: 0, y: 1 },
    Axial { x: -1, y: 1 },
    Axial { x: -1, y: 0 },
    Axial { x: 0, y: -1 },
    Axial { x: 1, y: -1 },
];

/// Integer axial hex coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Axial {
    pub x: i32,
    pub y: i32,
}

impl Axial {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0, y: 0 }
    }

    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    /// Hex metric: max(|dx|, |dy|, |dx + dy|)
    pub fn grid_distance(self, other: Self) -> u32 {
        let v = self.sub(other);
        let x = v.x.abs();
        let y = v.y.abs();
        let xy = (v.x + v.y).abs();
        x.max(y).max(xy) as u32
    }

    /// All 6 neighboring cells, in unit-vector order
    pub fn neighbors(self) -> [Axial; 6] {
        let mut out = [Axial::zero(); 6];
        for (i, uv) in UNIT_VECTORS.iter().enumerate() {
            out[i] = self.add(*uv);
        }
        out
    }

    /// True when `other` is exactly one of the 6 adjacent cells
    pub fn is_neighbor(self, other: Self) -> bool {
        if self == other {
            return false;
        }
        UNIT_VECTORS.contains(&other.sub(self))
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x as f64, self.y as f64)
    }

    /// Project onto the euclidean plane (x' = x + y/2, y' = y root3/2)
    pub fn to_plane(self) -> Vec2 {
        self.to_vec2().to_plane()
    }
}

/// Map a unit offset back to its direction index; unknown vectors fall
/// back to index 0
pub fn unit_vector_to_idx(v: Axial) -> u8 {
    for (idx, uv) in UNIT_VECTORS.iter().enumerate() {
        if v == *uv {
            return idx as u8;
        }
    }
    0
}

/// Direction index to unit offset; `None` outside 0..=5
pub fn idx_to_unit_vector(idx: u8) -> Option<Axial> {
    UNIT_VECTORS.get(idx as usize).copied()
}

/// Float 2D point or direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }

    pub fn mul(self, multiplier: f64) -> Self {
        Self::new(self.x * multiplier, self.y * multiplier)
    }

    /// Componentwise product
    pub fn mul_components(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y)
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Direction in degrees, [0, 360), measured from positive x towards
    /// positive y
    pub fn angle(self) -> f64 {
        let a = self.y.atan2(self.x).to_degrees();
        if a < 0.0 {
            a + 360.0
        } else {
            a
        }
    }

    pub fn round(self) -> Axial {
        Axial::new(self.x.round() as i32, self.y.round() as i32)
    }

    pub fn floor(self) -> Axial {
        Axial::new(self.x.floor() as i32, self.y.floor() as i32)
    }

    /// Linear interpolation towards `other`, clamped to the endpoints
    pub fn lerp(self, other: Self, t: f64) -> Self {
        if t <= 0.0 {
            return self;
        }
        if t >= 1.0 {
            return other;
        }
        self.add(other.sub(self).mul(t))
    }

    /// Project onto the euclidean plane (x' = x + y/2, y' = y root3/2)
    pub fn to_plane(self) -> Self {
        let y = self.y * 3.0_f64.sqrt() / 2.0;
        let x = self.x + self.y * 0.5;
        Self::new(x, y)
    }
}

/// Interpolate along a polyline whose vertices sit at cumulative
/// breakpoints `fracs` (one per segment end). `frac` below zero clamps
/// to the first vertex, at or above the last breakpoint to the last.
pub fn interpolate_path(points: &[Vec2], fracs: &[f64], frac: f64) -> Vec2 {
    if frac <= 0.0 {
        return points[0];
    }
    if frac >= fracs[fracs.len() - 1] {
        return points[points.len() - 1];
    }
    let mut i = 0;
    let mut start = 0.0;
    while i < fracs.len() && frac >= fracs[i] {
        start = fracs[i];
        i += 1;
    }
    let end = fracs[i];
    let seg_frac = (frac - start) / (end - start);
    points[i].lerp(points[i + 1], seg_frac)
}
