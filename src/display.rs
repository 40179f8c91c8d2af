//! Display driver contract and a pure-math hex layout
//!
//! The engine only ever asks the display for coordinate conversions and
//! camera panning. Rendering itself lives behind this boundary.

use crate::hex::{Axial, Vec2};

/// Coordinate bridge between pointer/screen space and the hex grid
pub trait DisplayDriver {
    /// Snap a screen point to the grid cell under it
    fn screen_to_grid(&self, p: Vec2) -> Axial;
    /// Screen position of a cell center
    fn grid_to_screen(&self, p: Axial) -> Vec2;
    /// Pan the camera by a screen-space delta
    fn add_camera_offset(&mut self, delta: Vec2);
}

/// Headless hex layout: sprite-proportioned cell footprint plus camera
/// offset, no drawing. Rows overlap vertically by a quarter cell, so
/// the row stride is 3/4 of the cell height.
#[derive(Debug, Clone)]
pub struct FlatLayout {
    hex_size: Vec2,
    camera_offset: Vec2,
}

impl FlatLayout {
    pub fn new(hex_size: Vec2) -> Self {
        Self {
            hex_size,
            camera_offset: Vec2::zero(),
        }
    }

    pub fn camera_offset(&self) -> Vec2 {
        self.camera_offset
    }
}

impl Default for FlatLayout {
    fn default() -> Self {
        // Footprint of the stock 64px sprite set
        Self::new(Vec2::new(64.0, 36.0))
    }
}

impl DisplayDriver for FlatLayout {
    fn screen_to_grid(&self, p: Vec2) -> Axial {
        let world = p.sub(self.camera_offset);
        let y = world.y / self.hex_size.y * 4.0 / 3.0;
        let x = world.x / self.hex_size.x - y / 2.0;
        // Round both axes, then correct the one with the larger error
        let round_x = x.round();
        let round_y = y.round();
        let fx = x - round_x;
        let fy = y - round_y;
        let (dx, dy) = if fx * fx >= fy * fy {
            ((fx + 0.5 * fy).round(), 0.0)
        } else {
            (0.0, (fy + 0.5 * fx).round())
        };
        Axial::new((round_x + dx) as i32, (round_y + dy) as i32)
    }

    fn grid_to_screen(&self, p: Axial) -> Vec2 {
        let cell = Vec2::new(p.x as f64 + 0.5 * p.y as f64, p.y as f64 * 3.0 / 4.0);
        cell.mul_components(self.hex_size).add(self.camera_offset)
    }

    fn add_camera_offset(&mut self, delta: Vec2) {
        self.camera_offset = self.camera_offset.add(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_center_round_trip() {
        let layout = FlatLayout::default();
        for x in -4..=4 {
            for y in -4..=4 {
                let cell = Axial::new(x, y);
                let screen = layout.grid_to_screen(cell);
                assert_eq!(layout.screen_to_grid(screen), cell);
            }
        }
    }

    #[test]
    fn test_round_trip_survives_camera_pan() {
        let mut layout = FlatLayout::default();
        layout.add_camera_offset(Vec2::new(133.0, -71.0));
        layout.add_camera_offset(Vec2::new(-12.5, 4.25));
        let cell = Axial::new(3, -2);
        let screen = layout.grid_to_screen(cell);
        assert_eq!(layout.screen_to_grid(screen), cell);
    }

    #[test]
    fn test_point_near_center_snaps_to_cell() {
        let layout = FlatLayout::default();
        let cell = Axial::new(1, 2);
        let center = layout.grid_to_screen(cell);
        let nudged = center.add(Vec2::new(7.0, -5.0));
        assert_eq!(layout.screen_to_grid(nudged), cell);
    }

    #[test]
    fn test_camera_offset_accumulates() {
        let mut layout = FlatLayout::default();
        layout.add_camera_offset(Vec2::new(10.0, 20.0));
        layout.add_camera_offset(Vec2::new(-4.0, 6.0));
        assert_eq!(layout.camera_offset(), Vec2::new(6.0, 26.0));
    }
}
