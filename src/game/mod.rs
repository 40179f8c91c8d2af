//! Board state, order composition and turn playback

pub mod grid;
mod motion;
mod resolver;
pub mod state;

pub use grid::Grid;

use crate::hex::Axial;
use crate::protocol::{BoardConfig, TankId};

/// Board-wide limits fixed at game start
#[derive(Debug, Clone, Copy)]
pub struct BoardRules {
    /// Cells a tank may drive per turn
    pub drive_range: u32,
    /// Sight radius around each own tank
    pub visibility_range: u32,
    /// Center cell the shrink contracts towards
    pub center: Axial,
}

impl BoardRules {
    pub fn from_config(config: &BoardConfig) -> Self {
        Self {
            drive_range: config.drive_range,
            visibility_range: config.visibility_range,
            center: config.center,
        }
    }
}

/// Events surfaced by a grid tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridEvent {
    /// Playback began; pointer input now only pans the camera
    AnimationStarted,
    /// A queued batch finished playing
    AnimationEnded,
    /// The player grabbed one of their tanks to edit its order
    TankSelected { id: TankId },
    /// A turn result referenced a tank this client does not know
    UnknownTank { id: Option<TankId> },
}
