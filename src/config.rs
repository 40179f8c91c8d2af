//! Configuration: environment variable parsing and animation timings

use std::env;

/// Demo configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Seed for the generated demo board
    pub seed: u64,
    /// Radius of the generated demo board in cells
    pub board_radius: u32,
    /// Playback clock multiplier (2.0 plays twice as fast)
    pub time_scale: f64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let seed = match env::var("DEMO_SEED") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid("DEMO_SEED"))?,
            Err(_) => 7,
        };
        let board_radius = match env::var("BOARD_RADIUS") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid("BOARD_RADIUS"))?,
            Err(_) => 4,
        };
        let time_scale = match env::var("TIME_SCALE") {
            Ok(v) => v.parse().map_err(|_| ConfigError::Invalid("TIME_SCALE"))?,
            Err(_) => 1.0,
        };

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            seed,
            board_radius,
            time_scale,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

/// Durations and speeds driving order composition and playback
#[derive(Debug, Clone, Copy)]
pub struct Timings {
    /// Hold duration before a press on a tank turns into aiming (ms)
    pub hold_to_aim_ms: f64,
    /// Hull and turret rotation speed (degrees per second)
    pub rotation_speed: f64,
    /// Peak driving speed (cell widths per second)
    pub travel_speed: f64,
    /// Muzzle flash duration (ms)
    pub firing_duration_ms: f64,
    /// Pause between turret alignment and the shot (ms)
    pub firing_pause_ms: f64,
    /// Shell blast duration (ms)
    pub explosion_duration_ms: f64,
    /// Still pause on each side of a blast (ms)
    pub explosion_pause_ms: f64,
    /// Fade-out of cells removed by a board shrink (ms)
    pub shrink_duration_ms: f64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            hold_to_aim_ms: 700.0,
            rotation_speed: 100.0,
            travel_speed: 1.2,
            firing_duration_ms: 350.0,
            firing_pause_ms: 300.0,
            explosion_duration_ms: 900.0,
            explosion_pause_ms: 250.0,
            shrink_duration_ms: 750.0,
        }
    }
}
