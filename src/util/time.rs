//! Time utilities for playback pacing

use std::time::Instant;

/// Clock origin for playback timestamps
static CLOCK_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Fix the clock origin (call once at startup)
pub fn init_clock() {
    CLOCK_START.get_or_init(Instant::now);
}

/// Milliseconds since the clock origin, fractional and monotonic.
/// Playback only ever compares differences of these values.
pub fn now_ms() -> f64 {
    let start = CLOCK_START.get_or_init(Instant::now);
    start.elapsed().as_secs_f64() * 1000.0
}

/// A simple timer for measuring durations
#[derive(Debug, Clone)]
pub struct Timer {
    start: Instant,
}

impl Timer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn reset(&mut self) {
        self.start = Instant::now();
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
