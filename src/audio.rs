//! Audio driver contract
//!
//! The playback engine raises sound cues through this trait and never
//! inspects the outcome: a missing or failed audio backend must not
//! affect animation.

/// Looping engine sounds, started and stopped around movement phases
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopSound {
    /// Tracks and engine while driving or rotating the hull
    Driving,
    /// Servo whine while the turret turns
    TurretRotation,
}

/// One-shot effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OneShot {
    TankFiring,
    Explosion,
}

/// Sound sink driven by the animation engine.
///
/// `start_loop` on an already playing loop is a no-op; the engine calls
/// it every tick while the matching phase lasts.
pub trait AudioDriver {
    fn start_loop(&mut self, sound: LoopSound);
    fn stop_loop(&mut self, sound: LoopSound);
    fn play_once(&mut self, sound: OneShot);
}

/// Driver that drops every cue
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioDriver for NullAudio {
    fn start_loop(&mut self, _sound: LoopSound) {}
    fn stop_loop(&mut self, _sound: LoopSound) {}
    fn play_once(&mut self, _sound: OneShot) {}
}

/// A recorded driver call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCall {
    Start(LoopSound),
    Stop(LoopSound),
    Play(OneShot),
}

/// Driver that records the full call sequence, for assertions
#[derive(Debug, Default)]
pub struct RecordingAudio {
    pub calls: Vec<AudioCall>,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times a one-shot was triggered
    pub fn play_count(&self, sound: OneShot) -> usize {
        self.calls
            .iter()
            .filter(|c| **c == AudioCall::Play(sound))
            .count()
    }

    /// True when the loop was started at least once
    pub fn loop_started(&self, sound: LoopSound) -> bool {
        self.calls.contains(&AudioCall::Start(sound))
    }

    /// True when the loop was stopped at least once
    pub fn loop_stopped(&self, sound: LoopSound) -> bool {
        self.calls.contains(&AudioCall::Stop(sound))
    }
}

impl AudioDriver for RecordingAudio {
    fn start_loop(&mut self, sound: LoopSound) {
        self.calls.push(AudioCall::Start(sound));
    }

    fn stop_loop(&mut self, sound: LoopSound) {
        self.calls.push(AudioCall::Stop(sound));
    }

    fn play_once(&mut self, sound: OneShot) {
        self.calls.push(AudioCall::Play(sound));
    }
}
