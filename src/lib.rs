//! Client engine for a two-player turn-based hex tank game
//!
//! This crate is the presentation core that sits between a renderer
//! and the game server:
//! - pointer gestures are composed into per-tank move and fire orders
//! - turn results from the server are queued and played back as timed
//!   animations over the board state
//! - fog of war and reachability overlays are derived on the fly
//!
//! Rendering, audio output and the network transport stay outside,
//! behind the `DisplayDriver` and `AudioDriver` traits and the wire
//! types in `protocol`.

pub mod audio;
pub mod config;
pub mod display;
pub mod game;
pub mod hex;
pub mod protocol;
pub mod session;
pub mod util;
