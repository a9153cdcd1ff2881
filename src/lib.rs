//! Breath Sentry - a breathing-rhythm arcade game
//!
//! Core modules:
//! - `sim`: Game-state orchestration (ranks, rank timer, breathing pauses, game over)
//! - `config`: Session configuration and JSON session files
//! - `error`: Error types for setup and rank-chain queries

pub mod config;
pub mod error;
pub mod sim;

pub use config::{GameConfig, SessionFile};
pub use error::{GameError, GameResult};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Session defaults
    pub const STARTING_PLAYER_HEALTH: i32 = 3;
    pub const BREATH_PAUSE_SECS: f32 = 10.0;
    pub const MAXIMUM_AMMO_COUNT: u32 = 100;

    /// Metronome tempo for the demo run
    pub const METRONOME_BPM: f32 = 60.0;
}
