//! Session configuration
//!
//! Fixed at construction. Loaded from a JSON session file on native builds,
//! otherwise the defaults apply.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{GameError, GameResult};
use crate::sim::{RankChain, RankId};

/// Game manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Health restored at every game start
    pub starting_player_health: i32,
    /// Length of the breathing pause between ranks
    pub breath_pause_secs: f32,
    /// Upper bound for the sentry's ammo counter
    pub maximum_ammo_count: u32,
    /// Head of the progression (index into the rank chain)
    pub initial_rank: RankId,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_player_health: STARTING_PLAYER_HEALTH,
            breath_pause_secs: BREATH_PAUSE_SECS,
            maximum_ammo_count: MAXIMUM_AMMO_COUNT,
            initial_rank: 0,
        }
    }
}

impl GameConfig {
    /// Reject values the game manager cannot run with
    pub fn validate(&self) -> GameResult<()> {
        if self.starting_player_health <= 0 {
            return Err(GameError::InvalidConfig(format!(
                "starting_player_health must be positive, got {}",
                self.starting_player_health
            )));
        }
        if !(self.breath_pause_secs.is_finite() && self.breath_pause_secs >= 0.0) {
            return Err(GameError::InvalidConfig(format!(
                "breath_pause_secs must be a non-negative number, got {}",
                self.breath_pause_secs
            )));
        }
        if self.maximum_ammo_count == 0 {
            return Err(GameError::InvalidConfig(
                "maximum_ammo_count must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Everything needed to set up a session: configuration plus progression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFile {
    #[serde(default)]
    pub config: GameConfig,
    /// Falls back to the built-in progression when omitted
    #[serde(default = "RankChain::default_progression")]
    pub ranks: RankChain,
}

impl Default for SessionFile {
    fn default() -> Self {
        Self {
            config: GameConfig::default(),
            ranks: RankChain::default_progression(),
        }
    }
}

impl SessionFile {
    pub fn from_json(json: &str) -> GameResult<Self> {
        let session: Self = serde_json::from_str(json)?;
        session.config.validate()?;
        Ok(session)
    }

    pub fn to_json(&self) -> GameResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from disk (native only)
    pub fn load(path: &Path) -> GameResult<Self> {
        let json = std::fs::read_to_string(path)?;
        let session = Self::from_json(&json)?;
        log::info!(
            "Loaded session from {} ({} ranks)",
            path.display(),
            session.ranks.len()
        );
        Ok(session)
    }

    pub fn save(&self, path: &Path) -> GameResult<()> {
        std::fs::write(path, self.to_json()?)?;
        log::info!("Session saved to {}", path.display());
        Ok(())
    }
}
