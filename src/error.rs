//! Error types for session setup and rank-chain queries
//!
//! Health depletion and timer expiry are not errors; they are state
//! transitions reported through notifications.

use thiserror::Error;

use crate::sim::RankId;

/// Errors raised by the game core.
#[derive(Error, Debug)]
pub enum GameError {
    /// A required collaborator was not supplied to the builder.
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// `initial_rank` does not index into the rank chain.
    #[error("initial rank {index} is out of range for a chain of {len} ranks")]
    InitialRankOutOfRange {
        /// Configured index.
        index: RankId,
        /// Number of ranks in the chain.
        len: usize,
    },

    /// A configuration value is outside its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The rank chain failed validation (empty, dangling link, or cycle).
    #[error("invalid rank chain: {0}")]
    InvalidRankChain(String),

    /// Normal-level rank collection was requested for a rank that is absent or not `Normal`.
    #[error(
        "attempted to get ranks for non-normal game mode at rank {0:?}; high score levels only have one rank"
    )]
    NotNormalRank(Option<RankId>),

    /// A normal-mode start was requested but the initial rank is a high score checkpoint.
    #[error("initial rank {0} is not a normal rank")]
    InitialRankNotNormal(RankId),

    /// No high score checkpoint is reachable from the starting rank.
    #[error("no high score rank reachable from rank {0}")]
    NoHighScoreRank(RankId),

    /// The session is active but has no current rank.
    #[error("active session has no current rank")]
    NoCurrentRank,

    /// Session file could not be read.
    #[error("failed to read session file: {0}")]
    ConfigIo(#[from] std::io::Error),

    /// Session file is not valid JSON for the expected shape.
    #[error("failed to parse session file: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

/// Result type for game core operations.
pub type GameResult<T> = Result<T, GameError>;
