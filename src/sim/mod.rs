//! Game-state simulation
//!
//! Everything here runs on the caller's fixed-step tick:
//! - No wall clock, no threads
//! - Deferred work goes through the scheduler
//! - No rendering or platform dependencies

pub mod collab;
pub mod events;
pub mod manager;
pub mod rank;
pub mod schedule;
pub mod timer;

pub use collab::{AmmoSentry, BeatMetronome, Metronome, Sentry};
pub use events::{BreathSignal, Broadcast, GameNotification, SubscriptionId};
pub use manager::{FrameInput, GameManager, GameManagerBuilder, SessionPhase};
pub use rank::{Difficulty, GameMode, Rank, RankChain, RankId, RankWalk};
pub use schedule::{Due, Scheduler, TaskHandle};
pub use timer::{RankTimer, TimerEvent, TimerPhase, TimerSegment};
