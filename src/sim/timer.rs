//! Rank countdown timer
//!
//! Armed with one rank (high score checkpoint) or a run of normal ranks.
//! Counting down happens only in `Running`; each completed rank yields a
//! single `NextRankReached`. After the last armed rank the timer sits in
//! `Expired` until it is reset.

use serde::{Deserialize, Serialize};

use super::rank::{Rank, RankChain, RankId};

/// Timer lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerPhase {
    /// Armed (or empty) but not counting
    Idle,
    Running,
    /// Suspended with remaining time preserved
    Paused,
    /// Every armed rank has completed
    Expired,
}

/// Signals emitted by [`RankTimer::tick`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// The current rank's countdown completed
    NextRankReached,
}

/// One armed countdown
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimerSegment {
    pub rank: RankId,
    pub duration_secs: f32,
}

impl TimerSegment {
    pub fn for_rank(id: RankId, rank: &Rank) -> Self {
        Self {
            rank: id,
            duration_secs: rank.duration_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankTimer {
    segments: Vec<TimerSegment>,
    /// Index of the segment currently counting down
    cursor: usize,
    remaining_secs: f32,
    phase: TimerPhase,
}

impl Default for RankTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl RankTimer {
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            cursor: 0,
            remaining_secs: 0.0,
            phase: TimerPhase::Idle,
        }
    }

    /// Arm for a run of ranks, cancelling any countdown in flight
    pub fn reset(&mut self, segments: Vec<TimerSegment>) {
        self.cursor = 0;
        self.remaining_secs = segments.first().map_or(0.0, |s| s.duration_secs);
        self.segments = segments;
        self.phase = TimerPhase::Idle;
        log::debug!(
            "Rank timer armed with {} rank(s): {:?}",
            self.segments.len(),
            self.armed_ranks()
        );
    }

    /// Arm for a single rank
    pub fn reset_single(&mut self, segment: TimerSegment) {
        self.reset(vec![segment]);
    }

    /// Arm from rank ids, looking up durations in the chain
    pub fn reset_for_ranks(&mut self, chain: &RankChain, ids: &[RankId]) {
        let segments = ids
            .iter()
            .filter_map(|&id| chain.get(id).map(|rank| TimerSegment::for_rank(id, rank)))
            .collect();
        self.reset(segments);
    }

    pub fn pause(&mut self) {
        if self.phase == TimerPhase::Running {
            self.phase = TimerPhase::Paused;
        }
    }

    /// Continue from the preserved remaining time; also starts a freshly armed timer
    pub fn resume(&mut self) {
        match self.phase {
            TimerPhase::Paused | TimerPhase::Idle if !self.segments.is_empty() => {
                self.phase = TimerPhase::Running;
            }
            TimerPhase::Expired => {
                log::warn!("Resume ignored: rank timer expired and must be reset first");
            }
            _ => {}
        }
    }

    /// Restart the current rank's countdown from its full duration
    pub fn restart(&mut self) {
        match self.segments.get(self.cursor) {
            Some(segment) => {
                self.remaining_secs = segment.duration_secs;
                self.phase = TimerPhase::Running;
            }
            None => log::warn!("Restart ignored: rank timer has nothing armed"),
        }
    }

    /// Advance a running countdown by `dt` seconds
    ///
    /// Time left over past a completed rank is discarded; the next rank
    /// always starts from its full duration.
    pub fn tick(&mut self, dt: f32) -> Option<TimerEvent> {
        if self.phase != TimerPhase::Running {
            return None;
        }

        self.remaining_secs -= dt;
        if self.remaining_secs > 0.0 {
            return None;
        }

        if self.cursor + 1 < self.segments.len() {
            self.cursor += 1;
            self.remaining_secs = self.segments[self.cursor].duration_secs;
        } else {
            self.remaining_secs = 0.0;
            self.phase = TimerPhase::Expired;
        }
        Some(TimerEvent::NextRankReached)
    }

    #[inline]
    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    #[inline]
    pub fn remaining_secs(&self) -> f32 {
        self.remaining_secs
    }

    /// Fraction of the current rank already elapsed (0..=1)
    pub fn progress(&self) -> f32 {
        match self.segments.get(self.cursor) {
            Some(segment) if self.phase != TimerPhase::Expired => {
                (1.0 - self.remaining_secs / segment.duration_secs).clamp(0.0, 1.0)
            }
            Some(_) => 1.0,
            None => 0.0,
        }
    }

    /// Rank whose countdown is current
    pub fn current_rank(&self) -> Option<RankId> {
        self.segments.get(self.cursor).map(|s| s.rank)
    }

    pub fn armed_ranks(&self) -> Vec<RankId> {
        self.segments.iter().map(|s| s.rank).collect()
    }
}
