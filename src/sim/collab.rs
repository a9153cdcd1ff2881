//! Collaborators the game manager drives: the sentry and the metronome

use serde::{Deserialize, Serialize};

/// Ammo-consuming defense entity
pub trait Sentry {
    /// Add rounds, never exceeding [`Sentry::maximum_ammo`]
    fn add_ammo(&mut self, amount: u32);
    /// Remove rounds, never going below zero
    fn remove_ammo(&mut self, amount: u32);
    fn ammo(&self) -> u32;
    fn maximum_ammo(&self) -> u32;
}

/// Global rhythm driver, started once per process
pub trait Metronome {
    fn is_started(&self) -> bool;
    fn start(&mut self);
}

/// Sentry with a clamped ammo counter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmmoSentry {
    ammo: u32,
    maximum_ammo_count: u32,
    /// KiBlasts fired this session
    pub shots_fired: u64,
}

impl AmmoSentry {
    pub fn new(maximum_ammo_count: u32) -> Self {
        Self {
            ammo: 0,
            maximum_ammo_count,
            shots_fired: 0,
        }
    }

    pub fn with_ammo(mut self, ammo: u32) -> Self {
        self.ammo = ammo.min(self.maximum_ammo_count);
        self
    }

    /// Fire one KiBlast if a round is available
    pub fn try_fire(&mut self) -> bool {
        if self.ammo == 0 {
            return false;
        }
        self.ammo -= 1;
        self.shots_fired += 1;
        true
    }
}

impl Sentry for AmmoSentry {
    fn add_ammo(&mut self, amount: u32) {
        self.ammo = self.ammo.saturating_add(amount).min(self.maximum_ammo_count);
    }

    fn remove_ammo(&mut self, amount: u32) {
        self.ammo = self.ammo.saturating_sub(amount);
    }

    fn ammo(&self) -> u32 {
        self.ammo
    }

    fn maximum_ammo(&self) -> u32 {
        self.maximum_ammo_count
    }
}

/// Fixed-tempo beat counter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeatMetronome {
    pub bpm: f32,
    started: bool,
    /// Seconds since the last beat
    phase_secs: f32,
    pub beats: u64,
}

impl BeatMetronome {
    pub fn new(bpm: f32) -> Self {
        Self {
            bpm,
            started: false,
            phase_secs: 0.0,
            beats: 0,
        }
    }

    #[inline]
    pub fn beat_interval(&self) -> f32 {
        60.0 / self.bpm.max(1.0)
    }

    /// Advance the clock; returns how many beats fell inside `dt`
    pub fn tick(&mut self, dt: f32) -> u32 {
        if !self.started {
            return 0;
        }
        let interval = self.beat_interval();
        self.phase_secs += dt;
        let mut fired = 0;
        while self.phase_secs >= interval {
            self.phase_secs -= interval;
            fired += 1;
        }
        self.beats += u64::from(fired);
        fired
    }
}

impl Metronome for BeatMetronome {
    fn is_started(&self) -> bool {
        self.started
    }

    fn start(&mut self) {
        if !self.started {
            log::info!("Metronome started at {} bpm", self.bpm);
        }
        self.started = true;
    }
}
