//! Game manager: rank progression, breathing pauses, and game over
//!
//! One manager per session. Collaborators are injected through
//! [`GameManagerBuilder`] and resolved when it is built.
//!
//! Per frame ([`GameManager::update`]):
//! 1. Apply breath signals and damage from the frame input
//! 2. Health check (game over is one-shot)
//! 3. Advance deferred tasks (breathing pause expiry)
//! 4. Tick the rank timer and handle `NextRankReached`
//!
//! A pause that ends inside a frame only hands the rest of that frame to
//! the resumed timer. Rank completion comes from the timer alone, so the
//! current rank and the timer's rank never drift apart.

use serde::{Deserialize, Serialize};

use super::collab::{Metronome, Sentry};
use super::events::{BreathSignal, Broadcast, GameNotification, SubscriptionId};
use super::rank::{Difficulty, Rank, RankChain, RankId};
use super::schedule::{Scheduler, TaskHandle};
use super::timer::{RankTimer, TimerEvent, TimerSegment};
use crate::config::GameConfig;
use crate::error::{GameError, GameResult};

/// Where the session currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No game started yet
    Inactive,
    /// Breathing pause outstanding, rank timer suspended
    Breathing,
    /// Rank timer counting
    Playing,
    /// Health ran out
    GameOver,
}

/// External signals collected for a single frame
#[derive(Debug, Clone, Default)]
pub struct FrameInput {
    /// Breath results in the order they happened
    pub breath: Vec<BreathSignal>,
    /// Health lost this frame (e.g. KiBlasts reaching the sentry)
    pub damage: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeferredTask {
    BreathPauseElapsed,
}

pub struct GameManager<S: Sentry, M: Metronome> {
    config: GameConfig,
    chain: RankChain,
    sentry: S,
    metronome: M,
    timer: RankTimer,
    scheduler: Scheduler<DeferredTask>,
    /// At most one breathing pause outstanding
    breath_pause: Option<TaskHandle>,
    notifications: Broadcast<GameNotification>,
    current_rank: Option<RankId>,
    difficulty: Difficulty,
    is_game_active: bool,
    game_over: bool,
    player_health: i32,
}

impl<S: Sentry, M: Metronome> GameManager<S, M> {
    pub fn builder() -> GameManagerBuilder<S, M> {
        GameManagerBuilder::new()
    }

    // === Session start ===

    /// Start at the configured initial rank, which must be a normal rank
    pub fn start_game_from_normal(&mut self) -> GameResult<()> {
        let initial = self.config.initial_rank;
        if !self.chain[initial].is_normal() {
            return Err(GameError::InitialRankNotNormal(initial));
        }
        self.begin_session(initial)
    }

    /// Start at the first high score checkpoint at or after the initial rank
    ///
    /// Fails without touching the session if no checkpoint is reachable.
    pub fn start_game_from_high_score(&mut self) -> GameResult<()> {
        let initial = self.config.initial_rank;
        let rank = self
            .chain
            .find_first_high_score_rank(initial)
            .ok_or(GameError::NoHighScoreRank(initial))?;
        self.begin_session(rank)
    }

    fn begin_session(&mut self, first_rank: RankId) -> GameResult<()> {
        // A restart supersedes whatever the previous session left pending
        self.scheduler.cancel_all();
        self.breath_pause = None;

        self.set_first_rank_in_level(first_rank)?;
        self.is_game_active = true;
        self.game_over = false;
        self.player_health = self.config.starting_player_health;
        log::info!(
            "Game started at rank {} ({}), health {}",
            first_rank,
            self.chain[first_rank].name,
            self.player_health
        );

        self.notify(GameNotification::GameStarted);
        self.begin_breath_pause();
        Ok(())
    }

    // === Frame update ===

    pub fn update(&mut self, input: &FrameInput, dt: f32) -> GameResult<()> {
        for &signal in &input.breath {
            self.handle_breath(signal);
        }
        if input.damage > 0 {
            self.damage_player(input.damage);
        }

        self.check_game_over();

        let mut timer_dt = dt;
        for due in self.scheduler.advance(dt) {
            match due.task {
                DeferredTask::BreathPauseElapsed => {
                    if self.breath_pause == Some(due.handle) {
                        self.breath_pause = None;
                        self.finish_breath_pause();
                        timer_dt = due.overshoot_secs.min(dt.max(0.0));
                    }
                }
            }
        }

        if let Some(TimerEvent::NextRankReached) = self.timer.tick(timer_dt) {
            self.on_next_rank_reached()?;
        }
        Ok(())
    }

    fn check_game_over(&mut self) {
        if !self.is_game_active || self.player_health > 0 {
            return;
        }

        log::info!("GAME OVER");
        self.timer.pause();
        self.is_game_active = false;
        self.game_over = true;
        if let Some(handle) = self.breath_pause.take() {
            self.scheduler.cancel(handle);
        }
        self.notify(GameNotification::GameOver);
    }

    // === Signal handlers ===

    pub fn handle_breath(&mut self, signal: BreathSignal) {
        match signal {
            BreathSignal::Hit => self.on_hit(),
            BreathSignal::Fail => self.on_fail(),
        }
    }

    pub fn on_hit(&mut self) {
        if !self.is_game_active {
            return;
        }
        self.sentry.add_ammo(self.difficulty.ammo_grant_for_hit);
    }

    pub fn on_fail(&mut self) {
        if !self.is_game_active {
            return;
        }
        self.sentry.remove_ammo(self.difficulty.ammo_reduction_for_miss);
    }

    /// Current rank's countdown completed
    fn on_next_rank_reached(&mut self) -> GameResult<()> {
        if !self.is_game_active {
            return Ok(());
        }
        if self.breath_pause.is_some() {
            log::warn!("Rank completion ignored: breathing pause still outstanding");
            return Ok(());
        }

        self.timer.pause();
        let current = self.current_rank.ok_or(GameError::NoCurrentRank)?;

        match self.chain.next_of(current) {
            // Entering or leaving a checkpoint starts a new level
            Some(next) if !self.chain[next].is_normal() || !self.chain[current].is_normal() => {
                log::info!("Level complete at rank {} ({})", current, self.chain[current].name);
                self.set_first_rank_in_level(next)?;
            }
            Some(next) => self.set_next_rank_in_level(next),
            None => {
                log::info!(
                    "Final rank {} ({}) complete, replaying it",
                    current,
                    self.chain[current].name
                );
                self.set_first_rank_in_level(current)?;
            }
        }

        self.begin_breath_pause();
        Ok(())
    }

    // === Rank transitions ===

    fn set_first_rank_in_level(&mut self, rank: RankId) -> GameResult<()> {
        self.current_rank = Some(rank);
        if self.chain[rank].is_normal() {
            let ranks = self.chain.ranks_for_normal_level(self.current_rank)?;
            self.timer.reset_for_ranks(&self.chain, &ranks);
        } else {
            self.timer
                .reset_single(TimerSegment::for_rank(rank, &self.chain[rank]));
        }
        self.difficulty = self.chain[rank].difficulty;
        log::debug!("First rank in level: {} ({})", rank, self.chain[rank].name);
        Ok(())
    }

    fn set_next_rank_in_level(&mut self, rank: RankId) {
        self.current_rank = Some(rank);
        self.difficulty = self.chain[rank].difficulty;
        log::debug!("Next rank in level: {} ({})", rank, self.chain[rank].name);
    }

    // === Breathing pause ===

    fn begin_breath_pause(&mut self) {
        if let Some(previous) = self.breath_pause.take() {
            self.scheduler.cancel(previous);
            log::debug!("Superseded outstanding breathing pause");
        }
        let handle = self
            .scheduler
            .schedule(self.config.breath_pause_secs, DeferredTask::BreathPauseElapsed);
        self.breath_pause = Some(handle);
        log::debug!("Breathing pause for {}s", self.config.breath_pause_secs);
    }

    fn finish_breath_pause(&mut self) {
        if !self.is_game_active {
            return;
        }
        let Some(is_normal) = self.current_rank_info().map(Rank::is_normal) else {
            log::warn!("Breathing pause ended without a current rank");
            return;
        };
        if is_normal {
            self.continue_level();
        } else {
            self.start_level();
        }
    }

    fn continue_level(&mut self) {
        self.timer.resume();
        self.notify(GameNotification::LevelContinued);
    }

    fn start_level(&mut self) {
        self.timer.restart();
        self.notify(GameNotification::LevelStarted);
        if !self.metronome.is_started() {
            self.metronome.start();
        }
    }

    // === Health ===

    /// Lower health; the game over check happens on the next update
    pub fn damage_player(&mut self, amount: u32) {
        if !self.is_game_active {
            return;
        }
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        self.player_health = self.player_health.saturating_sub(amount);
    }

    pub fn set_player_health(&mut self, health: i32) {
        if self.is_game_active {
            self.player_health = health;
        }
    }

    // === Notifications ===

    pub fn subscribe(&mut self, listener: impl FnMut(GameNotification) + 'static) -> SubscriptionId {
        self.notifications.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifications.unsubscribe(id)
    }

    fn notify(&mut self, notification: GameNotification) {
        log::debug!("Notify {:?}", notification);
        self.notifications.emit(notification);
    }

    // === Accessors ===

    pub fn phase(&self) -> SessionPhase {
        if self.is_game_active {
            if self.breath_pause.is_some() {
                SessionPhase::Breathing
            } else {
                SessionPhase::Playing
            }
        } else if self.game_over {
            SessionPhase::GameOver
        } else {
            SessionPhase::Inactive
        }
    }

    #[inline]
    pub fn is_game_active(&self) -> bool {
        self.is_game_active
    }

    #[inline]
    pub fn player_health(&self) -> i32 {
        self.player_health
    }

    #[inline]
    pub fn current_rank(&self) -> Option<RankId> {
        self.current_rank
    }

    pub fn current_rank_info(&self) -> Option<&Rank> {
        self.current_rank.and_then(|id| self.chain.get(id))
    }

    #[inline]
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Seconds left in the outstanding breathing pause
    pub fn breath_pause_remaining(&self) -> Option<f32> {
        self.breath_pause
            .and_then(|handle| self.scheduler.remaining(handle))
    }

    pub fn timer(&self) -> &RankTimer {
        &self.timer
    }

    pub fn chain(&self) -> &RankChain {
        &self.chain
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn sentry(&self) -> &S {
        &self.sentry
    }

    pub fn sentry_mut(&mut self) -> &mut S {
        &mut self.sentry
    }

    pub fn metronome(&self) -> &M {
        &self.metronome
    }

    pub fn metronome_mut(&mut self) -> &mut M {
        &mut self.metronome
    }
}

/// Resolves a [`GameManager`]'s collaborators up front
///
/// Every collaborator is required; a missing one fails `build` instead of
/// surfacing later during play.
pub struct GameManagerBuilder<S: Sentry, M: Metronome> {
    config: GameConfig,
    chain: Option<RankChain>,
    sentry: Option<S>,
    metronome: Option<M>,
}

impl<S: Sentry, M: Metronome> Default for GameManagerBuilder<S, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Sentry, M: Metronome> GameManagerBuilder<S, M> {
    pub fn new() -> Self {
        Self {
            config: GameConfig::default(),
            chain: None,
            sentry: None,
            metronome: None,
        }
    }

    pub fn with_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_rank_chain(mut self, chain: RankChain) -> Self {
        self.chain = Some(chain);
        self
    }

    pub fn with_sentry(mut self, sentry: S) -> Self {
        self.sentry = Some(sentry);
        self
    }

    pub fn with_metronome(mut self, metronome: M) -> Self {
        self.metronome = Some(metronome);
        self
    }

    pub fn build(self) -> GameResult<GameManager<S, M>> {
        self.config.validate()?;
        let chain = self
            .chain
            .ok_or(GameError::MissingCollaborator("rank chain"))?;
        let sentry = self.sentry.ok_or(GameError::MissingCollaborator("sentry"))?;
        let metronome = self
            .metronome
            .ok_or(GameError::MissingCollaborator("metronome"))?;

        if !chain.contains(self.config.initial_rank) {
            return Err(GameError::InitialRankOutOfRange {
                index: self.config.initial_rank,
                len: chain.len(),
            });
        }
        if sentry.maximum_ammo() != self.config.maximum_ammo_count {
            log::warn!(
                "Sentry ammo cap {} differs from configured maximum {}",
                sentry.maximum_ammo(),
                self.config.maximum_ammo_count
            );
        }

        Ok(GameManager {
            player_health: self.config.starting_player_health,
            config: self.config,
            chain,
            sentry,
            metronome,
            timer: RankTimer::new(),
            scheduler: Scheduler::new(),
            breath_pause: None,
            notifications: Broadcast::new(),
            current_rank: None,
            difficulty: Difficulty::default(),
            is_game_active: false,
            game_over: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collab::{AmmoSentry, BeatMetronome};
    use crate::sim::timer::TimerPhase;
    use std::cell::RefCell;
    use std::rc::Rc;

    const STEP: f32 = 0.5;

    /// Counts start calls so repeated level starts can be checked
    #[derive(Default)]
    struct CountingMetronome {
        starts: u32,
    }

    impl Metronome for CountingMetronome {
        fn is_started(&self) -> bool {
            self.starts > 0
        }

        fn start(&mut self) {
            self.starts += 1;
        }
    }

    type TestManager = GameManager<AmmoSentry, CountingMetronome>;

    /// [Normal A(5s), Normal B(5s), HighScore C(8s)]
    fn abc_chain() -> RankChain {
        RankChain::linear(vec![
            Rank::normal("A", Difficulty::new(5, 3), 5.0),
            Rank::normal("B", Difficulty::new(6, 4), 5.0),
            Rank::high_score("C", Difficulty::new(2, 9), 8.0),
        ])
        .unwrap()
    }

    fn config() -> GameConfig {
        GameConfig {
            breath_pause_secs: 1.0,
            ..Default::default()
        }
    }

    fn manager_with(chain: RankChain) -> (TestManager, Rc<RefCell<Vec<GameNotification>>>) {
        let mut manager = GameManager::builder()
            .with_config(config())
            .with_rank_chain(chain)
            .with_sentry(AmmoSentry::new(100).with_ammo(50))
            .with_metronome(CountingMetronome::default())
            .build()
            .unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        manager.subscribe(move |n| sink.borrow_mut().push(n));
        (manager, seen)
    }

    fn run(manager: &mut TestManager, secs: f32) {
        let frames = (secs / STEP).round() as u32;
        for _ in 0..frames {
            manager.update(&FrameInput::default(), STEP).unwrap();
        }
    }

    #[test]
    fn test_builder_requires_collaborators() {
        let missing_sentry = GameManager::<AmmoSentry, BeatMetronome>::builder()
            .with_rank_chain(abc_chain())
            .with_metronome(BeatMetronome::new(90.0))
            .build();
        assert!(matches!(
            missing_sentry,
            Err(GameError::MissingCollaborator("sentry"))
        ));

        let missing_chain = GameManager::<AmmoSentry, BeatMetronome>::builder()
            .with_sentry(AmmoSentry::new(100))
            .with_metronome(BeatMetronome::new(90.0))
            .build();
        assert!(matches!(
            missing_chain,
            Err(GameError::MissingCollaborator("rank chain"))
        ));

        let missing_metronome = GameManager::<AmmoSentry, BeatMetronome>::builder()
            .with_rank_chain(abc_chain())
            .with_sentry(AmmoSentry::new(100))
            .build();
        assert!(matches!(
            missing_metronome,
            Err(GameError::MissingCollaborator("metronome"))
        ));
    }

    #[test]
    fn test_builder_rejects_out_of_range_initial_rank() {
        let result = GameManager::builder()
            .with_config(GameConfig {
                initial_rank: 3,
                ..Default::default()
            })
            .with_rank_chain(abc_chain())
            .with_sentry(AmmoSentry::new(100))
            .with_metronome(BeatMetronome::new(90.0))
            .build();
        assert!(matches!(
            result,
            Err(GameError::InitialRankOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_new_manager_is_inactive() {
        let (manager, seen) = manager_with(abc_chain());
        assert_eq!(manager.phase(), SessionPhase::Inactive);
        assert!(!manager.is_game_active());
        assert_eq!(manager.current_rank(), None);
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_start_from_normal() {
        let (mut manager, seen) = manager_with(abc_chain());
        manager.start_game_from_normal().unwrap();

        assert!(manager.is_game_active());
        assert_eq!(manager.player_health(), 3);
        assert_eq!(manager.current_rank(), Some(0));
        assert_eq!(manager.difficulty(), Difficulty::new(5, 3));
        assert_eq!(manager.timer().armed_ranks(), vec![0, 1]);
        assert_eq!(manager.timer().phase(), TimerPhase::Idle);
        assert_eq!(manager.phase(), SessionPhase::Breathing);
        assert_eq!(manager.breath_pause_remaining(), Some(1.0));
        assert_eq!(*seen.borrow(), vec![GameNotification::GameStarted]);

        run(&mut manager, 1.0);
        assert_eq!(manager.phase(), SessionPhase::Playing);
        assert!(manager.timer().is_running());
        assert_eq!(
            *seen.borrow(),
            vec![GameNotification::GameStarted, GameNotification::LevelContinued]
        );
    }

    #[test]
    fn test_start_from_normal_rejects_checkpoint_start() {
        let chain = RankChain::linear(vec![
            Rank::high_score("C", Difficulty::new(1, 1), 8.0),
            Rank::normal("D", Difficulty::new(1, 1), 5.0),
        ])
        .unwrap();
        let (mut manager, _) = manager_with(chain);
        assert!(matches!(
            manager.start_game_from_normal(),
            Err(GameError::InitialRankNotNormal(0))
        ));
        assert!(!manager.is_game_active());
    }

    #[test]
    fn test_advance_within_level_keeps_armed_ranks() {
        let (mut manager, seen) = manager_with(abc_chain());
        manager.start_game_from_normal().unwrap();

        // 1s pause + 5s for A
        run(&mut manager, 6.0);
        assert_eq!(manager.current_rank(), Some(1));
        assert_eq!(manager.difficulty(), Difficulty::new(6, 4));
        assert_eq!(manager.phase(), SessionPhase::Breathing);
        assert_eq!(manager.timer().phase(), TimerPhase::Paused);
        assert_eq!(manager.timer().armed_ranks(), vec![0, 1]);
        assert_eq!(manager.timer().current_rank(), Some(1));

        run(&mut manager, 1.0);
        assert!(manager.timer().is_running());
        assert_eq!(manager.timer().armed_ranks(), vec![0, 1]);
        assert_eq!(
            seen.borrow().last(),
            Some(&GameNotification::LevelContinued)
        );
    }

    #[test]
    fn test_level_complete_arms_checkpoint() {
        let (mut manager, seen) = manager_with(abc_chain());
        manager.start_game_from_normal().unwrap();

        run(&mut manager, 12.0);
        assert_eq!(manager.current_rank(), Some(2));
        assert_eq!(manager.difficulty(), Difficulty::new(2, 9));
        assert_eq!(manager.timer().armed_ranks(), vec![2]);
        assert_eq!(manager.timer().phase(), TimerPhase::Idle);
        assert_eq!(manager.metronome().starts, 0);

        run(&mut manager, 1.0);
        assert!(manager.timer().is_running());
        assert_eq!(manager.metronome().starts, 1);
        assert_eq!(
            *seen.borrow(),
            vec![
                GameNotification::GameStarted,
                GameNotification::LevelContinued,
                GameNotification::LevelContinued,
                GameNotification::LevelStarted,
            ]
        );
    }

    #[test]
    fn test_each_rank_plays_its_full_duration() {
        let (mut manager, _) = manager_with(abc_chain());
        manager.start_game_from_normal().unwrap();

        run(&mut manager, 6.0);
        assert_eq!(manager.current_rank(), Some(1));
        assert_eq!(manager.timer().current_rank(), manager.current_rank());

        // Pause, then B must run 5s of its own before the checkpoint
        run(&mut manager, 1.0);
        assert_eq!(manager.timer().remaining_secs(), 5.0);
        run(&mut manager, 4.5);
        assert_eq!(manager.current_rank(), Some(1));
        assert_eq!(manager.phase(), SessionPhase::Playing);
        run(&mut manager, 0.5);
        assert_eq!(manager.current_rank(), Some(2));
        assert_eq!(manager.timer().current_rank(), manager.current_rank());
    }

    #[test]
    fn test_pause_ending_mid_frame_counts_only_the_rest() {
        let (mut manager, _) = manager_with(abc_chain());
        manager.start_game_from_normal().unwrap();

        // Pause ends 0.25s into the second frame
        manager.update(&FrameInput::default(), 0.75).unwrap();
        assert_eq!(manager.phase(), SessionPhase::Breathing);
        manager.update(&FrameInput::default(), 0.75).unwrap();
        assert_eq!(manager.phase(), SessionPhase::Playing);
        assert_eq!(manager.timer().remaining_secs(), 4.5);
    }

    #[test]
    fn test_metronome_started_only_once() {
        let (mut manager, seen) = manager_with(abc_chain());
        manager.start_game_from_high_score().unwrap();

        // Pause, 8s checkpoint, pause again (final rank replays)
        run(&mut manager, 1.0);
        run(&mut manager, 8.0);
        assert_eq!(manager.current_rank(), Some(2));
        run(&mut manager, 1.0);

        let starts = seen
            .borrow()
            .iter()
            .filter(|n| **n == GameNotification::LevelStarted)
            .count();
        assert_eq!(starts, 2);
        assert_eq!(manager.metronome().starts, 1);
    }

    #[test]
    fn test_start_from_high_score() {
        let (mut manager, seen) = manager_with(abc_chain());
        manager.start_game_from_high_score().unwrap();
        assert_eq!(manager.current_rank(), Some(2));
        assert_eq!(manager.timer().armed_ranks(), vec![2]);

        run(&mut manager, 1.0);
        assert_eq!(
            *seen.borrow(),
            vec![GameNotification::GameStarted, GameNotification::LevelStarted]
        );
        assert!(manager.timer().is_running());
        assert!(manager.metronome().is_started());
    }

    #[test]
    fn test_start_from_high_score_without_checkpoint() {
        let chain = RankChain::linear(vec![
            Rank::normal("A", Difficulty::new(1, 1), 5.0),
            Rank::normal("B", Difficulty::new(1, 1), 5.0),
        ])
        .unwrap();
        let (mut manager, seen) = manager_with(chain);
        assert!(matches!(
            manager.start_game_from_high_score(),
            Err(GameError::NoHighScoreRank(0))
        ));
        assert!(!manager.is_game_active());
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_leaving_checkpoint_starts_new_normal_level() {
        let chain = RankChain::linear(vec![
            Rank::high_score("C", Difficulty::new(1, 1), 2.0),
            Rank::normal("D", Difficulty::new(3, 3), 4.0),
            Rank::normal("E", Difficulty::new(4, 4), 4.0),
            Rank::high_score("F", Difficulty::new(5, 5), 4.0),
        ])
        .unwrap();
        let (mut manager, seen) = manager_with(chain);
        manager.start_game_from_high_score().unwrap();

        // 1s pause + 2s checkpoint
        run(&mut manager, 3.0);
        assert_eq!(manager.current_rank(), Some(1));
        assert_eq!(manager.timer().armed_ranks(), vec![1, 2]);

        run(&mut manager, 1.0);
        assert!(manager.timer().is_running());
        assert_eq!(
            seen.borrow().last(),
            Some(&GameNotification::LevelContinued)
        );
    }

    #[test]
    fn test_hit_and_fail_adjust_ammo() {
        let (mut manager, _) = manager_with(abc_chain());
        manager.start_game_from_normal().unwrap();

        manager.on_hit();
        assert_eq!(manager.sentry().ammo(), 55);
        manager.on_fail();
        assert_eq!(manager.sentry().ammo(), 52);

        let input = FrameInput {
            breath: vec![BreathSignal::Hit, BreathSignal::Hit, BreathSignal::Fail],
            damage: 0,
        };
        manager.update(&input, STEP).unwrap();
        assert_eq!(manager.sentry().ammo(), 59);
    }

    #[test]
    fn test_hit_while_inactive_is_noop() {
        let (mut manager, _) = manager_with(abc_chain());
        manager.on_hit();
        manager.on_fail();
        manager.on_next_rank_reached().unwrap();
        assert_eq!(manager.sentry().ammo(), 50);
        assert_eq!(manager.current_rank(), None);
    }

    #[test]
    fn test_game_over_fires_once() {
        let (mut manager, seen) = manager_with(abc_chain());
        manager.start_game_from_normal().unwrap();
        run(&mut manager, 2.0);
        assert!(manager.timer().is_running());

        manager.damage_player(3);
        assert_eq!(manager.player_health(), 0);
        assert!(manager.is_game_active());

        manager.update(&FrameInput::default(), STEP).unwrap();
        assert!(!manager.is_game_active());
        assert_eq!(manager.phase(), SessionPhase::GameOver);
        assert_eq!(manager.timer().phase(), TimerPhase::Paused);

        run(&mut manager, 20.0);
        let overs = seen
            .borrow()
            .iter()
            .filter(|n| **n == GameNotification::GameOver)
            .count();
        assert_eq!(overs, 1);
        assert_eq!(seen.borrow().last(), Some(&GameNotification::GameOver));
    }

    #[test]
    fn test_no_state_changes_after_game_over() {
        let (mut manager, _) = manager_with(abc_chain());
        manager.start_game_from_normal().unwrap();
        manager.set_player_health(-2);
        manager.update(&FrameInput::default(), STEP).unwrap();
        assert!(!manager.is_game_active());

        let ammo = manager.sentry().ammo();
        let rank = manager.current_rank();
        let input = FrameInput {
            breath: vec![BreathSignal::Hit, BreathSignal::Fail],
            damage: 5,
        };
        manager.update(&input, STEP).unwrap();
        manager.on_hit();
        manager.on_next_rank_reached().unwrap();
        manager.damage_player(1);

        assert_eq!(manager.sentry().ammo(), ammo);
        assert_eq!(manager.current_rank(), rank);
        assert_eq!(manager.player_health(), -2);
        assert_eq!(manager.breath_pause_remaining(), None);
    }

    #[test]
    fn test_game_over_cancels_breathing_pause() {
        let (mut manager, seen) = manager_with(abc_chain());
        manager.start_game_from_normal().unwrap();
        manager.damage_player(10);
        run(&mut manager, 3.0);

        assert_eq!(
            *seen.borrow(),
            vec![GameNotification::GameStarted, GameNotification::GameOver]
        );
        assert_eq!(manager.timer().phase(), TimerPhase::Idle);
    }

    #[test]
    fn test_rank_completion_ignored_during_pause() {
        let (mut manager, _) = manager_with(abc_chain());
        manager.start_game_from_normal().unwrap();
        assert_eq!(manager.phase(), SessionPhase::Breathing);

        manager.on_next_rank_reached().unwrap();
        assert_eq!(manager.current_rank(), Some(0));
        assert_eq!(manager.breath_pause_remaining(), Some(1.0));
    }

    #[test]
    fn test_restart_supersedes_pending_pause() {
        let (mut manager, seen) = manager_with(abc_chain());
        manager.start_game_from_normal().unwrap();
        run(&mut manager, 0.5);
        manager.start_game_from_normal().unwrap();

        // Old pause would have ended at 1.0; the new one ends at 1.5
        run(&mut manager, 0.5);
        assert_eq!(manager.phase(), SessionPhase::Breathing);
        run(&mut manager, 0.5);
        let continued = seen
            .borrow()
            .iter()
            .filter(|n| **n == GameNotification::LevelContinued)
            .count();
        assert_eq!(continued, 1);
    }

    #[test]
    fn test_restart_after_game_over_resets_health() {
        let (mut manager, _) = manager_with(abc_chain());
        manager.start_game_from_normal().unwrap();
        manager.damage_player(3);
        manager.update(&FrameInput::default(), STEP).unwrap();
        assert_eq!(manager.phase(), SessionPhase::GameOver);

        manager.start_game_from_normal().unwrap();
        assert!(manager.is_game_active());
        assert_eq!(manager.player_health(), 3);
        assert_eq!(manager.phase(), SessionPhase::Breathing);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let (mut manager, seen) = manager_with(abc_chain());
        let extra = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&extra);
        let id = manager.subscribe(move |_| *counter.borrow_mut() += 1);

        manager.start_game_from_normal().unwrap();
        assert!(manager.unsubscribe(id));
        run(&mut manager, 1.0);

        assert_eq!(*extra.borrow(), 1);
        assert_eq!(seen.borrow().len(), 2);
    }
}
