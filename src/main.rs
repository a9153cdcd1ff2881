//! Breath Sentry entry point
//!
//! Headless run: a seeded breathing simulator stands in for the player and
//! KiBlasts arrive at random. Usage:
//!
//! `breath-sentry [session.json] [--high-score] [--seed N]`

use std::path::PathBuf;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use breath_sentry::consts::*;
use breath_sentry::sim::{
    AmmoSentry, BeatMetronome, BreathSignal, FrameInput, GameManager, Sentry, SessionPhase,
};
use breath_sentry::{GameResult, SessionFile};

/// Simulated seconds before the demo stops on its own
const RUN_SECS: f32 = 600.0;
/// Render frame length driving the fixed-step accumulator
const FRAME_DT: f32 = 1.0 / 60.0;

struct Options {
    session_path: Option<PathBuf>,
    from_high_score: bool,
    seed: u64,
}

fn parse_args() -> Options {
    let mut options = Options {
        session_path: None,
        from_high_score: false,
        seed: 0x5EED,
    };
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--high-score" => options.from_high_score = true,
            "--seed" => match args.next().and_then(|s| s.parse().ok()) {
                Some(seed) => options.seed = seed,
                None => log::warn!("--seed expects an integer, keeping {}", options.seed),
            },
            path => options.session_path = Some(PathBuf::from(path)),
        }
    }
    options
}

/// Stand-in for the player and the incoming KiBlasts
struct BreathSimulator {
    rng: Pcg32,
    /// Seconds until the next breath
    next_breath: f32,
    breath_interval: f32,
    hit_chance: f64,
    /// Chance per second that a KiBlast arrives
    blast_rate: f64,
}

impl BreathSimulator {
    fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
            next_breath: 2.0,
            breath_interval: 2.0,
            hit_chance: 0.7,
            blast_rate: 0.6,
        }
    }

    /// Signals for one fixed step; the sentry shoots down what it can
    fn step(&mut self, dt: f32, sentry: &mut AmmoSentry) -> FrameInput {
        let mut input = FrameInput::default();

        self.next_breath -= dt;
        if self.next_breath <= 0.0 {
            self.next_breath += self.breath_interval;
            let signal = if self.rng.random_bool(self.hit_chance) {
                BreathSignal::Hit
            } else {
                BreathSignal::Fail
            };
            input.breath.push(signal);
        }

        let blast_chance = (self.blast_rate * f64::from(dt)).clamp(0.0, 1.0);
        if self.rng.random_bool(blast_chance) && !sentry.try_fire() {
            input.damage += 1;
        }
        input
    }
}

fn run(options: Options) -> GameResult<()> {
    let session = match &options.session_path {
        Some(path) => SessionFile::load(path)?,
        None => SessionFile::default(),
    };

    let sentry = AmmoSentry::new(session.config.maximum_ammo_count);
    let mut manager = GameManager::builder()
        .with_config(session.config)
        .with_rank_chain(session.ranks)
        .with_sentry(sentry)
        .with_metronome(BeatMetronome::new(METRONOME_BPM))
        .build()?;
    manager.subscribe(|notification| log::info!("Notification: {:?}", notification));

    if options.from_high_score {
        manager.start_game_from_high_score()?;
    } else {
        manager.start_game_from_normal()?;
    }

    let mut simulator = BreathSimulator::new(options.seed);
    let mut accumulator = 0.0;
    let mut elapsed = 0.0;
    let mut last_rank = manager.current_rank();

    while elapsed < RUN_SECS && manager.phase() != SessionPhase::GameOver {
        accumulator += FRAME_DT;
        let mut substeps = 0;
        while accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            let input = simulator.step(SIM_DT, manager.sentry_mut());
            manager.update(&input, SIM_DT)?;
            manager.metronome_mut().tick(SIM_DT);
            accumulator -= SIM_DT;
            substeps += 1;
        }
        elapsed += FRAME_DT;

        if manager.current_rank() != last_rank {
            last_rank = manager.current_rank();
            if let Some(rank) = manager.current_rank_info() {
                log::info!(
                    "[{:>6.1}s] rank {} ({:?}), ammo {}, health {}",
                    elapsed,
                    rank.name,
                    rank.game_mode,
                    manager.sentry().ammo(),
                    manager.player_health()
                );
            }
        }
    }

    log::info!(
        "Run finished after {:.1}s: phase {:?}, rank {:?}, health {}, shots {}, beats {}",
        elapsed,
        manager.phase(),
        manager.current_rank_info().map(|r| r.name.as_str()),
        manager.player_health(),
        manager.sentry().shots_fired,
        manager.metronome().beats
    );
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("Breath Sentry starting...");

    if let Err(err) = run(parse_args()) {
        log::error!("{err}");
        std::process::exit(1);
    }
}
