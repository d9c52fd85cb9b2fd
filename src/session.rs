use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::clock::{Clock, MonotonicClock};
use crate::config::Config;
use crate::game::{Game, GameStatus};

/// What a single press did to the game
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PressOutcome {
    Started,
    FalseStart,
    Recorded(f64),
}

/// Presentation-side driver: turns one press button plus timer ticks into
/// controller actions, and owns the random delay before the stimulus.
#[derive(Debug)]
pub struct Session<C: Clock = MonotonicClock> {
    game: Game<C>,
    config: Config,
    rng: StdRng,
    stimulus_at: Option<f64>,
}

impl Session<MonotonicClock> {
    pub fn new(config: Config) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock> Session<C> {
    pub fn with_clock(config: Config, clock: C) -> Self {
        Self::with_rng(config, clock, StdRng::from_entropy())
    }

    pub fn with_rng(config: Config, clock: C, rng: StdRng) -> Self {
        Self {
            game: Game::with_clock(clock),
            config,
            rng,
            stimulus_at: None,
        }
    }

    pub fn game(&self) -> &Game<C> {
        &self.game
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Clock reading at which the stimulus will be shown, while waiting
    pub fn stimulus_at(&self) -> Option<f64> {
        self.stimulus_at
    }

    pub fn press(&mut self) -> PressOutcome {
        match self.game.status() {
            GameStatus::Idle | GameStatus::Clicked | GameStatus::FalseStart => {
                self.game.start_game();
                self.arm_stimulus();
                PressOutcome::Started
            }
            GameStatus::Waiting => {
                self.game.record_false_start();
                self.stimulus_at = None;
                PressOutcome::FalseStart
            }
            GameStatus::Ready => match self.game.record_click() {
                Some(reaction_time) => PressOutcome::Recorded(reaction_time),
                // ready always carries a start time
                None => PressOutcome::FalseStart,
            },
        }
    }

    /// Show the stimulus once its delay has elapsed.
    /// Returns true when the phase changed.
    pub fn on_tick(&mut self) -> bool {
        match (self.game.status(), self.stimulus_at) {
            (GameStatus::Waiting, Some(due)) if self.game.clock().now() >= due => {
                self.stimulus_at = None;
                self.game.set_ready();
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        self.stimulus_at = None;
        self.game.reset_game();
    }

    pub fn reset_stats(&mut self) {
        self.game.reset_stats();
    }

    fn arm_stimulus(&mut self) {
        let range = self.config.delay_range();
        let delay_ms = if range.is_empty() {
            *range.start()
        } else {
            self.rng.gen_range(range)
        };
        let delay = delay_ms as f64;
        let due = self.game.clock().now() + delay;
        debug!(delay, due, "stimulus armed");
        self.stimulus_at = Some(due);
    }
}
