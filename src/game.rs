use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::{Clock, MonotonicClock};
use crate::stats::{calculate_stats, is_valid_state_transition, RECENT_WINDOW};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum GameStatus {
    #[default]
    Idle,
    Waiting,
    Ready,
    Clicked,
    FalseStart,
}

impl GameStatus {
    pub const ALL: [GameStatus; 5] = [
        GameStatus::Idle,
        GameStatus::Waiting,
        GameStatus::Ready,
        GameStatus::Clicked,
        GameStatus::FalseStart,
    ];
}

/// Mutable record of the current session.
///
/// `start_time` is only present while a round is `Ready` or `Clicked`;
/// `end_time` only once a click has been recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub status: GameStatus,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub reaction_times: Vec<f64>,
    pub current_attempt: u32,
}

/// Statistics derived from [`GameState::reaction_times`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStats {
    pub total_attempts: usize,
    pub best_time: Option<f64>,
    pub average_time: Option<f64>,
    pub recent_times: Vec<f64>,
}

/// Owned copy of both halves of a game, handed to presentation code
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub game_state: GameState,
    pub game_stats: GameStats,
}

/// Reaction game controller.
///
/// Every mutation goes through one of the seven actions below. Actions never
/// fail: a call that makes no sense in the current phase leaves the game
/// untouched.
#[derive(Debug)]
pub struct Game<C: Clock = MonotonicClock> {
    clock: C,
    state: GameState,
    stats: GameStats,
}

impl Game<MonotonicClock> {
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock::new())
    }
}

impl Default for Game<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Game<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            state: GameState::default(),
            stats: GameStats::default(),
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn stats(&self) -> &GameStats {
        &self.stats
    }

    pub fn status(&self) -> GameStatus {
        self.state.status
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            game_state: self.state.clone(),
            game_stats: self.stats.clone(),
        }
    }

    /// Most recently recorded reaction time, if any
    pub fn last_reaction_time(&self) -> Option<f64> {
        self.state.reaction_times.last().copied()
    }

    /// Begin a new round. Allowed from any phase.
    pub fn start_game(&mut self) {
        self.transition(GameStatus::Waiting);
        self.state.start_time = None;
        self.state.end_time = None;
        self.state.current_attempt += 1;
        debug!(attempt = self.state.current_attempt, "round started");
    }

    pub fn set_waiting(&mut self) {
        self.transition(GameStatus::Waiting);
        self.state.start_time = None;
        self.state.end_time = None;
    }

    /// Show the stimulus and start timing
    pub fn set_ready(&mut self) {
        let start_time = self.clock.now();
        self.transition(GameStatus::Ready);
        self.state.start_time = Some(start_time);
        self.state.end_time = None;
        debug!(start_time, "stimulus shown");
    }

    /// Record the user's response to the stimulus.
    ///
    /// Returns the measured reaction time, or `None` when the game was not
    /// waiting for a response (the call is then ignored).
    pub fn record_click(&mut self) -> Option<f64> {
        let end_time = self.clock.now();

        let start_time = match (self.state.status, self.state.start_time) {
            (GameStatus::Ready, Some(start_time)) => start_time,
            (status, _) => {
                debug!(%status, "click ignored");
                return None;
            }
        };

        let reaction_time = end_time - start_time;
        self.state.reaction_times.push(reaction_time);
        self.transition(GameStatus::Clicked);
        self.state.end_time = Some(end_time);
        self.update_stats(reaction_time);

        info!(
            reaction_time,
            attempt = self.state.current_attempt,
            "reaction recorded"
        );
        Some(reaction_time)
    }

    pub fn record_false_start(&mut self) {
        self.transition(GameStatus::FalseStart);
        self.state.start_time = None;
        self.state.end_time = None;
        debug!(attempt = self.state.current_attempt, "false start");
    }

    /// Restore the session record to its initial value. Stats are kept.
    pub fn reset_game(&mut self) {
        self.transition(GameStatus::Idle);
        self.state = GameState::default();
    }

    /// Clear stats and history but stay in the current phase
    pub fn reset_stats(&mut self) {
        self.stats = GameStats::default();
        self.state.reaction_times.clear();
        self.state.current_attempt = 0;
        debug!(status = %self.state.status, "stats reset");
    }

    fn update_stats(&mut self, reaction_time: f64) {
        let summary = calculate_stats(&self.state.reaction_times);

        let recent_times = &mut self.stats.recent_times;
        recent_times.push(reaction_time);
        let overflow = recent_times.len().saturating_sub(RECENT_WINDOW);
        recent_times.drain(..overflow);

        self.stats.total_attempts = summary.total_attempts;
        self.stats.best_time = summary.best_time;
        self.stats.average_time = summary.average_time;
    }

    fn transition(&mut self, to: GameStatus) {
        let from = self.state.status;
        if from != to && !is_valid_state_transition(from, to) {
            debug!(%from, %to, "transition outside the advisory table");
        }
        self.state.status = to;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn game_at(ms: f64) -> (Game<ManualClock>, ManualClock) {
        let clock = ManualClock::new(ms);
        (Game::with_clock(clock.clone()), clock)
    }

    fn play_round(game: &mut Game<ManualClock>, clock: &ManualClock, delta: f64) -> Option<f64> {
        game.start_game();
        game.set_ready();
        clock.advance(delta);
        game.record_click()
    }

    #[test]
    fn test_new_game_is_idle_and_empty() {
        let (game, _) = game_at(1000.0);

        assert_eq!(
            *game.state(),
            GameState {
                status: GameStatus::Idle,
                start_time: None,
                end_time: None,
                reaction_times: vec![],
                current_attempt: 0,
            }
        );
        assert_eq!(
            *game.stats(),
            GameStats {
                total_attempts: 0,
                best_time: None,
                average_time: None,
                recent_times: vec![],
            }
        );
    }

    #[test]
    fn test_start_game_increments_attempt() {
        let (mut game, _) = game_at(1000.0);

        game.start_game();

        assert_eq!(game.status(), GameStatus::Waiting);
        assert_eq!(game.state().current_attempt, 1);
        assert_eq!(game.state().start_time, None);
        assert_eq!(game.state().end_time, None);

        game.start_game();
        assert_eq!(game.state().current_attempt, 2);
    }

    #[test]
    fn test_set_waiting_keeps_attempt_counter() {
        let (mut game, _) = game_at(1000.0);
        game.start_game();
        game.set_ready();

        game.set_waiting();

        assert_eq!(game.status(), GameStatus::Waiting);
        assert_eq!(game.state().start_time, None);
        assert_eq!(game.state().end_time, None);
        assert_eq!(game.state().current_attempt, 1);
    }

    #[test]
    fn test_set_ready_reads_clock() {
        let (mut game, _) = game_at(2000.0);

        game.set_ready();

        assert_eq!(game.status(), GameStatus::Ready);
        assert_eq!(game.state().start_time, Some(2000.0));
        assert_eq!(game.state().end_time, None);
    }

    #[test]
    fn test_record_click_measures_reaction_time() {
        let (mut game, clock) = game_at(1000.0);
        game.set_ready();
        clock.set(1250.0);

        assert_eq!(game.record_click(), Some(250.0));

        assert_eq!(game.status(), GameStatus::Clicked);
        assert_eq!(game.state().end_time, Some(1250.0));
        assert_eq!(game.state().reaction_times, vec![250.0]);
        assert_eq!(
            *game.stats(),
            GameStats {
                total_attempts: 1,
                best_time: Some(250.0),
                average_time: Some(250.0),
                recent_times: vec![250.0],
            }
        );
    }

    #[test]
    fn test_record_click_keeps_fractional_precision() {
        let (mut game, clock) = game_at(1000.0);
        game.set_ready();
        clock.set(1187.25);

        assert_eq!(game.record_click(), Some(187.25));
        assert_eq!(game.last_reaction_time(), Some(187.25));
    }

    #[test]
    fn test_record_click_ignored_unless_ready() {
        let setups: [fn(&mut Game<ManualClock>); 3] = [
            |_| {},
            |g| g.start_game(),
            |g| g.record_false_start(),
        ];

        for setup in setups {
            let (mut game, clock) = game_at(1000.0);
            setup(&mut game);
            let before = game.snapshot();

            clock.advance(300.0);
            assert_eq!(game.record_click(), None);
            assert_eq!(game.snapshot(), before);
        }
    }

    #[test]
    fn test_duplicate_click_is_ignored() {
        let (mut game, clock) = game_at(1000.0);
        play_round(&mut game, &clock, 220.0);
        let before = game.snapshot();

        clock.advance(50.0);
        assert_eq!(game.record_click(), None);
        assert_eq!(game.snapshot(), before);
    }

    #[test]
    fn test_record_false_start_leaves_history_alone() {
        let (mut game, clock) = game_at(1000.0);
        play_round(&mut game, &clock, 200.0);
        game.start_game();
        let stats_before = game.stats().clone();

        game.record_false_start();

        assert_eq!(game.status(), GameStatus::FalseStart);
        assert_eq!(game.state().start_time, None);
        assert_eq!(game.state().end_time, None);
        assert_eq!(game.state().reaction_times, vec![200.0]);
        assert_eq!(*game.stats(), stats_before);
    }

    #[test]
    fn test_multiple_attempts_track_best_and_average() {
        let (mut game, clock) = game_at(1000.0);

        play_round(&mut game, &clock, 200.0);
        play_round(&mut game, &clock, 150.0);
        play_round(&mut game, &clock, 250.0);

        assert_eq!(game.state().reaction_times, vec![200.0, 150.0, 250.0]);
        assert_eq!(game.state().current_attempt, 3);
        assert_eq!(game.stats().total_attempts, 3);
        assert_eq!(game.stats().best_time, Some(150.0));
        assert_eq!(game.stats().average_time, Some(200.0));
    }

    #[test]
    fn test_recent_times_window_slides() {
        let (mut game, clock) = game_at(0.0);

        for (idx, delta) in [100.0, 150.0, 200.0, 250.0, 300.0, 350.0]
            .into_iter()
            .enumerate()
        {
            clock.advance(idx as f64);
            game.set_ready();
            clock.advance(delta);
            game.record_click();
        }

        assert_eq!(
            game.stats().recent_times,
            vec![150.0, 200.0, 250.0, 300.0, 350.0]
        );
        assert_eq!(game.state().reaction_times.len(), 6);
    }

    #[test]
    fn test_implausible_times_stay_out_of_aggregates() {
        let (mut game, clock) = game_at(1000.0);

        play_round(&mut game, &clock, 30.0);
        assert_eq!(game.state().reaction_times, vec![30.0]);
        assert_eq!(game.stats().recent_times, vec![30.0]);
        assert_eq!(game.stats().total_attempts, 0);
        assert_eq!(game.stats().best_time, None);
        assert_eq!(game.stats().average_time, None);

        play_round(&mut game, &clock, 240.0);
        play_round(&mut game, &clock, 2500.0);

        assert_eq!(game.stats().total_attempts, 1);
        assert_eq!(game.stats().best_time, Some(240.0));
        assert_eq!(game.stats().average_time, Some(240.0));
        assert_eq!(game.stats().recent_times, vec![30.0, 240.0, 2500.0]);
    }

    #[test]
    fn test_reset_game_restores_initial_state() {
        let (mut game, clock) = game_at(1000.0);
        play_round(&mut game, &clock, 200.0);
        game.start_game();
        game.set_ready();

        game.reset_game();

        assert_eq!(*game.state(), GameState::default());
        assert_eq!(game.stats().total_attempts, 1);
    }

    #[test]
    fn test_reset_stats_keeps_phase() {
        let (mut game, clock) = game_at(1000.0);
        play_round(&mut game, &clock, 200.0);
        game.start_game();
        game.set_ready();
        let start_time = game.state().start_time;

        game.reset_stats();

        assert_eq!(*game.stats(), GameStats::default());
        assert!(game.state().reaction_times.is_empty());
        assert_eq!(game.state().current_attempt, 0);
        assert_eq!(game.status(), GameStatus::Ready);
        assert_eq!(game.state().start_time, start_time);
    }

    #[test]
    fn test_status_display_is_kebab_case() {
        assert_eq!(GameStatus::FalseStart.to_string(), "false-start");
        assert_eq!(GameStatus::Idle.to_string(), "idle");
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let (mut game, clock) = game_at(1000.0);
        game.set_ready();
        clock.set(1250.0);
        game.record_click();

        let json = serde_json::to_value(game.snapshot()).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "gameState": {
                    "status": "clicked",
                    "startTime": 1000.0,
                    "endTime": 1250.0,
                    "reactionTimes": [250.0],
                    "currentAttempt": 0,
                },
                "gameStats": {
                    "totalAttempts": 1,
                    "bestTime": 250.0,
                    "averageTime": 250.0,
                    "recentTimes": [250.0],
                },
            })
        );
    }

    #[test]
    fn test_false_start_status_deserializes() {
        let status: GameStatus = serde_json::from_str("\"false-start\"").unwrap();
        assert_eq!(status, GameStatus::FalseStart);
    }
}
