//! Pure validation and aggregation helpers for reaction times.
//!
//! Nothing here holds state; the controller in [`crate::game`] and the
//! front-end both call into these functions.

use serde::{Deserialize, Serialize};

use crate::game::GameStatus;
use crate::util::{mean, min};

/// Fastest response treated as genuine, in milliseconds
pub const MIN_VALID_REACTION_MS: f64 = 50.0;
/// Slowest response treated as genuine, in milliseconds
pub const MAX_VALID_REACTION_MS: f64 = 2000.0;
/// Number of raw samples kept in the recent-times window
pub const RECENT_WINDOW: usize = 5;

/// Aggregates over the plausible subset of a reaction-time history
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_attempts: usize,
    pub best_time: Option<f64>,
    pub average_time: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PerformanceCategory {
    Excellent,
    Good,
    Average,
    Slow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PerformanceContext {
    pub category: PerformanceCategory,
    pub message: &'static str,
}

/// True when `time` lies inside the plausibility band (inclusive on both ends).
/// Anticipations and missed triggers fall outside it.
pub fn is_valid_reaction_time(time: f64) -> bool {
    (MIN_VALID_REACTION_MS..=MAX_VALID_REACTION_MS).contains(&time)
}

pub fn calculate_stats(reaction_times: &[f64]) -> StatsSummary {
    let valid_times = reaction_times
        .iter()
        .copied()
        .filter(|t| is_valid_reaction_time(*t))
        .collect::<Vec<f64>>();

    StatsSummary {
        total_attempts: valid_times.len(),
        best_time: min(&valid_times),
        average_time: mean(&valid_times),
    }
}

/// Row of the transition table for `from`
pub fn allowed_transitions(from: GameStatus) -> &'static [GameStatus] {
    use GameStatus::*;

    match from {
        Idle => &[Waiting],
        Waiting => &[Ready, FalseStart, Idle],
        Ready => &[Clicked, FalseStart, Idle],
        Clicked => &[Waiting, Idle],
        FalseStart => &[Waiting, Idle],
    }
}

pub fn is_valid_state_transition(from: GameStatus, to: GameStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Render a reaction time as whole milliseconds, rounding ties up
pub fn format_reaction_time(time: f64) -> String {
    format!("{}ms", (time + 0.5).floor() as i64)
}

pub fn performance_context(time: f64) -> PerformanceContext {
    if time < 150.0 {
        PerformanceContext {
            category: PerformanceCategory::Excellent,
            message: "Excellent! That's faster than most people.",
        }
    } else if time < 200.0 {
        PerformanceContext {
            category: PerformanceCategory::Good,
            message: "Good reaction time!",
        }
    } else if time < 300.0 {
        PerformanceContext {
            category: PerformanceCategory::Average,
            message: "Average human reaction time.",
        }
    } else {
        PerformanceContext {
            category: PerformanceCategory::Slow,
            message: "Try to react faster next time.",
        }
    }
}
