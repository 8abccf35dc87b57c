//! Round State Definitions
//!
//! Data for the one live round: phase, public multiplier, secret crash
//! point, and the waiting countdown.

use serde::{Deserialize, Serialize};

use crate::WAITING_COUNTDOWN_SECS;

/// Phase of the round cycle.
///
/// The cycle is total: `Waiting -> Flying -> Crashed -> Waiting`,
/// repeating until process shutdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    /// Countdown running, bets open.
    Waiting,
    /// Multiplier climbing, cash-outs open.
    Flying,
    /// Round over, payout multiplier frozen at the crash point.
    Crashed,
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GamePhase::Waiting => write!(f, "waiting"),
            GamePhase::Flying => write!(f, "flying"),
            GamePhase::Crashed => write!(f, "crashed"),
        }
    }
}

/// State of the live round.
///
/// Invariants: `crash_point >= 1.0`, and `1.0 <= multiplier <=
/// crash_point` at every observable instant. `multiplier` is
/// monotonically non-decreasing within a round.
#[derive(Clone, Debug)]
pub struct RoundState {
    /// Current phase.
    pub phase: GamePhase,
    /// Publicly displayed multiplier (unrounded, authoritative).
    pub multiplier: f64,
    /// Multiplier at which this round will end. Drawn once per round.
    pub crash_point: f64,
    /// Seconds left in the waiting countdown.
    pub time_remaining: u32,
}

impl RoundState {
    /// Fresh round in the waiting phase with the given crash point.
    pub fn waiting(crash_point: f64) -> Self {
        Self {
            phase: GamePhase::Waiting,
            multiplier: 1.0,
            crash_point,
            time_remaining: WAITING_COUNTDOWN_SECS,
        }
    }

    /// Multiplier as shown to clients, rounded to one decimal place.
    ///
    /// Payouts always use the unrounded `multiplier`.
    pub fn display_multiplier(&self) -> f64 {
        (self.multiplier * 10.0).round() / 10.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_waiting_reset() {
        let round = RoundState::waiting(2.37);
        assert_eq!(round.phase, GamePhase::Waiting);
        assert_eq!(round.multiplier, 1.0);
        assert_eq!(round.crash_point, 2.37);
        assert_eq!(round.time_remaining, WAITING_COUNTDOWN_SECS);
    }

    #[test]
    fn test_display_multiplier_rounds_to_one_decimal() {
        let mut round = RoundState::waiting(10.0);
        round.multiplier = 1.7345;
        assert_eq!(round.display_multiplier(), 1.7);

        round.multiplier = 1.75;
        assert_eq!(round.display_multiplier(), 1.8);

        round.multiplier = 1.0;
        assert_eq!(round.display_multiplier(), 1.0);
    }

    #[test]
    fn test_phase_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&GamePhase::Waiting).unwrap(),
            "\"waiting\""
        );
        assert_eq!(
            serde_json::to_string(&GamePhase::Flying).unwrap(),
            "\"flying\""
        );
        assert_eq!(
            serde_json::to_string(&GamePhase::Crashed).unwrap(),
            "\"crashed\""
        );
    }
}
