//! Per-Round Bet Ledger
//!
//! Tracks each player's stake and cash-out status for the active round.
//! Uses BTreeMap so auto-cashouts resolve in sorted player order.
//!
//! Phase gating lives in the engine; the ledger itself only enforces
//! per-bet rules (bet exists, not already cashed out). Stake amounts
//! are accepted as-is; callers validate upstream.

use std::collections::BTreeMap;

/// A single player's stake in the active round.
#[derive(Clone, Debug)]
pub struct Bet {
    /// Owning player.
    pub player_id: String,
    /// Stake amount.
    pub amount: f64,
    /// Optional multiplier threshold for automatic cash-out.
    pub auto_cashout: Option<f64>,
    /// Set once, by the first successful cash-out.
    pub cashed_out: bool,
    /// Multiplier locked in at cash-out time (unrounded).
    pub cashout_multiplier: Option<f64>,
}

/// Outcome of a cash-out attempt, mirrored verbatim into the reply
/// message.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CashoutOutcome {
    /// Whether the cash-out was accepted.
    pub success: bool,
    /// Stake times multiplier, present only on success.
    pub winnings: Option<f64>,
}

impl CashoutOutcome {
    /// A rejected cash-out.
    pub fn rejected() -> Self {
        Self {
            success: false,
            winnings: None,
        }
    }
}

/// All bets for the active round, keyed by player.
#[derive(Debug, Default)]
pub struct BetLedger {
    bets: BTreeMap<String, Bet>,
}

impl BetLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a bet for `player_id`, replacing any existing bet the
    /// player holds this round (last write wins).
    pub fn place(&mut self, player_id: &str, amount: f64, auto_cashout: Option<f64>) {
        self.bets.insert(
            player_id.to_string(),
            Bet {
                player_id: player_id.to_string(),
                amount,
                auto_cashout,
                cashed_out: false,
                cashout_multiplier: None,
            },
        );
    }

    /// Cash out `player_id`'s bet at `multiplier`.
    ///
    /// Returns the winnings, or `None` if the player has no bet or the
    /// bet is already cashed out. The multiplier recorded on the bet is
    /// the unrounded value passed in.
    pub fn cash_out(&mut self, player_id: &str, multiplier: f64) -> Option<f64> {
        let bet = self.bets.get_mut(player_id)?;
        if bet.cashed_out {
            return None;
        }

        bet.cashed_out = true;
        bet.cashout_multiplier = Some(multiplier);
        Some(bet.amount * multiplier)
    }

    /// Players whose auto-cashout threshold has been reached and whose
    /// bet is still live, in sorted player order.
    pub fn auto_cashouts_due(&self, multiplier: f64) -> Vec<String> {
        self.bets
            .values()
            .filter(|bet| !bet.cashed_out)
            .filter(|bet| matches!(bet.auto_cashout, Some(t) if multiplier >= t))
            .map(|bet| bet.player_id.clone())
            .collect()
    }

    /// Look up a player's bet.
    pub fn get(&self, player_id: &str) -> Option<&Bet> {
        self.bets.get(player_id)
    }

    /// Discard all bets (round returned to waiting).
    pub fn clear(&mut self) {
        self.bets.clear();
    }

    /// Number of bets in the round.
    pub fn len(&self) -> usize {
        self.bets.len()
    }

    /// Whether the round has no bets.
    pub fn is_empty(&self) -> bool {
        self.bets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_replaces_existing_bet() {
        let mut ledger = BetLedger::new();
        ledger.place("alice", 10.0, None);
        ledger.place("alice", 25.0, Some(2.0));

        assert_eq!(ledger.len(), 1);
        let bet = ledger.get("alice").unwrap();
        assert_eq!(bet.amount, 25.0);
        assert_eq!(bet.auto_cashout, Some(2.0));
        assert!(!bet.cashed_out);
    }

    #[test]
    fn test_cash_out_computes_winnings_once() {
        let mut ledger = BetLedger::new();
        ledger.place("bob", 10.0, None);

        assert_eq!(ledger.cash_out("bob", 1.75), Some(17.5));
        let bet = ledger.get("bob").unwrap();
        assert!(bet.cashed_out);
        assert_eq!(bet.cashout_multiplier, Some(1.75));

        // Second attempt is rejected
        assert_eq!(ledger.cash_out("bob", 2.5), None);
    }

    #[test]
    fn test_cash_out_unknown_player() {
        let mut ledger = BetLedger::new();
        assert_eq!(ledger.cash_out("ghost", 2.0), None);
    }

    #[test]
    fn test_auto_cashouts_due_filters_and_sorts() {
        let mut ledger = BetLedger::new();
        ledger.place("carol", 5.0, Some(3.0));
        ledger.place("alice", 5.0, Some(1.5));
        ledger.place("bob", 5.0, None);
        ledger.place("dave", 5.0, Some(1.2));

        // dave already cashed out manually
        ledger.cash_out("dave", 1.3).unwrap();

        let due = ledger.auto_cashouts_due(1.5);
        assert_eq!(due, vec!["alice".to_string()]);

        let due = ledger.auto_cashouts_due(3.0);
        assert_eq!(due, vec!["alice".to_string(), "carol".to_string()]);
    }

    #[test]
    fn test_clear_discards_all() {
        let mut ledger = BetLedger::new();
        ledger.place("alice", 1.0, None);
        ledger.place("bob", 2.0, None);
        ledger.clear();
        assert!(ledger.is_empty());
    }
}
