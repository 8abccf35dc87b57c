//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket.
//! One JSON object per message in both directions, internally tagged on
//! `"type"` with camelCase names, the format the production client
//! already speaks.

use serde::{Deserialize, Serialize};

use crate::game::bets::CashoutOutcome;
use crate::game::round::GamePhase;

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to engine.
///
/// Framing and parsing happen in the transport layer; the engine's
/// handlers assume well-typed input and only apply phase/existence
/// checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Stake a bet on the upcoming round. Accepted only while waiting.
    #[serde(rename_all = "camelCase")]
    PlaceBet {
        /// Betting player.
        player_id: String,
        /// Stake amount. Not validated at this boundary.
        amount: f64,
        /// Optional auto-cashout multiplier threshold.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        auto_cashout: Option<f64>,
    },

    /// Lock in winnings at the current multiplier. Accepted only while
    /// flying.
    #[serde(rename_all = "camelCase")]
    Cashout {
        /// Cashing-out player.
        player_id: String,
    },
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from engine to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Reply to a `placeBet` request.
    #[serde(rename_all = "camelCase")]
    BetPlaced {
        /// Whether the bet was accepted.
        success: bool,
    },

    /// Reply to a `cashout` request.
    #[serde(rename_all = "camelCase")]
    CashoutResult {
        /// Whether the cash-out was accepted.
        success: bool,
        /// Stake times multiplier, omitted on failure.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winnings: Option<f64>,
    },

    /// Full round snapshot, sent on every phase entry and every tick.
    #[serde(rename_all = "camelCase")]
    GameState {
        /// The snapshot.
        state: GameStateSnapshot,
    },

    /// A player cashed out (manually or automatically). Broadcast to
    /// every subscriber. The round's only event beyond snapshots.
    #[serde(rename_all = "camelCase")]
    Cashout {
        /// Player who cashed out.
        player_id: String,
        /// Multiplier the winnings were locked at (unrounded).
        multiplier: f64,
        /// Stake times multiplier.
        winnings: f64,
    },
}

impl ServerMessage {
    /// Build a `cashoutResult` reply from a ledger outcome.
    pub fn cashout_result(outcome: CashoutOutcome) -> Self {
        ServerMessage::CashoutResult {
            success: outcome.success,
            winnings: outcome.winnings,
        }
    }
}

/// Publicly visible round state.
///
/// `multiplier` is rounded to one decimal for display; `crash_point` is
/// included in every snapshot, matching the production client's wire
/// contract (the pre-crash visibility is a known leak, recorded in
/// DESIGN.md).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateSnapshot {
    /// Current phase.
    pub phase: GamePhase,
    /// Display multiplier, one decimal place.
    pub multiplier: f64,
    /// This round's crash point.
    pub crash_point: f64,
    /// Seconds left in the waiting countdown.
    pub time_remaining: u32,
    /// Past crash points, most recent first.
    pub history: Vec<f64>,
}

// =============================================================================
// SERIALIZATION HELPERS
// =============================================================================

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_bet_wire_shape() {
        let msg = ClientMessage::PlaceBet {
            player_id: "alice".to_string(),
            amount: 32.0,
            auto_cashout: Some(2.0),
        };

        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "placeBet");
        assert_eq!(value["playerId"], "alice");
        assert_eq!(value["amount"], 32.0);
        assert_eq!(value["autoCashout"], 2.0);
    }

    #[test]
    fn test_place_bet_without_auto_cashout() {
        let parsed =
            ClientMessage::from_json(r#"{"type":"placeBet","playerId":"bob","amount":10}"#)
                .unwrap();

        if let ClientMessage::PlaceBet {
            player_id,
            amount,
            auto_cashout,
        } = parsed
        {
            assert_eq!(player_id, "bob");
            assert_eq!(amount, 10.0);
            assert_eq!(auto_cashout, None);
        } else {
            panic!("Wrong message type");
        }
    }

    #[test]
    fn test_cashout_request_roundtrip() {
        let msg = ClientMessage::Cashout {
            player_id: "carol".to_string(),
        };

        let json = msg.to_json().unwrap();
        assert!(json.contains("\"type\":\"cashout\""));

        let parsed = ClientMessage::from_json(&json).unwrap();
        if let ClientMessage::Cashout { player_id } = parsed {
            assert_eq!(player_id, "carol");
        } else {
            panic!("Wrong message type");
        }
    }

    #[test]
    fn test_game_state_wire_shape() {
        let msg = ServerMessage::GameState {
            state: GameStateSnapshot {
                phase: GamePhase::Flying,
                multiplier: 1.7,
                crash_point: 2.41,
                time_remaining: 0,
                history: vec![2.41, 1.0],
            },
        };

        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "gameState");
        assert_eq!(value["state"]["phase"], "flying");
        assert_eq!(value["state"]["multiplier"], 1.7);
        assert_eq!(value["state"]["crashPoint"], 2.41);
        assert_eq!(value["state"]["timeRemaining"], 0);
        assert_eq!(value["state"]["history"][0], 2.41);
    }

    #[test]
    fn test_cashout_result_omits_winnings_on_failure() {
        let msg = ServerMessage::cashout_result(CashoutOutcome::rejected());
        let json = msg.to_json().unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(!json.contains("winnings"));

        let msg = ServerMessage::cashout_result(CashoutOutcome {
            success: true,
            winnings: Some(17.5),
        });
        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "cashoutResult");
        assert_eq!(value["winnings"], 17.5);
    }

    #[test]
    fn test_cashout_event_wire_shape() {
        let msg = ServerMessage::Cashout {
            player_id: "alice".to_string(),
            multiplier: 2.0,
            winnings: 64.0,
        };

        let value: serde_json::Value = serde_json::from_str(&msg.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "cashout");
        assert_eq!(value["playerId"], "alice");
        assert_eq!(value["multiplier"], 2.0);
        assert_eq!(value["winnings"], 64.0);
    }

    #[test]
    fn test_server_message_json_roundtrip() {
        let msg = ServerMessage::BetPlaced { success: true };
        let parsed = ServerMessage::from_json(&msg.to_json().unwrap()).unwrap();
        assert!(matches!(parsed, ServerMessage::BetPlaced { success: true }));
    }
}
