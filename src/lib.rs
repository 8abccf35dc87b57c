//! # Crash Game Server
//!
//! Authoritative round engine for the crash wagering game.
//! One engine instance owns one live round at a time and keeps every
//! connected subscriber synchronized to it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CRASH SERVER                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Seedable primitives                       │
//! │  └── rng.rs      - Xorshift128+ PRNG + seed derivation       │
//! │                                                              │
//! │  game/           - Round engine (all mutable state)          │
//! │  ├── round.rs    - Phase state machine data                  │
//! │  ├── crash.rs    - Crash-point distribution                  │
//! │  ├── bets.rs     - Per-round bet ledger                      │
//! │  ├── history.rs  - Bounded crash-point history               │
//! │  └── engine.rs   - Phase controller, fan-out, run loop       │
//! │                                                              │
//! │  network/        - Transport shell                           │
//! │  ├── protocol.rs - JSON wire messages                        │
//! │  └── server.rs   - WebSocket accept + connection tasks       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Authority Guarantee
//!
//! All round state lives behind a single engine task. Timer ticks and
//! inbound player actions are serialized through one `select!` loop, so
//! no two mutations ever race on the same round. The transport layer
//! only ever holds a cloneable [`EngineHandle`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use crate::core::rng::SeededRng;
pub use game::bets::{Bet, BetLedger, CashoutOutcome};
pub use game::crash::CrashPointGenerator;
pub use game::engine::{CrashGame, EngineHandle, SubscriberId};
pub use game::round::{GamePhase, RoundState};
pub use network::protocol::{ClientMessage, GameStateSnapshot, ServerMessage};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Waiting-phase countdown length (1-second ticks).
pub const WAITING_COUNTDOWN_SECS: u32 = 25;

/// Flying-phase tick rate (Hz).
pub const FLYING_TICK_RATE: u32 = 10;

/// Multiplier growth per second of flight.
pub const GROWTH_RATE: f64 = 0.1;

/// Pause between crash and the next waiting phase (seconds).
pub const CRASHED_PAUSE_SECS: u64 = 3;

/// Maximum number of past crash points kept in the history log.
pub const HISTORY_LIMIT: usize = 11;
