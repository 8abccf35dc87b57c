//! Network Layer
//!
//! WebSocket transport shell around the round engine. Connection
//! handling and framing live here; every game decision is made by the
//! engine task behind its handle.

pub mod protocol;
pub mod server;

pub use protocol::{ClientMessage, GameStateSnapshot, ServerMessage};
pub use server::{GameServer, GameServerError, ServerConfig};
