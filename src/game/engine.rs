//! Round Engine
//!
//! The single authority over the live round. All mutable state
//! (round, ledger, history, subscriber set) lives inside one
//! [`CrashGame`] owned by one spawned task, and every mutation (timer
//! tick or inbound player action) is serialized through that task's
//! `select!` loop. The transport layer talks to it through a cloneable
//! [`EngineHandle`].
//!
//! Timer discipline: exactly one interval is armed at a time, re-armed
//! on every phase transition. Dropping the previous interval before
//! arming the next one is what guarantees a stale tick can never
//! mutate state across a transition.

use std::collections::BTreeMap;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, Duration, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};
use uuid::Uuid;

use crate::game::bets::{BetLedger, CashoutOutcome};
use crate::game::crash::CrashPointGenerator;
use crate::game::history::RoundHistory;
use crate::game::round::{GamePhase, RoundState};
use crate::network::protocol::{GameStateSnapshot, ServerMessage};
use crate::{CRASHED_PAUSE_SECS, FLYING_TICK_RATE, GROWTH_RATE};

/// Opaque identifier for a connected subscriber.
pub type SubscriberId = Uuid;

/// The round engine state machine.
///
/// Owns the live round, the bet ledger, the crash-point generator, the
/// history log, and the subscriber fan-out list. Methods mutate
/// synchronously; the async run loop is the only caller in production.
pub struct CrashGame {
    round: RoundState,
    bets: BetLedger,
    history: RoundHistory,
    generator: CrashPointGenerator,
    subscribers: BTreeMap<SubscriberId, mpsc::Sender<ServerMessage>>,
    flying_since: Option<Instant>,
}

impl CrashGame {
    /// New engine in the waiting phase, with the first round's crash
    /// point already drawn from `seed`.
    pub fn new(seed: u64) -> Self {
        let mut generator = CrashPointGenerator::new(seed);
        let round = RoundState::waiting(generator.next_crash_point());

        Self {
            round,
            bets: BetLedger::new(),
            history: RoundHistory::new(),
            generator,
            subscribers: BTreeMap::new(),
            flying_since: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> GamePhase {
        self.round.phase
    }

    /// Number of registered subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Publicly visible snapshot of the live round.
    pub fn snapshot(&self) -> GameStateSnapshot {
        GameStateSnapshot {
            phase: self.round.phase,
            multiplier: self.round.display_multiplier(),
            crash_point: self.round.crash_point,
            time_remaining: self.round.time_remaining,
            history: self.history.to_vec(),
        }
    }

    // =========================================================================
    // Player actions
    // =========================================================================

    /// Stake a bet on the upcoming round.
    ///
    /// Rejected outside the waiting phase. A second bet from the same
    /// player replaces the first. Amounts are accepted as-is.
    pub fn place_bet(&mut self, player_id: &str, amount: f64, auto_cashout: Option<f64>) -> bool {
        if self.round.phase != GamePhase::Waiting {
            return false;
        }

        self.bets.place(player_id, amount, auto_cashout);
        debug!(player_id, amount, ?auto_cashout, "bet placed");
        true
    }

    /// Cash out a player's bet at the current multiplier.
    ///
    /// Rejected outside the flying phase, for unknown players, and for
    /// bets already cashed out. On success the winnings are computed
    /// from the unrounded multiplier and a cash-out event is broadcast
    /// to every subscriber. Auto-cashout drives this same path.
    pub fn cash_out(&mut self, player_id: &str) -> CashoutOutcome {
        if self.round.phase != GamePhase::Flying {
            return CashoutOutcome::rejected();
        }

        let multiplier = self.round.multiplier;
        let winnings = match self.bets.cash_out(player_id, multiplier) {
            Some(w) => w,
            None => return CashoutOutcome::rejected(),
        };

        debug!(player_id, multiplier, winnings, "cash-out");
        self.broadcast(ServerMessage::Cashout {
            player_id: player_id.to_string(),
            multiplier,
            winnings,
        });

        CashoutOutcome {
            success: true,
            winnings: Some(winnings),
        }
    }

    // =========================================================================
    // Subscriber management
    // =========================================================================

    /// Register a subscriber and immediately send it a full snapshot,
    /// so late joiners sync to the in-progress round.
    pub fn add_subscriber(&mut self, id: SubscriberId, sender: mpsc::Sender<ServerMessage>) {
        let snapshot = ServerMessage::GameState {
            state: self.snapshot(),
        };
        if sender.try_send(snapshot).is_err() {
            debug!(%id, "subscriber unreachable before first snapshot");
        }
        self.subscribers.insert(id, sender);
    }

    /// Deregister a subscriber. No other side effects.
    pub fn remove_subscriber(&mut self, id: &SubscriberId) {
        self.subscribers.remove(id);
    }

    fn broadcast_state(&self) {
        self.broadcast(ServerMessage::GameState {
            state: self.snapshot(),
        });
    }

    fn broadcast(&self, message: ServerMessage) {
        for (id, sender) in &self.subscribers {
            // A full or closed connection never aborts the fan-out.
            if sender.try_send(message.clone()).is_err() {
                debug!(%id, "skipping unreachable subscriber");
            }
        }
    }

    // =========================================================================
    // Phase controller
    // =========================================================================

    /// Advance the round by one timer tick.
    ///
    /// Returns the phase in force after the tick so the run loop can
    /// re-arm its interval when a transition occurred.
    pub fn on_tick(&mut self, now: Instant) -> GamePhase {
        match self.round.phase {
            GamePhase::Waiting => self.on_waiting_tick(now),
            GamePhase::Flying => self.on_flying_tick(now),
            // Crashed has a single tick: the pause elapsed.
            GamePhase::Crashed => self.begin_waiting(),
        }
        self.round.phase
    }

    fn on_waiting_tick(&mut self, now: Instant) {
        self.round.time_remaining = self.round.time_remaining.saturating_sub(1);

        if self.round.time_remaining == 0 {
            self.begin_flying(now);
        } else {
            self.broadcast_state();
        }
    }

    fn on_flying_tick(&mut self, now: Instant) {
        let since = match self.flying_since {
            Some(t) => t,
            None => return,
        };

        let elapsed = now.saturating_duration_since(since).as_secs_f64();
        let climbed = 1.0 + elapsed * GROWTH_RATE;
        self.round.multiplier = climbed.min(self.round.crash_point);

        if self.round.multiplier >= self.round.crash_point {
            self.begin_crashed();
            return;
        }

        // Thresholds resolve in sorted player order, before this
        // tick's broadcast, through the same path as a manual cash-out.
        for player_id in self.bets.auto_cashouts_due(self.round.multiplier) {
            self.cash_out(&player_id);
        }

        self.broadcast_state();
    }

    fn begin_waiting(&mut self) {
        self.round = RoundState::waiting(self.generator.next_crash_point());
        self.flying_since = None;
        self.bets.clear();
        debug!(crash_point = self.round.crash_point, "round reset to waiting");
        self.broadcast_state();
    }

    fn begin_flying(&mut self, now: Instant) {
        self.round.phase = GamePhase::Flying;
        self.round.multiplier = 1.0;
        self.flying_since = Some(now);
        info!(crash_point = self.round.crash_point, bets = self.bets.len(), "round lifted off");
        self.broadcast_state();
    }

    fn begin_crashed(&mut self) {
        self.round.phase = GamePhase::Crashed;
        self.round.multiplier = self.round.crash_point;
        self.history.record(self.round.crash_point);
        info!(crash_point = self.round.crash_point, "round crashed");
        self.broadcast_state();
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Subscribe { id, sender } => self.add_subscriber(id, sender),
            Command::Unsubscribe { id } => self.remove_subscriber(&id),
            Command::PlaceBet {
                player_id,
                amount,
                auto_cashout,
                reply,
            } => {
                let accepted = self.place_bet(&player_id, amount, auto_cashout);
                let _ = reply.send(accepted);
            }
            Command::Cashout { player_id, reply } => {
                let outcome = self.cash_out(&player_id);
                let _ = reply.send(outcome);
            }
            // Intercepted by the run loop.
            Command::Shutdown => {}
        }
    }

    fn teardown(&mut self) {
        self.subscribers.clear();
        self.bets.clear();
    }
}

// =============================================================================
// COMMANDS & HANDLE
// =============================================================================

/// One mutation per message; replies travel back on oneshot channels.
enum Command {
    Subscribe {
        id: SubscriberId,
        sender: mpsc::Sender<ServerMessage>,
    },
    Unsubscribe {
        id: SubscriberId,
    },
    PlaceBet {
        player_id: String,
        amount: f64,
        auto_cashout: Option<f64>,
        reply: oneshot::Sender<bool>,
    },
    Cashout {
        player_id: String,
        reply: oneshot::Sender<CashoutOutcome>,
    },
    Shutdown,
}

/// Engine errors surfaced to the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine task has stopped.
    #[error("engine is not running")]
    Closed,
}

/// Cloneable handle to a running engine task.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<Command>,
}

impl EngineHandle {
    /// Register a new subscriber; it receives a snapshot immediately.
    pub async fn subscribe(
        &self,
        sender: mpsc::Sender<ServerMessage>,
    ) -> Result<SubscriberId, EngineError> {
        let id = Uuid::new_v4();
        self.tx
            .send(Command::Subscribe { id, sender })
            .await
            .map_err(|_| EngineError::Closed)?;
        Ok(id)
    }

    /// Deregister a subscriber.
    pub async fn unsubscribe(&self, id: SubscriberId) -> Result<(), EngineError> {
        self.tx
            .send(Command::Unsubscribe { id })
            .await
            .map_err(|_| EngineError::Closed)
    }

    /// Stake a bet; resolves to the engine's accept/reject decision.
    pub async fn place_bet(
        &self,
        player_id: &str,
        amount: f64,
        auto_cashout: Option<f64>,
    ) -> Result<bool, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::PlaceBet {
                player_id: player_id.to_string(),
                amount,
                auto_cashout,
                reply,
            })
            .await
            .map_err(|_| EngineError::Closed)?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Attempt a cash-out at whatever the phase is when the engine
    /// processes it; phase order, not message order, decides a race
    /// against the crash transition.
    pub async fn cash_out(&self, player_id: &str) -> Result<CashoutOutcome, EngineError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Command::Cashout {
                player_id: player_id.to_string(),
                reply,
            })
            .await
            .map_err(|_| EngineError::Closed)?;
        rx.await.map_err(|_| EngineError::Closed)
    }

    /// Stop the engine: the pending phase timer is cancelled and the
    /// subscriber set cleared. An in-flight round is abandoned.
    pub async fn shutdown(&self) {
        let _ = self.tx.send(Command::Shutdown).await;
    }
}

/// Spawn the engine task.
///
/// Returns the handle the transport layer clones, plus the join handle
/// for shutdown sequencing.
pub fn spawn_engine(seed: u64) -> (EngineHandle, tokio::task::JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(256);
    let game = CrashGame::new(seed);
    let task = tokio::spawn(run(game, rx));
    (EngineHandle { tx }, task)
}

async fn run(mut game: CrashGame, mut rx: mpsc::Receiver<Command>) {
    info!(phase = %game.phase(), "round engine started");
    let mut ticker = phase_ticker(game.phase());

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Shutdown) | None => break,
                Some(command) => game.apply(command),
            },
            _ = ticker.tick() => {
                let before = game.phase();
                let after = game.on_tick(Instant::now());
                if before != after {
                    ticker = phase_ticker(after);
                }
            }
        }
    }

    game.teardown();
    info!("round engine stopped");
}

fn phase_ticker(phase: GamePhase) -> Interval {
    let period = match phase {
        GamePhase::Waiting => Duration::from_secs(1),
        GamePhase::Flying => Duration::from_millis(1_000 / FLYING_TICK_RATE as u64),
        GamePhase::Crashed => Duration::from_secs(CRASHED_PAUSE_SECS),
    };

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}

// =============================================================================
// TESTS
// =============================================================================
