//! Room actor: an isolated Tokio task that owns one game room.
//!
//! The actor waits on two things at once: its command mailbox and its
//! phase deadline. Whatever arrives first runs to completion, then the
//! deadline is re-synced with whatever the room now expects.

use std::collections::HashMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use metaphora_game::rules::for_kind;
use metaphora_game::{Admission, GameRoom, Outbound, TimerToken};
use metaphora_protocol::{
    ClientAction, ConnectionId, ErrorEvent, Phase, PlayerId, Recipient, RoomId, RoomSnapshot,
    RulesetKind, ServerEvent,
};
use metaphora_timer::DeadlineTimer;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info};

use crate::{RoomConfig, RoomError};

/// Channel for delivering events to one connection's writer task.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room actor through its mailbox.
pub(crate) enum RoomCommand {
    /// Admit or reconnect a player on `conn`.
    Join {
        conn: ConnectionId,
        admission: Admission,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<PlayerId, RoomError>>,
    },

    /// Apply a client action. Rejections are reported to `conn` directly.
    Action {
        conn: ConnectionId,
        action: ClientAction,
    },

    /// The connection closed or moved to another room.
    Disconnect { conn: ConnectionId },

    Snapshot {
        viewer: Option<PlayerId>,
        reply: oneshot::Sender<RoomSnapshot>,
    },

    Info { reply: oneshot::Sender<RoomInfo> },

    /// Stop if idle. The reply says whether the actor is stopping.
    CloseIfIdle { reply: oneshot::Sender<bool> },

    Shutdown,
}

/// Room metadata (not the game state itself).
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub ruleset: RulesetKind,
    pub phase: Phase,
    /// Players and spectators, online or not.
    pub player_count: usize,
    pub online_count: usize,
    /// Nobody online and quiet for at least the idle TTL.
    pub idle: bool,
}

/// Handle to a running room actor.
///
/// Cheap to clone; the [`RoomManager`](crate::RoomManager) holds one per
/// room and connection handlers borrow clones of it.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    /// `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Joins `conn` to the room and waits for the outcome.
    pub async fn join(
        &self,
        conn: ConnectionId,
        admission: Admission,
        sender: PlayerSender,
    ) -> Result<PlayerId, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Join {
            conn,
            admission,
            sender,
            reply: reply_tx,
        })
        .await?;
        reply_rx.await.map_err(|_| self.unavailable())?
    }

    /// Sends a client action to the room (fire-and-forget).
    pub async fn send_action(&self, conn: ConnectionId, action: ClientAction) -> Result<(), RoomError> {
        self.send(RoomCommand::Action { conn, action }).await
    }

    /// Marks whoever is on `conn` offline.
    pub async fn disconnect(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.send(RoomCommand::Disconnect { conn }).await
    }

    /// The public room state as `viewer` would see it.
    pub async fn snapshot(&self, viewer: Option<PlayerId>) -> Result<RoomSnapshot, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Snapshot { viewer, reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::Info { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Stops the room if nobody has been online for the idle TTL.
    ///
    /// The check and the stop happen inside the actor, so a join queued
    /// ahead of this command keeps the room alive.
    pub async fn close_if_idle(&self) -> Result<bool, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(RoomCommand::CloseIfIdle { reply: reply_tx }).await?;
        reply_rx.await.map_err(|_| self.unavailable())
    }

    /// Tells the room to shut down. Its timer is dropped with it.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.send(RoomCommand::Shutdown).await
    }

    async fn send(&self, cmd: RoomCommand) -> Result<(), RoomError> {
        self.sender.send(cmd).await.map_err(|_| self.unavailable())
    }

    /// `true` if both handles talk to the same actor.
    pub(crate) fn same_actor(&self, other: &RoomHandle) -> bool {
        self.sender.same_channel(&other.sender)
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.room_id.clone())
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: GameRoom,
    idle_ttl: Duration,
    /// Per-connection outbound channels, only for connections the room
    /// currently maps to a player.
    senders: HashMap<ConnectionId, PlayerSender>,
    timer: DeadlineTimer<TimerToken>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop until shutdown or until every handle is gone.
    async fn run(mut self) {
        info!(room_id = %self.room.id(), ruleset = %self.room.ruleset(), "room actor started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle(cmd) {
                        break;
                    }
                }
                token = self.timer.wait() => {
                    let out = self.room.on_timer(token, now_ms());
                    self.dispatch(out);
                }
            }
            self.sync_timer();
        }

        info!(room_id = %self.room.id(), "room actor stopped");
    }

    /// Returns `false` when the actor should stop.
    fn handle(&mut self, cmd: RoomCommand) -> bool {
        match cmd {
            RoomCommand::Join {
                conn,
                admission,
                sender,
                reply,
            } => {
                let result = self.handle_join(conn, &admission, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Action { conn, action } => self.handle_action(conn, action),
            RoomCommand::Disconnect { conn } => {
                self.senders.remove(&conn);
                let out = self.room.disconnect(conn, now_ms());
                self.dispatch(out);
            }
            RoomCommand::Snapshot { viewer, reply } => {
                let _ = reply.send(self.room.snapshot(viewer.as_ref()));
            }
            RoomCommand::Info { reply } => {
                let _ = reply.send(self.info());
            }
            RoomCommand::CloseIfIdle { reply } => {
                let idle = self.info().idle;
                let _ = reply.send(idle);
                if idle {
                    info!(room_id = %self.room.id(), "idle room closing");
                    return false;
                }
            }
            RoomCommand::Shutdown => {
                info!(room_id = %self.room.id(), "room shutting down");
                return false;
            }
        }
        true
    }

    fn handle_join(
        &mut self,
        conn: ConnectionId,
        admission: &Admission,
        sender: PlayerSender,
    ) -> Result<PlayerId, RoomError> {
        let out = self.room.join(conn, admission, now_ms())?;
        self.senders.insert(conn, sender);
        // A reconnect on a new connection retires the old one.
        let room = &self.room;
        self.senders.retain(|c, _| room.player_for(*c).is_some());
        self.dispatch(out);
        Ok(admission.user_id.clone())
    }

    fn handle_action(&mut self, conn: ConnectionId, action: ClientAction) {
        let result = self.room.apply(conn, action, now_ms());
        match result {
            Ok(out) => self.dispatch(out),
            Err(err) => match err.code() {
                Some(code) => {
                    debug!(room_id = %self.room.id(), %conn, ?code, reason = %err, "action rejected");
                    self.send_to(
                        conn,
                        ServerEvent::Error(ErrorEvent {
                            code,
                            message: err.to_string(),
                        }),
                    );
                }
                None => {
                    debug!(room_id = %self.room.id(), %conn, reason = %err, "action ignored");
                }
            },
        }
    }

    /// Arms, re-arms, or cancels the deadline to match the room.
    fn sync_timer(&mut self) {
        let desired = self
            .room
            .timer()
            .map(|t| (t.token, Duration::from_millis(t.duration_ms)));
        self.timer.sync(desired);
    }

    /// Delivers events, resolving players to their current connection.
    fn dispatch(&self, out: Outbound) {
        for (recipient, event) in out {
            match recipient {
                Recipient::Room => {
                    for sender in self.senders.values() {
                        let _ = sender.send(event.clone());
                    }
                }
                Recipient::Player(player_id) => {
                    let conn = self
                        .room
                        .player(&player_id)
                        .filter(|p| p.is_online())
                        .map(|p| p.connection);
                    if let Some(conn) = conn {
                        self.send_to(conn, event);
                    }
                }
                Recipient::Connection(conn) => self.send_to(conn, event),
            }
        }
    }

    /// Drops the event if the connection's writer is gone.
    fn send_to(&self, conn: ConnectionId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&conn) {
            let _ = sender.send(event);
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room.id().clone(),
            ruleset: self.room.ruleset(),
            phase: self.room.phase(),
            player_count: self.room.players().len(),
            online_count: self.room.online_count(),
            idle: self.room.is_idle(now_ms(), self.idle_ttl.as_millis() as u64),
        }
    }
}

/// Wall-clock Unix milliseconds, as the game state machine expects.
pub(crate) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

/// Spawns a new room actor with `host` as its host and returns a handle.
pub(crate) fn spawn_room(room_id: RoomId, host: PlayerId, config: &RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size);
    let rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let actor = RoomActor {
        room: GameRoom::new(
            room_id.clone(),
            host,
            for_kind(config.ruleset),
            config.deck_policy,
            rng,
            now_ms(),
        ),
        idle_ttl: config.idle_room_ttl,
        senders: HashMap::new(),
        timer: DeadlineTimer::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
