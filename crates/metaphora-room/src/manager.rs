//! Room manager: creates rooms on demand and routes connections to them.

use std::collections::HashMap;

use metaphora_game::Admission;
use metaphora_protocol::{ConnectionId, JoinRequest, PlayerId, RoomId, RoomSnapshot};
use tracing::{debug, info};

use crate::room::spawn_room;
use crate::{PlayerSender, RoomConfig, RoomError, RoomHandle, RoomInfo};

/// Tracks every live room and which room each connection is in.
///
/// Rooms are named by whoever joins first; there is no explicit create.
/// A connection is in at most one room at a time.
pub struct RoomManager {
    config: RoomConfig,

    /// Active rooms, keyed by room ID.
    rooms: HashMap<RoomId, RoomHandle>,

    /// Maps each connection to the room it last joined.
    connection_rooms: HashMap<ConnectionId, RoomId>,
}

impl RoomManager {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config,
            rooms: HashMap::new(),
            connection_rooms: HashMap::new(),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Joins `conn` to the room named in `request`, creating the room if
    /// it does not exist yet. The first joiner becomes host.
    ///
    /// A connection that was in a different room is first marked offline
    /// there. Returns the room and the joiner's durable player id.
    pub async fn join(
        &mut self,
        conn: ConnectionId,
        request: JoinRequest,
        sender: PlayerSender,
    ) -> Result<(RoomId, PlayerId), RoomError> {
        let admission = Admission::from_request(request)?;
        let room_id = admission.room_id.clone();

        let previous = self.connection_rooms.get(&conn).cloned();
        if let Some(previous) = previous.filter(|r| *r != room_id) {
            self.connection_rooms.remove(&conn);
            self.leave(conn, &previous).await;
        }

        let handle = self.room_for(&admission);
        let player_id = handle.join(conn, admission, sender).await?;
        self.connection_rooms.insert(conn, room_id.clone());
        Ok((room_id, player_id))
    }

    /// The handle of the room `conn` is in.
    ///
    /// Callers clone the handle out so the manager's lock is not held
    /// while the room's mailbox applies backpressure.
    pub fn route(&self, conn: ConnectionId) -> Result<RoomHandle, RoomError> {
        let room_id = self
            .connection_rooms
            .get(&conn)
            .ok_or(RoomError::NotInRoom(conn))?;
        self.rooms
            .get(room_id)
            .cloned()
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }

    /// Forgets `conn` and marks its player offline in its room.
    pub async fn disconnect(&mut self, conn: ConnectionId) {
        if let Some(room_id) = self.connection_rooms.remove(&conn) {
            self.leave(conn, &room_id).await;
        }
    }

    /// Returns the room a connection is currently in, if any.
    pub fn room_of(&self, conn: ConnectionId) -> Option<&RoomId> {
        self.connection_rooms.get(&conn)
    }

    pub async fn room_info(&self, room_id: &RoomId) -> Result<RoomInfo, RoomError> {
        self.handle(room_id)?.info().await
    }

    pub async fn snapshot(
        &self,
        room_id: &RoomId,
        viewer: Option<PlayerId>,
    ) -> Result<RoomSnapshot, RoomError> {
        self.handle(room_id)?.snapshot(viewer).await
    }

    /// Stops idle rooms and forgets them, along with rooms whose actor
    /// has already stopped. Returns the IDs of the rooms removed.
    ///
    /// Waits on every room while borrowing the manager. A manager shared
    /// behind a lock should use [`handles`](Self::handles),
    /// [`close_idle`] and [`evict`](Self::evict) with the lock released
    /// in between.
    pub async fn reap_idle(&mut self) -> Vec<RoomId> {
        let stopped = close_idle(self.handles()).await;
        self.evict(&stopped)
    }

    /// Clones of every room handle.
    pub fn handles(&self) -> Vec<RoomHandle> {
        self.rooms.values().cloned().collect()
    }

    /// Removes the given stopped rooms and their connections.
    ///
    /// A room recreated since its handle was taken is a different actor
    /// and stays.
    pub fn evict(&mut self, stopped: &[RoomHandle]) -> Vec<RoomId> {
        let mut reaped = Vec::new();
        for handle in stopped {
            let room_id = handle.room_id();
            if !self.rooms.get(room_id).is_some_and(|h| h.same_actor(handle)) {
                continue;
            }
            self.rooms.remove(room_id);
            self.connection_rooms.retain(|_, r| r != room_id);
            info!(%room_id, "idle room reaped");
            reaped.push(room_id.clone());
        }
        reaped
    }

    /// Stops every room actor and clears the connection index.
    pub async fn shutdown_all(&mut self) {
        for (room_id, handle) in self.rooms.drain() {
            if handle.shutdown().await.is_err() {
                debug!(%room_id, "room already stopped");
            }
        }
        self.connection_rooms.clear();
        info!("all rooms shut down");
    }

    /// Returns the number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Lists all active room IDs.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.rooms.keys().cloned().collect()
    }

    fn handle(&self, room_id: &RoomId) -> Result<&RoomHandle, RoomError> {
        self.rooms
            .get(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }

    /// The room's handle, spawning a fresh actor if the room is missing
    /// or its actor has stopped.
    fn room_for(&mut self, admission: &Admission) -> RoomHandle {
        if self
            .rooms
            .get(&admission.room_id)
            .is_some_and(RoomHandle::is_closed)
        {
            self.rooms.remove(&admission.room_id);
        }

        let config = &self.config;
        self.rooms
            .entry(admission.room_id.clone())
            .or_insert_with(|| {
                info!(
                    room_id = %admission.room_id,
                    host = %admission.user_id,
                    ruleset = %config.ruleset,
                    "room created"
                );
                spawn_room(admission.room_id.clone(), admission.user_id.clone(), config)
            })
            .clone()
    }

    async fn leave(&self, conn: ConnectionId, room_id: &RoomId) {
        if let Some(handle) = self.rooms.get(room_id) {
            if handle.disconnect(conn).await.is_err() {
                debug!(%room_id, %conn, "room gone before disconnect");
            }
        }
    }
}

/// Asks each room to stop if idle. Returns the handles of rooms that are
/// stopping or were already gone.
pub async fn close_idle(handles: Vec<RoomHandle>) -> Vec<RoomHandle> {
    let mut stopped = Vec::new();
    for handle in handles {
        match handle.close_if_idle().await {
            Ok(true) | Err(_) => stopped.push(handle),
            Ok(false) => {}
        }
    }
    stopped
}
