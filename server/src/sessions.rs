//! Connection tracking for the game server
//!
//! This module handles the server-side bookkeeping for TCP connections:
//! - Session lifecycle (open, close, idle timeout)
//! - Connection capacity limits
//! - Binding a connection to the player that logged in on it
//!
//! Every accepted TCP connection is a session. A session starts anonymous and
//! is bound to a player once that connection logs in. Player accounts
//! themselves live in [`crate::game::Game`] and outlive their sessions, so a
//! player can reconnect later.

use crate::config::SessionTimeouts;
use crate::team::PlayerId;
use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Notify;

pub type SessionId = u32;

/// One open client connection
///
/// Each session records:
/// - Connection metadata (ID, remote address, last activity)
/// - The player bound to it after a successful login
/// - A signal the owning connection task waits on to learn it was evicted
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier assigned by the server
    pub id: SessionId,
    /// Remote address, used for logging
    pub addr: SocketAddr,
    /// Set once a login on this connection succeeds
    pub player: Option<PlayerId>,
    /// Last time a frame arrived on this connection
    pub last_seen: Instant,
    /// Notified when the session is evicted for inactivity
    evicted: Arc<Notify>,
}

impl Session {
    /// Creates an anonymous session, marked as active now
    pub fn new(id: SessionId, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            player: None,
            last_seen: Instant::now(),
            evicted: Arc::new(Notify::new()),
        }
    }

    /// Records activity on this connection
    pub fn touch(&mut self) {
        self.last_seen = Instant::now();
    }

    /// Checks whether the connection has been silent for too long
    ///
    /// Sessions that never logged in are held to the `login` allowance,
    /// logged-in ones to the `idle` allowance.
    pub fn is_timed_out(&self, timeouts: &SessionTimeouts) -> bool {
        let allowance = if self.player.is_some() {
            timeouts.idle
        } else {
            timeouts.login
        };
        self.last_seen.elapsed() > allowance
    }

    /// Handle the connection task waits on for eviction
    pub fn eviction_signal(&self) -> Arc<Notify> {
        Arc::clone(&self.evicted)
    }
}

/// Manages all open connections
///
/// The SessionManager enforces the connection capacity, hands out session ids
/// and frees the slots of connections that stop talking. Connection tasks own
/// their sockets; the manager only tells them to close.
pub struct SessionManager {
    /// Open sessions indexed by their id
    sessions: HashMap<SessionId, Session>,
    /// Next id to hand out
    next_session_id: SessionId,
    /// Maximum number of concurrent connections allowed
    max_sessions: usize,
}

impl SessionManager {
    /// Creates a manager with the given connection capacity
    ///
    /// Session ids start from 1 and are never reused.
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            next_session_id: 1,
            max_sessions,
        }
    }

    /// Registers a new connection
    ///
    /// Returns the session id together with the eviction signal the
    /// connection task should watch. Returns `None` when the server is already
    /// at capacity; the caller is expected to tell the client and drop the
    /// connection.
    pub fn open(&mut self, addr: SocketAddr) -> Option<(SessionId, Arc<Notify>)> {
        if self.sessions.len() >= self.max_sessions {
            return None;
        }

        let id = self.next_session_id;
        self.next_session_id += 1;

        info!("Connection {} opened from {}", id, addr);
        let session = Session::new(id, addr);
        let evicted = session.eviction_signal();
        self.sessions.insert(id, session);
        Some((id, evicted))
    }

    /// Forgets a connection
    ///
    /// Returns true if the session was found and removed, false if it was
    /// already gone (for example after a timeout eviction).
    pub fn close(&mut self, id: SessionId) -> bool {
        match self.sessions.remove(&id) {
            Some(session) => {
                match &session.player {
                    Some(player) => info!(
                        "Connection {} from {} closed (player {})",
                        id, session.addr, player
                    ),
                    None => info!("Connection {} from {} closed", id, session.addr),
                }
                true
            }
            None => false,
        }
    }

    /// Records activity on a connection
    pub fn touch(&mut self, id: SessionId) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.touch();
        }
    }

    /// Associates a logged-in player with a connection
    ///
    /// Returns false if the session is unknown.
    pub fn bind_player(&mut self, id: SessionId, player: PlayerId) -> bool {
        match self.sessions.get_mut(&id) {
            Some(session) => {
                session.player = Some(player);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    /// Number of open connections currently logged in as `player`
    pub fn connections_for(&self, player: &PlayerId) -> usize {
        self.sessions
            .values()
            .filter(|s| s.player.as_ref() == Some(player))
            .count()
    }

    /// Removes sessions that have been silent past their allowance
    ///
    /// Each removed session's connection task is signalled so it closes its
    /// socket. The slot is free for a new connection as soon as this returns.
    /// Returns the evicted ids.
    pub fn timed_out(&mut self, timeouts: &SessionTimeouts) -> Vec<SessionId> {
        let expired: Vec<SessionId> = self
            .sessions
            .values()
            .filter(|session| session.is_timed_out(timeouts))
            .map(|session| session.id)
            .collect();

        for id in &expired {
            if let Some(session) = self.sessions.remove(id) {
                info!(
                    "Connection {} from {} timed out after {:?} idle",
                    id,
                    session.addr,
                    session.last_seen.elapsed()
                );
                session.evicted.notify_one();
            }
        }

        expired
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:51832".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:51833".parse().unwrap()
    }

    fn short_timeouts() -> SessionTimeouts {
        SessionTimeouts {
            login: Duration::from_millis(20),
            idle: Duration::from_secs(60),
        }
    }

    #[test]
    fn test_session_creation() {
        let session = Session::new(7, test_addr());
        assert_eq!(session.id, 7);
        assert_eq!(session.addr, test_addr());
        assert!(session.player.is_none());
    }

    #[test]
    fn test_manager_creation() {
        let manager = SessionManager::new(5);
        assert_eq!(manager.max_sessions, 5);
        assert!(manager.is_empty());
        assert_eq!(manager.len(), 0);
    }

    #[test]
    fn test_open_assigns_increasing_ids() {
        let mut manager = SessionManager::new(3);
        assert_eq!(manager.open(test_addr()).map(|(id, _)| id), Some(1));
        assert_eq!(manager.open(test_addr2()).map(|(id, _)| id), Some(2));
        assert_eq!(manager.len(), 2);
    }

    #[test]
    fn test_open_respects_capacity() {
        let mut manager = SessionManager::new(1);
        let (first, _) = manager.open(test_addr()).unwrap();
        assert!(manager.open(test_addr2()).is_none());
        assert_eq!(manager.len(), 1);

        // A closed slot can be reused, but the id is fresh
        assert!(manager.close(first));
        assert_eq!(manager.open(test_addr2()).map(|(id, _)| id), Some(2));
    }

    #[test]
    fn test_close_unknown_session() {
        let mut manager = SessionManager::new(2);
        assert!(!manager.close(42));
    }

    #[test]
    fn test_bind_player() {
        let mut manager = SessionManager::new(2);
        let (id, _) = manager.open(test_addr()).unwrap();
        let player = PlayerId::from("00000000deadbeef");

        assert!(manager.bind_player(id, player.clone()));
        assert_eq!(manager.get(id).unwrap().player.as_ref(), Some(&player));
        assert_eq!(manager.connections_for(&player), 1);
        assert!(!manager.bind_player(99, player.clone()));

        manager.close(id);
        assert_eq!(manager.connections_for(&player), 0);
    }

    #[test]
    fn test_touch_updates_last_seen() {
        let mut manager = SessionManager::new(1);
        let (id, _) = manager.open(test_addr()).unwrap();
        let before = manager.get(id).unwrap().last_seen;
        std::thread::sleep(Duration::from_millis(5));
        manager.touch(id);
        assert!(manager.get(id).unwrap().last_seen > before);
    }

    #[test]
    fn test_session_timeout() {
        let mut session = Session::new(1, test_addr());
        let timeouts = short_timeouts();
        assert!(!session.is_timed_out(&timeouts));

        std::thread::sleep(Duration::from_millis(40));
        assert!(session.is_timed_out(&timeouts));

        // Logged-in sessions get the longer allowance
        session.player = Some(PlayerId::from("00000000deadbeef"));
        assert!(!session.is_timed_out(&timeouts));
    }

    #[tokio::test]
    async fn test_timed_out_frees_slot_and_signals() {
        let mut manager = SessionManager::new(2);
        let (anonymous, evicted) = manager.open(test_addr()).unwrap();
        let (player, _) = manager.open(test_addr2()).unwrap();
        manager.bind_player(player, PlayerId::from("00000000deadbeef"));

        std::thread::sleep(Duration::from_millis(40));
        let expired = manager.timed_out(&short_timeouts());

        assert_eq!(expired, vec![anonymous]);
        assert!(manager.get(anonymous).is_none());
        assert!(manager.get(player).is_some());
        assert!(!manager.close(anonymous));

        // The permit is stored until the connection task waits for it
        let signalled = tokio::time::timeout(Duration::from_secs(1), evicted.notified()).await;
        assert!(signalled.is_ok());
    }

    #[test]
    fn test_active_sessions_survive_timeout_sweep() {
        let mut manager = SessionManager::new(1);
        let (id, _) = manager.open(test_addr()).unwrap();
        assert!(manager.timed_out(&short_timeouts()).is_empty());
        assert_eq!(manager.len(), 1);
        manager.touch(id);
    }
}
