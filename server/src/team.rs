//! Teams, players and the identifiers that link them
//!
//! Teams are stored in an arena owned by [`crate::game::Game`] and addressed by
//! [`TeamId`]. Players hold the id of their team rather than a reference, and a
//! team's roster holds player ids, so there is no ownership cycle between the two.

use crate::board::Ship;
use rand::Rng;
use shared::Coordinate;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

/// Index of a team in the game's team arena. Stable for the game's lifetime
/// since teams are never removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamId(pub usize);

impl TeamId {
    /// One-based number shown to players by `teams` and accepted by `radar`,
    /// `players` and `target`
    pub fn number(&self) -> usize {
        self.0 + 1
    }
}

/// Opaque player identifier handed out at join
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(String);

impl PlayerId {
    /// 16 random lowercase hex characters
    pub fn generate() -> Self {
        let value: u64 = rand::thread_rng().gen();
        PlayerId(format!("{:016x}", value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        PlayerId(id.to_string())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A registered player
///
/// Players are created by their first login and never removed, so a player
/// can disconnect and log back in with the same username and password.
#[derive(Debug, Clone)]
pub struct Player {
    /// Identifier the client sends with every command
    pub id: PlayerId,
    /// Name chosen at first login, unique across the game
    pub username: String,
    /// Password given at first login, required to log back in
    pub(crate) password: String,
    /// Score, raised by hits and sinks. Decides team leadership.
    pub points: u32,
    /// Consecutive successful hits, reset on a miss
    pub hit_streak: u32,
    /// Team the player currently belongs to
    pub team: TeamId,
    /// Global join order, used to break leadership ties
    pub joined: u64,
}

impl Player {
    pub fn new(username: &str, password: &str, team: TeamId, joined: u64) -> Self {
        Self {
            id: PlayerId::generate(),
            username: username.to_string(),
            password: password.to_string(),
            points: 0,
            hit_streak: 0,
            team,
            joined,
        }
    }

    pub fn password_matches(&self, password: &str) -> bool {
        self.password == password
    }
}

/// A team and everything on its board
///
/// Each team has its own square board holding only its own ships. Besides
/// its roster and fleet, a team tracks:
/// - Its deployment point balance, spent on ships and refilled over time
/// - Every cell other teams have fired at, so radar can show only what the
///   firing team has learned
#[derive(Debug, Clone)]
pub struct Team {
    /// Position in the game's team arena
    pub id: TeamId,
    /// Display name, unique across the game
    pub name: String,
    /// Player ids in the order they joined this team
    pub players: Vec<PlayerId>,
    /// Deployed ships, in deployment order
    pub ships: Vec<Ship>,
    /// Balance spent on deployments; a deploy that would overdraw it fails
    pub deployment_points: i64,
    /// Cells fired at on this team's board, keyed by the team that fired
    pub(crate) incoming: HashMap<TeamId, BTreeSet<Coordinate>>,
}

impl Team {
    /// Creates a team with no players, no ships and no deployment points
    pub fn new(id: TeamId, name: String) -> Self {
        Self {
            id,
            name,
            players: Vec::new(),
            ships: Vec::new(),
            deployment_points: 0,
            incoming: HashMap::new(),
        }
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    /// Index of the ship occupying `coord`, if any
    pub fn ship_at(&self, coord: Coordinate) -> Option<usize> {
        self.ships.iter().position(|ship| ship.occupies(coord))
    }

    /// Remembers that `from` fired at `coord` on this team's board
    pub fn record_shot(&mut self, from: TeamId, coord: Coordinate) {
        self.incoming.entry(from).or_default().insert(coord);
    }

    /// Whether `from` has fired at `coord` on this team's board
    pub fn was_fired_upon(&self, from: TeamId, coord: Coordinate) -> bool {
        self.incoming
            .get(&from)
            .map_or(false, |cells| cells.contains(&coord))
    }

    pub(crate) fn remove_player(&mut self, player: &PlayerId) {
        self.players.retain(|id| id != player);
    }
}
