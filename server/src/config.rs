use crate::error::ServerError;
use shared::DEFAULT_PORT;
use std::time::Duration;

/// How often every team is granted one deployment point
pub const DEPLOYMENT_INTERVAL: Duration = Duration::from_secs(5);

/// How long a connection may stay silent before it is closed
///
/// A connection that has not logged in gets the short `login` allowance, so
/// stray sockets cannot hold connection slots. Logged-in players sit at a
/// prompt between commands and get the much longer `idle` allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTimeouts {
    /// Silence allowed before a successful login
    pub login: Duration,
    /// Silence allowed once logged in
    pub idle: Duration,
}

impl Default for SessionTimeouts {
    fn default() -> Self {
        Self {
            login: Duration::from_secs(30),
            idle: Duration::from_secs(30 * 60),
        }
    }
}

impl SessionTimeouts {
    /// How often the server sweeps for expired sessions: half the shorter
    /// timeout, at most once a second.
    pub fn check_interval(&self) -> Duration {
        let shortest = self.login.min(self.idle).min(Duration::from_secs(2));
        (shortest / 2).max(Duration::from_millis(10))
    }
}

/// Largest board side length. Keeps a rendered map inside one frame.
pub const MAX_BOARD_SIZE: usize = 255;
pub const MAX_PLAYERS: usize = 255;

/// Settings fixed for the lifetime of one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    pub port: u16,
    /// Join password; empty means anyone may join
    pub password: String,
    /// Required by `shutdown`; empty disables the command
    pub admin_password: String,
    pub max_players: usize,
    /// Largest ship size that may be deployed
    pub ship_limit: usize,
    /// Side length of every team's square board
    pub board_size: usize,
    /// Deployment points each starting team begins with
    pub start_deploy_points: i64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            password: String::new(),
            admin_password: String::new(),
            max_players: 32,
            ship_limit: 16,
            board_size: 16,
            start_deploy_points: 10,
        }
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.board_size == 0 {
            return Err(ServerError::Config("board size must be at least 1".into()));
        }
        if self.board_size > MAX_BOARD_SIZE {
            return Err(ServerError::Config(format!(
                "board size {} exceeds the maximum of {}",
                self.board_size, MAX_BOARD_SIZE
            )));
        }
        if self.ship_limit == 0 {
            return Err(ServerError::Config("ship limit must be at least 1".into()));
        }
        if self.ship_limit > self.board_size {
            return Err(ServerError::Config(format!(
                "ship limit {} does not fit on a {}x{} board",
                self.ship_limit, self.board_size, self.board_size
            )));
        }
        if self.max_players == 0 {
            return Err(ServerError::Config("max players must be at least 1".into()));
        }
        if self.max_players > MAX_PLAYERS {
            return Err(ServerError::Config(format!(
                "max players {} exceeds the maximum of {}",
                self.max_players, MAX_PLAYERS
            )));
        }
        if self.start_deploy_points < 0 {
            return Err(ServerError::Config(
                "starting deployment points cannot be negative".into(),
            ));
        }
        Ok(())
    }
}
