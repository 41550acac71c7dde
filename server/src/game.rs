//! The authoritative game aggregate
//!
//! Everything a client can change lives here: the team arena, the player
//! registry, deployed ships and shot history. The aggregate is not
//! synchronised itself; the server wraps it in a single mutex and every
//! command and scheduler tick runs against `&mut Game` while holding it.

use crate::board::{Orientation, Ship, ShotResult};
use crate::config::GameConfig;
use crate::error::GameError;
use crate::team::{Player, PlayerId, Team, TeamId};
use log::{debug, info};
use shared::{Coordinate, Target};
use std::collections::HashMap;
use std::time::{Duration, SystemTime};

/// Score given to a player who starts their own team
pub const MUTINY_SCORE: u32 = 10;

/// Result of a successful login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub player_id: PlayerId,
    pub team: TeamId,
    pub team_name: String,
    /// True when an existing player logged back in
    pub existing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutinyOutcome {
    pub old_team: TeamId,
    pub new_team: TeamId,
    /// Deployment points the new team starts with
    pub stolen_points: i64,
}

/// The whole state of one running game
///
/// The game owns:
/// - The team arena, indexed by [`TeamId`]; teams are only ever appended
/// - The player registry, keyed by [`PlayerId`]
/// - The settings it was started with, fixed for its lifetime
///
/// Every operation validates all of its preconditions before changing
/// anything, so a refused command leaves the game exactly as it was.
#[derive(Debug)]
pub struct Game {
    /// False once the game has been shut down
    live: bool,
    /// Settings fixed at startup
    config: GameConfig,
    /// Creation time, reported as uptime at shutdown
    started: SystemTime,
    /// Team arena; a team's index is its [`TeamId`]
    teams: Vec<Team>,
    /// Every player that ever joined
    players: HashMap<PlayerId, Player>,
    /// Next join sequence number, breaks leadership ties
    next_join: u64,
}

impl Game {
    /// Creates a live game with two empty teams, each holding the configured
    /// starting deployment points.
    pub fn new(config: GameConfig) -> Self {
        let mut game = Self {
            live: true,
            config,
            started: SystemTime::now(),
            teams: Vec::new(),
            players: HashMap::new(),
            next_join: 0,
        };

        for _ in 0..2 {
            let id = game.new_team();
            game.teams[id.0].deployment_points = game.config.start_deploy_points;
        }

        game
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn board_size(&self) -> usize {
        self.config.board_size
    }

    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Moves the game to its terminal state. The scheduler stops on its next tick.
    pub fn end(&mut self) {
        self.live = false;
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed().unwrap_or(Duration::ZERO)
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    /// Looks up a team by id. Ids not issued by this game are a validation
    /// error rather than a panic.
    pub fn team(&self, id: TeamId) -> Result<&Team, GameError> {
        self.teams
            .get(id.0)
            .ok_or_else(|| GameError::validation(format!("no team number {}", id.number())))
    }

    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    /// Resolves a one-based team number as typed by a player
    pub fn team_by_number(&self, input: &str) -> Result<TeamId, GameError> {
        let number: usize = input
            .parse()
            .map_err(|_| GameError::validation(format!("team selection '{}' invalid", input)))?;

        if number < 1 || number > self.teams.len() {
            return Err(GameError::validation(format!(
                "team selection {} out of range, run 'teams' to see a list of teams and their team#",
                number
            )));
        }

        Ok(TeamId(number - 1))
    }

    fn check_team(&self, id: TeamId) -> Result<(), GameError> {
        self.team(id).map(|_| ())
    }

    /// Looks up a player by id
    ///
    /// An unknown id is [`GameError::UnknownPlayer`], which the client treats
    /// as fatal for its session.
    pub fn player(&self, id: &PlayerId) -> Result<&Player, GameError> {
        self.players
            .get(id)
            .ok_or_else(|| GameError::UnknownPlayer(id.to_string()))
    }

    pub fn player_by_username(&self, username: &str) -> Option<&Player> {
        self.players.values().find(|p| p.username == username)
    }

    /// Roster of `team` in join order
    pub fn team_players(&self, team: TeamId) -> impl Iterator<Item = &Player> + '_ {
        self.teams
            .get(team.0)
            .into_iter()
            .flat_map(|t| t.players.iter())
            .filter_map(|id| self.players.get(id))
    }

    /// Appends a team with a generated name, no players, ships or points
    pub fn new_team(&mut self) -> TeamId {
        let id = TeamId(self.teams.len());
        let name = self.generated_team_name();
        debug!("Created team {} ({})", name, id.number());
        self.teams.push(Team::new(id, name));
        id
    }

    fn generated_team_name(&self) -> String {
        (self.teams.len() + 1..)
            .map(|n| format!("Team-{}", n))
            .find(|name| self.unique_team_name(name))
            .unwrap_or_default()
    }

    /// Case-sensitive check against every existing team name
    pub fn unique_team_name(&self, name: &str) -> bool {
        !self.teams.iter().any(|team| team.name == name)
    }

    /// Logs a player in by username.
    ///
    /// A known username must present the password it first joined with. A new
    /// username must present the game password when one is configured, and is
    /// placed on the least-populated team (lowest number on ties).
    pub fn join(&mut self, username: &str, password: &str) -> Result<JoinOutcome, GameError> {
        if username.trim().is_empty() {
            return Err(GameError::validation("username cannot be empty"));
        }

        if let Some(player) = self.player_by_username(username) {
            if !player.password_matches(password) {
                return Err(GameError::authentication(format!(
                    "incorrect password for player {}",
                    username
                )));
            }
            return Ok(JoinOutcome {
                player_id: player.id.clone(),
                team: player.team,
                team_name: self.teams[player.team.0].name.clone(),
                existing: true,
            });
        }

        if !self.config.password.is_empty() && self.config.password != password {
            return Err(GameError::authentication("incorrect game password"));
        }
        if self.players.len() >= self.config.max_players {
            return Err(GameError::precondition(format!(
                "game is full ({} players)",
                self.config.max_players
            )));
        }

        let team = self
            .teams
            .iter()
            .min_by_key(|team| team.num_players())
            .map(|team| team.id)
            .ok_or_else(|| GameError::precondition("no teams to join"))?;

        self.next_join += 1;
        let player = Player::new(username, password, team, self.next_join);
        let player_id = player.id.clone();
        self.teams[team.0].players.push(player_id.clone());
        self.players.insert(player_id.clone(), player);

        Ok(JoinOutcome {
            player_id,
            team,
            team_name: self.teams[team.0].name.clone(),
            existing: false,
        })
    }

    /// The player with the strictly highest score, earliest join on ties
    pub fn team_leader(&self, team: TeamId) -> Option<&PlayerId> {
        self.team_players(team)
            .max_by_key(|p| (p.points, std::cmp::Reverse(p.joined)))
            .map(|p| &p.id)
    }

    pub fn is_leader(&self, player: &PlayerId) -> Result<bool, GameError> {
        let team = self.player(player)?.team;
        Ok(self.team_leader(team) == Some(player))
    }

    /// Renames the caller's team. Only the team leader may do this.
    /// Returns the old name.
    pub fn rename_team(&mut self, player: &PlayerId, new_name: &str) -> Result<String, GameError> {
        let team = self.player(player)?.team;
        if !self.is_leader(player)? {
            return Err(GameError::precondition(
                "you must be team leader to do this (player on your team with the most points)",
            ));
        }
        self.validate_new_team_name(new_name)?;

        let old = std::mem::replace(&mut self.teams[team.0].name, new_name.to_string());
        info!("Team {} renamed to {}", old, new_name);
        Ok(old)
    }

    fn validate_new_team_name(&self, name: &str) -> Result<(), GameError> {
        if name.trim().is_empty() {
            return Err(GameError::validation("team name cannot be empty"));
        }
        if !self.unique_team_name(name) {
            return Err(GameError::validation(format!("team name {} already taken", name)));
        }
        Ok(())
    }

    /// Splits the caller off into a new team named `new_name`.
    ///
    /// The old team's deployment points are halved (floor) and the new team
    /// receives the same half. The caller's score is reset to
    /// [`MUTINY_SCORE`]. The team leader cannot mutiny.
    pub fn mutiny(
        &mut self,
        player: &PlayerId,
        new_name: &str,
    ) -> Result<MutinyOutcome, GameError> {
        let old_team = self.player(player)?.team;
        if self.is_leader(player)? {
            return Err(GameError::precondition(
                "the team leader cannot mutiny, use 'rename' instead",
            ));
        }
        self.validate_new_team_name(new_name)?;

        let new_team = self.new_team();
        self.teams[new_team.0].name = new_name.to_string();

        let half = self.teams[old_team.0].deployment_points / 2;
        self.teams[old_team.0].deployment_points = half;
        self.teams[new_team.0].deployment_points = half;

        self.switch_team(player, new_team)?;
        if let Some(p) = self.players.get_mut(player) {
            p.points = MUTINY_SCORE;
        }

        Ok(MutinyOutcome {
            old_team,
            new_team,
            stolen_points: half,
        })
    }

    /// Moves a player between rosters. Callers hold the game lock, so the
    /// move is never observed half done.
    fn switch_team(&mut self, player: &PlayerId, to: TeamId) -> Result<(), GameError> {
        let p = self
            .players
            .get_mut(player)
            .ok_or_else(|| GameError::UnknownPlayer(player.to_string()))?;
        let from = std::mem::replace(&mut p.team, to);

        self.teams[from.0].remove_player(player);
        self.teams[to.0].players.push(player.clone());
        Ok(())
    }

    /// Places a ship for `team`, debiting `size` deployment points.
    ///
    /// Nothing changes unless every check passes. Returns the remaining balance.
    pub fn deploy_ship(
        &mut self,
        team: TeamId,
        size: usize,
        orientation: Orientation,
        anchor: Coordinate,
    ) -> Result<i64, GameError> {
        self.check_team(team)?;
        if size < 1 || size > self.config.ship_limit {
            return Err(GameError::validation(format!(
                "ship size must be between 1 and {}",
                self.config.ship_limit
            )));
        }

        let ship = Ship::new(size, orientation, anchor, self.config.board_size)?;
        let team = &mut self.teams[team.0];

        if let Some(existing) = team.ships.iter().find(|s| s.overlaps(&ship)) {
            return Err(GameError::validation(format!(
                "ship would overlap your ship at {}",
                Target::from(existing.anchor())
            )));
        }

        let cost = size as i64;
        if team.deployment_points < cost {
            return Err(GameError::precondition(format!(
                "not enough deployment points ({} needed, {} available)",
                cost, team.deployment_points
            )));
        }

        team.deployment_points -= cost;
        team.ships.push(ship);
        Ok(team.deployment_points)
    }

    /// Fires `player`'s shot at `coord` on `target`'s board.
    ///
    /// The firing team must have deployed at least one ship and may not
    /// target itself. Hits and sinks add one point and extend the hit streak;
    /// a miss resets the streak; a repeat hit changes nothing.
    pub fn fire_shot(
        &mut self,
        player: &PlayerId,
        target: TeamId,
        coord: Coordinate,
    ) -> Result<ShotResult, GameError> {
        let firing_team = self.player(player)?.team;
        self.check_team(target)?;

        if self.teams[firing_team.0].ships.is_empty() {
            return Err(GameError::precondition(
                "you must have ships deployed to fire shots",
            ));
        }
        if firing_team == target {
            return Err(GameError::validation("you cannot target your own team"));
        }
        if !coord.in_bounds(self.config.board_size) {
            return Err(GameError::validation(format!(
                "{} is outside the {}x{} board",
                Target::from(coord),
                self.config.board_size,
                self.config.board_size
            )));
        }

        let team = &mut self.teams[target.0];
        team.record_shot(firing_team, coord);
        let result = team
            .ships
            .iter_mut()
            .find_map(|ship| ship.receive_shot(coord))
            .unwrap_or(ShotResult::Miss);

        if let Some(p) = self.players.get_mut(player) {
            match result {
                ShotResult::Hit | ShotResult::Sink => {
                    p.hit_streak += 1;
                    p.points += 1;
                }
                ShotResult::Miss => p.hit_streak = 0,
                ShotResult::RepeatHit => {}
            }
        }

        Ok(result)
    }

    /// One scheduler tick: every team gains a deployment point
    pub fn grant_deployment_points(&mut self) {
        for team in &mut self.teams {
            team.deployment_points += 1;
        }
    }

    /// Team names with their player counts, for the server log
    pub fn team_counts(&self) -> Vec<(String, usize)> {
        self.teams
            .iter()
            .map(|team| (team.name.clone(), team.num_players()))
            .collect()
    }
}
