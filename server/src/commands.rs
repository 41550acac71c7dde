//! Command dispatch: the single path through which clients read or change the game
//!
//! Every command is a plain function taking the game, the calling player's id
//! and the whitespace-split command line (`fields[0]` is the command name).
//! The [`Dispatcher`] maps names to those functions and resolves the caller
//! before running anything, so an unknown player id never reaches a handler.

use crate::board::{Orientation, ShotResult};
use crate::error::GameError;
use crate::game::{Game, JoinOutcome, MUTINY_SCORE};
use crate::render;
use crate::team::{PlayerId, TeamId};
use log::{debug, info};
use shared::Target;
use std::collections::HashMap;

/// Signature shared by every command handler
pub type Handler = fn(&mut Game, &PlayerId, &[String]) -> Result<String, GameError>;

const HELP: &str = "\
Commands:
  map                               show your team's board
  radar <team#>                     show what your team has found on another team's board
  teams                             list teams (* marks your own)
  players [team#]                   list players, optionally for one team
  target <team#> <cell>             fire at a cell, e.g. target 2 G7
  deploy <cell> <size> <H|V>        place a ship, costs <size> deployment points
  points                            show your team's deployment points
  rename <name>                     rename your team (team leader only)
  mutiny <name>                     leave your team and start your own
  chat-help                         how to chat
  echo-test                         check the connection
  shutdown <admin password>         stop the server
  quit                              leave the game";

/// Maps command names to handlers
pub struct Dispatcher {
    handlers: HashMap<&'static str, Handler>,
}

impl Dispatcher {
    pub fn new() -> Self {
        let mut handlers: HashMap<&'static str, Handler> = HashMap::new();
        handlers.insert("echo-test", echo_test);
        handlers.insert("echo", echo_test);
        handlers.insert("help", help);
        handlers.insert("map", map);
        handlers.insert("radar", radar);
        handlers.insert("teams", teams);
        handlers.insert("players", players);
        handlers.insert("target", target);
        handlers.insert("deploy", deploy);
        handlers.insert("points", points);
        handlers.insert("chat-help", chat_help);
        handlers.insert("rename", rename);
        handlers.insert("mutiny", mutiny);
        handlers.insert("shutdown", shutdown);

        Self { handlers }
    }

    /// Registered command names, sorted
    pub fn command_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Handles a login request
    pub fn join(
        &self,
        game: &mut Game,
        username: &str,
        password: &str,
    ) -> Result<JoinOutcome, GameError> {
        let outcome = game.join(username, password)?;

        if outcome.existing {
            info!("Existing player reconnected: {}", username);
        } else {
            info!("New player connected: {}", username);
        }
        info!(
            "Player {} ({}) assigned to team {}",
            username, outcome.player_id, outcome.team_name
        );
        log_team_counts(game);

        Ok(outcome)
    }

    /// Runs one command on behalf of `player`
    pub fn dispatch(
        &self,
        game: &mut Game,
        player: &PlayerId,
        fields: &[String],
    ) -> Result<String, GameError> {
        let username = game.player(player)?.username.clone();

        let name = fields
            .first()
            .map(|f| f.to_lowercase())
            .ok_or_else(|| GameError::validation("empty command, type 'help' for a list"))?;

        let handler = self.handlers.get(name.as_str()).ok_or_else(|| {
            GameError::validation(format!("unknown command '{}', type 'help' for a list", name))
        })?;

        debug!("Command '{}' from {} ({}): {:?}", name, username, player, fields);
        handler(game, player, fields)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Logs every team with its player count
pub fn log_team_counts(game: &Game) {
    for (name, count) in game.team_counts() {
        info!("  {}: {} player(s)", name, count);
    }
}

fn argument<'a>(fields: &'a [String], index: usize, usage: &str) -> Result<&'a str, GameError> {
    fields
        .get(index)
        .map(String::as_str)
        .ok_or_else(|| GameError::validation(format!("not enough arguments: {}", usage)))
}

fn echo_test(game: &mut Game, player: &PlayerId, fields: &[String]) -> Result<String, GameError> {
    let p = game.player(player)?;
    info!("Echo command received from {} ({}): {:?}", p.username, player, fields);
    Ok(format!("Echo command successful\n{:?}\n", fields))
}

fn help(_game: &mut Game, _player: &PlayerId, _fields: &[String]) -> Result<String, GameError> {
    Ok(HELP.to_string())
}

fn map(game: &mut Game, player: &PlayerId, _fields: &[String]) -> Result<String, GameError> {
    let team = game.player(player)?.team;
    render::own_map(game, team)
}

fn radar(game: &mut Game, player: &PlayerId, fields: &[String]) -> Result<String, GameError> {
    let viewer = game.player(player)?.team;
    let number = fields.get(1).ok_or_else(|| {
        GameError::validation("must target radar at a specific team: radar <team#>")
    })?;
    let target = game.team_by_number(number)?;
    render::radar(game, viewer, target)
}

fn teams(game: &mut Game, player: &PlayerId, _fields: &[String]) -> Result<String, GameError> {
    let own = game.player(player)?.team;
    let mut output = String::new();

    for team in game.teams() {
        let number = if team.id == own {
            format!("*{}", team.id.number())
        } else {
            team.id.number().to_string()
        };
        output.push_str(&format!("{:>3}:\t{}\n", number, team.name));
    }

    Ok(output)
}

/// Scores are only visible for the caller's own team
fn players(game: &mut Game, player: &PlayerId, fields: &[String]) -> Result<String, GameError> {
    let own = game.player(player)?.team;
    let mut output = String::new();

    let roster = |output: &mut String, team: TeamId| {
        for p in game.team_players(team) {
            let points = if team == own {
                p.points.to_string()
            } else {
                "?".to_string()
            };
            output.push_str(&format!("{:>8} {:<20}\n", points, p.username));
        }
    };

    if let Some(number) = fields.get(1) {
        let team = game.team_by_number(number)?;
        let t = game.team(team)?;
        output.push_str(&format!("\n{} [ {} player(s) ]\n", t.name, t.num_players()));
        output.push_str(&format!("{:>8} {:<20}\n", "Points", "Username"));
        roster(&mut output, team);
    } else {
        for team in game.teams() {
            output.push_str(&format!("Team {}: {}\n", team.id.number(), team.name));
            roster(&mut output, team.id);
        }
    }

    Ok(output)
}

fn target(game: &mut Game, player: &PlayerId, fields: &[String]) -> Result<String, GameError> {
    const USAGE: &str = "target <team#> <target_coordinate>";
    let number = argument(fields, 1, USAGE)?;
    let cell = argument(fields, 2, USAGE)?;

    let team = game.team_by_number(number)?;
    let target = Target::parse(cell)?;
    let result = game.fire_shot(player, team, target.to_coordinate())?;

    let p = game.player(player)?;
    info!(
        "Shots fired by {} ({}) at team {} {} {}: {}",
        p.username,
        player,
        game.team(team)?.name,
        target,
        target.to_coordinate(),
        result
    );

    Ok(match result {
        ShotResult::Hit => format!("Shot confirmed HIT!\n{} hit streak\n", p.hit_streak),
        ShotResult::RepeatHit => {
            "Shot confirmed HIT but no further damage inflicted!\n".to_string()
        }
        ShotResult::Miss => "Shot confirmed MISS!\n".to_string(),
        ShotResult::Sink => "Shot confirmed HIT... enemy ship SUNK!\n".to_string(),
    })
}

fn deploy(game: &mut Game, player: &PlayerId, fields: &[String]) -> Result<String, GameError> {
    const USAGE: &str = "deploy <location> <size> <orientation( H|V )>";
    let team = game.player(player)?.team;

    if fields.len() < 4 {
        return Err(GameError::validation(format!("not enough arguments: {}", USAGE)));
    }

    let location = Target::parse(&fields[1])?;
    let size: usize = fields[2].parse().map_err(|_| {
        GameError::validation(format!("ship size selection invalid: {}", USAGE))
    })?;
    let orientation = Orientation::parse(&fields[3]).ok_or_else(|| {
        GameError::validation(format!("ship orientation selection invalid: {}", USAGE))
    })?;

    let remaining = game.deploy_ship(team, size, orientation, location.to_coordinate())?;
    info!(
        "Team {} deployed a size {} ship at {} ({:?})",
        game.team(team)?.name,
        size,
        location,
        orientation
    );

    Ok(format!("Ship deployed - {} deployment points remaining", remaining))
}

fn points(game: &mut Game, player: &PlayerId, _fields: &[String]) -> Result<String, GameError> {
    let team = game.player(player)?.team;
    Ok(format!(
        "Your team has {} deployment points",
        game.team(team)?.deployment_points
    ))
}

fn chat_help(
    _game: &mut Game,
    _player: &PlayerId,
    _fields: &[String],
) -> Result<String, GameError> {
    let mut output = String::from("\t Type $ followed by a space and your message to CHAT ALL\n");
    output.push_str("\t Type # followed by a space and your message to TEAM CHAT\n");
    output.push_str(
        "\t Type @ followed by a space, username, space and your message to PRIVATE CHAT\n",
    );
    Ok(output)
}

fn rename(game: &mut Game, player: &PlayerId, fields: &[String]) -> Result<String, GameError> {
    let new_name = argument(fields, 1, "rename <new_name>")?;
    let old_name = game.rename_team(player, new_name)?;
    Ok(format!("Team {} renamed to {}", old_name, new_name))
}

fn mutiny(game: &mut Game, player: &PlayerId, fields: &[String]) -> Result<String, GameError> {
    let new_name = argument(fields, 1, "mutiny <new_name>")?;
    let outcome = game.mutiny(player, new_name)?;

    info!(
        "Mutiny! {} left team {} to start team {}",
        game.player(player)?.username,
        game.team(outcome.old_team)?.name,
        new_name
    );
    log_team_counts(game);

    Ok(format!(
        "Treachery! You have stolen {} deployment points to start your own team: {}\n\
         By starting your own team your points have been reduced to {}",
        outcome.stolen_points, new_name, MUTINY_SCORE
    ))
}

/// Ends the game when given the admin password. The network layer notices the
/// game is no longer live and stops the server once this reply is sent.
fn shutdown(game: &mut Game, player: &PlayerId, fields: &[String]) -> Result<String, GameError> {
    let password = fields
        .get(1)
        .ok_or_else(|| GameError::validation("must follow admin command with admin password"))?;

    let admin = &game.config().admin_password;
    if admin.is_empty() || password != admin {
        return Err(GameError::authentication("incorrect admin password"));
    }

    info!(
        "Shutdown requested by {} ({})",
        game.player(player)?.username,
        player
    );
    game.end();
    Ok("Shutting down server".to_string())
}
