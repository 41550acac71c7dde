//! Text grids for the `map` and `radar` commands

use crate::board::CellState;
use crate::error::GameError;
use crate::game::Game;
use crate::team::{Team, TeamId};
use shared::{base26, Coordinate};

pub const WATER: char = '~';
pub const SHIP: char = 'O';
pub const HIT: char = 'X';
pub const SUNK: char = '#';
pub const UNKNOWN: char = '.';
pub const MISS: char = 'o';

/// Lays out a `board_size` square grid: a header of column labels, then one
/// line per row prefixed with the row number. Every column is one wider than
/// the longest label, so up to 26 columns each cell is its glyph plus a space.
pub fn print_map(board_size: usize, icon: impl Fn(Coordinate) -> char) -> String {
    let width = base26::encode(board_size.saturating_sub(1)).len() + 1;
    let mut output = String::from("    ");

    for x in 0..board_size {
        output.push_str(&format!("{:<width$}", base26::encode(x), width = width));
    }
    output.push('\n');

    for y in 0..board_size {
        output.push_str(&format!("{:>3} ", y));
        for x in 0..board_size {
            output.push_str(&format!("{:<width$}", icon(Coordinate::new(x, y)), width = width));
        }
        output.push('\n');
    }

    output
}

fn ship_state(team: &Team, coord: Coordinate) -> Option<CellState> {
    team.ships.iter().find_map(|ship| ship.cell_state(coord))
}

/// Full-detail view of a team's own board
pub fn own_map(game: &Game, team: TeamId) -> Result<String, GameError> {
    let team = game.team(team)?;
    Ok(print_map(game.board_size(), |coord| match ship_state(team, coord) {
        Some(CellState::Intact) => SHIP,
        Some(CellState::Hit) => HIT,
        Some(CellState::Sunk) => SUNK,
        None => WATER,
    }))
}

/// What `viewer` knows of `target`'s board: only the cells it has fired at
pub fn radar(game: &Game, viewer: TeamId, target: TeamId) -> Result<String, GameError> {
    if viewer == target {
        return Err(GameError::validation("you cannot target your own team"));
    }

    let target = game.team(target)?;
    Ok(print_map(game.board_size(), |coord| {
        if !target.was_fired_upon(viewer, coord) {
            return UNKNOWN;
        }
        match ship_state(target, coord) {
            Some(CellState::Sunk) => SUNK,
            Some(_) => HIT,
            None => MISS,
        }
    }))
}
