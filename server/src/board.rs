//! Ships, their placement on a team's board, and per-cell damage

use crate::error::GameError;
use shared::Coordinate;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Extends along the row, increasing x
    Horizontal,
    /// Extends along the column, increasing y
    Vertical,
}

impl Orientation {
    /// Accepts `H` or `V`, either case
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "H" | "h" => Some(Orientation::Horizontal),
            "V" | "v" => Some(Orientation::Vertical),
            _ => None,
        }
    }
}

/// Outcome of firing at a single cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotResult {
    Miss,
    Hit,
    /// The cell was already damaged; nothing changes
    RepeatHit,
    /// The shot destroyed the ship's last intact cell
    Sink,
}

impl fmt::Display for ShotResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShotResult::Miss => "MISS",
            ShotResult::Hit => "HIT",
            ShotResult::RepeatHit => "REPEAT HIT",
            ShotResult::Sink => "HIT and SINK",
        };
        f.write_str(name)
    }
}

/// State of one cell occupied by a ship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellState {
    Intact,
    Hit,
    Sunk,
}

#[derive(Debug, Clone)]
pub struct Ship {
    anchor: Coordinate,
    orientation: Orientation,
    /// One flag per occupied cell, starting at the anchor
    damage: Vec<bool>,
}

impl Ship {
    /// Builds a ship whose every cell lies inside a `board_size` square board.
    pub fn new(
        size: usize,
        orientation: Orientation,
        anchor: Coordinate,
        board_size: usize,
    ) -> Result<Self, GameError> {
        if size == 0 {
            return Err(GameError::validation("ship size must be at least 1"));
        }

        let ship = Self {
            anchor,
            orientation,
            damage: vec![false; size],
        };

        let end = ship.cell(size - 1);
        if !anchor.in_bounds(board_size) || end.map_or(true, |c| !c.in_bounds(board_size)) {
            return Err(GameError::validation(format!(
                "ship of size {} at {} does not fit on the {}x{} board",
                size,
                shared::Target::from(anchor),
                board_size,
                board_size
            )));
        }

        Ok(ship)
    }

    fn cell(&self, offset: usize) -> Option<Coordinate> {
        match self.orientation {
            Orientation::Horizontal => self
                .anchor
                .x
                .checked_add(offset)
                .map(|x| Coordinate::new(x, self.anchor.y)),
            Orientation::Vertical => self
                .anchor
                .y
                .checked_add(offset)
                .map(|y| Coordinate::new(self.anchor.x, y)),
        }
    }

    pub fn size(&self) -> usize {
        self.damage.len()
    }

    pub fn anchor(&self) -> Coordinate {
        self.anchor
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// All occupied cells, anchor first
    pub fn cells(&self) -> impl Iterator<Item = Coordinate> + '_ {
        (0..self.size()).filter_map(|offset| self.cell(offset))
    }

    fn offset_of(&self, coord: Coordinate) -> Option<usize> {
        let (along, across, anchor_along, anchor_across) = match self.orientation {
            Orientation::Horizontal => (coord.x, coord.y, self.anchor.x, self.anchor.y),
            Orientation::Vertical => (coord.y, coord.x, self.anchor.y, self.anchor.x),
        };

        if across != anchor_across || along < anchor_along {
            return None;
        }
        let offset = along - anchor_along;
        (offset < self.size()).then_some(offset)
    }

    pub fn occupies(&self, coord: Coordinate) -> bool {
        self.offset_of(coord).is_some()
    }

    pub fn overlaps(&self, other: &Ship) -> bool {
        other.cells().any(|c| self.occupies(c))
    }

    pub fn is_sunk(&self) -> bool {
        self.damage.iter().all(|hit| *hit)
    }

    /// Display state of `coord`, or `None` if this ship does not occupy it
    pub fn cell_state(&self, coord: Coordinate) -> Option<CellState> {
        let offset = self.offset_of(coord)?;
        Some(if self.is_sunk() {
            CellState::Sunk
        } else if self.damage[offset] {
            CellState::Hit
        } else {
            CellState::Intact
        })
    }

    /// Applies a shot at `coord`. Returns `None` when the ship is not there.
    pub fn receive_shot(&mut self, coord: Coordinate) -> Option<ShotResult> {
        let offset = self.offset_of(coord)?;
        if self.damage[offset] {
            return Some(ShotResult::RepeatHit);
        }

        self.damage[offset] = true;
        Some(if self.is_sunk() {
            ShotResult::Sink
        } else {
            ShotResult::Hit
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_parse() {
        assert_eq!(Orientation::parse("H"), Some(Orientation::Horizontal));
        assert_eq!(Orientation::parse("v"), Some(Orientation::Vertical));
        assert_eq!(Orientation::parse("X"), None);
        assert_eq!(Orientation::parse("HV"), None);
    }

    #[test]
    fn test_horizontal_ship_cells() {
        let ship = Ship::new(3, Orientation::Horizontal, Coordinate::new(2, 4), 10).unwrap();
        let cells: Vec<_> = ship.cells().collect();
        assert_eq!(
            cells,
            vec![
                Coordinate::new(2, 4),
                Coordinate::new(3, 4),
                Coordinate::new(4, 4)
            ]
        );
        assert!(ship.occupies(Coordinate::new(4, 4)));
        assert!(!ship.occupies(Coordinate::new(5, 4)));
        assert!(!ship.occupies(Coordinate::new(2, 5)));
    }

    #[test]
    fn test_vertical_ship_cells() {
        let ship = Ship::new(2, Orientation::Vertical, Coordinate::new(0, 8), 10).unwrap();
        let cells: Vec<_> = ship.cells().collect();
        assert_eq!(cells, vec![Coordinate::new(0, 8), Coordinate::new(0, 9)]);
        assert!(!ship.occupies(Coordinate::new(1, 8)));
    }

    #[test]
    fn test_ship_must_fit_on_board() {
        assert!(Ship::new(3, Orientation::Horizontal, Coordinate::new(7, 0), 10).is_ok());
        assert!(Ship::new(4, Orientation::Horizontal, Coordinate::new(7, 0), 10).is_err());
        assert!(Ship::new(4, Orientation::Vertical, Coordinate::new(0, 7), 10).is_err());
        assert!(Ship::new(1, Orientation::Vertical, Coordinate::new(10, 0), 10).is_err());
        assert!(Ship::new(0, Orientation::Vertical, Coordinate::new(0, 0), 10).is_err());
    }

    #[test]
    fn test_ship_overlap() {
        let a = Ship::new(3, Orientation::Horizontal, Coordinate::new(2, 2), 10).unwrap();
        let crossing = Ship::new(3, Orientation::Vertical, Coordinate::new(3, 1), 10).unwrap();
        let parallel = Ship::new(3, Orientation::Horizontal, Coordinate::new(2, 3), 10).unwrap();
        assert!(a.overlaps(&crossing));
        assert!(crossing.overlaps(&a));
        assert!(!a.overlaps(&parallel));
    }

    #[test]
    fn test_shots_hit_repeat_and_sink() {
        let mut ship = Ship::new(2, Orientation::Horizontal, Coordinate::new(0, 0), 4).unwrap();

        assert_eq!(ship.receive_shot(Coordinate::new(3, 3)), None);
        assert_eq!(ship.receive_shot(Coordinate::new(0, 0)), Some(ShotResult::Hit));
        assert_eq!(ship.cell_state(Coordinate::new(0, 0)), Some(CellState::Hit));
        assert_eq!(ship.receive_shot(Coordinate::new(0, 0)), Some(ShotResult::RepeatHit));
        assert_eq!(ship.receive_shot(Coordinate::new(1, 0)), Some(ShotResult::Sink));
        assert!(ship.is_sunk());
        assert_eq!(ship.cell_state(Coordinate::new(0, 0)), Some(CellState::Sunk));
        assert_eq!(ship.receive_shot(Coordinate::new(1, 0)), Some(ShotResult::RepeatHit));
    }

    #[test]
    fn test_single_cell_ship_sinks_immediately() {
        let mut ship = Ship::new(1, Orientation::Vertical, Coordinate::new(1, 1), 4).unwrap();
        assert_eq!(ship.cell_state(Coordinate::new(1, 1)), Some(CellState::Intact));
        assert_eq!(ship.receive_shot(Coordinate::new(1, 1)), Some(ShotResult::Sink));
    }
}
