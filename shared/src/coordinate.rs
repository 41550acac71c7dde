//! Cell references as typed by players ("G7") and the grid coordinates they map to.

use crate::base26;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Reasons a typed cell reference could not be understood
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no coordinate given, expected column letters followed by a row number (e.g. G7)")]
    Empty,
    #[error("coordinate '{0}' must start with column letters (e.g. G7)")]
    MissingColumn(String),
    #[error("coordinate '{0}' is missing a row number (e.g. G7)")]
    MissingRow(String),
    #[error("coordinate '{input}' contains unexpected character '{found}'")]
    UnexpectedCharacter { input: String, found: char },
    #[error("row number in '{0}' is too large")]
    RowOutOfRange(String),
    #[error("'{0}' is not a valid column label")]
    InvalidLabel(String),
}

/// Zero-based grid position. `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: usize,
    pub y: usize,
}

impl Coordinate {
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// True when both axes lie within `[0, board_size)`
    pub fn in_bounds(&self, board_size: usize) -> bool {
        self.x < board_size && self.y < board_size
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A parsed cell reference: column letters plus a row number.
///
/// Only constructible through parsing, so the column label is always a valid
/// base-26 label and [`Target::to_coordinate`] cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    column: String,
    row: usize,
    x: usize,
}

impl Target {
    /// Splits a leading run of letters from a trailing run of digits.
    ///
    /// `"G7"` gives column `"G"`, row `7`. Letters are normalised to upper
    /// case. Rejects empty input, a missing run, any other character, and
    /// letters following digits (`"7G"`, `"G7G"`).
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ParseError::Empty);
        }

        let split = input
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(input.len());
        let (letters, digits) = input.split_at(split);

        if let Some(found) = digits.chars().find(|c| !c.is_ascii_digit()) {
            if letters.is_empty() && found.is_ascii_alphabetic() {
                return Err(ParseError::MissingColumn(input.to_string()));
            }
            return Err(ParseError::UnexpectedCharacter {
                input: input.to_string(),
                found,
            });
        }
        if letters.is_empty() {
            return Err(ParseError::MissingColumn(input.to_string()));
        }
        if digits.is_empty() {
            return Err(ParseError::MissingRow(input.to_string()));
        }

        let row = digits
            .parse::<usize>()
            .map_err(|_| ParseError::RowOutOfRange(input.to_string()))?;
        let x = base26::decode(letters)?;

        Ok(Self {
            column: letters.to_ascii_uppercase(),
            row,
            x,
        })
    }

    /// Column letters, upper case
    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn row(&self) -> usize {
        self.row
    }

    /// Column label to zero-based x; the row number maps to y unchanged.
    pub fn to_coordinate(&self) -> Coordinate {
        Coordinate::new(self.x, self.row)
    }
}

impl FromStr for Target {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Target::parse(s)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.column, self.row)
    }
}

impl From<Coordinate> for Target {
    fn from(coord: Coordinate) -> Self {
        Self {
            column: base26::encode(coord.x),
            row: coord.y,
            x: coord.x,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_target() {
        let target = Target::parse("G7").unwrap();
        assert_eq!(target.column(), "G");
        assert_eq!(target.row(), 7);
        assert_eq!(target.to_coordinate(), Coordinate::new(6, 7));
    }

    #[test]
    fn test_parse_multi_letter_and_multi_digit() {
        let target = Target::parse("AB12").unwrap();
        assert_eq!(target.column(), "AB");
        assert_eq!(target.row(), 12);
        assert_eq!(target.to_coordinate(), Coordinate::new(27, 12));
    }

    #[test]
    fn test_parse_row_zero_has_no_offset() {
        let target = Target::parse("A0").unwrap();
        assert_eq!(target.to_coordinate(), Coordinate::new(0, 0));
    }

    #[test]
    fn test_parse_lower_case_is_normalised() {
        let target: Target = "g7".parse().unwrap();
        assert_eq!(target.column(), "G");
        assert_eq!(target.to_string(), "G7");
    }

    #[test]
    fn test_parse_rejects_digits_first() {
        assert_eq!(
            Target::parse("7G"),
            Err(ParseError::MissingColumn("7G".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert_eq!(Target::parse(""), Err(ParseError::Empty));
        assert_eq!(Target::parse("   "), Err(ParseError::Empty));
    }

    #[test]
    fn test_parse_rejects_negative_row() {
        assert_eq!(
            Target::parse("G-1"),
            Err(ParseError::UnexpectedCharacter {
                input: "G-1".to_string(),
                found: '-'
            })
        );
    }

    #[test]
    fn test_parse_rejects_missing_row_and_trailing_letters() {
        assert_eq!(Target::parse("G"), Err(ParseError::MissingRow("G".to_string())));
        assert!(matches!(
            Target::parse("G7G"),
            Err(ParseError::UnexpectedCharacter { found: 'G', .. })
        ));
    }

    #[test]
    fn test_parse_rejects_huge_row() {
        let input = format!("A{}", "9".repeat(40));
        assert!(matches!(
            Target::parse(&input),
            Err(ParseError::RowOutOfRange(_))
        ));
    }

    #[test]
    fn test_target_from_coordinate_round_trips() {
        let coord = Coordinate::new(30, 4);
        let target = Target::from(coord);
        assert_eq!(target.to_string(), "AE4");
        assert_eq!(Target::parse(&target.to_string()).unwrap().to_coordinate(), coord);
    }

    #[test]
    fn test_coordinate_bounds() {
        assert!(Coordinate::new(0, 0).in_bounds(1));
        assert!(Coordinate::new(15, 15).in_bounds(16));
        assert!(!Coordinate::new(16, 0).in_bounds(16));
        assert!(!Coordinate::new(0, 16).in_bounds(16));
    }
}
