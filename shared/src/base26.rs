//! Spreadsheet-style column labels: 0 → "A", 25 → "Z", 26 → "AA", 701 → "ZZ", 702 → "AAA".

use crate::coordinate::ParseError;

const RADIX: usize = 26;

/// Encodes a zero-based column index as an upper-case base-26 label.
pub fn encode(index: usize) -> String {
    let mut letters = Vec::new();
    // Bijective numeration: shift to one-based so every digit is in 1..=26
    let mut n = index as u128 + 1;

    while n > 0 {
        n -= 1;
        letters.push(b'A' + (n % RADIX as u128) as u8);
        n /= RADIX as u128;
    }

    letters.reverse();
    letters.into_iter().map(char::from).collect()
}

/// Decodes a base-26 label back into its zero-based column index.
///
/// Lower-case letters are accepted. Anything other than ASCII letters, an
/// empty label, or a label too long to fit in `usize` is rejected.
pub fn decode(label: &str) -> Result<usize, ParseError> {
    if label.is_empty() {
        return Err(ParseError::InvalidLabel(label.to_string()));
    }

    let mut value: usize = 0;
    for c in label.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(ParseError::InvalidLabel(label.to_string()));
        }
        let digit = (c.to_ascii_uppercase() as u8 - b'A') as usize + 1;
        value = value
            .checked_mul(RADIX)
            .and_then(|v| v.checked_add(digit))
            .ok_or_else(|| ParseError::InvalidLabel(label.to_string()))?;
    }

    Ok(value - 1)
}
