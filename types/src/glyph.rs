//! Pattern alphabet.
//!
//! Requests use `?` (disclose this position) and `-` (leave it hidden).
//! Replies and poke patterns use `T`/`F` for bit values and `-` for positions
//! that carry no value.

pub const TRUE_GLYPH: char = 'T';
pub const FALSE_GLYPH: char = 'F';
pub const QUERY_GLYPH: char = '?';
pub const HIDDEN_GLYPH: char = '-';

#[must_use]
pub const fn glyph_for(bit: bool) -> char {
    if bit { TRUE_GLYPH } else { FALSE_GLYPH }
}

/// Parse a bit glyph. Anything other than `T`/`F` carries no value.
#[must_use]
pub const fn bit_from_glyph(glyph: char) -> Option<bool> {
    match glyph {
        TRUE_GLYPH => Some(true),
        FALSE_GLYPH => Some(false),
        _ => None,
    }
}

/// Parse a full bit string such as `"TTFT"`.
///
/// Returns the index and character of the first glyph that is not `T`/`F`.
pub fn parse_bits(text: &str) -> Result<Vec<bool>, (usize, char)> {
    text.chars()
        .enumerate()
        .map(|(index, glyph)| bit_from_glyph(glyph).ok_or((index, glyph)))
        .collect()
}

/// True when every bit holds the same value. An empty slice counts as uniform.
#[must_use]
pub fn is_uniform(bits: &[bool]) -> bool {
    match bits.split_first() {
        Some((first, rest)) => rest.iter().all(|bit| bit == first),
        None => true,
    }
}
