//! Core domain types for the word board.

use derive_new::new;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// A single playable letter printed on a tile.
///
/// Glyphs travel over the wire as one-character strings (`"A"`, `"Ж"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub struct Glyph(char);

impl Glyph {
    /// Creates a glyph from a character.
    pub fn new(letter: char) -> Self {
        Self(letter)
    }

    /// Returns the underlying character.
    pub fn letter(self) -> char {
        self.0
    }
}

impl From<char> for Glyph {
    fn from(letter: char) -> Self {
        Self(letter)
    }
}

/// Error parsing a glyph from text.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("Expected a single letter, got {:?}", _0)]
pub struct GlyphParseError(pub String);

impl std::error::Error for GlyphParseError {}

impl FromStr for Glyph {
    type Err = GlyphParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(letter), None) => Ok(Self(letter)),
            _ => Err(GlyphParseError(s.to_string())),
        }
    }
}

impl Serialize for Glyph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut buf = [0u8; 4];
        serializer.serialize_str(self.0.encode_utf8(&mut buf))
    }
}

impl<'de> Deserialize<'de> for Glyph {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// A cell address on the board, zero-based.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, new,
    derive_more::Display,
)]
#[display("({row}, {col})")]
pub struct Coord {
    /// Row index, top to bottom.
    pub row: usize,
    /// Column index, left to right.
    pub col: usize,
}

/// Identifier the authority assigns to a player.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    derive_more::Display, derive_more::From,
)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Creates a player id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Local identity of a tile in the rack.
///
/// Only meaningful inside one session; the authority never sees it.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
    derive_more::Display,
)]
#[display("#{_0}")]
pub struct TileId(pub(crate) u64);

impl TileId {
    /// Returns the raw numeric id.
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Letter set the authority deals from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
    strum::Display, strum::EnumString, strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Language {
    /// Latin alphabet distribution.
    #[default]
    English,
    /// Cyrillic alphabet distribution.
    Russian,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_parses_single_letter() {
        assert_eq!("A".parse::<Glyph>(), Ok(Glyph::new('A')));
        assert_eq!("Ж".parse::<Glyph>(), Ok(Glyph::new('Ж')));
    }

    #[test]
    fn test_glyph_rejects_empty_and_multiple_letters() {
        assert!("".parse::<Glyph>().is_err());
        assert!("AB".parse::<Glyph>().is_err());
    }

    #[test]
    fn test_glyph_serializes_as_string() {
        let json = serde_json::to_string(&Glyph::new('Q')).unwrap();
        assert_eq!(json, "\"Q\"");
        let back: Glyph = serde_json::from_str("\"Я\"").unwrap();
        assert_eq!(back, Glyph::new('Я'));
    }

    #[test]
    fn test_language_names() {
        assert_eq!(Language::Russian.to_string(), "russian");
        assert_eq!("English".parse::<Language>(), Ok(Language::English));
        assert_eq!(serde_json::to_string(&Language::English).unwrap(), "\"english\"");
    }

    #[test]
    fn test_player_id_is_transparent() {
        let id = PlayerId::new("CqgxpmYX");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"CqgxpmYX\"");
    }
}
