//! Source positions and ranges
//!
//! Format: `<line>:<column>` for a position, `<start>-<end>` for a range.
//!
//! Examples:
//! - `12:5` - line 12, column 5
//! - `12:5-12:9` - the four columns starting at 12:5

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A line/column location as reported by the front-end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl FromStr for Position {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (line, column) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidRange(format!("Position must be line:column, got {s:?}")))?;
        let line = line
            .trim()
            .parse()
            .map_err(|_| Error::InvalidRange(format!("Invalid line number: {line}")))?;
        let column = column
            .trim()
            .parse()
            .map_err(|_| Error::InvalidRange(format!("Invalid column number: {column}")))?;
        Ok(Self { line, column })
    }
}

/// A half-open source span. Ranges order by start, then end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    pub const fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Build a range from raw coordinates
    pub const fn from_coords(start_line: u32, start_column: u32, end_line: u32, end_column: u32) -> Self {
        Self {
            start: Position::new(start_line, start_column),
            end: Position::new(end_line, end_column),
        }
    }

    /// A range covering no characters
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Whether `pos` falls inside this range
    pub fn contains(&self, pos: Position) -> bool {
        self.start <= pos && pos < self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

impl FromStr for Range {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| Error::InvalidRange(format!("Range must be start-end, got {s:?}")))?;
        Ok(Self {
            start: start.parse()?,
            end: end.parse()?,
        })
    }
}

impl Serialize for Range {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Range {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_text_form() {
        let range = Range::from_coords(3, 1, 3, 14);
        assert_eq!(range.to_string(), "3:1-3:14");
        assert_eq!("3:1-3:14".parse::<Range>().unwrap(), range);
    }

    #[test]
    fn test_invalid_range() {
        assert!("3:1".parse::<Range>().is_err());
        assert!("a:1-3:4".parse::<Range>().is_err());
        assert!("3:1-3".parse::<Range>().is_err());
        assert!("".parse::<Range>().is_err());
    }

    #[test]
    fn test_empty_and_contains() {
        assert!(Range::default().is_empty());
        let range = Range::from_coords(1, 5, 2, 1);
        assert!(!range.is_empty());
        assert!(range.contains(Position::new(1, 9)));
        assert!(!range.contains(Position::new(2, 1)));
    }

    #[test]
    fn test_ordering_start_then_end() {
        let a = Range::from_coords(1, 1, 1, 5);
        let b = Range::from_coords(1, 1, 1, 9);
        let c = Range::from_coords(2, 1, 2, 2);
        let mut ranges = vec![c, b, a];
        ranges.sort();
        assert_eq!(ranges, vec![a, b, c]);
    }

    #[test]
    fn test_serde_uses_text_form() {
        let range = Range::from_coords(10, 2, 10, 8);
        let json = serde_json::to_string(&range).unwrap();
        assert_eq!(json, "\"10:2-10:8\"");
        let back: Range = serde_json::from_str(&json).unwrap();
        assert_eq!(back, range);
    }
}
