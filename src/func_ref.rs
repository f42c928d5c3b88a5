//! Call references - one recorded call site of a function
//!
//! Text form: `[~]<caller>@<range>`
//!
//! Examples:
//! - `3@12:5-12:9` - called from function 3
//! - `~3@12:5-12:9` - implicit (compiler-synthesized) call from function 3
//! - `-1@1:10-1:13` - called outside any function (e.g. a global initializer)

use crate::id::{FuncId, RawId};
use crate::position::Range;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A usage of a function.
///
/// `id` is the enclosing function on the caller side (in `callers` lists)
/// or the called function (in `callees` lists). It is the sentinel when the
/// call has no enclosing function.
///
/// `==` is the exact comparison (id, range, implicit flag), the same as
/// [`FuncRef::exact_eq`]. It has to be: `Ord` sorts by id, then range, then
/// implicit flag, and `Eq` must agree with it for sorted call lists and for
/// whole-index equality after a cache round trip. Code that means "the same
/// call" across two runs uses [`FuncRef::same_call_site`] instead, which
/// ignores implicit-flag drift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncRef {
    pub id: FuncId,
    pub range: Range,
    pub is_implicit: bool,
}

impl FuncRef {
    pub fn new(id: FuncId, range: Range, is_implicit: bool) -> Self {
        Self {
            id,
            range,
            is_implicit,
        }
    }

    /// A call made outside of any function
    pub fn without_caller(range: Range, is_implicit: bool) -> Self {
        Self::new(FuncId::INVALID, range, is_implicit)
    }

    /// Whether an enclosing function is recorded
    pub fn has_caller(&self) -> bool {
        self.id.has_value()
    }

    /// Id, range and implicit flag all match.
    pub fn exact_eq(&self, other: &FuncRef) -> bool {
        self == other
    }

    /// Id and range match; the implicit flag is ignored.
    pub fn same_call_site(&self, other: &FuncRef) -> bool {
        self.id == other.id && self.range == other.range
    }
}

impl fmt::Display for FuncRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_implicit {
            f.write_str("~")?;
        }
        write!(f, "{}@{}", self.id, self.range)
    }
}

impl FromStr for FuncRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (is_implicit, rest) = match s.strip_prefix('~') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (id_str, range_str) = rest
            .split_once('@')
            .ok_or_else(|| Error::InvalidFuncRef(format!("Missing @ in {s:?}")))?;

        let id = if id_str == "-1" {
            FuncId::INVALID
        } else {
            let raw: RawId = id_str
                .parse()
                .map_err(|_| Error::InvalidFuncRef(format!("Invalid function id: {id_str}")))?;
            if raw == RawId::MAX {
                return Err(Error::InvalidFuncRef(format!("Function id out of range: {id_str}")));
            }
            FuncId::new(raw)
        };

        let range = range_str
            .parse()
            .map_err(|e| Error::InvalidFuncRef(format!("{e} in {s:?}")))?;

        Ok(Self {
            id,
            range,
            is_implicit,
        })
    }
}

impl Serialize for FuncRef {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FuncRef {
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

    fn range(line: u32) -> Range {
        Range::from_coords(line, 1, line, 4)
    }

    #[test]
    fn test_text_form() {
        let r = FuncRef::new(FuncId::new(3), range(12), false);
        assert_eq!(r.to_string(), "3@12:1-12:4");

        let implicit = FuncRef::new(FuncId::new(3), range(12), true);
        assert_eq!(implicit.to_string(), "~3@12:1-12:4");

        let global = FuncRef::without_caller(range(1), false);
        assert_eq!(global.to_string(), "-1@1:1-1:4");
    }

    #[test]
    fn test_codec_preserves_implicit_and_absent_caller() {
        let samples = [
            FuncRef::new(FuncId::new(0), range(2), false),
            FuncRef::new(FuncId::new(17), range(9), true),
            FuncRef::without_caller(range(4), true),
            FuncRef::without_caller(range(4), false),
        ];
        for original in samples {
            let parsed: FuncRef = original.to_string().parse().unwrap();
            assert!(parsed.exact_eq(&original), "{original} did not survive");
        }
    }

    #[test]
    fn test_rejects_malformed() {
        assert!("3".parse::<FuncRef>().is_err());
        assert!("x@1:1-1:2".parse::<FuncRef>().is_err());
        assert!("3@nope".parse::<FuncRef>().is_err());
        assert!("4294967295@1:1-1:2".parse::<FuncRef>().is_err());
    }

    #[test]
    fn test_exact_versus_same_call_site() {
        let a = FuncRef::new(FuncId::new(1), range(5), false);
        let b = FuncRef::new(FuncId::new(1), range(5), true);
        assert!(!a.exact_eq(&b));
        assert!(a.same_call_site(&b));
        assert_ne!(a, b);

        let c = FuncRef::new(FuncId::new(2), range(5), false);
        assert!(!a.same_call_site(&c));
    }

    #[test]
    fn test_operator_eq_is_exact_and_agrees_with_ord() {
        let a = FuncRef::new(FuncId::new(1), range(5), false);
        let b = FuncRef::new(FuncId::new(1), range(5), true);
        for (x, y) in [(a, a), (a, b), (b, a)] {
            assert_eq!(x == y, x.exact_eq(&y));
            assert_eq!(x == y, x.cmp(&y) == std::cmp::Ordering::Equal);
        }
        // same site, still distinct under ==
        assert!(a.same_call_site(&b) && a != b);
    }

    #[test]
    fn test_ordering_is_id_range_implicit() {
        let refs = vec![
            FuncRef::without_caller(range(1), false),
            FuncRef::new(FuncId::new(2), range(1), true),
            FuncRef::new(FuncId::new(2), range(1), false),
            FuncRef::new(FuncId::new(1), range(9), false),
            FuncRef::new(FuncId::new(2), range(0), false),
        ];

        let mut first = refs.clone();
        first.sort();
        let mut second: Vec<_> = refs.into_iter().rev().collect();
        second.sort();

        assert_eq!(first, second);
        assert_eq!(first[0], FuncRef::new(FuncId::new(1), range(9), false));
        assert_eq!(first[1], FuncRef::new(FuncId::new(2), range(0), false));
        assert_eq!(first[2], FuncRef::new(FuncId::new(2), range(1), false));
        assert_eq!(first[3], FuncRef::new(FuncId::new(2), range(1), true));
        assert!(!first[4].has_caller());
    }

    #[test]
    fn test_serde_uses_text_form() {
        let r = FuncRef::new(FuncId::new(8), range(3), true);
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, "\"~8@3:1-3:4\"");
        let back: FuncRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, r);
    }
}
