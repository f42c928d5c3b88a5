//! Cache layer - versioned on-disk persistence of file indexes
//!
//! Two encodings are supported. JSON is readable and tolerant: missing
//! fields take their defaults and unknown fields are ignored, so only the
//! major version has to match. MessagePack is compact and positional, so
//! both major and minor must match exactly.

mod format;
mod store;

pub use format::{decode, encode, HEADER_LEN, MAGIC};
pub use store::CacheStore;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Version of the persisted layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheVersion {
    /// Bumped on any incompatible layout change
    pub major: u16,
    /// Bumped when fields are added
    pub minor: u16,
}

impl CacheVersion {
    pub const CURRENT: CacheVersion = CacheVersion { major: 13, minor: 0 };

    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Whether a cache written as `on_disk` can be read by `running`.
    pub fn can_read(running: CacheVersion, on_disk: CacheVersion, format: SerializeFormat) -> bool {
        match format {
            SerializeFormat::Json => running.major == on_disk.major,
            SerializeFormat::MessagePack => running == on_disk,
        }
    }
}

impl Default for CacheVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for CacheVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Encoding of cache files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializeFormat {
    #[default]
    Json,
    #[serde(alias = "msgpack")]
    MessagePack,
}

impl SerializeFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SerializeFormat::Json => "json",
            SerializeFormat::MessagePack => "mpack",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SerializeFormat::Json => "json",
            SerializeFormat::MessagePack => "messagepack",
        }
    }
}

impl FromStr for SerializeFormat {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(SerializeFormat::Json),
            "messagepack" | "msgpack" | "mpack" => Ok(SerializeFormat::MessagePack),
            _ => Err(crate::Error::UnknownKind(format!("serialize format '{s}'"))),
        }
    }
}

impl fmt::Display for SerializeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
