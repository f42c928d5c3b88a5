//! Byte layout of cache files
//!
//! JSON: a single object `{"version": {"major", "minor"}, "file": {...}}`.
//! MessagePack: `CXIX` magic, little-endian `u16` major and minor, then the
//! `rmp-serde` body.

use super::{CacheVersion, SerializeFormat};
use crate::index_file::IndexFile;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

pub const MAGIC: &[u8; 4] = b"CXIX";
pub const HEADER_LEN: usize = 8;

#[derive(Serialize)]
struct JsonEnvelopeRef<'a> {
    version: CacheVersion,
    file: &'a IndexFile,
}

/// Only the version is read first, so an incompatible body is never
/// decoded.
#[derive(Deserialize)]
struct JsonVersionHeader {
    version: CacheVersion,
}

#[derive(Deserialize)]
struct JsonEnvelope {
    file: IndexFile,
}

/// Encode `file` stamped with `version`.
pub fn encode(file: &IndexFile, format: SerializeFormat, version: CacheVersion) -> Result<Vec<u8>> {
    match format {
        SerializeFormat::Json => Ok(serde_json::to_vec(&JsonEnvelopeRef { version, file })?),
        SerializeFormat::MessagePack => {
            let body = rmp_serde::to_vec(file)?;
            let mut bytes = Vec::with_capacity(HEADER_LEN + body.len());
            bytes.extend_from_slice(MAGIC);
            bytes.extend_from_slice(&version.major.to_le_bytes());
            bytes.extend_from_slice(&version.minor.to_le_bytes());
            bytes.extend_from_slice(&body);
            Ok(bytes)
        }
    }
}

/// Decode a cache file written in `format`, refusing versions `running`
/// cannot read.
pub fn decode(bytes: &[u8], format: SerializeFormat, running: CacheVersion) -> Result<IndexFile> {
    match format {
        SerializeFormat::Json => {
            let header: JsonVersionHeader = serde_json::from_slice(bytes)?;
            check_version(running, header.version, format)?;
            let envelope: JsonEnvelope = serde_json::from_slice(bytes)?;
            Ok(envelope.file)
        }
        SerializeFormat::MessagePack => {
            let found = read_header(bytes)?;
            check_version(running, found, format)?;
            Ok(rmp_serde::from_slice(&bytes[HEADER_LEN..])?)
        }
    }
}

fn read_header(bytes: &[u8]) -> Result<CacheVersion> {
    if bytes.len() < HEADER_LEN {
        return Err(Error::InvalidHeader(format!("{} bytes is too short", bytes.len())));
    }
    if &bytes[0..4] != MAGIC {
        return Err(Error::InvalidHeader("bad magic".to_string()));
    }
    Ok(CacheVersion {
        major: u16::from_le_bytes([bytes[4], bytes[5]]),
        minor: u16::from_le_bytes([bytes[6], bytes[7]]),
    })
}

fn check_version(running: CacheVersion, found: CacheVersion, format: SerializeFormat) -> Result<()> {
    if CacheVersion::can_read(running, found, format) {
        Ok(())
    } else {
        Err(Error::UnsupportedVersion { found, running })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Range;

    fn sample() -> IndexFile {
        let mut file = IndexFile::new("/p/a.cc", "");
        let f = file.to_func_id("c:@F@f#");
        file.resolve_func_mut(f).def.definition_spelling = Some(Range::from_coords(1, 6, 1, 7));
        file
    }

    #[test]
    fn test_messagepack_header_layout() {
        let bytes = encode(&sample(), SerializeFormat::MessagePack, CacheVersion::new(13, 1)).unwrap();
        assert_eq!(&bytes[0..4], b"CXIX");
        assert_eq!(&bytes[4..8], &[13, 0, 1, 0]);
    }

    #[test]
    fn test_json_envelope_layout() {
        let bytes = encode(&sample(), SerializeFormat::Json, CacheVersion::new(13, 0)).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["version"]["major"], 13);
        assert_eq!(value["file"]["path"], "/p/a.cc");
    }

    #[test]
    fn test_decode_roundtrip_both_formats() {
        let file = sample();
        for format in [SerializeFormat::Json, SerializeFormat::MessagePack] {
            let bytes = encode(&file, format, CacheVersion::CURRENT).unwrap();
            let loaded = decode(&bytes, format, CacheVersion::CURRENT).unwrap();
            assert_eq!(loaded, file, "{format}");
        }
    }

    #[test]
    fn test_short_header_rejected() {
        let err = decode(b"CXI", SerializeFormat::MessagePack, CacheVersion::CURRENT).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
        let err = decode(b"ABCD\0\0\0\0", SerializeFormat::MessagePack, CacheVersion::CURRENT).unwrap_err();
        assert!(matches!(err, Error::InvalidHeader(_)));
    }

    #[test]
    fn test_version_mismatch_reports_versions() {
        let bytes = encode(&sample(), SerializeFormat::Json, CacheVersion::new(14, 0)).unwrap();
        let err = decode(&bytes, SerializeFormat::Json, CacheVersion::new(13, 0)).unwrap_err();
        assert_eq!(err.to_string(), "Unsupported cache version 14.0 (running 13.0)");
    }
}
