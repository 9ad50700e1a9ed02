//! Core value types shared by the scanner, store, and reconciler.

use crate::tree::path;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Length of a SHA-512 digest in bytes.
pub const HASH_LEN: usize = 64;

/// Root-relative, `/`-separated path used as the manifest key.
///
/// Always normalized: no empty, `.` or `..` components and no leading or
/// trailing separator. Deserializing a non-normalized key fails, which the
/// store surfaces as a corrupt manifest.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelPath(String);

impl RelPath {
    /// Normalize `raw` into a relative path. Fails on empty paths, absolute
    /// paths, and paths that climb out of their base with `..`.
    pub fn new(raw: &str) -> Result<Self, String> {
        path::normalize_relative(raw).map(RelPath)
    }

    /// Build a key from a filesystem path already relative to the scan root.
    ///
    /// Returns `None` for names that are not valid UTF-8; those cannot be
    /// stored in the JSON manifest without loss.
    pub fn from_relative_path(rel: &Path) -> Option<Self> {
        let mut parts = Vec::new();
        for component in rel.components() {
            match component {
                std::path::Component::Normal(name) => parts.push(name.to_str()?),
                std::path::Component::CurDir => {}
                _ => return None,
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(RelPath(parts.join("/")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve against a root directory.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        let mut full = root.to_path_buf();
        full.extend(self.0.split('/'));
        full
    }

    /// Path relative to `prefix`, if `self` is strictly underneath it.
    pub fn strip_prefix(&self, prefix: &RelPath) -> Option<RelPath> {
        let rest = self.0.strip_prefix(prefix.as_str())?;
        let rest = rest.strip_prefix('/')?;
        Some(RelPath(rest.to_string()))
    }

    /// `base/self`, or `self` when there is no base.
    pub fn rebase(&self, base: Option<&RelPath>) -> RelPath {
        match base {
            Some(base) => RelPath(format!("{}/{}", base.0, self.0)),
            None => self.clone(),
        }
    }
}

impl TryFrom<String> for RelPath {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let normalized = path::normalize_relative(&value)?;
        if normalized != value {
            return Err(format!("path {:?} is not normalized", value));
        }
        Ok(RelPath(value))
    }
}

impl From<RelPath> for String {
    fn from(value: RelPath) -> Self {
        value.0
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Modification time in nanoseconds since the Unix epoch.
///
/// Compared with exact equality; no tolerance window is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mtime(pub i64);

impl Mtime {
    pub fn from_system_time(time: SystemTime) -> Self {
        let nanos = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => i64::try_from(after.as_nanos()).unwrap_or(i64::MAX),
            Err(before) => i64::try_from(before.duration().as_nanos())
                .map(|n| -n)
                .unwrap_or(i64::MIN),
        };
        Mtime(nanos)
    }
}

impl fmt::Display for Mtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.0.div_euclid(1_000_000_000);
        let nanos = self.0.rem_euclid(1_000_000_000) as u32;
        match chrono::DateTime::from_timestamp(secs, nanos) {
            Some(dt) => write!(
                f,
                "{}",
                dt.to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
            ),
            None => write!(f, "{}ns", self.0),
        }
    }
}

/// SHA-512 digest of a file's full content.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentHash(pub [u8; HASH_LEN]);

impl ContentHash {
    /// Parse 128 hex characters (either case).
    pub fn from_hex(text: &str) -> Result<Self, String> {
        if text.len() != HASH_LEN * 2 {
            return Err(format!(
                "expected {} hex characters, found {}",
                HASH_LEN * 2,
                text.len()
            ));
        }
        let mut bytes = [0u8; HASH_LEN];
        hex::decode_to_slice(text, &mut bytes).map_err(|e| format!("invalid hash: {}", e))?;
        Ok(ContentHash(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl TryFrom<String> for ContentHash {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ContentHash::from_hex(&value)
    }
}

impl From<ContentHash> for String {
    fn from(value: ContentHash) -> Self {
        value.to_hex()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({}…)", &self.to_hex()[..16])
    }
}

/// On-disk metadata observed for one regular file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStat {
    pub size: u64,
    pub mtime: Mtime,
    /// Permission bits, when the platform reports them.
    pub mode: Option<u32>,
}

impl FileStat {
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        let mtime = metadata
            .modified()
            .map(Mtime::from_system_time)
            .unwrap_or(Mtime(0));
        Self {
            size: metadata.len(),
            mtime,
            mode: permission_bits(metadata),
        }
    }
}

#[cfg(unix)]
fn permission_bits(metadata: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(metadata.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
fn permission_bits(_metadata: &std::fs::Metadata) -> Option<u32> {
    None
}
