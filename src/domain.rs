use std::fmt;
use std::str::FromStr;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::ArchiveError;

/// Comic identifier as assigned by the remote feed: a positive integer,
/// monotonically increasing at the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComicId(u32);

impl ComicId {
    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Zero-padded file stem. Fixed width 4, widening automatically once ids
    /// reach five digits.
    pub fn padded(self) -> String {
        format!("{:04}", self.0)
    }
}

impl fmt::Display for ComicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ComicId {
    type Err = ArchiveError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let parsed = trimmed
            .parse::<u32>()
            .map_err(|_| ArchiveError::InvalidComicId(value.to_string()))?;
        if parsed == 0 {
            return Err(ArchiveError::InvalidComicId(value.to_string()));
        }
        Ok(Self(parsed))
    }
}

/// Metadata for one fetched comic. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComicRecord {
    pub id: ComicId,
    pub title: String,
    pub image: String,
}

/// Three-level bucket location for a comic id: nested closed ranges of width
/// 1000, 100 and 10. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketPath {
    pub thousands: (u32, u32),
    pub hundreds: (u32, u32),
    pub tens: (u32, u32),
}

impl BucketPath {
    /// Pure function of the id. Ranges are 1-based, contiguous and
    /// non-overlapping: id 1 lands in 0001-1000/0001-0100/0001-0010.
    pub fn for_id(id: ComicId) -> Self {
        let n = id.get();
        let l1 = (n - 1) / 1000 * 1000 + 1;
        let l2 = l1 + (n - l1) / 100 * 100;
        let l3 = l2 + (n - l2) / 10 * 10;
        Self {
            thousands: (l1, l1 + 999),
            hundreds: (l2, l2 + 99),
            tens: (l3, l3 + 9),
        }
    }

    pub fn segments(&self) -> [String; 3] {
        [
            format!("{:04}-{:04}", self.thousands.0, self.thousands.1),
            format!("{:04}-{:04}", self.hundreds.0, self.hundreds.1),
            format!("{:04}-{:04}", self.tens.0, self.tens.1),
        ]
    }

    /// Directory path relative to the archive root.
    pub fn relative_dir(&self) -> Utf8PathBuf {
        let [l1, l2, l3] = self.segments();
        Utf8PathBuf::from(l1).join(l2).join(l3)
    }
}
