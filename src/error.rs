//! Error types for decoding and loading map bundles.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Why a single line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorruptionKind {
    /// Wrong number of `;` separated fields.
    FieldCount { found: usize },
    /// A field that must be an integer is not one.
    InvalidNumber { field: usize },
    /// Tile offset lies outside the header's width/height.
    OutOfBounds,
    /// Body data arrived before the header was complete.
    HeaderIncomplete,
    /// Item, warp or annotation targets a cell without a tile.
    MissingTile,
    /// Annotation index points past the tile's item stack.
    MissingItem { index: usize, items: usize },
}

impl fmt::Display for CorruptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorruptionKind::FieldCount { found } => write!(f, "unexpected field count {found}"),
            CorruptionKind::InvalidNumber { field } => {
                write!(f, "field {} is not a valid integer", field + 1)
            }
            CorruptionKind::OutOfBounds => f.write_str("position outside of the map"),
            CorruptionKind::HeaderIncomplete => f.write_str("map header is not complete yet"),
            CorruptionKind::MissingTile => f.write_str("no tile at this position"),
            CorruptionKind::MissingItem { index, items } => {
                write!(f, "item index {index} exceeds the {items} item(s) on the tile")
            }
        }
    }
}

/// A line that does not match the grammar of its section.
///
/// Carries everything a diagnostic needs: which file of which map, the
/// offending text, its 1-based line number and the expected format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatCorrupted {
    pub map_path: PathBuf,
    pub map_name: String,
    pub file_suffix: &'static str,
    pub line: String,
    pub line_number: usize,
    pub expected: &'static str,
    pub kind: CorruptionKind,
}

impl FormatCorrupted {
    /// File the offending line came from.
    pub fn file_path(&self) -> PathBuf {
        self.map_path
            .join(format!("{}{}", self.map_name, self.file_suffix))
    }
}

impl fmt::Display for FormatCorrupted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} line {}: {}: `{}` (expected `{}`)",
            self.map_name, self.file_suffix, self.line_number, self.kind, self.line, self.expected
        )
    }
}

impl std::error::Error for FormatCorrupted {}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unsupported map format version {version}")]
    UnsupportedVersion { version: u32 },
    #[error("map format corrupted: {0}")]
    Corrupted(Box<FormatCorrupted>),
    #[error("decoder for map `{map_name}` already failed and accepts no more lines")]
    Aborted { map_name: String },
}

impl DecodeError {
    /// The corruption details, if this is a grammar error.
    pub fn corruption(&self) -> Option<&FormatCorrupted> {
        match self {
            DecodeError::Corrupted(c) => Some(&**c),
            _ => None,
        }
    }
}

impl From<FormatCorrupted> for DecodeError {
    fn from(c: FormatCorrupted) -> Self {
        DecodeError::Corrupted(Box::new(c))
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no `V:` format version in header of {}", .path.display())]
    MissingVersion { path: PathBuf },
    #[error("invalid format version `{value}` in {}", .path.display())]
    InvalidVersion { path: PathBuf, value: String },
    #[error("header of {} never completed (need L, X, Y, W and H)", .path.display())]
    IncompleteHeader { path: PathBuf },
    #[error("invalid config {}", .path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}
