//! Decoder configuration.
//!
//! Options can be built in code or read from a small TOML file:
//!
//! ```toml
//! strictness = "lenient"
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::LoadError;

/// How to treat lines that reference something that does not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strictness {
    /// Items, warps and annotations on a missing tile, and annotations past
    /// the end of an item stack, are corruption errors.
    #[default]
    Strict,
    /// Such lines are dropped silently, as older editors did.
    Lenient,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    pub strictness: Strictness,
}

impl DecodeOptions {
    pub fn lenient() -> Self {
        Self {
            strictness: Strictness::Lenient,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strictness == Strictness::Strict
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text).map_err(|source| LoadError::Config {
            path: path.to_path_buf(),
            source,
        })
    }
}
