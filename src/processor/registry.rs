//! Format version -> decoder table.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use super::map_parser::{self, Version2Decoder};
use super::{Decoder, DecoderContext};
use crate::config::DecodeOptions;
use crate::error::DecodeError;

pub type DecoderCtor = fn(DecoderContext) -> Box<dyn Decoder>;

static GLOBAL: OnceLock<DecoderRegistry> = OnceLock::new();

#[derive(Debug, Clone, Default)]
pub struct DecoderRegistry {
    ctors: BTreeMap<u32, DecoderCtor>,
}

impl DecoderRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Registry with every format version this crate can read.
    pub fn with_builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(map_parser::VERSION, Version2Decoder::boxed);
        registry
    }

    /// Process-wide registry of the built-in versions.
    pub fn global() -> &'static DecoderRegistry {
        GLOBAL.get_or_init(Self::with_builtin)
    }

    /// Add or replace the decoder for `version`.
    pub fn register(&mut self, version: u32, ctor: DecoderCtor) -> Option<DecoderCtor> {
        self.ctors.insert(version, ctor)
    }

    pub fn supports(&self, version: u32) -> bool {
        self.ctors.contains_key(&version)
    }

    pub fn versions(&self) -> impl Iterator<Item = u32> + '_ {
        self.ctors.keys().copied()
    }

    pub fn get_decoder(
        &self,
        version: u32,
        map_name: &str,
        map_path: &Path,
        options: DecodeOptions,
    ) -> Result<Box<dyn Decoder>, DecodeError> {
        let ctor = self
            .ctors
            .get(&version)
            .ok_or(DecodeError::UnsupportedVersion { version })?;
        Ok(ctor(DecoderContext {
            map_name: map_name.to_string(),
            map_path: map_path.to_path_buf(),
            options,
        }))
    }
}

/// Decoder for `version` from the global registry, with default options.
pub fn get_decoder(
    version: u32,
    map_name: &str,
    map_path: &Path,
) -> Result<Box<dyn Decoder>, DecodeError> {
    DecoderRegistry::global().get_decoder(version, map_name, map_path, DecodeOptions::default())
}
