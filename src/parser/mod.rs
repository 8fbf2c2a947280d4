//! Component 1 – reading a map bundle from disk.
//!
//! A bundle named `town` in `maps/` consists of
//!   • maps/town.tiles.txt   (required, carries the header)
//!   • maps/town.item.txt
//!   • maps/town.warps.txt
//!   • maps/town.annot.txt
//!
//! Missing optional files count as empty.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::DecodeOptions;
use crate::error::LoadError;
use crate::model::Map;
use crate::processor::header::scan_token;
use crate::processor::map_parser::is_skipped;
use crate::processor::{DataType, Decoder, DecoderRegistry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapBundle {
    pub dir: PathBuf,
    pub name: String,
}

impl MapBundle {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    pub fn path(&self, data_type: DataType) -> PathBuf {
        self.dir.join(format!("{}{}", self.name, data_type.suffix()))
    }

    /// Read one file; `Ok(None)` if an optional file does not exist.
    fn read(&self, data_type: DataType) -> Result<Option<String>, LoadError> {
        let path = self.path(data_type);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound && data_type != DataType::Tiles => {
                warn!(path = %path.display(), "{data_type} file missing, treating as empty");
                Ok(None)
            }
            Err(source) => Err(LoadError::Io { path, source }),
        }
    }
}

/// Find the `V: <n>` format version in the header of a tiles file.
///
/// Only lines before the first body line (one containing `;`) are searched.
pub fn detect_version(tiles: &str, path: &Path) -> Result<u32, LoadError> {
    for line in tiles.lines() {
        if is_skipped(line) {
            continue;
        }
        if line.contains(';') {
            break;
        }
        if let Some(value) = scan_token(line, 'V', true) {
            return value.parse().map_err(|_| LoadError::InvalidVersion {
                path: path.to_path_buf(),
                value: value.to_string(),
            });
        }
    }
    Err(LoadError::MissingVersion {
        path: path.to_path_buf(),
    })
}

/// Load a bundle using the built-in decoders.
pub fn load_bundle(bundle: &MapBundle, options: DecodeOptions) -> Result<Map, LoadError> {
    load_bundle_with(DecoderRegistry::global(), bundle, options)
}

pub fn load_bundle_with(
    registry: &DecoderRegistry,
    bundle: &MapBundle,
    options: DecodeOptions,
) -> Result<Map, LoadError> {
    let tiles_path = bundle.path(DataType::Tiles);
    let tiles = bundle.read(DataType::Tiles)?.unwrap_or_default();
    let version = detect_version(&tiles, &tiles_path)?;
    info!(map = %bundle.name, version, "loading map bundle");

    let mut decoder = registry.get_decoder(version, &bundle.name, &bundle.dir, options)?;

    feed(decoder.as_mut(), DataType::Tiles, &tiles)?;
    for data_type in &DataType::ALL[1..] {
        if let Some(text) = bundle.read(*data_type)? {
            feed(decoder.as_mut(), *data_type, &text)?;
        }
    }

    let map = decoder
        .into_map()
        .ok_or(LoadError::IncompleteHeader { path: tiles_path })?;
    info!(
        map = %bundle.name,
        tiles = map.tile_count(),
        warps = map.warp_count(),
        "map bundle loaded"
    );
    Ok(map)
}

fn feed(decoder: &mut dyn Decoder, data_type: DataType, text: &str) -> Result<(), LoadError> {
    let mut count = 0;
    for (i, line) in text.lines().enumerate() {
        decoder.decode_line(data_type, line, i + 1)?;
        count += 1;
    }
    debug!(lines = count, "fed {data_type}");
    Ok(())
}
