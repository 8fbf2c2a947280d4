//! Component 2 – the decoding core.
//!
//! A map is stored as four text files; each file's lines are streamed
//! through a [`Decoder`] chosen by the map's format version.
pub mod header;
pub mod lexer;
pub mod map_parser;
pub mod registry;
pub mod tile_id;

use std::fmt;
use std::path::PathBuf;

use crate::config::DecodeOptions;
use crate::error::DecodeError;
use crate::model::Map;

pub use map_parser::{DecodeState, Version2Decoder};
pub use registry::{DecoderRegistry, get_decoder};

/// Which file of a map bundle a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Tiles,
    Items,
    WarpPoints,
    Annotations,
}

impl DataType {
    /// Files in the order they have to be fed to a decoder.
    pub const ALL: [DataType; 4] = [
        DataType::Tiles,
        DataType::Items,
        DataType::WarpPoints,
        DataType::Annotations,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            DataType::Tiles => ".tiles.txt",
            DataType::Items => ".item.txt",
            DataType::WarpPoints => ".warps.txt",
            DataType::Annotations => ".annot.txt",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Tiles => "tiles",
            DataType::Items => "items",
            DataType::WarpPoints => "warps",
            DataType::Annotations => "annotations",
        };
        f.write_str(name)
    }
}

/// What a decoder knows about the map it is building.
#[derive(Debug, Clone)]
pub struct DecoderContext {
    pub map_name: String,
    pub map_path: PathBuf,
    pub options: DecodeOptions,
}

/// One format version's line decoder.
///
/// Instances are single-use: one per map load. Lines of the tiles file
/// must come first since they carry the header.
pub trait Decoder {
    /// Feed one line of the given section. `line_number` is 1-based.
    fn decode_line(
        &mut self,
        data_type: DataType,
        line: &str,
        line_number: usize,
    ) -> Result<(), DecodeError>;

    /// The map built so far, `None` until the header is complete.
    fn decoded_map(&self) -> Option<&Map>;

    /// Hand the map over to the caller.
    fn into_map(self: Box<Self>) -> Option<Map>;

    fn version(&self) -> u32;
}
