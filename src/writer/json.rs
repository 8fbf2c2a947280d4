//! Dump a decoded map as pretty JSON.

use crate::model::Map;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

pub fn emit(map: &Map, path: &Path) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, map)?;
    writeln!(out)?;
    out.flush()
}
