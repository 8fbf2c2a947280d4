//! Write a map back out as a version 2 bundle.
//!
//! The output decodes to an equal [`Map`]; values that cannot be expressed
//! in the line format are rejected with `InvalidData`.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::model::Map;
use crate::processor::DataType;
use crate::processor::lexer::split_escaped;
use crate::processor::map_parser::VERSION;

fn invalid(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

fn check_line_safe(what: &str, value: &str) -> io::Result<()> {
    if value.contains(['\n', '\r']) {
        return Err(invalid(format!("{what} `{value}` contains a line break")));
    }
    Ok(())
}

/// A data value must come back as exactly itself when split again.
fn check_data_value(value: &str) -> io::Result<()> {
    check_line_safe("item data", value)?;
    if split_escaped(&format!("{value};")) != [value] {
        return Err(invalid(format!(
            "item data `{value}` is empty or has an unescaped `;` or trailing `\\`"
        )));
    }
    Ok(())
}

pub fn encode_tiles<W: Write>(map: &Map, out: &mut W) -> io::Result<()> {
    let h = map.header();
    writeln!(out, "V: {VERSION}")?;
    writeln!(out, "L: {}", h.level)?;
    writeln!(out, "X: {}", h.origin_x)?;
    writeln!(out, "Y: {}", h.origin_y)?;
    writeln!(out, "W: {}", h.width)?;
    writeln!(out, "H: {}", h.height)?;
    for (x, y, tile) in map.tiles() {
        writeln!(out, "{x};{y};{};{}", tile.combined_id(), tile.music_id)?;
    }
    Ok(())
}

pub fn encode_items<W: Write>(map: &Map, out: &mut W) -> io::Result<()> {
    for (x, y, tile) in map.tiles() {
        for item in &tile.items {
            write!(out, "{x};{y};{};{}", item.item_id, item.quality)?;
            for value in &item.data {
                check_data_value(value)?;
                write!(out, ";{value}")?;
            }
            writeln!(out)?;
        }
    }
    Ok(())
}

pub fn encode_warps<W: Write>(map: &Map, out: &mut W) -> io::Result<()> {
    for (x, y, warp) in map.warps() {
        writeln!(
            out,
            "{x};{y};{};{};{}",
            warp.target_x, warp.target_y, warp.target_z
        )?;
    }
    Ok(())
}

fn write_annotation<W: Write>(out: &mut W, x: i32, y: i32, index: usize, text: &str) -> io::Result<()> {
    check_line_safe("annotation", text)?;
    if text.contains(';') {
        return Err(invalid(format!("annotation `{text}` contains `;`")));
    }
    writeln!(out, "{x};{y};{index};{text}")
}

pub fn encode_annotations<W: Write>(map: &Map, out: &mut W) -> io::Result<()> {
    for (x, y, tile) in map.tiles() {
        if let Some(text) = &tile.annotation {
            write_annotation(out, x, y, 0, text)?;
        }
        for (i, item) in tile.items.iter().enumerate() {
            if let Some(text) = &item.annotation {
                write_annotation(out, x, y, i + 1, text)?;
            }
        }
    }
    Ok(())
}

/// Write all four files of `name` into `dir`.
///
/// Every file is encoded before any is written, so a value that cannot be
/// represented leaves `dir` untouched.
pub fn emit(map: &Map, dir: &Path, name: &str) -> io::Result<()> {
    let mut files = Vec::with_capacity(DataType::ALL.len());
    for data_type in DataType::ALL {
        let mut buf = Vec::new();
        match data_type {
            DataType::Tiles => encode_tiles(map, &mut buf)?,
            DataType::Items => encode_items(map, &mut buf)?,
            DataType::WarpPoints => encode_warps(map, &mut buf)?,
            DataType::Annotations => encode_annotations(map, &mut buf)?,
        }
        files.push((data_type, buf));
    }

    fs::create_dir_all(dir)?;
    for (data_type, buf) in files {
        let path = dir.join(format!("{name}{}", data_type.suffix()));
        debug!(path = %path.display(), bytes = buf.len(), "writing {data_type}");
        fs::write(&path, buf)?;
    }
    Ok(())
}
