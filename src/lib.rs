pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod processor;
pub mod writer;

use anyhow::Context;
use clap::Parser;

use crate::config::{DecodeOptions, Strictness};

pub fn run() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // 1. ── Options ────────────────────────────────────────────────────
    let mut options = match &args.config {
        Some(path) => DecodeOptions::from_file(path)
            .with_context(|| format!("Loading options from {}", path.display()))?,
        None => DecodeOptions::default(),
    };
    if args.lenient {
        options.strictness = Strictness::Lenient;
    }

    // 2. ── Decode ─────────────────────────────────────────────────────
    let bundle = parser::MapBundle::new(&args.dir, &args.name);
    let map = parser::load_bundle(&bundle, options)
        .with_context(|| format!("Loading map `{}` from {}", args.name, args.dir.display()))?;

    let h = map.header();
    println!(
        "{}: level {} at ({}, {}), {}x{}, {} tiles, {} warps",
        args.name,
        h.level,
        h.origin_x,
        h.origin_y,
        h.width,
        h.height,
        map.tile_count(),
        map.warp_count()
    );

    // 3. ── Write outputs ──────────────────────────────────────────────
    if let Some(path) = &args.json {
        writer::json::emit(&map, path)
            .with_context(|| format!("Writing {}", path.display()))?;
    }
    if let Some(dir) = &args.reencode {
        writer::bundle::emit(&map, dir, &args.name)
            .with_context(|| format!("Writing bundle to {}", dir.display()))?;
    }

    Ok(())
}
