//! Decoder for format version 2 map bundles.
//!
//! Decoding is a fold over lines: [`DecodeState::step`] takes the current
//! state and one line and returns the next state. [`Version2Decoder`] wraps
//! that fold behind the [`Decoder`] trait for the registry.
//
//  Grammar per file (fields separated by `;`):
//
//      tiles   header tokens `L: X: Y: W: H:` until complete, then
//              <dx>;<dy>;<tileID>;<musicID>
//      items   <dx>;<dy>;<item ID>;<quality>[;<data value>]*   (escape aware)
//      warps   <sx>;<sy>;<tx>;<ty>;<tz>
//      annot   <sx>;<sy>;<item index>;<annotation>
//
//  Lines starting with "# " and blank lines are skipped everywhere.

use std::str::FromStr;

use tracing::{debug, info};

use super::header::HeaderFields;
use super::lexer::split_escaped;
use super::{DataType, Decoder, DecoderContext};
use crate::error::{CorruptionKind, DecodeError, FormatCorrupted};
use crate::model::{Map, MapItem, MapTile, MapWarpPoint};

pub const VERSION: u32 = 2;

pub const COMMENT_MARKER: &str = "# ";

pub const HEADER_FORMAT: &str = "L: <level> X: <x> Y: <y> W: <width> H: <height>";

pub fn expected_format(data_type: DataType) -> &'static str {
    match data_type {
        DataType::Tiles => "<dx>;<dy>;<tileID>;<musicID>",
        DataType::Items => "<dx>;<dy>;<item ID>;<quality>[;<data value>]*",
        DataType::WarpPoints => "<sx>;<sy>;<tx>;<ty>;<tz>",
        DataType::Annotations => "<sx>;<sy>;<item index>;<annotation>",
    }
}

/// Comment and blank lines carry no data in any file.
pub fn is_skipped(line: &str) -> bool {
    line.starts_with(COMMENT_MARKER) || line.trim().is_empty()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeState {
    AwaitingHeader(HeaderFields),
    Active(Map),
}

impl Default for DecodeState {
    fn default() -> Self {
        DecodeState::AwaitingHeader(HeaderFields::default())
    }
}

impl DecodeState {
    pub fn map(&self) -> Option<&Map> {
        match self {
            DecodeState::Active(map) => Some(map),
            DecodeState::AwaitingHeader(_) => None,
        }
    }

    pub fn into_map(self) -> Option<Map> {
        match self {
            DecodeState::Active(map) => Some(map),
            DecodeState::AwaitingHeader(_) => None,
        }
    }

    /// Apply one line and return the resulting state.
    pub fn step(
        self,
        ctx: &DecoderContext,
        data_type: DataType,
        line: &str,
        line_number: usize,
    ) -> Result<Self, DecodeError> {
        if is_skipped(line) {
            return Ok(self);
        }
        let at = Line {
            ctx,
            data_type,
            text: line,
            number: line_number,
        };

        match self {
            DecodeState::AwaitingHeader(mut fields) => {
                if data_type != DataType::Tiles || line.contains(';') {
                    return Err(at.corrupted_as(HEADER_FORMAT, CorruptionKind::HeaderIncomplete));
                }
                fields.observe(line);
                match fields.complete() {
                    Some(header) => {
                        info!(
                            map = %ctx.map_name,
                            level = header.level,
                            x = header.origin_x,
                            y = header.origin_y,
                            width = header.width,
                            height = header.height,
                            "map header complete"
                        );
                        Ok(DecodeState::Active(Map::new(header)))
                    }
                    None => Ok(DecodeState::AwaitingHeader(fields)),
                }
            }
            DecodeState::Active(mut map) => {
                match data_type {
                    DataType::Tiles => decode_tile(&at, &mut map)?,
                    DataType::Items => decode_item(&at, &mut map)?,
                    DataType::WarpPoints => decode_warp(&at, &mut map)?,
                    DataType::Annotations => decode_annotation(&at, &mut map)?,
                }
                Ok(DecodeState::Active(map))
            }
        }
    }
}

/// Fold every line of one section into `state`. Numbers lines from 1.
pub fn decode_lines<'a, I>(
    state: DecodeState,
    ctx: &DecoderContext,
    data_type: DataType,
    lines: I,
) -> Result<DecodeState, DecodeError>
where
    I: IntoIterator<Item = &'a str>,
{
    lines
        .into_iter()
        .enumerate()
        .try_fold(state, |state, (i, line)| {
            state.step(ctx, data_type, line, i + 1)
        })
}

/// The line currently being decoded, for error reporting.
struct Line<'a> {
    ctx: &'a DecoderContext,
    data_type: DataType,
    text: &'a str,
    number: usize,
}

impl Line<'_> {
    fn corrupted_as(&self, expected: &'static str, kind: CorruptionKind) -> DecodeError {
        FormatCorrupted {
            map_path: self.ctx.map_path.clone(),
            map_name: self.ctx.map_name.clone(),
            file_suffix: self.data_type.suffix(),
            line: self.text.to_string(),
            line_number: self.number,
            expected,
            kind,
        }
        .into()
    }

    fn corrupted(&self, kind: CorruptionKind) -> DecodeError {
        self.corrupted_as(expected_format(self.data_type), kind)
    }

    fn expect_fields(&self, found: usize, ok: bool) -> Result<(), DecodeError> {
        if ok {
            Ok(())
        } else {
            Err(self.corrupted(CorruptionKind::FieldCount { found }))
        }
    }

    fn number<T: FromStr, S: AsRef<str>>(&self, fields: &[S], field: usize) -> Result<T, DecodeError> {
        fields[field]
            .as_ref()
            .trim()
            .parse()
            .map_err(|_| self.corrupted(CorruptionKind::InvalidNumber { field }))
    }

    /// A reference to something missing: an error when strict, else dropped.
    fn unresolved(&self, kind: CorruptionKind) -> Result<(), DecodeError> {
        if self.ctx.options.is_strict() {
            return Err(self.corrupted(kind));
        }
        debug!(
            map = %self.ctx.map_name,
            file = self.data_type.suffix(),
            line = self.number,
            reason = %kind,
            "dropping unresolved line"
        );
        Ok(())
    }
}

fn decode_tile(at: &Line, map: &mut Map) -> Result<(), DecodeError> {
    let fields: Vec<&str> = at.text.split(';').collect();
    at.expect_fields(fields.len(), fields.len() == 4)?;

    let x: i32 = at.number(&fields, 0)?;
    let y: i32 = at.number(&fields, 1)?;
    let tile_id: i32 = at.number(&fields, 2)?;
    let music_id: i32 = at.number(&fields, 3)?;

    if !map.contains(x, y) {
        return Err(at.corrupted(CorruptionKind::OutOfBounds));
    }
    map.set_tile_at(x, y, MapTile::from_combined(tile_id, music_id));
    Ok(())
}

fn decode_item(at: &Line, map: &mut Map) -> Result<(), DecodeError> {
    let fields = split_escaped(at.text);
    at.expect_fields(fields.len(), fields.len() >= 4)?;

    let x: i32 = at.number(&fields, 0)?;
    let y: i32 = at.number(&fields, 1)?;
    let item_id: i32 = at.number(&fields, 2)?;
    let quality: i32 = at.number(&fields, 3)?;

    let item = MapItem::new(item_id, quality, fields[4..].to_vec());
    if !map.add_item_at(x, y, item) {
        at.unresolved(CorruptionKind::MissingTile)?;
    }
    Ok(())
}

fn decode_warp(at: &Line, map: &mut Map) -> Result<(), DecodeError> {
    let fields: Vec<&str> = at.text.split(';').collect();
    at.expect_fields(fields.len(), fields.len() == 5)?;

    let x: i32 = at.number(&fields, 0)?;
    let y: i32 = at.number(&fields, 1)?;
    let warp = MapWarpPoint {
        target_x: at.number(&fields, 2)?,
        target_y: at.number(&fields, 3)?,
        target_z: at.number(&fields, 4)?,
    };

    if map.tile_at(x, y).is_none() {
        return at.unresolved(CorruptionKind::MissingTile);
    }
    map.set_warp_at(x, y, warp);
    Ok(())
}

fn decode_annotation(at: &Line, map: &mut Map) -> Result<(), DecodeError> {
    let fields: Vec<&str> = at.text.split(';').collect();
    at.expect_fields(fields.len(), fields.len() == 4)?;

    let x: i32 = at.number(&fields, 0)?;
    let y: i32 = at.number(&fields, 1)?;
    let index: usize = at.number(&fields, 2)?;
    let text = fields[3].to_string();

    let Some(tile) = map.tile_at_mut(x, y) else {
        return at.unresolved(CorruptionKind::MissingTile);
    };
    if index == 0 {
        tile.annotation = Some(text);
        return Ok(());
    }
    let items = tile.items.len();
    match tile.items.get_mut(index - 1) {
        Some(item) => item.annotation = Some(text),
        None => at.unresolved(CorruptionKind::MissingItem { index, items })?,
    }
    Ok(())
}

/// [`Decoder`] for version 2 bundles.
///
/// After a line fails the decoder keeps no map and refuses further input.
#[derive(Debug)]
pub struct Version2Decoder {
    ctx: DecoderContext,
    state: Option<DecodeState>,
}

impl Version2Decoder {
    pub fn new(ctx: DecoderContext) -> Self {
        Self {
            ctx,
            state: Some(DecodeState::default()),
        }
    }

    pub fn boxed(ctx: DecoderContext) -> Box<dyn Decoder> {
        Box::new(Self::new(ctx))
    }

    pub fn context(&self) -> &DecoderContext {
        &self.ctx
    }

    pub fn state(&self) -> Option<&DecodeState> {
        self.state.as_ref()
    }
}

impl Decoder for Version2Decoder {
    fn decode_line(
        &mut self,
        data_type: DataType,
        line: &str,
        line_number: usize,
    ) -> Result<(), DecodeError> {
        let state = self.state.take().ok_or_else(|| DecodeError::Aborted {
            map_name: self.ctx.map_name.clone(),
        })?;
        self.state = Some(state.step(&self.ctx, data_type, line, line_number)?);
        Ok(())
    }

    fn decoded_map(&self) -> Option<&Map> {
        self.state.as_ref()?.map()
    }

    fn into_map(self: Box<Self>) -> Option<Map> {
        self.state?.into_map()
    }

    fn version(&self) -> u32 {
        VERSION
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DecodeOptions;
    use crate::processor::tile_id;
    use std::path::PathBuf;

    const HEADER: &str = "V: 2\nL: 0\nX: 10\nY: 20\nW: 8\nH: 6";

    fn ctx(options: DecodeOptions) -> DecoderContext {
        DecoderContext {
            map_name: "test".into(),
            map_path: PathBuf::from("maps"),
            options,
        }
    }

    /// Helper: decode the tiles text, then each following section in order.
    fn decode(options: DecodeOptions, sections: &[(DataType, &str)]) -> Result<DecodeState, DecodeError> {
        let ctx = ctx(options);
        sections
            .iter()
            .try_fold(DecodeState::default(), |state, (dt, text)| {
                decode_lines(state, &ctx, *dt, text.lines())
            })
    }

    fn with_tiles(tiles: &str) -> String {
        format!("{HEADER}\n{tiles}")
    }

    fn corruption(err: DecodeError) -> FormatCorrupted {
        match err {
            DecodeError::Corrupted(c) => *c,
            other => panic!("expected corruption, got {other:?}"),
        }
    }

    #[test]
    fn test_header_gates_map_creation() {
        let ctx = ctx(DecodeOptions::default());
        let mut state = DecodeState::default();
        for line in ["V: 2", "L: 0", "X: 1 Y: 2", "W: 3", "X: 5", "# H: 9"] {
            state = state.step(&ctx, DataType::Tiles, line, 1).unwrap();
            assert!(state.map().is_none(), "map created early after {line:?}");
        }
        state = state.step(&ctx, DataType::Tiles, "H: 4", 7).unwrap();
        let header = *state.map().unwrap().header();
        assert_eq!((header.origin_x, header.origin_y), (5, 2));
        assert_eq!((header.width, header.height), (3, 4));
    }

    #[test]
    fn test_body_before_header_is_rejected() {
        let ctx = ctx(DecodeOptions::default());
        let state = DecodeState::default()
            .step(&ctx, DataType::Tiles, "L: 0", 1)
            .unwrap();

        let err = state
            .clone()
            .step(&ctx, DataType::Tiles, "0;0;1;0", 2)
            .unwrap_err();
        let c = corruption(err);
        assert_eq!(c.kind, CorruptionKind::HeaderIncomplete);
        assert_eq!(c.line_number, 2);
        assert_eq!(c.expected, HEADER_FORMAT);

        let cases = [
            (DataType::Items, "0;0;1;1", ".item.txt"),
            (DataType::WarpPoints, "0;0;1;2;3", ".warps.txt"),
            (DataType::Annotations, "0;0;0;note", ".annot.txt"),
        ];
        for (data_type, line, suffix) in cases {
            let err = state.clone().step(&ctx, data_type, line, 1).unwrap_err();
            let c = corruption(err);
            assert_eq!(c.kind, CorruptionKind::HeaderIncomplete, "{data_type}");
            assert_eq!(c.file_suffix, suffix);
        }
    }

    #[test]
    fn test_tiles_decompose_combined_id() {
        let combined = tile_id::combine(9, 4, 2);
        let tiles = with_tiles(&format!("0;0;{combined};3\n7;5;12;0"));
        let state = decode(DecodeOptions::default(), &[(DataType::Tiles, tiles.as_str())]).unwrap();
        let map = state.map().unwrap();

        let tile = map.tile_at(0, 0).unwrap();
        assert_eq!((tile.base_id, tile.overlay_id, tile.shape_id), (9, 4, 2));
        assert_eq!(tile.music_id, 3);
        assert_eq!(tile.combined_id(), combined);

        let tile = map.tile_at(7, 5).unwrap();
        assert_eq!((tile.base_id, tile.overlay_id, tile.shape_id), (12, 0, 0));
    }

    #[test]
    fn test_tile_last_write_wins() {
        let tiles = with_tiles("1;1;5;0\n1;1;6;2");
        let items = "1;1;100;10";
        let state = decode(
            DecodeOptions::default(),
            &[(DataType::Tiles, tiles.as_str()), (DataType::Items, items)],
        )
        .unwrap();
        let tile = state.map().unwrap().tile_at(1, 1).unwrap();
        assert_eq!((tile.base_id, tile.music_id), (6, 2));
        assert_eq!(tile.items.len(), 1);
    }

    #[test]
    fn test_tile_grammar_errors() {
        let cases = [
            ("0;0;1", CorruptionKind::FieldCount { found: 3 }),
            ("0;0;1;2;3", CorruptionKind::FieldCount { found: 5 }),
            ("0;a;1;2", CorruptionKind::InvalidNumber { field: 1 }),
            ("8;0;1;2", CorruptionKind::OutOfBounds),
            ("0;-1;1;2", CorruptionKind::OutOfBounds),
        ];
        for (line, kind) in cases {
            let tiles = with_tiles(line);
            let err = decode(DecodeOptions::default(), &[(DataType::Tiles, tiles.as_str())]).unwrap_err();
            let c = corruption(err);
            assert_eq!(c.kind, kind, "line {line:?}");
            assert_eq!(c.line_number, 7);
            assert_eq!(c.expected, expected_format(DataType::Tiles));
        }
    }

    #[test]
    fn test_items_stack_in_file_order() {
        let tiles = with_tiles("2;3;1;0");
        let items = "2;3;10;100\n# comment\n2;3;11;200;a=1;b=2\n\n2;3;12;300;x";
        let state = decode(
            DecodeOptions::default(),
            &[(DataType::Tiles, tiles.as_str()), (DataType::Items, items)],
        )
        .unwrap();
        let stack = &state.map().unwrap().tile_at(2, 3).unwrap().items;

        let ids: Vec<_> = stack.iter().map(|i| i.item_id).collect();
        assert_eq!(ids, vec![10, 11, 12]);
        let data_counts: Vec<_> = stack.iter().map(|i| i.data.len()).collect();
        assert_eq!(data_counts, vec![0, 2, 1]);
        assert_eq!(stack[1].quality, 200);
        assert_eq!(stack[1].data, vec!["a=1".to_string(), "b=2".to_string()]);
    }

    #[test]
    fn test_item_escaped_semicolon() {
        let tiles = with_tiles("0;0;1;0");
        let items = r#"0;0;100;50;"a\;b""#;
        let state = decode(
            DecodeOptions::default(),
            &[(DataType::Tiles, tiles.as_str()), (DataType::Items, items)],
        )
        .unwrap();
        let item = &state.map().unwrap().tile_at(0, 0).unwrap().items[0];
        assert_eq!(item.item_id, 100);
        assert_eq!(item.quality, 50);
        assert_eq!(item.data, vec![r#""a\;b""#.to_string()]);
    }

    #[test]
    fn test_item_needs_four_fields() {
        let tiles = with_tiles("0;0;1;0");
        let err = decode(
            DecodeOptions::default(),
            &[(DataType::Tiles, tiles.as_str()), (DataType::Items, "0;0;100")],
        )
        .unwrap_err();
        let c = corruption(err);
        assert_eq!(c.kind, CorruptionKind::FieldCount { found: 3 });
        assert_eq!(c.expected, expected_format(DataType::Items));
    }

    #[test]
    fn test_item_on_missing_tile() {
        let tiles = with_tiles("0;0;1;0");
        let sections = [(DataType::Tiles, tiles.as_str()), (DataType::Items, "4;4;100;1")];

        let err = decode(DecodeOptions::default(), &sections).unwrap_err();
        assert_eq!(corruption(err).kind, CorruptionKind::MissingTile);

        let state = decode(DecodeOptions::lenient(), &sections).unwrap();
        let map = state.map().unwrap();
        assert!(map.tile_at(4, 4).is_none());
        assert!(map.tile_at(0, 0).unwrap().items.is_empty());
    }

    #[test]
    fn test_warps() {
        let tiles = with_tiles("1;1;1;0\n2;2;1;0");
        let warps = "1;1;100;200;0\n1;1;300;400;-1\n2;2;5;6;7";
        let state = decode(
            DecodeOptions::default(),
            &[(DataType::Tiles, tiles.as_str()), (DataType::WarpPoints, warps)],
        )
        .unwrap();
        let map = state.map().unwrap();
        assert_eq!(map.warp_count(), 2);
        assert_eq!(
            map.warp_at(1, 1),
            Some(&MapWarpPoint {
                target_x: 300,
                target_y: 400,
                target_z: -1
            })
        );
    }

    #[test]
    fn test_warp_field_count_reports_line() {
        let tiles = with_tiles("1;1;1;0");
        for bad in ["1;1;100;200", "1;1;100;200;0;9"] {
            let warps = format!("# warps\n1;1;2;3;4\n{bad}");
            let err = decode(
                DecodeOptions::default(),
                &[(DataType::Tiles, tiles.as_str()), (DataType::WarpPoints, warps.as_str())],
            )
            .unwrap_err();
            let c = corruption(err);
            assert_eq!(c.line_number, 3);
            assert_eq!(c.line, bad);
            assert_eq!(c.expected, "<sx>;<sy>;<tx>;<ty>;<tz>");
            assert_eq!(c.file_suffix, ".warps.txt");
        }
    }

    #[test]
    fn test_warp_on_missing_tile() {
        let tiles = with_tiles("1;1;1;0");
        let sections = [(DataType::Tiles, tiles.as_str()), (DataType::WarpPoints, "3;3;1;2;3")];
        assert!(decode(DecodeOptions::default(), &sections).is_err());
        let state = decode(DecodeOptions::lenient(), &sections).unwrap();
        assert_eq!(state.map().unwrap().warp_count(), 0);
    }

    #[test]
    fn test_annotation_indexing() {
        let tiles = with_tiles("0;0;1;0");
        let items = "0;0;10;1\n0;0;11;1";
        let annot = "0;0;0;tile note\n0;0;1;first\n0;0;2;second";
        let state = decode(
            DecodeOptions::default(),
            &[
                (DataType::Tiles, tiles.as_str()),
                (DataType::Items, items),
                (DataType::Annotations, annot),
            ],
        )
        .unwrap();
        let tile = state.map().unwrap().tile_at(0, 0).unwrap();
        assert_eq!(tile.annotation.as_deref(), Some("tile note"));
        assert_eq!(tile.items[0].annotation.as_deref(), Some("first"));
        assert_eq!(tile.items[1].annotation.as_deref(), Some("second"));
    }

    #[test]
    fn test_annotation_out_of_range() {
        let tiles = with_tiles("0;0;1;0");
        let sections = [
            (DataType::Tiles, tiles.as_str()),
            (DataType::Items, "0;0;10;1"),
            (DataType::Annotations, "0;0;2;nothing there"),
        ];

        let err = decode(DecodeOptions::default(), &sections).unwrap_err();
        assert_eq!(
            corruption(err).kind,
            CorruptionKind::MissingItem { index: 2, items: 1 }
        );

        let state = decode(DecodeOptions::lenient(), &sections).unwrap();
        let tile = state.map().unwrap().tile_at(0, 0).unwrap();
        assert!(tile.annotation.is_none());
        assert!(tile.items[0].annotation.is_none());
    }

    #[test]
    fn test_annotation_field_count() {
        let tiles = with_tiles("0;0;1;0");
        let err = decode(
            DecodeOptions::default(),
            &[(DataType::Tiles, tiles.as_str()), (DataType::Annotations, "0;0;0;a;b")],
        )
        .unwrap_err();
        assert_eq!(corruption(err).kind, CorruptionKind::FieldCount { found: 5 });
    }

    #[test]
    fn test_comments_skipped_in_every_state() {
        let ctx = ctx(DecodeOptions::default());
        let comment = "# 0;0;garbage;;;";

        let awaiting = DecodeState::default();
        for dt in DataType::ALL {
            let next = awaiting.clone().step(&ctx, dt, comment, 1).unwrap();
            assert_eq!(next, awaiting);
        }

        let tiles = with_tiles("0;0;1;0");
        let active = decode(DecodeOptions::default(), &[(DataType::Tiles, tiles.as_str())]).unwrap();
        for dt in DataType::ALL {
            let next = active.clone().step(&ctx, dt, comment, 1).unwrap();
            assert_eq!(next, active);
        }
    }

    #[test]
    fn test_decoder_aborts_after_error() {
        let mut decoder = Version2Decoder::new(ctx(DecodeOptions::default()));
        for (i, line) in HEADER.lines().enumerate() {
            decoder.decode_line(DataType::Tiles, line, i + 1).unwrap();
        }
        assert!(decoder.decoded_map().is_some());

        assert!(decoder.decode_line(DataType::Tiles, "0;0", 7).is_err());
        assert!(decoder.decoded_map().is_none());
        assert!(matches!(
            decoder.decode_line(DataType::Tiles, "0;0;1;0", 8),
            Err(DecodeError::Aborted { .. })
        ));
    }
}
