//! Header accumulation for the tiles section.
//
//  Header lines carry free-form `KEY: value` tokens, e.g.
//
//      V: 2
//      L: 0
//      X: -15 Y: 240
//      W: 100 H: 80
//
//  Each key is matched on its own, so tokens may appear in any order and
//  be spread over any number of lines.

use crate::model::MapHeader;

/// Find `<key>: <integer>` in `line` and return the integer text.
///
/// The key must start a word, so `XL: 3` does not match `L`. Spaces after
/// the colon are optional. A leading `-` is kept only when `signed`.
pub fn scan_token(line: &str, key: char, signed: bool) -> Option<&str> {
    let bytes = line.as_bytes();
    let mut prev: Option<char> = None;

    for (i, c) in line.char_indices() {
        let at_word_start = prev.is_none_or(|p| !p.is_ascii_alphanumeric());
        prev = Some(c);
        if c != key || !at_word_start || bytes.get(i + 1) != Some(&b':') {
            continue;
        }

        let rest = &line[i + 2..];
        let value = rest.trim_start_matches([' ', '\t']);
        let sign = usize::from(signed && value.starts_with('-'));
        let digits = value[sign..]
            .bytes()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if digits > 0 {
            return Some(&value[..sign + digits]);
        }
    }
    None
}

/// Header fields seen so far; complete once all five are known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderFields {
    pub level: Option<i32>,
    pub origin_x: Option<i32>,
    pub origin_y: Option<i32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl HeaderFields {
    /// Record every header token found in `line`. Later values win.
    ///
    /// Returns whether anything was recognised.
    pub fn observe(&mut self, line: &str) -> bool {
        let mut seen = false;
        let mut take_i32 = |key, slot: &mut Option<i32>| {
            if let Some(v) = scan_token(line, key, true).and_then(|t| t.parse().ok()) {
                *slot = Some(v);
                seen = true;
            }
        };
        take_i32('L', &mut self.level);
        take_i32('X', &mut self.origin_x);
        take_i32('Y', &mut self.origin_y);

        let mut take_u32 = |key, slot: &mut Option<u32>| {
            if let Some(v) = scan_token(line, key, false).and_then(|t| t.parse().ok()) {
                *slot = Some(v);
                seen = true;
            }
        };
        take_u32('W', &mut self.width);
        take_u32('H', &mut self.height);

        seen
    }

    pub fn complete(&self) -> Option<MapHeader> {
        Some(MapHeader {
            level: self.level?,
            origin_x: self.origin_x?,
            origin_y: self.origin_y?,
            width: self.width?,
            height: self.height?,
        })
    }
}
