//! In-memory map as produced by the decoders.
//!
//! Positions are local offsets relative to the header's origin; use
//! [`Map::to_world`] to get world coordinates.

use std::collections::BTreeMap;

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

use crate::processor::tile_id;

/// Completed map header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapHeader {
    pub level: i32,
    pub origin_x: i32,
    pub origin_y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapItem {
    pub item_id: i32,
    /// Opaque data values, escape sequences kept as written.
    pub data: Vec<String>,
    pub quality: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl MapItem {
    pub fn new(item_id: i32, quality: i32, data: Vec<String>) -> Self {
        Self {
            item_id,
            data,
            quality,
            annotation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapTile {
    pub base_id: i32,
    pub overlay_id: i32,
    pub shape_id: i32,
    pub music_id: i32,
    /// Item stack in file order.
    pub items: Vec<MapItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<String>,
}

impl MapTile {
    /// Build a tile from the combined ID stored in map files.
    pub fn from_combined(combined: i32, music_id: i32) -> Self {
        Self {
            base_id: tile_id::base_id(combined),
            overlay_id: tile_id::overlay_id(combined),
            shape_id: tile_id::shape_id(combined),
            music_id,
            items: Vec::new(),
            annotation: None,
        }
    }

    pub fn combined_id(&self) -> i32 {
        tile_id::combine(self.base_id, self.overlay_id, self.shape_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MapWarpPoint {
    pub target_x: i32,
    pub target_y: i32,
    pub target_z: i32,
}

/// Row-major key: sorting by `(y, x)` walks the map line by line.
type CellKey = (i32, i32);

#[inline]
fn key(x: i32, y: i32) -> CellKey {
    (y, x)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Map {
    header: MapHeader,
    tiles: BTreeMap<CellKey, MapTile>,
    warps: BTreeMap<CellKey, MapWarpPoint>,
}

impl Map {
    pub fn new(header: MapHeader) -> Self {
        Self {
            header,
            tiles: BTreeMap::new(),
            warps: BTreeMap::new(),
        }
    }

    pub fn header(&self) -> &MapHeader {
        &self.header
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    /// Whether a local offset lies inside the declared extents.
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as u32) < self.header.width && (y as u32) < self.header.height
    }

    /// World position of a local offset, `None` if it does not fit in `i32`.
    pub fn to_world(&self, x: i32, y: i32) -> Option<(i32, i32, i32)> {
        Some((
            self.header.origin_x.checked_add(x)?,
            self.header.origin_y.checked_add(y)?,
            self.header.level,
        ))
    }

    pub fn tile_at(&self, x: i32, y: i32) -> Option<&MapTile> {
        self.tiles.get(&key(x, y))
    }

    pub fn tile_at_mut(&mut self, x: i32, y: i32) -> Option<&mut MapTile> {
        self.tiles.get_mut(&key(x, y))
    }

    /// Store a tile, replacing whatever was there. Returns the old tile.
    pub fn set_tile_at(&mut self, x: i32, y: i32, tile: MapTile) -> Option<MapTile> {
        self.tiles.insert(key(x, y), tile)
    }

    /// Push an item on top of the stack at `(x, y)`.
    ///
    /// Returns `false` and drops the item when there is no tile there.
    pub fn add_item_at(&mut self, x: i32, y: i32, item: MapItem) -> bool {
        match self.tiles.get_mut(&key(x, y)) {
            Some(tile) => {
                tile.items.push(item);
                true
            }
            None => false,
        }
    }

    /// Set the warp leaving `(x, y)`, replacing any previous one.
    pub fn set_warp_at(&mut self, x: i32, y: i32, warp: MapWarpPoint) -> Option<MapWarpPoint> {
        self.warps.insert(key(x, y), warp)
    }

    pub fn warp_at(&self, x: i32, y: i32) -> Option<&MapWarpPoint> {
        self.warps.get(&key(x, y))
    }

    /// Present tiles in row-major order as `(x, y, tile)`.
    pub fn tiles(&self) -> impl Iterator<Item = (i32, i32, &MapTile)> {
        self.tiles.iter().map(|(&(y, x), t)| (x, y, t))
    }

    /// Warp points in row-major order of their source cell.
    pub fn warps(&self) -> impl Iterator<Item = (i32, i32, &MapWarpPoint)> {
        self.warps.iter().map(|(&(y, x), w)| (x, y, w))
    }

    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    pub fn warp_count(&self) -> usize {
        self.warps.len()
    }
}

#[derive(Serialize)]
struct PlacedTile<'a> {
    x: i32,
    y: i32,
    #[serde(flatten)]
    tile: &'a MapTile,
}

#[derive(Serialize)]
struct PlacedWarp<'a> {
    x: i32,
    y: i32,
    #[serde(flatten)]
    warp: &'a MapWarpPoint,
}

impl Serialize for Map {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tiles: Vec<_> = self
            .tiles()
            .map(|(x, y, tile)| PlacedTile { x, y, tile })
            .collect();
        let warps: Vec<_> = self
            .warps()
            .map(|(x, y, warp)| PlacedWarp { x, y, warp })
            .collect();

        let mut s = serializer.serialize_struct("Map", 3)?;
        s.serialize_field("header", &self.header)?;
        s.serialize_field("tiles", &tiles)?;
        s.serialize_field("warps", &warps)?;
        s.end()
    }
}
