//! Combined tile ID layout shared with the game's graphics module.
//
//   bit  15 ........ 10 9 ...... 5 4 ...... 0
//        |   shape    | overlay  |   base   |
//
// An ID only carries overlay information when shape bits are set;
// otherwise the whole value is the base tile.

pub const BASE_MASK: i32 = 0x001F;
pub const OVERLAY_MASK: i32 = 0x03E0;
pub const SHAPE_MASK: i32 = 0xFC00;

const OVERLAY_SHIFT: i32 = 5;
const SHAPE_SHIFT: i32 = 10;

#[inline]
pub fn has_overlay(id: i32) -> bool {
    id & SHAPE_MASK != 0
}

#[inline]
pub fn base_id(id: i32) -> i32 {
    if has_overlay(id) { id & BASE_MASK } else { id }
}

#[inline]
pub fn overlay_id(id: i32) -> i32 {
    if has_overlay(id) {
        (id & OVERLAY_MASK) >> OVERLAY_SHIFT
    } else {
        0
    }
}

#[inline]
pub fn shape_id(id: i32) -> i32 {
    if has_overlay(id) {
        (id & SHAPE_MASK) >> SHAPE_SHIFT
    } else {
        0
    }
}

/// Inverse of the three extractions above.
pub fn combine(base: i32, overlay: i32, shape: i32) -> i32 {
    if shape == 0 {
        return base;
    }
    ((shape << SHAPE_SHIFT) & SHAPE_MASK)
        | ((overlay << OVERLAY_SHIFT) & OVERLAY_MASK)
        | (base & BASE_MASK)
}
