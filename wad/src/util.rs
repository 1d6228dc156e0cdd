use super::types::{ChildId, VertexId, WadCoord, NO_INDEX};
use math::Pnt2f;

const CHILD_IS_LEAF: ChildId = 0x8000;
const VERTEX_IS_GL: VertexId = 0x8000;

pub fn from_wad_coords(x: WadCoord, y: WadCoord) -> Pnt2f {
    Pnt2f::new(f32::from(x), f32::from(y))
}

/// Converts a 16.16 fixed point coordinate.
pub fn from_fixed(value: i32) -> f32 {
    value as f32 / 65536.0
}

pub fn from_wad_light(light: i16) -> f32 {
    f32::from(light) / 256.0
}

/// Returns `(index, is_leaf)`.
pub fn parse_child_id(id: ChildId) -> (usize, bool) {
    ((id & !CHILD_IS_LEAF) as usize, id & CHILD_IS_LEAF != 0)
}

/// Returns `(index, is_gl_vertex)`.
pub fn parse_vertex_id(id: VertexId) -> (usize, bool) {
    ((id & !VERTEX_IS_GL) as usize, id & VERTEX_IS_GL != 0)
}

pub fn parse_optional_id(id: u16) -> Option<usize> {
    if id == NO_INDEX {
        None
    } else {
        Some(id as usize)
    }
}
