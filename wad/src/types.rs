pub use super::name::WadName;
use serde::{Deserialize, Serialize};

pub type LightLevel = i16;
pub type LinedefFlags = u16;
pub type SectorId = u16;
pub type SectorTag = u16;
pub type SectorType = u16;
pub type SidedefId = u16;
pub type SpecialType = u16;
pub type ThingFlags = u16;
pub type ThingType = u16;
pub type VertexId = u16;
pub type WadCoord = i16;
pub type SegId = u16;
pub type LinedefId = u16;
pub type ChildId = u16;

/// Side, linedef and partner-seg references use this value for "none".
pub const NO_INDEX: u16 = 0xffff;

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct WadInfo {
    pub identifier: [u8; 4],
    pub num_lumps: u32,
    pub info_table_offset: u32,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct WadLump {
    pub file_pos: u32,
    pub size: u32,
    pub name: WadName,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct WadThing {
    pub x: WadCoord,
    pub y: WadCoord,
    pub angle: WadCoord,
    pub thing_type: ThingType,
    pub flags: ThingFlags,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct WadVertex {
    pub x: WadCoord,
    pub y: WadCoord,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct WadLinedef {
    pub start_vertex: VertexId,
    pub end_vertex: VertexId,
    pub flags: LinedefFlags,
    pub special_type: SpecialType,
    pub sector_tag: SectorTag,
    pub right_side: SidedefId,
    pub left_side: SidedefId,
}

pub const LINEDEF_TWO_SIDED: LinedefFlags = 0x0004;
pub const LINEDEF_UPPER_UNPEGGED: LinedefFlags = 0x0008;
pub const LINEDEF_LOWER_UNPEGGED: LinedefFlags = 0x0010;

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct WadSidedef {
    pub x_offset: WadCoord,
    pub y_offset: WadCoord,
    pub upper_texture: WadName,
    pub lower_texture: WadName,
    pub middle_texture: WadName,
    pub sector: SectorId,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct WadSector {
    pub floor_height: WadCoord,
    pub ceiling_height: WadCoord,
    pub floor_texture: WadName,
    pub ceiling_texture: WadName,
    pub light: LightLevel,
    pub sector_type: SectorType,
    pub tag: SectorTag,
}

/// A `GL_VERT` entry (v2): 16.16 fixed point.
#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct WadGlVertex {
    pub x: i32,
    pub y: i32,
}

/// A `GL_SEGS` entry (v2). Vertex ids with the high bit set index `GL_VERT`.
#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct WadGlSeg {
    pub start_vertex: VertexId,
    pub end_vertex: VertexId,
    pub linedef: LinedefId,
    pub side: u16,
    pub partner_seg: SegId,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct WadSubsector {
    pub num_segs: u16,
    pub first_seg: SegId,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct WadNode {
    pub line_x: WadCoord,
    pub line_y: WadCoord,
    pub step_x: WadCoord,
    pub step_y: WadCoord,
    pub right_y_max: WadCoord,
    pub right_y_min: WadCoord,
    pub right_x_min: WadCoord,
    pub right_x_max: WadCoord,
    pub left_y_max: WadCoord,
    pub left_y_min: WadCoord,
    pub left_x_min: WadCoord,
    pub left_x_max: WadCoord,
    pub right: ChildId,
    pub left: ChildId,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct WadTextureHeader {
    pub name: WadName,
    pub masked: u32,
    pub width: u16,
    pub height: u16,
    pub column_directory: u32,
    pub num_patches: u16,
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
pub struct WadTexturePatchRef {
    pub origin_x: i16,
    pub origin_y: i16,
    pub patch: u16,
    pub stepdir: u16,
    pub colormap: u16,
}

pub const PALETTE_SIZE: usize = 256 * 3;
pub const FLAT_SIZE: usize = 64;
pub const FLAT_BYTES: usize = FLAT_SIZE * FLAT_SIZE;

#[derive(Debug)]
pub struct Palette(pub [u8; PALETTE_SIZE]);

impl Palette {
    pub fn color(&self, index: u8) -> [u8; 3] {
        let start = usize::from(index) * 3;
        [self.0[start], self.0[start + 1], self.0[start + 2]]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Palette([0u8; PALETTE_SIZE])
    }
}

impl AsMut<[u8]> for Palette {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}
