use bytemuck::{Pod, Zeroable};

/// `texture_kind` of a floor or ceiling vertex: samples the flat array.
pub const TEXTURE_KIND_FLAT: u32 = 1;
/// `texture_kind` of a wall vertex: samples the wall texture array.
pub const TEXTURE_KIND_WALL: u32 = 2;

/// `texture_index` meaning "no texture"; the fragment is discarded.
pub const NO_TEXTURE: i32 = -1;

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub tex_coords: [f32; 2],
    pub texture_index: i32,
    pub texture_kind: u32,
    pub light: f32,
    /// Part of the texture array slice the texture covers; wrapping happens inside it.
    pub max_coords: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct StencilVertex {
    pub position: [f32; 3],
}
