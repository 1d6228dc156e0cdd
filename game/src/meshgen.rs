use super::vertex::{MeshVertex, StencilVertex, NO_TEXTURE, TEXTURE_KIND_FLAT, TEXTURE_KIND_WALL};
use log::{debug, info, warn};
use math::prelude::*;
use math::{vec3, Mat4, Pnt2f, Pnt3f, Vec3f};
use std::ops::Range;
use std::time::Instant;
use wad::types::FLAT_SIZE;
use wad::{BspVisitor, ErrorKind, FlatRef, FlatSet, Leaf, LevelMap, Linedef, Result, Sector};
use wad::{Seg, Sidedef, SpatialIndex, WallTextureSet};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WallPart {
    Lower,
    Upper,
    Middle,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WallQuad {
    pub part: WallPart,
    pub seg: usize,
    pub texture: usize,
    /// First of the quad's four vertices in the owning `LeafMesh`.
    pub first_vertex: usize,
}

/// Everything drawn for one BSP leaf: its walls, then its floor and ceiling.
#[derive(Clone, Debug)]
pub struct LeafMesh {
    pub leaf: usize,
    pub region: Option<usize>,
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
    /// Vertex ranges of the floor and ceiling polygons; empty for degenerate leaves.
    pub floor: Range<usize>,
    pub ceiling: Range<usize>,
    /// Index ranges of the floor and ceiling triangles.
    pub floor_indices: Range<usize>,
    pub ceiling_indices: Range<usize>,
    pub walls: Vec<WallQuad>,
}

impl LeafMesh {
    fn new(leaf: usize) -> Self {
        LeafMesh {
            leaf,
            region: None,
            vertices: Vec::new(),
            indices: Vec::new(),
            floor: 0..0,
            ceiling: 0..0,
            floor_indices: 0..0,
            ceiling_indices: 0..0,
            walls: Vec::new(),
        }
    }

    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }
}

/// A vertical or horizontal parallelogram that only writes the stencil buffer, marking where the
/// sky backdrop may show through.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StencilQuad {
    pub origin: Pnt3f,
    pub u: Vec3f,
    pub v: Vec3f,
}

impl StencilQuad {
    /// Maps the unit quad `(0, 0, 0)-(1, 1, 0)` onto this one.
    pub fn transform(&self) -> Mat4 {
        let normal = self.u.cross(self.v);
        let normal = if normal.magnitude2() > 0.0 {
            normal.normalize()
        } else {
            Vec3f::zero()
        };
        Mat4::from_cols(
            self.u.extend(0.0),
            self.v.extend(0.0),
            normal.extend(0.0),
            self.origin.to_homogeneous(),
        )
    }

    pub fn corners(&self) -> [Pnt3f; 4] {
        [
            self.origin,
            self.origin + self.u,
            self.origin + self.u + self.v,
            self.origin + self.v,
        ]
    }
}

/// The ceiling polygon of a sky leaf, positions only.
#[derive(Clone, Debug)]
pub struct StencilMesh {
    pub leaf: usize,
    pub vertices: Vec<StencilVertex>,
    pub indices: Vec<u32>,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct MeshStats {
    pub num_leaves: usize,
    pub num_degenerate_leaves: usize,
    pub num_floor_polys: usize,
    pub num_ceil_polys: usize,
    pub num_sky_ceil_polys: usize,
    pub num_lower_quads: usize,
    pub num_upper_quads: usize,
    pub num_middle_quads: usize,
    pub num_sky_quads: usize,
    pub num_skipped_segs: usize,
    pub num_triangles: usize,
}

pub struct RenderMeshSet {
    pub leaves: Vec<LeafMesh>,
    pub sky_quads: Vec<StencilQuad>,
    pub sky_meshes: Vec<StencilMesh>,
    pub overhead: StencilQuad,
    /// One unit above the highest ceiling: the plane sky stencils reach up to.
    pub max_height: f32,
    pub stats: MeshStats,
}

impl RenderMeshSet {
    pub fn leaf_mesh(&self, leaf: usize) -> Option<&LeafMesh> {
        self.leaves.iter().find(|mesh| mesh.leaf == leaf)
    }
}

/// Builds the render meshes of a level in BSP walk order.
///
/// `sky_flat_index` is the flat drawn on sky ceilings, if the flat set has one.
pub fn generate_meshes(
    level: &LevelMap,
    index: &SpatialIndex,
    flats: &FlatSet,
    walls: &WallTextureSet,
    sky_flat_index: Option<usize>,
) -> Result<RenderMeshSet> {
    info!("Generating meshes for {}...", level.name);
    let start_time = Instant::now();

    let max_height = level.max_ceiling().unwrap_or(0.0) + 1.0;
    let bounds = level.bounds;
    let size = bounds.size();
    let overhead = StencilQuad {
        origin: Pnt3f::new(bounds.min.x, max_height, bounds.min.y),
        u: vec3(size.x, 0.0, 0.0),
        v: vec3(0.0, 0.0, size.y),
    };

    let mut builder = Builder {
        level,
        index,
        flats,
        walls,
        sky_flat_index,
        max_height,
        leaves: Vec::with_capacity(index.leaves.len()),
        sky_quads: Vec::new(),
        sky_meshes: Vec::new(),
        stats: MeshStats::default(),
    };
    index.walk(&mut builder)?;

    let Builder {
        leaves,
        sky_quads,
        sky_meshes,
        mut stats,
        ..
    } = builder;
    stats.num_triangles = leaves.iter().map(LeafMesh::num_triangles).sum();

    info!(
        "Meshes generated in {:.2}ms:\n\
         \tnum_leaves = {}\n\
         \tnum_degenerate_leaves = {}\n\
         \tnum_floor_polys = {}\n\
         \tnum_ceil_polys = {}\n\
         \tnum_sky_ceil_polys = {}\n\
         \tnum_lower_quads = {}\n\
         \tnum_upper_quads = {}\n\
         \tnum_middle_quads = {}\n\
         \tnum_sky_quads = {}\n\
         \tnum_skipped_segs = {}\n\
         \tnum_triangles = {}",
        start_time.elapsed().as_secs_f64() * 1000.0,
        stats.num_leaves,
        stats.num_degenerate_leaves,
        stats.num_floor_polys,
        stats.num_ceil_polys,
        stats.num_sky_ceil_polys,
        stats.num_lower_quads,
        stats.num_upper_quads,
        stats.num_middle_quads,
        stats.num_sky_quads,
        stats.num_skipped_segs,
        stats.num_triangles,
    );

    Ok(RenderMeshSet {
        leaves,
        sky_quads,
        sky_meshes,
        overhead,
        max_height,
        stats,
    })
}

struct Builder<'a> {
    level: &'a LevelMap,
    index: &'a SpatialIndex,
    flats: &'a FlatSet,
    walls: &'a WallTextureSet,
    sky_flat_index: Option<usize>,
    max_height: f32,

    leaves: Vec<LeafMesh>,
    sky_quads: Vec<StencilQuad>,
    sky_meshes: Vec<StencilMesh>,
    stats: MeshStats,
}

/// The two sides of a seg's linedef as seen from the seg.
struct SegSides<'a> {
    linedef: &'a Linedef,
    side: &'a Sidedef,
    front: &'a Sector,
    back: Option<&'a Sector>,
}

impl<'a> BspVisitor for Builder<'a> {
    fn visit_leaf(&mut self, leaf_index: usize, leaf: &Leaf) -> Result<()> {
        self.stats.num_leaves += 1;
        let (level, index) = (self.level, self.index);
        let segs = index.leaf_segs(leaf_index)?;
        if segs.len() < 3 {
            debug!("Leaf {} has {} segs, skipping.", leaf_index, segs.len());
            self.stats.num_degenerate_leaves += 1;
            return Ok(());
        }

        let mut mesh = LeafMesh::new(leaf_index);

        let mut boundary = Vec::with_capacity(segs.len());
        for (i_seg, seg) in segs.iter().enumerate() {
            let edge = index.seg_vertices(level, seg)?;
            boundary.push(edge.0);
            self.seg_walls(&mut mesh, leaf.first_seg + i_seg, seg, edge)?;
        }

        mesh.region = index.leaf_sector(level, leaf_index)?;
        match mesh.region {
            Some(region) => {
                let sector = *self.level.sector(region)?;
                self.flats_polys(&mut mesh, &boundary, &sector);
            }
            None => {
                debug!("Leaf {} has no region, no flats.", leaf_index);
                self.stats.num_degenerate_leaves += 1;
            }
        }

        self.leaves.push(mesh);
        Ok(())
    }
}

impl<'a> Builder<'a> {
    fn seg_sides(&self, seg_index: usize, seg: &Seg) -> Result<Option<SegSides<'a>>> {
        let level = self.level;
        let linedef_index = match seg.linedef {
            Some(index) => index,
            None => return Ok(None),
        };
        let linedef = level.linedef(linedef_index)?;
        let (front_side, back_side) = if seg.is_back {
            (linedef.back, linedef.front)
        } else {
            (linedef.front, linedef.back)
        };
        let side = match front_side {
            Some(side) => level.sidedef(side)?,
            None => {
                warn!(
                    "Seg {} runs along a missing side of linedef {}, skipping.",
                    seg_index, linedef_index
                );
                return Ok(None);
            }
        };
        let back = match (linedef.is_two_sided(), back_side) {
            (true, Some(back_side)) => Some(level.sector(level.sidedef(back_side)?.sector)?),
            (true, None) => {
                warn!(
                    "Two-sided linedef {} has no back side, drawing it one-sided.",
                    linedef_index
                );
                None
            }
            (false, _) => None,
        };
        Ok(Some(SegSides {
            linedef,
            side,
            front: level.sector(side.sector)?,
            back,
        }))
    }

    fn seg_walls(
        &mut self,
        mesh: &mut LeafMesh,
        seg_index: usize,
        seg: &Seg,
        edge: (Pnt2f, Pnt2f),
    ) -> Result<()> {
        let sides = match self.seg_sides(seg_index, seg)? {
            Some(sides) => sides,
            None => {
                if seg.linedef.is_some() {
                    self.stats.num_skipped_segs += 1;
                }
                return Ok(());
            }
        };
        let front = sides.front;

        let back = match sides.back {
            Some(back) => back,
            None => {
                if let Some(texture) = sides.side.middle {
                    let heights = (front.floor, front.ceiling);
                    self.wall_quad(mesh, &sides, WallPart::Middle, seg_index, texture, edge, heights)?;
                }
                if front.ceiling_flat.is_sky() {
                    self.sky_quad(edge, front.ceiling);
                }
                return Ok(());
            }
        };

        if front.floor < back.floor {
            if let Some(texture) = sides.side.lower {
                let heights = (front.floor, back.floor);
                self.wall_quad(mesh, &sides, WallPart::Lower, seg_index, texture, edge, heights)?;
            }
        }

        let both_sky = front.ceiling_flat.is_sky() && back.ceiling_flat.is_sky();
        if front.ceiling > back.ceiling && !both_sky {
            if let Some(texture) = sides.side.upper {
                let heights = (back.ceiling, front.ceiling);
                self.wall_quad(mesh, &sides, WallPart::Upper, seg_index, texture, edge, heights)?;
            }
        }

        if front.ceiling_flat.is_sky() && !back.ceiling_flat.is_sky() && front.ceiling > back.ceiling
        {
            self.sky_quad(edge, front.ceiling);
        }
        Ok(())
    }

    fn wall_quad(
        &mut self,
        mesh: &mut LeafMesh,
        sides: &SegSides,
        part: WallPart,
        seg: usize,
        texture: usize,
        (start, end): (Pnt2f, Pnt2f),
        (low, high): (f32, f32),
    ) -> Result<()> {
        let (tw, th, max_coords) = match (self.walls.get(texture), self.walls.padding(texture)) {
            (Some(info), Some(padding)) => (info.width as f32, info.height as f32, padding),
            _ => {
                return Err(ErrorKind::OutOfRange(format!(
                    "wall texture {} of seg {} (have {})",
                    texture,
                    seg,
                    self.walls.len()
                ))
                .into())
            }
        };

        let w = (end - start).magnitude() / tw;
        let x_off = sides.side.offset.x / tw;
        let mut y_off = sides.side.offset.y / th;
        let (ty0, ty1) = match part {
            WallPart::Lower => {
                let h = (high - low).abs() / th;
                if sides.linedef.lower_unpegged() {
                    y_off += (sides.front.ceiling - high) / th;
                }
                (y_off + h, y_off)
            }
            WallPart::Upper => {
                let h = -(high - low).abs() / th;
                if sides.linedef.upper_unpegged() {
                    y_off -= h;
                }
                (y_off, y_off + h)
            }
            WallPart::Middle => {
                let h = (high - low) / th;
                if sides.linedef.lower_unpegged() {
                    y_off -= h;
                }
                (y_off + h, y_off)
            }
        };
        let (tx0, tx1) = (x_off * max_coords[0], (x_off + w) * max_coords[0]);
        let (ty0, ty1) = (ty0 * max_coords[1], ty1 * max_coords[1]);

        let first_vertex = mesh.vertices.len();
        let light = sides.front.light;
        let texture_index = texture as i32;
        mesh.vertices.extend_from_slice(&[
            wall_vertex(start, low, [tx0, ty0], texture_index, light, max_coords),
            wall_vertex(end, low, [tx1, ty0], texture_index, light, max_coords),
            wall_vertex(end, high, [tx1, ty1], texture_index, light, max_coords),
            wall_vertex(start, high, [tx0, ty1], texture_index, light, max_coords),
        ]);
        any_quad(mesh.vertices.len(), &mut mesh.indices);
        mesh.walls.push(WallQuad {
            part,
            seg,
            texture,
            first_vertex,
        });

        match part {
            WallPart::Lower => self.stats.num_lower_quads += 1,
            WallPart::Upper => self.stats.num_upper_quads += 1,
            WallPart::Middle => self.stats.num_middle_quads += 1,
        }
        Ok(())
    }

    fn sky_quad(&mut self, (start, end): (Pnt2f, Pnt2f), top: f32) {
        let along = end - start;
        self.sky_quads.push(StencilQuad {
            origin: Pnt3f::new(start.x, top, start.y),
            u: vec3(along.x, 0.0, along.y),
            v: vec3(0.0, self.max_height - top, 0.0),
        });
        self.stats.num_sky_quads += 1;
    }

    fn flat_texture(&self, flat: FlatRef) -> i32 {
        match flat {
            FlatRef::Flat(index) if index < self.flats.len() => index as i32,
            FlatRef::Sky => self.sky_flat_index.map_or(NO_TEXTURE, |index| index as i32),
            FlatRef::Flat(_) | FlatRef::None => NO_TEXTURE,
        }
    }

    fn flats_polys(&mut self, mesh: &mut LeafMesh, boundary: &[Pnt2f], sector: &Sector) {
        let n = boundary.len();
        let floor_texture = self.flat_texture(sector.floor_flat);
        let ceiling_texture = self.flat_texture(sector.ceiling_flat);

        let floor_start = mesh.vertices.len();
        for &point in boundary {
            mesh.vertices
                .push(flat_vertex(point, sector.floor, floor_texture, sector.light));
        }
        let ceiling_start = mesh.vertices.len();
        for &point in boundary {
            mesh.vertices
                .push(flat_vertex(point, sector.ceiling, ceiling_texture, sector.light));
        }
        mesh.floor = floor_start..ceiling_start;
        mesh.ceiling = ceiling_start..mesh.vertices.len();

        let base = floor_start as u32;
        let n32 = n as u32;
        let floor_indices_start = mesh.indices.len();
        for k in 1..(n32 - 1) {
            mesh.indices.extend_from_slice(&[base, base + k + 1, base + k]);
        }
        let ceiling_indices_start = mesh.indices.len();
        for k in 1..(n32 - 1) {
            mesh.indices
                .extend_from_slice(&[base + n32, base + n32 + k, base + n32 + k + 1]);
        }
        mesh.floor_indices = floor_indices_start..ceiling_indices_start;
        mesh.ceiling_indices = ceiling_indices_start..mesh.indices.len();
        self.stats.num_floor_polys += 1;
        self.stats.num_ceil_polys += 1;

        if sector.ceiling_flat.is_sky() {
            let vertices = boundary
                .iter()
                .map(|point| StencilVertex {
                    position: [point.x, sector.ceiling, point.y],
                })
                .collect();
            let mut indices = Vec::with_capacity(3 * (n - 2));
            any_poly(n, n, &mut indices);
            self.sky_meshes.push(StencilMesh {
                leaf: mesh.leaf,
                vertices,
                indices,
            });
            self.stats.num_sky_ceil_polys += 1;
        }
    }
}

fn wall_vertex(
    xz: Pnt2f,
    y: f32,
    tex_coords: [f32; 2],
    texture_index: i32,
    light: f32,
    max_coords: [f32; 2],
) -> MeshVertex {
    MeshVertex {
        position: [xz.x, y, xz.y],
        tex_coords,
        texture_index,
        texture_kind: TEXTURE_KIND_WALL,
        light,
        max_coords,
    }
}

fn flat_vertex(xz: Pnt2f, y: f32, texture_index: i32, light: f32) -> MeshVertex {
    let tile = FLAT_SIZE as f32;
    MeshVertex {
        position: [xz.x, y, xz.y],
        tex_coords: [xz.x / tile, xz.y / tile],
        texture_index,
        texture_kind: TEXTURE_KIND_FLAT,
        light,
        max_coords: [1.0, 1.0],
    }
}

fn any_quad(new_length: usize, indices: &mut Vec<u32>) {
    let new_length = new_length as u32;
    let v0 = new_length - 4;
    let v1 = v0 + 1;
    let v2 = v1 + 1;
    let v3 = v2 + 1;

    indices.push(v0);
    indices.push(v1);
    indices.push(v3);

    indices.push(v1);
    indices.push(v2);
    indices.push(v3);
}

fn any_poly(new_length: usize, poly_length: usize, indices: &mut Vec<u32>) {
    let new_length = new_length as u32;
    let poly_length = poly_length as u32;
    let v0 = new_length - poly_length;
    for (v1, v2) in ((v0 + 1)..new_length).zip((v0 + 2)..new_length) {
        indices.push(v0);
        indices.push(v1);
        indices.push(v2);
    }
}
