use super::archive::Archive;
use super::errors::{Error, ErrorKind, Result};
use super::level::LevelMap;
use super::types::{WadGlSeg, WadGlVertex, WadNode, WadSubsector};
use super::util::{from_fixed, from_wad_coords, parse_child_id, parse_optional_id, parse_vertex_id};
use failchain::ensure;
use log::info;
use math::{vec2, Line2f, Pnt2f};
use std::time::Instant;

const GL_VERT_OFFSET: usize = 1;
const GL_SEGS_OFFSET: usize = 2;
const GL_SSECT_OFFSET: usize = 3;
const GL_NODES_OFFSET: usize = 4;

const GL_VERT_MAGIC: &[u8; 4] = b"gNd2";
const GL_SEGS_V3_MAGIC: &[u8; 4] = b"gNd3";

/// A vertex in either the level's table or the extra table the node builder adds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VertexRef {
    Level(usize),
    Gl(usize),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Child {
    Node(usize),
    Leaf(usize),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Seg {
    pub start: VertexRef,
    pub end: VertexRef,
    /// `None` for minisegs: splits along a partition line with no wall behind them.
    pub linedef: Option<usize>,
    /// Whether the seg runs along the back side of its linedef.
    pub is_back: bool,
    pub partner: Option<usize>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Leaf {
    pub first_seg: usize,
    pub num_segs: usize,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Node {
    pub partition: Line2f,
    pub front: Child,
    pub back: Child,
}

/// The GL node builder's BSP tree of one level, with all on-disk flag bits decoded.
pub struct SpatialIndex {
    pub vertices: Vec<Pnt2f>,
    pub segs: Vec<Seg>,
    pub leaves: Vec<Leaf>,
    pub nodes: Vec<Node>,
}

impl SpatialIndex {
    /// Reads the `GL_<level>` lumps from `wad`; these may live in a separate `.gwa` file.
    pub fn from_archive(wad: &Archive, level_name: &str) -> Result<SpatialIndex> {
        let start_time = Instant::now();
        let marker_name = format!("GL_{}", level_name);
        let start_index = wad.find_record(marker_name.as_str())?;
        let lump = |offset: usize, expected: &str| {
            let lump = wad.lump_after(start_index, offset, expected)?;
            if lump.is_named(expected) {
                Ok(lump)
            } else {
                Err(Error::from(ErrorKind::NotFound(format!(
                    "{} lump of {}, found {} instead",
                    expected,
                    marker_name,
                    lump.name()
                ))))
            }
        };

        let vertices: Vec<WadGlVertex> =
            lump(GL_VERT_OFFSET, "GL_VERT")?.decode_vec_after(GL_VERT_MAGIC)?;

        let segs_lump = lump(GL_SEGS_OFFSET, "GL_SEGS")?;
        let seg_bytes = segs_lump.bytes();
        ensure!(
            !seg_bytes.starts_with(GL_SEGS_V3_MAGIC),
            ErrorKind::unsupported_sub_format("GL_SEGS", GL_SEGS_V3_MAGIC)
        );
        let segs: Vec<WadGlSeg> = segs_lump.decode_vec()?;
        let leaves: Vec<WadSubsector> = lump(GL_SSECT_OFFSET, "GL_SSECT")?.decode_vec()?;
        let nodes: Vec<WadNode> = lump(GL_NODES_OFFSET, "GL_NODES")?.decode_vec()?;

        info!("Loaded GL nodes for '{}':", level_name);
        info!("    {:4} vertices", vertices.len());
        info!("    {:4} segs", segs.len());
        info!("    {:4} subsectors", leaves.len());
        info!("    {:4} nodes", nodes.len());

        let index = SpatialIndex::from_wad_records(&vertices, &segs, &leaves, &nodes);
        info!(
            "Done in {:.2}ms.",
            start_time.elapsed().as_secs_f64() * 1000.0
        );
        Ok(index)
    }

    pub fn from_wad_records(
        vertices: &[WadGlVertex],
        segs: &[WadGlSeg],
        leaves: &[WadSubsector],
        nodes: &[WadNode],
    ) -> SpatialIndex {
        SpatialIndex {
            vertices: vertices
                .iter()
                .map(|vertex| Pnt2f::new(from_fixed(vertex.x), from_fixed(vertex.y)))
                .collect(),
            segs: segs
                .iter()
                .map(|seg| Seg {
                    start: vertex_ref(seg.start_vertex),
                    end: vertex_ref(seg.end_vertex),
                    linedef: parse_optional_id(seg.linedef),
                    is_back: seg.side != 0,
                    partner: parse_optional_id(seg.partner_seg),
                })
                .collect(),
            leaves: leaves
                .iter()
                .map(|leaf| Leaf {
                    first_seg: usize::from(leaf.first_seg),
                    num_segs: usize::from(leaf.num_segs),
                })
                .collect(),
            nodes: nodes
                .iter()
                .map(|node| Node {
                    partition: Line2f::from_origin_and_displace(
                        from_wad_coords(node.line_x, node.line_y),
                        vec2(f32::from(node.step_x), f32::from(node.step_y)),
                    ),
                    front: child_ref(node.right),
                    back: child_ref(node.left),
                })
                .collect(),
        }
    }

    /// The last node, or the only leaf of a level too small to need partitioning.
    pub fn root(&self) -> Child {
        if self.nodes.is_empty() {
            Child::Leaf(0)
        } else {
            Child::Node(self.nodes.len() - 1)
        }
    }

    pub fn leaf(&self, index: usize) -> Result<&Leaf> {
        self.leaves
            .get(index)
            .ok_or_else(|| ErrorKind::out_of_range("leaf", index, self.leaves.len()).into())
    }

    pub fn node(&self, index: usize) -> Result<&Node> {
        self.nodes
            .get(index)
            .ok_or_else(|| ErrorKind::out_of_range("node", index, self.nodes.len()).into())
    }

    pub fn leaf_segs(&self, index: usize) -> Result<&[Seg]> {
        let leaf = self.leaf(index)?;
        let end = leaf.first_seg + leaf.num_segs;
        ensure!(
            end <= self.segs.len(),
            ErrorKind::out_of_range(format!("segs of leaf {}", index), end, self.segs.len() + 1)
        );
        Ok(&self.segs[leaf.first_seg..end])
    }

    pub fn vertex(&self, level: &LevelMap, vertex: VertexRef) -> Result<Pnt2f> {
        match vertex {
            VertexRef::Level(index) => level.vertex(index),
            VertexRef::Gl(index) => self.vertices.get(index).cloned().ok_or_else(|| {
                ErrorKind::out_of_range("GL vertex", index, self.vertices.len()).into()
            }),
        }
    }

    pub fn seg_vertices(&self, level: &LevelMap, seg: &Seg) -> Result<(Pnt2f, Pnt2f)> {
        Ok((self.vertex(level, seg.start)?, self.vertex(level, seg.end)?))
    }
}

fn vertex_ref(id: u16) -> VertexRef {
    match parse_vertex_id(id) {
        (index, true) => VertexRef::Gl(index),
        (index, false) => VertexRef::Level(index),
    }
}

fn child_ref(id: u16) -> Child {
    match parse_child_id(id) {
        (index, true) => Child::Leaf(index),
        (index, false) => Child::Node(index),
    }
}
