//! In-memory archives shared by the tests of this crate.
//!
//! The main fixture is two square rooms side by side. The left room (sector 0) spans x in
//! `0..128` with a floor at 0; the right room (sector 1) spans x in `128..256` with a floor at 64
//! and a sky ceiling at 128. They share one two-sided linedef at x = 128, whose front faces the
//! left room and carries a lower texture. A single GL node at x = 128 puts the right room in
//! front.

use wad::types::{WadGlSeg, WadLinedef, WadNode, WadSector, WadSidedef, WadSubsector, WadThing};
use wad::types::{WadName, WadTextureHeader, WadVertex, FLAT_BYTES, NO_INDEX, PALETTE_SIZE};
use wad::types::LINEDEF_TWO_SIDED;
use wad::{Archive, ArchiveBuilder, FlatSet, LevelMap, SpatialIndex, WadMetadata, WallTextureSet};

pub const FLAT_NAMES: &[&str] = &["FLOOR1", "CEIL1", "F_SKY1", "NUKAGE1", "NUKAGE2", "NUKAGE3"];

pub fn name(name: &str) -> WadName {
    name.parse().unwrap()
}

pub struct Fixture {
    pub left_floor_flat: &'static str,
    pub left_ceiling: i16,
    pub shared_flags: u16,
    pub shared_lower: &'static str,
    pub shared_upper: &'static str,
    pub shared_offset: (i16, i16),
}

impl Default for Fixture {
    fn default() -> Self {
        Fixture {
            left_floor_flat: "FLOOR1",
            left_ceiling: 128,
            shared_flags: LINEDEF_TWO_SIDED,
            shared_lower: "STEP1",
            shared_upper: "-",
            shared_offset: (0, 0),
        }
    }
}

fn texture_directory(textures: &[(&str, u16, u16)]) -> Vec<u8> {
    const HEADER_SIZE: usize = 22;
    let mut bytes = (textures.len() as u32).to_le_bytes().to_vec();
    let first_offset = 4 + 4 * textures.len();
    for i_texture in 0..textures.len() {
        let offset = (first_offset + i_texture * HEADER_SIZE) as u32;
        bytes.extend_from_slice(&offset.to_le_bytes());
    }
    for &(texture_name, width, height) in textures {
        let header = WadTextureHeader {
            name: name(texture_name),
            masked: 0,
            width,
            height,
            column_directory: 0,
            num_patches: 0,
        };
        bytes.extend_from_slice(&bincode::serialize(&header).unwrap());
    }
    bytes
}

fn side(lower: &str, middle: &str, sector: u16, offset: (i16, i16)) -> WadSidedef {
    WadSidedef {
        x_offset: offset.0,
        y_offset: offset.1,
        upper_texture: name("-"),
        lower_texture: name(lower),
        middle_texture: name(middle),
        sector,
    }
}

fn linedef(start_vertex: u16, end_vertex: u16, right_side: u16) -> WadLinedef {
    WadLinedef {
        start_vertex,
        end_vertex,
        flags: 0,
        special_type: 0,
        sector_tag: 0,
        right_side,
        left_side: NO_INDEX,
    }
}

fn seg(start_vertex: u16, end_vertex: u16, linedef: u16, side: u16) -> WadGlSeg {
    WadGlSeg {
        start_vertex,
        end_vertex,
        linedef,
        side,
        partner_seg: NO_INDEX,
    }
}

fn add_resources(builder: &mut ArchiveBuilder) {
    builder.lump("PLAYPAL", vec![0; PALETTE_SIZE * 2]);
    builder.marker("F_START");
    for (i_flat, &flat) in FLAT_NAMES.iter().enumerate() {
        builder.lump(flat, vec![i_flat as u8; FLAT_BYTES]);
    }
    builder
        .marker("F_END")
        .lump("PNAMES", 0u32.to_le_bytes().to_vec())
        .lump(
            "TEXTURE1",
            texture_directory(&[("WALL1", 64, 128), ("STEP1", 32, 64)]),
        );
}

impl Fixture {
    pub fn archive(&self) -> ArchiveBuilder {
        let mut builder = ArchiveBuilder::new();
        add_resources(&mut builder);
        let mut shared = linedef(2, 1, 2);
        shared.flags = self.shared_flags;
        shared.left_side = 3;
        let mut shared_side = side(self.shared_lower, "-", 0, self.shared_offset);
        shared_side.upper_texture = name(self.shared_upper);
        builder
            .marker("E1M1")
            .records(
                "THINGS",
                &[WadThing {
                    x: 64,
                    y: 32,
                    angle: 90,
                    thing_type: 1,
                    flags: 7,
                }],
            )
            .records(
                "LINEDEFS",
                &[
                    linedef(0, 3, 0),
                    linedef(3, 2, 1),
                    shared,
                    linedef(1, 0, 4),
                    linedef(2, 5, 5),
                    linedef(5, 4, 6),
                    linedef(4, 1, 7),
                ],
            )
            .records(
                "SIDEDEFS",
                &[
                    side("-", "WALL1", 0, (0, 0)),
                    side("-", "WALL1", 0, (0, 0)),
                    shared_side,
                    side("-", "-", 1, (0, 0)),
                    side("-", "WALL1", 0, (0, 0)),
                    side("-", "WALL1", 1, (0, 0)),
                    side("-", "WALL1", 1, (0, 0)),
                    side("-", "WALL1", 1, (0, 0)),
                ],
            )
            .records(
                "VERTEXES",
                &[
                    WadVertex { x: 0, y: 0 },
                    WadVertex { x: 128, y: 0 },
                    WadVertex { x: 128, y: 128 },
                    WadVertex { x: 0, y: 128 },
                    WadVertex { x: 256, y: 0 },
                    WadVertex { x: 256, y: 128 },
                ],
            )
            .marker("SEGS")
            .marker("SSECTORS")
            .marker("NODES")
            .records(
                "SECTORS",
                &[
                    WadSector {
                        floor_height: 0,
                        ceiling_height: self.left_ceiling,
                        floor_texture: name(self.left_floor_flat),
                        ceiling_texture: name("CEIL1"),
                        light: 128,
                        sector_type: 0,
                        tag: 0,
                    },
                    WadSector {
                        floor_height: 64,
                        ceiling_height: 128,
                        floor_texture: name("FLOOR1"),
                        ceiling_texture: name("F_SKY1"),
                        light: 192,
                        sector_type: 0,
                        tag: 0,
                    },
                ],
            )
            .marker("GL_E1M1")
            .records_after::<WadVertex>("GL_VERT", b"gNd2", &[])
            .records(
                "GL_SEGS",
                &[
                    seg(0, 3, 0, 0),
                    seg(3, 2, 1, 0),
                    seg(2, 1, 2, 0),
                    seg(1, 0, 3, 0),
                    seg(1, 2, 2, 1),
                    seg(2, 5, 4, 0),
                    seg(5, 4, 5, 0),
                    seg(4, 1, 6, 0),
                ],
            )
            .records(
                "GL_SSECT",
                &[
                    WadSubsector {
                        num_segs: 4,
                        first_seg: 0,
                    },
                    WadSubsector {
                        num_segs: 4,
                        first_seg: 4,
                    },
                ],
            )
            .records(
                "GL_NODES",
                &[WadNode {
                    line_x: 128,
                    line_y: 0,
                    step_x: 0,
                    step_y: 128,
                    right_y_max: 128,
                    right_y_min: 0,
                    right_x_min: 128,
                    right_x_max: 256,
                    left_y_max: 128,
                    left_y_min: 0,
                    left_x_min: 0,
                    left_x_max: 128,
                    right: 0x8001,
                    left: 0x8000,
                }],
            );
        builder
    }
}

/// One triangular leaf with no nodes, split by a two-sided linedef from an unseen second sector.
pub fn triangle_archive() -> ArchiveBuilder {
    let mut builder = ArchiveBuilder::new();
    add_resources(&mut builder);
    let mut two_sided = linedef(1, 2, 1);
    two_sided.flags = LINEDEF_TWO_SIDED;
    two_sided.left_side = 2;
    builder
        .marker("E1M1")
        .records::<WadThing>("THINGS", &[])
        .records(
            "LINEDEFS",
            &[linedef(0, 1, 0), two_sided, linedef(2, 0, 3)],
        )
        .records(
            "SIDEDEFS",
            &[
                side("-", "-", 0, (0, 0)),
                side("-", "-", 0, (0, 0)),
                side("-", "-", 1, (0, 0)),
                side("-", "-", 0, (0, 0)),
            ],
        )
        .records(
            "VERTEXES",
            &[
                WadVertex { x: 0, y: 0 },
                WadVertex { x: 0, y: 64 },
                WadVertex { x: 64, y: 0 },
            ],
        )
        .marker("SEGS")
        .marker("SSECTORS")
        .marker("NODES")
        .records(
            "SECTORS",
            &[
                WadSector {
                    floor_height: 0,
                    ceiling_height: 72,
                    floor_texture: name("FLOOR1"),
                    ceiling_texture: name("CEIL1"),
                    light: 255,
                    sector_type: 0,
                    tag: 0,
                },
                WadSector {
                    floor_height: 0,
                    ceiling_height: 72,
                    floor_texture: name("FLOOR1"),
                    ceiling_texture: name("CEIL1"),
                    light: 255,
                    sector_type: 0,
                    tag: 0,
                },
            ],
        )
        .marker("GL_E1M1")
        .records_after::<WadVertex>("GL_VERT", b"gNd2", &[])
        .records(
            "GL_SEGS",
            &[seg(0, 1, 0, 0), seg(1, 2, 1, 0), seg(2, 0, 2, 0)],
        )
        .records(
            "GL_SSECT",
            &[WadSubsector {
                num_segs: 3,
                first_seg: 0,
            }],
        )
        .records::<WadNode>("GL_NODES", &[]);
    builder
}

pub struct Decoded {
    pub archive: Archive,
    pub level: LevelMap,
    pub index: SpatialIndex,
    pub flats: FlatSet,
    pub walls: WallTextureSet,
}

pub fn decode(builder: ArchiveBuilder) -> Decoded {
    let archive = builder.into_archive().unwrap();
    let metadata = WadMetadata::default();
    let flats = wad::decode_flats(&archive).unwrap();
    let walls = wad::decode_game_wall_textures(&archive).unwrap();
    let level = LevelMap::from_archive(&archive, "E1M1", &flats, &walls, metadata.sky_flat)
        .unwrap();
    let index = SpatialIndex::from_archive(&archive, "E1M1").unwrap();
    Decoded {
        archive,
        level,
        index,
        flats,
        walls,
    }
}
