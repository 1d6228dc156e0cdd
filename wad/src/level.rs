use super::archive::Archive;
use super::errors::{Error, ErrorKind, Result};
use super::name::WadName;
use super::tex::{FlatSet, WallTextureSet};
use super::types::{LinedefFlags, ThingType, WadLinedef, WadSector, WadSidedef, WadThing};
use super::types::{WadVertex, LINEDEF_LOWER_UNPEGGED, LINEDEF_TWO_SIDED, LINEDEF_UPPER_UNPEGGED};
use super::util::{from_wad_coords, from_wad_light, parse_optional_id};
use super::meta::PLAYER_START_THING;
use log::{info, warn};
use math::{vec2, Pnt2f, Rad, Radf, Vec2f};
use std::time::Instant;

const THINGS_OFFSET: usize = 1;
const LINEDEFS_OFFSET: usize = 2;
const SIDEDEFS_OFFSET: usize = 3;
const VERTICES_OFFSET: usize = 4;
const SECTORS_OFFSET: usize = 8;

/// A resolved floor or ceiling texture.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlatRef {
    None,
    Sky,
    Flat(usize),
}

impl FlatRef {
    pub fn is_sky(self) -> bool {
        self == FlatRef::Sky
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Linedef {
    pub start: usize,
    pub end: usize,
    pub flags: LinedefFlags,
    pub front: Option<usize>,
    pub back: Option<usize>,
}

impl Linedef {
    pub fn is_two_sided(&self) -> bool {
        self.flags & LINEDEF_TWO_SIDED != 0
    }

    pub fn upper_unpegged(&self) -> bool {
        self.flags & LINEDEF_UPPER_UNPEGGED != 0
    }

    pub fn lower_unpegged(&self) -> bool {
        self.flags & LINEDEF_LOWER_UNPEGGED != 0
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sidedef {
    pub offset: Vec2f,
    pub upper: Option<usize>,
    pub lower: Option<usize>,
    pub middle: Option<usize>,
    pub sector: usize,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Sector {
    pub floor: f32,
    pub ceiling: f32,
    pub floor_flat: FlatRef,
    pub ceiling_flat: FlatRef,
    /// Brightness multiplier in `[0, 1)`.
    pub light: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Thing {
    pub position: Pnt2f,
    pub angle: Radf,
    pub thing_type: ThingType,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingBox {
    pub min: Pnt2f,
    pub max: Pnt2f,
}

impl BoundingBox {
    pub fn from_points<I: IntoIterator<Item = Pnt2f>>(points: I) -> Option<BoundingBox> {
        points.into_iter().fold(None, |bounds, point| {
            Some(match bounds {
                None => BoundingBox {
                    min: point,
                    max: point,
                },
                Some(BoundingBox { min, max }) => BoundingBox {
                    min: Pnt2f::new(min.x.min(point.x), min.y.min(point.y)),
                    max: Pnt2f::new(max.x.max(point.x), max.y.max(point.y)),
                },
            })
        })
    }

    pub fn size(&self) -> Vec2f {
        self.max - self.min
    }
}

/// The typed tables of one level, with every texture name resolved to an index.
pub struct LevelMap {
    pub name: WadName,
    pub vertices: Vec<Pnt2f>,
    pub linedefs: Vec<Linedef>,
    pub sidedefs: Vec<Sidedef>,
    pub sectors: Vec<Sector>,
    pub things: Vec<Thing>,
    pub bounds: BoundingBox,
}

impl LevelMap {
    pub fn from_archive(
        wad: &Archive,
        level_name: &str,
        flats: &FlatSet,
        walls: &WallTextureSet,
        sky_flat: WadName,
    ) -> Result<LevelMap> {
        let start_time = Instant::now();
        let level_index = wad.level_index(level_name)?;
        let marker = wad.level_lump(level_index)?;
        info!("Reading level data for '{}'...", marker.name());
        let start_index = marker.index();
        let lump = |offset: usize, expected: &str| {
            let lump = wad.lump_after(start_index, offset, expected)?;
            if !lump.is_named(expected) {
                warn!(
                    "Expected {} at +{} from {}, found {}.",
                    expected,
                    offset,
                    marker.name(),
                    lump.name()
                );
            }
            Ok::<_, Error>(lump)
        };

        let things: Vec<WadThing> = lump(THINGS_OFFSET, "THINGS")?.decode_vec()?;
        let linedefs: Vec<WadLinedef> = lump(LINEDEFS_OFFSET, "LINEDEFS")?.decode_vec()?;
        let sidedefs: Vec<WadSidedef> = lump(SIDEDEFS_OFFSET, "SIDEDEFS")?.decode_vec()?;
        let vertices: Vec<WadVertex> = lump(VERTICES_OFFSET, "VERTEXES")?.decode_vec()?;
        let sectors: Vec<WadSector> = lump(SECTORS_OFFSET, "SECTORS")?.decode_vec()?;

        info!("Loaded level '{}':", marker.name());
        info!("    {:4} things", things.len());
        info!("    {:4} linedefs", linedefs.len());
        info!("    {:4} sidedefs", sidedefs.len());
        info!("    {:4} vertices", vertices.len());
        info!("    {:4} sectors", sectors.len());

        let level = LevelMap::from_wad_records(
            marker.name(),
            &vertices,
            &linedefs,
            &sidedefs,
            &sectors,
            &things,
            |name| resolve_flat(flats, sky_flat, name),
            |name| resolve_wall(walls, name),
        );
        info!(
            "Done in {:.2}ms.",
            start_time.elapsed().as_secs_f64() * 1000.0
        );
        Ok(level)
    }

    /// Builds the typed tables from raw records, using the given texture name resolvers.
    pub fn from_wad_records<FlatF, WallF>(
        name: WadName,
        vertices: &[WadVertex],
        linedefs: &[WadLinedef],
        sidedefs: &[WadSidedef],
        sectors: &[WadSector],
        things: &[WadThing],
        mut resolve_flat: FlatF,
        mut resolve_wall: WallF,
    ) -> LevelMap
    where
        FlatF: FnMut(WadName) -> FlatRef,
        WallF: FnMut(WadName) -> Option<usize>,
    {
        let vertices: Vec<Pnt2f> = vertices
            .iter()
            .map(|vertex| from_wad_coords(vertex.x, vertex.y))
            .collect();
        let bounds = BoundingBox::from_points(vertices.iter().cloned()).unwrap_or(BoundingBox {
            min: Pnt2f::new(0.0, 0.0),
            max: Pnt2f::new(0.0, 0.0),
        });
        LevelMap {
            name,
            bounds,
            vertices,
            linedefs: linedefs
                .iter()
                .map(|linedef| Linedef {
                    start: usize::from(linedef.start_vertex),
                    end: usize::from(linedef.end_vertex),
                    flags: linedef.flags,
                    front: parse_optional_id(linedef.right_side),
                    back: parse_optional_id(linedef.left_side),
                })
                .collect(),
            sidedefs: sidedefs
                .iter()
                .map(|side| Sidedef {
                    offset: vec2(f32::from(side.x_offset), f32::from(side.y_offset)),
                    upper: resolve_wall(side.upper_texture),
                    lower: resolve_wall(side.lower_texture),
                    middle: resolve_wall(side.middle_texture),
                    sector: usize::from(side.sector),
                })
                .collect(),
            sectors: sectors
                .iter()
                .map(|sector| Sector {
                    floor: f32::from(sector.floor_height),
                    ceiling: f32::from(sector.ceiling_height),
                    floor_flat: resolve_flat(sector.floor_texture),
                    ceiling_flat: resolve_flat(sector.ceiling_texture),
                    light: from_wad_light(sector.light),
                })
                .collect(),
            things: things
                .iter()
                .map(|thing| Thing {
                    position: from_wad_coords(thing.x, thing.y),
                    angle: Rad(f32::from(thing.angle).to_radians()),
                    thing_type: thing.thing_type,
                })
                .collect(),
        }
    }

    pub fn vertex(&self, index: usize) -> Result<Pnt2f> {
        self.vertices
            .get(index)
            .cloned()
            .ok_or_else(|| ErrorKind::out_of_range("vertex", index, self.vertices.len()).into())
    }

    pub fn linedef(&self, index: usize) -> Result<&Linedef> {
        self.linedefs
            .get(index)
            .ok_or_else(|| ErrorKind::out_of_range("linedef", index, self.linedefs.len()).into())
    }

    pub fn sidedef(&self, index: usize) -> Result<&Sidedef> {
        self.sidedefs
            .get(index)
            .ok_or_else(|| ErrorKind::out_of_range("sidedef", index, self.sidedefs.len()).into())
    }

    pub fn sector(&self, index: usize) -> Result<&Sector> {
        self.sectors
            .get(index)
            .ok_or_else(|| ErrorKind::out_of_range("sector", index, self.sectors.len()).into())
    }

    /// Highest ceiling in the level, or `None` for a level without sectors.
    pub fn max_ceiling(&self) -> Option<f32> {
        self.sectors
            .iter()
            .map(|sector| sector.ceiling)
            .fold(None, |max, ceiling| {
                Some(max.map_or(ceiling, |max: f32| max.max(ceiling)))
            })
    }

    pub fn player_start(&self) -> Option<&Thing> {
        self.things
            .iter()
            .find(|thing| thing.thing_type == PLAYER_START_THING)
    }
}

fn resolve_flat(flats: &FlatSet, sky_flat: WadName, name: WadName) -> FlatRef {
    if name == sky_flat {
        FlatRef::Sky
    } else if name.is_untextured() {
        FlatRef::None
    } else if let Some(index) = flats.index_of(name) {
        FlatRef::Flat(index)
    } else {
        warn!("No such flat '{}', leaving untextured.", name);
        FlatRef::None
    }
}

fn resolve_wall(walls: &WallTextureSet, name: WadName) -> Option<usize> {
    if name.is_untextured() || name.is_empty() {
        None
    } else {
        let index = walls.index_of(name);
        if index.is_none() {
            warn!("No such wall texture '{}', leaving untextured.", name);
        }
        index
    }
}

#[cfg(test)]
mod test {
    use super::super::builder::ArchiveBuilder;
    use super::super::tex::{FlatSet, WallTexture, WallTextureSet};
    use super::super::types::*;
    use super::{FlatRef, LevelMap};
    use std::str::FromStr;

    fn name(name: &str) -> WadName {
        WadName::from_str(name).unwrap()
    }

    fn test_archive() -> ArchiveBuilder {
        let mut builder = ArchiveBuilder::new();
        builder
            .marker("E1M1")
            .records(
                "THINGS",
                &[WadThing {
                    x: 16,
                    y: 16,
                    angle: 90,
                    thing_type: 1,
                    flags: 7,
                }],
            )
            .records(
                "LINEDEFS",
                &[WadLinedef {
                    start_vertex: 0,
                    end_vertex: 1,
                    flags: LINEDEF_TWO_SIDED | LINEDEF_LOWER_UNPEGGED,
                    special_type: 0,
                    sector_tag: 0,
                    right_side: 0,
                    left_side: NO_INDEX,
                }],
            )
            .records(
                "SIDEDEFS",
                &[WadSidedef {
                    x_offset: 3,
                    y_offset: -2,
                    upper_texture: name("-"),
                    lower_texture: name("STEP1"),
                    middle_texture: name("UNKNOWN"),
                    sector: 0,
                }],
            )
            .records(
                "VERTEXES",
                &[
                    WadVertex { x: -64, y: 0 },
                    WadVertex { x: 128, y: 32 },
                    WadVertex { x: 0, y: -16 },
                ],
            )
            .marker("SEGS")
            .marker("SSECTORS")
            .marker("NODES")
            .records(
                "SECTORS",
                &[WadSector {
                    floor_height: 0,
                    ceiling_height: 128,
                    floor_texture: name("FLOOR4_8"),
                    ceiling_texture: name("F_SKY1"),
                    light: 192,
                    sector_type: 0,
                    tag: 0,
                }],
            );
        builder
    }

    fn textures() -> (FlatSet, WallTextureSet) {
        let flats = FlatSet::from_flats(vec![
            (name("F_SKY1"), vec![0; FLAT_BYTES]),
            (name("FLOOR4_8"), vec![0; FLAT_BYTES]),
        ]);
        let walls = WallTextureSet::from_textures(vec![WallTexture {
            name: name("STEP1"),
            width: 32,
            height: 16,
            pixels: vec![0; 32 * 16],
        }]);
        (flats, walls)
    }

    #[test]
    fn decodes_and_resolves_level() {
        let archive = test_archive().into_archive().unwrap();
        let (flats, walls) = textures();
        let level = LevelMap::from_archive(&archive, "e1m1", &flats, &walls, name("F_SKY1"))
            .unwrap();

        assert_eq!(level.vertices.len(), 3);
        assert_eq!(level.linedefs.len(), 1);
        let linedef = level.linedef(0).unwrap();
        assert!(linedef.is_two_sided());
        assert!(linedef.lower_unpegged());
        assert!(!linedef.upper_unpegged());
        assert_eq!(linedef.front, Some(0));
        assert_eq!(linedef.back, None);

        let side = level.sidedef(0).unwrap();
        assert_eq!((side.offset.x, side.offset.y), (3.0, -2.0));
        assert_eq!(side.upper, None);
        assert_eq!(side.lower, Some(0));
        assert_eq!(side.middle, None);

        let sector = level.sector(0).unwrap();
        assert_eq!(sector.floor_flat, FlatRef::Flat(1));
        assert_eq!(sector.ceiling_flat, FlatRef::Sky);
        assert_eq!(sector.light, 0.75);
        assert_eq!(level.max_ceiling(), Some(128.0));

        assert_eq!((level.bounds.min.x, level.bounds.min.y), (-64.0, -16.0));
        assert_eq!((level.bounds.max.x, level.bounds.max.y), (128.0, 32.0));

        let start = level.player_start().unwrap();
        assert!((start.angle.0 - std::f32::consts::FRAC_PI_2).abs() < 1e-6);
        assert!(level.vertex(3).unwrap_err().kind().is_out_of_range());
        assert!(level.sector(1).unwrap_err().kind().is_out_of_range());
    }

    #[test]
    fn missing_level_is_not_found() {
        let archive = test_archive().into_archive().unwrap();
        let (flats, walls) = textures();
        let error = LevelMap::from_archive(&archive, "E1M2", &flats, &walls, name("F_SKY1"))
            .err()
            .unwrap();
        assert!(error.kind().is_not_found());
    }

    #[test]
    fn bad_record_length_is_corrupt() {
        let mut builder = ArchiveBuilder::new();
        builder
            .marker("MAP01")
            .lump("THINGS", vec![0; 10])
            .lump("LINEDEFS", vec![0; 13])
            .lump("SIDEDEFS", Vec::new())
            .lump("VERTEXES", Vec::new())
            .marker("SEGS")
            .marker("SSECTORS")
            .marker("NODES")
            .lump("SECTORS", Vec::new());
        let archive = builder.into_archive().unwrap();
        let (flats, walls) = textures();
        let error = LevelMap::from_archive(&archive, "MAP01", &flats, &walls, name("F_SKY1"))
            .err()
            .unwrap();
        assert!(error.kind().is_corrupt());
    }

    #[test]
    fn truncated_level_is_not_found() {
        let mut builder = ArchiveBuilder::new();
        builder.marker("MAP01").lump("THINGS", Vec::new());
        let archive = builder.into_archive().unwrap();
        let (flats, walls) = textures();
        let error = LevelMap::from_archive(&archive, "MAP01", &flats, &walls, name("F_SKY1"))
            .err()
            .unwrap();
        assert!(error.kind().is_not_found());
    }
}
