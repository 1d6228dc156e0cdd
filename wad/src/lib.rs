mod archive;
mod bsp;
mod builder;
mod errors;
mod gl;
mod image;
mod level;
mod meta;
mod name;

pub mod tex;
pub mod types;
pub mod util;

pub use self::archive::{Archive, LumpReader};
pub use self::bsp::{seg_sector, BspVisitor};
pub use self::builder::ArchiveBuilder;
pub use self::errors::{Error, ErrorKind, Result};
pub use self::gl::{Child, Leaf, Node, Seg, SpatialIndex, VertexRef};
pub use self::image::{Canvas, Image, TRANSPARENT_PIXEL};
pub use self::level::{BoundingBox, FlatRef, LevelMap, Linedef, Sector, Sidedef, Thing};
pub use self::meta::{AnimationMetadata, CameraMetadata, ThingMetadata, WadMetadata};
pub use self::meta::PLAYER_START_THING;
pub use self::name::{IntoWadName, WadName};
pub use self::tex::{decode_flats, decode_game_wall_textures, decode_palettes, decode_wall_textures};
pub use self::tex::{FlatSet, Palettes, WallTexture, WallTextureSet};
