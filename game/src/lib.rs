#![cfg_attr(feature = "cargo-clippy", allow(clippy::too_many_arguments))]

mod anim;
mod camera;
mod errors;
mod host;
mod meshgen;
mod state;
mod vertex;

#[cfg(test)]
mod fixtures;

pub use self::anim::{FlatAnimator, FLAT_FRAME_TIME};
pub use self::camera::Camera;
pub use self::errors::{Error, ErrorKind, Result};
pub use self::host::{Analog2d, Gesture, Host, Key, MeshId, MouseButton, Renderer, TextureArray};
pub use self::meshgen::{generate_meshes, LeafMesh, MeshStats, RenderMeshSet, StencilMesh};
pub use self::meshgen::{StencilQuad, WallPart, WallQuad};
pub use self::state::{Bindings, EngineState};
pub use self::vertex::{MeshVertex, StencilVertex, NO_TEXTURE, TEXTURE_KIND_FLAT};
pub use self::vertex::TEXTURE_KIND_WALL;
