use super::anim::FlatAnimator;
use super::camera::Camera;
use super::errors::{ErrorKind, Result};
use super::host::{Analog2d, Gesture, Host, Key, MeshId, MouseButton, Renderer, TextureArray};
use super::meshgen::{generate_meshes, RenderMeshSet};
use super::vertex::StencilVertex;
use failchain::{bail, ResultExt};
use log::{debug, info, warn};
use math::prelude::*;
use math::{Mat4, Pnt2f, Pnt3f, Rad};
use std::time::Instant;
use wad::types::FLAT_SIZE;
use wad::{Archive, FlatSet, LevelMap, Palettes, SpatialIndex, WadMetadata, WadName};
use wad::WallTextureSet;
use wad::{CameraMetadata, PLAYER_START_THING};

/// Name of the wall texture drawn as the sky backdrop.
const SKY_TEXTURE: &str = "SKY1";

pub struct Bindings {
    pub movement: Analog2d,
    pub turn: Analog2d,
    pub look: Analog2d,
    pub run: Gesture,
    pub palette_down: Gesture,
    pub palette_up: Gesture,
    pub reset_pitch: Gesture,
    pub capture_mouse: Gesture,
    pub release_mouse: Gesture,
}

impl Bindings {
    pub fn new(camera: &CameraMetadata) -> Bindings {
        Bindings {
            movement: Analog2d::Gestures {
                x_positive: Gesture::KeyHold(Key::D),
                x_negative: Gesture::KeyHold(Key::A),
                y_positive: Gesture::AnyOf(vec![
                    Gesture::KeyHold(Key::W),
                    Gesture::KeyHold(Key::Up),
                ]),
                y_negative: Gesture::AnyOf(vec![
                    Gesture::KeyHold(Key::S),
                    Gesture::KeyHold(Key::Down),
                ]),
                step: 1.0,
            },
            turn: Analog2d::Gestures {
                x_positive: Gesture::KeyHold(Key::Right),
                x_negative: Gesture::KeyHold(Key::Left),
                y_positive: Gesture::NoGesture,
                y_negative: Gesture::NoGesture,
                step: camera.turn_speed,
            },
            look: Analog2d::Mouse {
                sensitivity: camera.mouse_sensitivity,
            },
            run: Gesture::KeyHold(Key::LShift),
            palette_down: Gesture::KeyTrigger(Key::Minus),
            palette_up: Gesture::KeyTrigger(Key::Equal),
            reset_pitch: Gesture::KeyHold(Key::Equal),
            capture_mouse: Gesture::ButtonHold(MouseButton::Right),
            release_mouse: Gesture::KeyHold(Key::Escape),
        }
    }
}

struct UploadedMeshes {
    leaves: Vec<MeshId>,
    sky_meshes: Vec<MeshId>,
    unit_quad: MeshId,
}

/// A loaded level and everything needed to move around it and draw it.
pub struct EngineState {
    level: LevelMap,
    index: SpatialIndex,
    flats: FlatSet,
    walls: WallTextureSet,
    palettes: Palettes,
    meshes: RenderMeshSet,
    animator: FlatAnimator,

    camera: Camera,
    camera_config: CameraMetadata,
    bindings: Bindings,
    eye_height: f32,
    aspect_ratio: f32,
    palette_index: usize,

    uploaded: Option<UploadedMeshes>,
    dirty_meshes: Vec<usize>,
}

impl EngineState {
    /// Decodes textures and `level_name` from `archive`, its GL nodes from `gl_archive` (or
    /// `archive` if there is none), then builds the meshes.
    pub fn load(
        archive: &Archive,
        gl_archive: Option<&Archive>,
        level_name: &str,
        metadata: &WadMetadata,
    ) -> Result<EngineState> {
        info!("Loading level {}...", level_name);
        let start_time = Instant::now();

        let palettes = wad::decode_palettes(archive)
            .chain_err(|| ErrorKind::load(level_name, "palettes"))?;
        let flats =
            wad::decode_flats(archive).chain_err(|| ErrorKind::load(level_name, "flats"))?;
        let walls = wad::decode_game_wall_textures(archive)
            .chain_err(|| ErrorKind::load(level_name, "wall textures"))?;
        let level = LevelMap::from_archive(archive, level_name, &flats, &walls, metadata.sky_flat)
            .chain_err(|| ErrorKind::load(level_name, "level records"))?;
        let index = SpatialIndex::from_archive(gl_archive.unwrap_or(archive), level_name)
            .chain_err(|| ErrorKind::load(level_name, "GL nodes"))?;

        let meshes = generate_meshes(
            &level,
            &index,
            &flats,
            &walls,
            flats.sky_index(metadata.sky_flat),
        )
        .chain_err(|| ErrorKind::mesh_generation(level_name))?;
        let animator = FlatAnimator::new(&metadata.animations, &flats, &meshes);

        let eye_height = match metadata.find_thing(PLAYER_START_THING) {
            Some(thing) => thing.height,
            None => {
                warn!("No height for the player start thing, eyes on the floor.");
                0.0
            }
        };

        let mut state = EngineState {
            level,
            index,
            flats,
            walls,
            palettes,
            meshes,
            animator,
            camera: Camera::new(&metadata.camera),
            camera_config: metadata.camera,
            bindings: Bindings::new(&metadata.camera),
            eye_height,
            aspect_ratio: 1.0,
            palette_index: 0,
            uploaded: None,
            dirty_meshes: Vec::new(),
        };
        state.place_at_start();

        info!(
            "Level {} loaded in {:.2}ms.",
            level_name,
            start_time.elapsed().as_secs_f64() * 1000.0
        );
        Ok(state)
    }

    /// Tears down the current level and loads `level_name` in its place. On failure the current
    /// level stays loaded.
    pub fn reload(
        &mut self,
        archive: &Archive,
        gl_archive: Option<&Archive>,
        level_name: &str,
        metadata: &WadMetadata,
    ) -> Result<()> {
        info!("Tearing down level {}...", self.level.name);
        *self = EngineState::load(archive, gl_archive, level_name, metadata)?;
        Ok(())
    }

    fn place_at_start(&mut self) {
        let start = match self.level.player_start() {
            Some(start) => *start,
            None => {
                warn!("Level {} has no player start, starting at origin.", self.level.name);
                self.camera.position = Pnt3f::new(0.0, self.eye_height, 0.0);
                return;
            }
        };
        let floor = self.floor_at(start.position).unwrap_or(0.0);
        self.camera.position = Pnt3f::new(
            start.position.x,
            floor + self.eye_height,
            start.position.y,
        );
        self.camera.set_yaw(start.angle);
        self.camera.set_pitch(Rad(0.0));
        info!(
            "Player start at {:?}, eye at {}.",
            start.position, self.camera.position.y
        );
    }

    fn floor_at(&self, point: Pnt2f) -> Option<f32> {
        let region = self.index.locate_region(&self.level, point)?;
        self.level.sector(region).ok().map(|sector| sector.floor)
    }

    pub fn level(&self) -> &LevelMap {
        &self.level
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn flats(&self) -> &FlatSet {
        &self.flats
    }

    pub fn walls(&self) -> &WallTextureSet {
        &self.walls
    }

    pub fn palettes(&self) -> &Palettes {
        &self.palettes
    }

    pub fn meshes(&self) -> &RenderMeshSet {
        &self.meshes
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn palette_index(&self) -> usize {
        self.palette_index
    }

    /// The leaf the camera stands in.
    pub fn current_leaf(&self) -> Option<usize> {
        let position = self.camera.position;
        self.index.locate_leaf(Pnt2f::new(position.x, position.z))
    }

    pub fn update(&mut self, delta_time: f32, host: &mut impl Host) {
        self.aspect_ratio = host.aspect_ratio();

        let bindings = &self.bindings;
        if host.poll_gesture(&bindings.palette_down) {
            self.palette_index = self.palette_index.saturating_sub(1);
        }
        if host.poll_gesture(&bindings.palette_up) {
            self.palette_index += 1;
        }
        self.palette_index = self
            .palette_index
            .min(self.palettes.len().saturating_sub(1));

        let position = self.camera.position;
        if let Some(floor) = self.floor_at(Pnt2f::new(position.x, position.z)) {
            self.camera.position.y = floor + self.eye_height;
        }

        let bindings = &self.bindings;
        let mut speed = self.camera_config.speed * delta_time;
        if host.poll_gesture(&bindings.run) {
            speed *= self.camera_config.run_multiplier;
        }
        let movement = host.poll_analog2d(&bindings.movement);
        let (forward, right) = self.camera.ground_axes();
        self.camera.position += forward * (movement.y * speed) + right * (movement.x * speed);

        let turn = host.poll_analog2d(&bindings.turn);
        let mut yaw = self.camera.yaw() - Rad(turn.x * delta_time);

        if host.poll_gesture(&bindings.release_mouse) {
            host.set_mouse_captured(false);
        }
        if host.poll_gesture(&bindings.capture_mouse) {
            host.set_mouse_captured(true);
        }
        let mut pitch = self.camera.pitch();
        if host.poll_gesture(&bindings.reset_pitch) {
            pitch = Rad(0.0);
        }
        let look = host.poll_analog2d(&bindings.look);
        yaw -= Rad(look.x);
        pitch -= Rad(look.y);
        self.camera.set_yaw(yaw);
        self.camera.set_pitch(pitch);

        let changed = self.animator.update(delta_time, &mut self.meshes);
        if !changed.is_empty() {
            debug!("{} meshes changed by flat animation.", changed.len());
            self.dirty_meshes.extend(changed);
        }
    }

    /// Hands every texture and mesh of the level to `renderer`.
    pub fn upload(&mut self, renderer: &mut impl Renderer) -> Result<()> {
        info!("Uploading level {}...", self.level.name);
        let start_time = Instant::now();

        renderer.upload_palettes(&self.palettes.pixels(), self.palettes.len())?;
        let flat_pixels = self.flats.array_pixels();
        renderer.upload_flats(TextureArray {
            width: FLAT_SIZE,
            height: FLAT_SIZE,
            layers: self.flats.len(),
            pixels: &flat_pixels,
        })?;
        let wall_pixels = self.walls.array_pixels();
        let (max_width, max_height) = self.walls.max_size();
        renderer.upload_walls(TextureArray {
            width: max_width,
            height: max_height,
            layers: self.walls.len(),
            pixels: &wall_pixels,
        })?;
        let sky = SKY_TEXTURE
            .parse::<WadName>()
            .ok()
            .and_then(|name| self.walls.index_of(name))
            .and_then(|index| self.walls.get(index));
        match sky {
            Some(texture) => renderer.upload_sky_texture(texture)?,
            None => warn!("No {} wall texture, the sky will be blank.", SKY_TEXTURE),
        }

        let leaves = self
            .meshes
            .leaves
            .iter()
            .map(|mesh| renderer.upload_mesh(&mesh.vertices, &mesh.indices))
            .collect::<Result<Vec<_>>>()?;
        let sky_meshes = self
            .meshes
            .sky_meshes
            .iter()
            .map(|mesh| renderer.upload_stencil_mesh(&mesh.vertices, &mesh.indices))
            .collect::<Result<Vec<_>>>()?;
        let unit_quad = renderer.upload_stencil_mesh(&UNIT_QUAD_VERTICES, &UNIT_QUAD_INDICES)?;

        self.uploaded = Some(UploadedMeshes {
            leaves,
            sky_meshes,
            unit_quad,
        });
        self.dirty_meshes.clear();
        info!(
            "Done in {:.2}ms.",
            start_time.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    /// Draws the level: leaf meshes in BSP order, then the sky stencils, then the sky.
    pub fn render(&mut self, renderer: &mut impl Renderer) -> Result<()> {
        let uploaded = match self.uploaded {
            Some(ref uploaded) => uploaded,
            None => bail!(ErrorKind::not_uploaded(&self.level.name.to_string())),
        };
        for i_mesh in self.dirty_meshes.drain(..) {
            if let (Some(&id), Some(mesh)) =
                (uploaded.leaves.get(i_mesh), self.meshes.leaves.get(i_mesh))
            {
                renderer.update_mesh_vertices(id, &mesh.vertices)?;
            }
        }

        renderer.set_projection(&self.camera.projection(self.aspect_ratio));
        renderer.set_view(&self.camera.view());
        renderer.set_palette_index(self.palette_index);

        for &mesh in &uploaded.leaves {
            renderer.draw_mesh(mesh);
        }
        renderer.draw_stencil_mesh(uploaded.unit_quad, &self.meshes.overhead.transform());
        for quad in &self.meshes.sky_quads {
            renderer.draw_stencil_mesh(uploaded.unit_quad, &quad.transform());
        }
        let identity = Mat4::identity();
        for &mesh in &uploaded.sky_meshes {
            renderer.draw_stencil_mesh(mesh, &identity);
        }
        renderer.draw_sky();
        Ok(())
    }
}

const UNIT_QUAD_VERTICES: [StencilVertex; 4] = [
    StencilVertex {
        position: [0.0, 0.0, 0.0],
    },
    StencilVertex {
        position: [0.0, 1.0, 0.0],
    },
    StencilVertex {
        position: [1.0, 1.0, 0.0],
    },
    StencilVertex {
        position: [1.0, 0.0, 0.0],
    },
];

const UNIT_QUAD_INDICES: [u32; 6] = [0, 2, 1, 0, 3, 2];
