use super::errors::Result;
use super::vertex::{MeshVertex, StencilVertex};
use math::prelude::*;
use math::{Mat4, Vec2f};
use wad::WallTexture;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Up,
    Down,
    Left,
    Right,
    LShift,
    Minus,
    Equal,
    Escape,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

pub enum Gesture {
    NoGesture,
    KeyHold(Key),
    KeyTrigger(Key),
    ButtonHold(MouseButton),
    AnyOf(Vec<Gesture>),
    AllOf(Vec<Gesture>),
}

pub enum Analog2d {
    NoAnalog2d,

    Mouse {
        sensitivity: f32,
    },

    Gestures {
        x_positive: Gesture,
        x_negative: Gesture,
        y_positive: Gesture,
        y_negative: Gesture,
        step: f32,
    },
}

/// The window and input side of the platform: everything the engine reads each tick.
pub trait Host {
    /// Size of the drawable area in pixels.
    fn window_size(&self) -> (u32, u32);

    fn is_key_down(&self, key: Key) -> bool;

    /// Whether `key` went down since the previous tick.
    fn is_key_just_pressed(&self, key: Key) -> bool;

    fn is_button_down(&self, button: MouseButton) -> bool;

    /// Pointer motion since the previous tick, in pixels, y pointing down.
    fn mouse_delta(&self) -> Vec2f;

    fn is_mouse_captured(&self) -> bool;

    fn set_mouse_captured(&mut self, captured: bool);

    fn aspect_ratio(&self) -> f32 {
        let (width, height) = self.window_size();
        if height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        }
    }

    fn poll_gesture(&self, gesture: &Gesture) -> bool {
        match *gesture {
            Gesture::KeyHold(key) => self.is_key_down(key),
            Gesture::KeyTrigger(key) => self.is_key_just_pressed(key),
            Gesture::ButtonHold(button) => self.is_button_down(button),
            Gesture::AnyOf(ref subgestures) => subgestures
                .iter()
                .any(|subgesture| self.poll_gesture(subgesture)),
            Gesture::AllOf(ref subgestures) => subgestures
                .iter()
                .all(|subgesture| self.poll_gesture(subgesture)),
            Gesture::NoGesture => false,
        }
    }

    fn poll_analog2d(&self, motion: &Analog2d) -> Vec2f {
        match *motion {
            Analog2d::Mouse { sensitivity } => {
                if self.is_mouse_captured() {
                    self.mouse_delta() * sensitivity
                } else {
                    Vec2f::zero()
                }
            }
            Analog2d::Gestures {
                ref x_positive,
                ref x_negative,
                ref y_positive,
                ref y_negative,
                step,
            } => Vec2f::new(
                if self.poll_gesture(x_positive) {
                    step
                } else if self.poll_gesture(x_negative) {
                    -step
                } else {
                    0.0
                },
                if self.poll_gesture(y_positive) {
                    step
                } else if self.poll_gesture(y_negative) {
                    -step
                } else {
                    0.0
                },
            ),
            Analog2d::NoAnalog2d => Vec2f::zero(),
        }
    }
}

pub type MeshId = usize;

/// A stack of equally sized 8-bit paletted images.
#[derive(Copy, Clone, Debug)]
pub struct TextureArray<'a> {
    pub width: usize,
    pub height: usize,
    pub layers: usize,
    pub pixels: &'a [u8],
}

/// The GPU side of the platform. Meshes are drawn with depth testing; stencil meshes only write
/// the stencil buffer, which `draw_sky` then tests against.
pub trait Renderer {
    fn set_projection(&mut self, projection: &Mat4);
    fn set_view(&mut self, view: &Mat4);
    fn set_palette_index(&mut self, index: usize);

    /// `count` palettes of 256 RGB triples, back to back.
    fn upload_palettes(&mut self, pixels: &[u8], count: usize) -> Result<()>;
    fn upload_flats(&mut self, flats: TextureArray) -> Result<()>;
    fn upload_walls(&mut self, walls: TextureArray) -> Result<()>;
    fn upload_sky_texture(&mut self, texture: &WallTexture) -> Result<()>;

    fn upload_mesh(&mut self, vertices: &[MeshVertex], indices: &[u32]) -> Result<MeshId>;
    fn update_mesh_vertices(&mut self, mesh: MeshId, vertices: &[MeshVertex]) -> Result<()>;
    fn upload_stencil_mesh(&mut self, vertices: &[StencilVertex], indices: &[u32])
        -> Result<MeshId>;

    fn draw_mesh(&mut self, mesh: MeshId);
    fn draw_stencil_mesh(&mut self, mesh: MeshId, transform: &Mat4);
    fn draw_sky(&mut self);
}

#[cfg(test)]
mod test {
    use super::{Analog2d, Gesture, Host, Key, MouseButton};
    use math::prelude::*;
    use math::Vec2f;

    struct Keys(Vec<Key>, bool);

    impl Host for Keys {
        fn window_size(&self) -> (u32, u32) {
            (800, 0)
        }

        fn is_key_down(&self, key: Key) -> bool {
            self.0.contains(&key)
        }

        fn is_key_just_pressed(&self, _key: Key) -> bool {
            false
        }

        fn is_button_down(&self, button: MouseButton) -> bool {
            button == MouseButton::Middle
        }

        fn mouse_delta(&self) -> Vec2f {
            Vec2f::new(3.0, 4.0)
        }

        fn is_mouse_captured(&self) -> bool {
            self.1
        }

        fn set_mouse_captured(&mut self, captured: bool) {
            self.1 = captured;
        }
    }

    #[test]
    fn gestures_combine() {
        let host = Keys(vec![Key::A, Key::LShift], false);
        let run_left = Gesture::AllOf(vec![
            Gesture::KeyHold(Key::A),
            Gesture::KeyHold(Key::LShift),
        ]);
        assert!(host.poll_gesture(&run_left));
        assert!(!host.poll_gesture(&Gesture::AllOf(vec![
            Gesture::KeyHold(Key::A),
            Gesture::KeyHold(Key::D),
        ])));
        assert!(host.poll_gesture(&Gesture::ButtonHold(MouseButton::Middle)));
        assert!(!host.poll_gesture(&Gesture::NoGesture));
        // A zero-height window does not divide by zero.
        assert_eq!(host.aspect_ratio(), 1.0);
    }

    #[test]
    fn analogs_scale_and_respect_capture() {
        let mut host = Keys(vec![Key::A, Key::D, Key::W], false);
        let motion = Analog2d::Gestures {
            x_positive: Gesture::KeyHold(Key::D),
            x_negative: Gesture::KeyHold(Key::A),
            y_positive: Gesture::KeyHold(Key::W),
            y_negative: Gesture::KeyHold(Key::S),
            step: 2.0,
        };
        // Positive wins when both directions are held.
        assert_eq!(host.poll_analog2d(&motion), Vec2f::new(2.0, 2.0));
        assert_eq!(host.poll_analog2d(&Analog2d::NoAnalog2d), Vec2f::zero());

        let mouse = Analog2d::Mouse { sensitivity: 0.5 };
        assert_eq!(host.poll_analog2d(&mouse), Vec2f::zero());
        host.set_mouse_captured(true);
        assert_eq!(host.poll_analog2d(&mouse), Vec2f::new(1.5, 2.0));
    }
}
