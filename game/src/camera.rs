use math::prelude::*;
use math::{perspective, vec3, Deg, Mat4, Pnt3f, Rad, Radf, Vec3f};
use std::f32::consts::FRAC_PI_2;
use wad::CameraMetadata;

/// How close the pitch may get to straight up or down.
const PITCH_MARGIN: f32 = 0.05;

#[derive(Copy, Clone, Debug)]
pub struct Camera {
    pub position: Pnt3f,
    yaw: Radf,
    pitch: Radf,
    fov: Radf,
    near: f32,
    far: f32,
}

impl Camera {
    pub fn new(config: &CameraMetadata) -> Camera {
        Camera {
            position: Pnt3f::origin(),
            yaw: Rad(0.0),
            pitch: Rad(0.0),
            fov: Deg(config.fov_degrees).into(),
            near: config.near,
            far: config.far,
        }
    }

    pub fn yaw(&self) -> Radf {
        self.yaw
    }

    pub fn pitch(&self) -> Radf {
        self.pitch
    }

    pub fn set_yaw(&mut self, yaw: Radf) {
        self.yaw = yaw;
    }

    pub fn set_pitch(&mut self, pitch: Radf) {
        let limit = FRAC_PI_2 - PITCH_MARGIN;
        self.pitch = Rad(pitch.0.max(-limit).min(limit));
    }

    pub fn forward(&self) -> Vec3f {
        let (yaw, pitch) = (self.yaw.0, self.pitch.0);
        vec3(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
    }

    pub fn right(&self) -> Vec3f {
        Vec3f::unit_y().cross(self.forward()).normalize()
    }

    pub fn up(&self) -> Vec3f {
        self.forward().cross(self.right()).normalize()
    }

    /// `forward` and `right` projected onto the horizontal plane.
    pub fn ground_axes(&self) -> (Vec3f, Vec3f) {
        let (forward, right) = (self.forward(), self.right());
        (
            vec3(forward.x, 0.0, forward.z).normalize(),
            vec3(right.x, 0.0, right.z).normalize(),
        )
    }

    /// Map y becomes world z, which mirrors the level; flipping view x undoes it so that `right`
    /// points to the right of the screen.
    pub fn view(&self) -> Mat4 {
        Mat4::from_nonuniform_scale(-1.0, 1.0, 1.0)
            * Mat4::look_at_rh(self.position, self.position + self.forward(), self.up())
    }

    pub fn projection(&self, aspect_ratio: f32) -> Mat4 {
        perspective(self.fov, aspect_ratio, self.near, self.far)
    }
}
