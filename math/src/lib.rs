mod line;

pub use cgmath::prelude;
pub use cgmath::{perspective, vec2, vec3, vec4, Deg, Matrix4, Point2, Point3, Rad};
pub use cgmath::{Vector2, Vector3, Vector4};

pub use self::line::{Line2, Line2f};

pub type Vec2<ScalarT> = Vector2<ScalarT>;
pub type Vec3<ScalarT> = Vector3<ScalarT>;

pub type Vec2f = Vector2<f32>;
pub type Vec3f = Vector3<f32>;
pub type Pnt2f = Point2<f32>;
pub type Pnt3f = Point3<f32>;
pub type Mat4 = Matrix4<f32>;
pub type Radf = Rad<f32>;
