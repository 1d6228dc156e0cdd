use cgmath::{BaseFloat, InnerSpace, Point2, Vector2};
use num_traits::Float;

pub type Line2f = Line2<f32>;

/// A directed 2-D line: an origin and an (unnormalised) displacement.
///
/// Partition lines keep the displacement exactly as stored so that side tests reproduce the
/// integer arithmetic of the on-disk tree.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Line2<ScalarT: BaseFloat> {
    pub origin: Point2<ScalarT>,
    pub displace: Vector2<ScalarT>,
}

impl<ScalarT: BaseFloat> Line2<ScalarT> {
    pub fn from_origin_and_displace(
        origin: Point2<ScalarT>,
        displace: Vector2<ScalarT>,
    ) -> Line2<ScalarT> {
        Line2 { origin, displace }
    }

    pub fn from_two_points(origin: Point2<ScalarT>, towards: Point2<ScalarT>) -> Line2<ScalarT> {
        Self::from_origin_and_displace(origin, towards - origin)
    }

    pub fn inverted_halfspaces(&self) -> Line2<ScalarT> {
        Line2 {
            origin: self.origin,
            displace: -self.displace,
        }
    }

    pub fn length(&self) -> ScalarT {
        self.displace.magnitude()
    }

    /// The 2-D cross product `(point - origin) x displace`.
    ///
    /// Positive on the front (right-hand) side, negative on the back side and zero on the line.
    pub fn side_cross(&self, point: Point2<ScalarT>) -> ScalarT {
        let delta = point - self.origin;
        delta.x * self.displace.y - delta.y * self.displace.x
    }

    /// Points exactly on the line are not in front.
    pub fn is_in_front(&self, point: Point2<ScalarT>) -> bool {
        self.side_cross(point) > ScalarT::zero()
    }

    /// Same sign convention as `side_cross` but scaled by the length of the line.
    pub fn signed_distance(&self, point: Point2<ScalarT>) -> ScalarT {
        let length = self.length();
        if Float::abs(length) < <ScalarT as Float>::epsilon() {
            ScalarT::zero()
        } else {
            self.side_cross(point) / length
        }
    }

    pub fn at_offset(&self, offset: ScalarT) -> Point2<ScalarT> {
        self.origin + self.displace * offset
    }
}
