//! Free functions over `glam` vectors that the kernel needs beyond `DVec3`'s own API.

use crate::{HomogeneousPoint, Point3, Vector3};

/// A unit vector perpendicular to `v`.
///
/// The helper axis is the world axis least aligned with `v`, so the result is
/// well conditioned for any non-zero input. Returns `Vector3::ZERO` for a zero
/// vector.
pub fn perpendicular_to(v: Vector3) -> Vector3 {
    let len = v.length();
    if len == 0.0 {
        return Vector3::ZERO;
    }
    let d = v / len;
    let helper = if d.x.abs() < 0.9 { Vector3::X } else { Vector3::Y };
    d.cross(helper).normalize()
}

/// Distance from `p` to the closed segment `[a, b]`.
pub fn distance_to_segment(p: Point3, a: Point3, b: Point3) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq == 0.0 {
        return (p - a).length();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).length()
}

/// Lift a Cartesian point with weight `w` to homogeneous coordinates.
pub fn to_homogeneous(p: Point3, w: f64) -> HomogeneousPoint {
    HomogeneousPoint::new(p.x * w, p.y * w, p.z * w, w)
}

/// Project a homogeneous point back to Cartesian space.
///
/// A zero weight returns the unprojected position; callers that can produce
/// one are expected to have rejected it earlier.
pub fn from_homogeneous(h: HomogeneousPoint) -> Point3 {
    if h.w == 0.0 {
        h.truncate()
    } else {
        h.truncate() / h.w
    }
}
