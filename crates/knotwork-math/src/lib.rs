//! knotwork math primitives: `glam` aliases, vector helpers and a small dense matrix.

pub mod matrix;
pub mod vector;

pub use glam::{dvec3, DVec2, DVec3, DVec4};
pub use matrix::Matrix;

pub type Point3 = DVec3;
pub type Vector3 = DVec3;
/// Weighted control point `(x*w, y*w, z*w, w)`.
pub type HomogeneousPoint = DVec4;
