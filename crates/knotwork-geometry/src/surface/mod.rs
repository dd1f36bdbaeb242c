//! Surface traits and implementations.

mod nurbs;

use knotwork_core::{NurbsError, Result, Tolerance};
use knotwork_math::{Point3, Vector3};
use serde::{Deserialize, Serialize};

pub use nurbs::{NurbsSurface, NurbsSurfaceData};

/// Direction queried by [`Surface::evaluate_at`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceDirection {
    U,
    V,
    Normal,
}

/// Trait for parametric surfaces in 3D space.
pub trait Surface: Send + Sync {
    /// Return the u-parameter domain `(u_min, u_max)`.
    fn domain_u(&self) -> (f64, f64);

    /// Return the v-parameter domain `(v_min, v_max)`.
    fn domain_v(&self) -> (f64, f64);

    /// Evaluate the surface at parameters `(u, v)`.
    fn point_at(&self, u: f64, v: f64) -> Result<Point3>;

    /// Mixed partials `skl[k][l]` (k times in u, l times in v) for `k + l <= order`.
    fn derivatives_at(&self, u: f64, v: f64, order: usize) -> Result<Vec<Vec<Vector3>>>;

    /// Unit normal along `Su x Sv`.
    fn normal_at(&self, u: f64, v: f64) -> Result<Vector3> {
        let skl = self.derivatives_at(u, v, 1)?;
        let n = skl[1][0].cross(skl[0][1]);
        let len = n.length();
        if len < Tolerance::EPSILON {
            return Err(NurbsError::DegenerateGeometry(format!(
                "surface normal undefined at ({}, {})",
                u, v
            )));
        }
        Ok(n / len)
    }

    /// Unit tangent in `u` or `v`, or the unit normal.
    fn evaluate_at(&self, u: f64, v: f64, direction: SurfaceDirection) -> Result<Vector3> {
        let (k, l) = match direction {
            SurfaceDirection::Normal => return self.normal_at(u, v),
            SurfaceDirection::U => (1, 0),
            SurfaceDirection::V => (0, 1),
        };
        let skl = self.derivatives_at(u, v, 1)?;
        let d = skl[k][l];
        let len = d.length();
        if len < Tolerance::EPSILON {
            return Err(NurbsError::DegenerateGeometry(format!(
                "{:?} tangent vanishes at ({}, {})",
                direction, u, v
            )));
        }
        Ok(d / len)
    }
}
