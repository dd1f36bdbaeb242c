//! Rotation-minimizing frames along a curve (double reflection).

use knotwork_core::{NurbsError, Result, Tolerance};
use knotwork_math::{vector::perpendicular_to, Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::curve::Curve;

/// An orthonormal frame on a curve.
///
/// `x_axis` and `y_axis` span the plane perpendicular to the curve; their
/// cross product is the unit tangent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub origin: Point3,
    pub x_axis: Vector3,
    pub y_axis: Vector3,
}

impl Frame {
    /// Frame at `origin` around `tangent`, with an arbitrary perpendicular as
    /// the starting axis. The tangent is normalized first.
    pub fn initial(origin: Point3, tangent: Vector3) -> Result<Self> {
        let len = tangent.length();
        if !(len >= Tolerance::EPSILON) {
            return Err(NurbsError::DegenerateGeometry(format!(
                "cannot build a frame around tangent {:?}",
                tangent
            )));
        }
        let tangent = tangent / len;
        let y_axis = tangent.cross(perpendicular_to(tangent)).normalize();
        let x_axis = y_axis.cross(tangent);
        Ok(Self {
            origin,
            x_axis,
            y_axis,
        })
    }

    /// Unit tangent the frame was built around.
    pub fn z_axis(&self) -> Vector3 {
        self.x_axis.cross(self.y_axis)
    }

    /// Carry this frame to the next point by two reflections: across the
    /// bisecting plane of the two origins, then across the plane bisecting
    /// the reflected and the actual tangent.
    pub fn next(&self, origin: Point3, tangent: Vector3) -> Result<Self> {
        let v1 = origin - self.origin;
        let c1 = v1.dot(v1);
        if c1.sqrt() < Tolerance::EPSILON {
            return Err(NurbsError::DegenerateGeometry(format!(
                "coincident frame origins at {:?}",
                origin
            )));
        }
        let t0 = self.z_axis();
        let r_l = self.x_axis - (2.0 / c1) * v1.dot(self.x_axis) * v1;
        let t_l = t0 - (2.0 / c1) * v1.dot(t0) * v1;

        let v2 = tangent - t_l;
        let c2 = v2.dot(v2);
        let r = if c2 < Tolerance::EPSILON * Tolerance::EPSILON {
            r_l
        } else {
            r_l - (2.0 / c2) * v2.dot(r_l) * v2
        };
        // Round-off drift is removed by projecting back onto the normal plane.
        let x_axis = (r - r.dot(tangent) * tangent).normalize();
        let y_axis = tangent.cross(x_axis);
        Ok(Self {
            origin,
            x_axis,
            y_axis,
        })
    }
}

/// Rotation-minimizing frames at `params`, propagated in the given order.
///
/// The first frame starts from an arbitrary perpendicular; each later frame
/// depends on the one before it, so reordering the parameters changes the
/// result.
pub fn perpendicular_frames(curve: &dyn Curve, params: &[f64]) -> Result<Vec<Frame>> {
    let stations = params
        .iter()
        .map(|&t| -> Result<(Point3, Vector3)> {
            Ok((curve.point_at(t)?, curve.unit_tangent_at(t)?))
        })
        .collect::<Result<Vec<_>>>()?;

    let Some((&(origin, tangent), rest)) = stations.split_first() else {
        return Ok(Vec::new());
    };

    let frames = rest.iter().try_fold(
        vec![Frame::initial(origin, tangent)?],
        |mut frames, &(origin, tangent)| -> Result<Vec<Frame>> {
            let next = match frames.last() {
                Some(prev) => prev.next(origin, tangent)?,
                None => Frame::initial(origin, tangent)?,
            };
            frames.push(next);
            Ok(frames)
        },
    )?;

    log::trace!("propagated {} frames", frames.len());
    Ok(frames)
}
