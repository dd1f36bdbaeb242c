//! NURBS surface implementation.

use knotwork_core::{NurbsError, Result, Validate};
use knotwork_math::{vector::to_homogeneous, HomogeneousPoint, Point3, Vector3};
use serde::{Deserialize, Serialize};

use super::Surface;
use crate::curve::NurbsCurve;
use crate::nurbs::{evaluate, interpolate, KnotVector};

/// A tensor-product NURBS surface.
///
/// `control_points[i][j]` is the control point at row `i` (u-direction) and
/// column `j` (v-direction); `weights` has the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "NurbsSurfaceData")]
pub struct NurbsSurface {
    degree_u: usize,
    degree_v: usize,
    knots_u: KnotVector,
    knots_v: KnotVector,
    control_points: Vec<Vec<Point3>>,
    weights: Vec<Vec<f64>>,
    #[serde(skip)]
    homogeneous: Vec<Vec<HomogeneousPoint>>,
}

/// Unvalidated plain-data form of a [`NurbsSurface`].
#[derive(Debug, Clone, Deserialize)]
pub struct NurbsSurfaceData {
    pub degree_u: usize,
    pub degree_v: usize,
    pub knots_u: Vec<f64>,
    pub knots_v: Vec<f64>,
    pub control_points: Vec<Vec<Point3>>,
    #[serde(default)]
    pub weights: Option<Vec<Vec<f64>>>,
}

impl TryFrom<NurbsSurfaceData> for NurbsSurface {
    type Error = NurbsError;

    fn try_from(data: NurbsSurfaceData) -> Result<Self> {
        let weights = data
            .weights
            .unwrap_or_else(|| data.control_points.iter().map(|r| vec![1.0; r.len()]).collect());
        Self::try_new(
            data.degree_u,
            data.degree_v,
            KnotVector::new(data.knots_u)?,
            KnotVector::new(data.knots_v)?,
            data.control_points,
            weights,
        )
    }
}

impl NurbsSurface {
    pub fn try_new(
        degree_u: usize,
        degree_v: usize,
        knots_u: KnotVector,
        knots_v: KnotVector,
        control_points: Vec<Vec<Point3>>,
        weights: Vec<Vec<f64>>,
    ) -> Result<Self> {
        let homogeneous = control_points
            .iter()
            .zip(&weights)
            .map(|(row, row_w)| {
                row.iter()
                    .zip(row_w)
                    .map(|(&p, &w)| to_homogeneous(p, w))
                    .collect()
            })
            .collect();
        let surface = Self {
            degree_u,
            degree_v,
            knots_u,
            knots_v,
            control_points,
            weights,
            homogeneous,
        };
        surface.validate()?;
        Ok(surface)
    }

    /// Bilinear patch through four corners, counter-clockwise from `p1`.
    ///
    /// The grid is `[[p1, p4], [p2, p3]]`, so `u` runs from `p1` to `p2` and
    /// `v` from `p1` to `p4`.
    pub fn from_corners(p1: Point3, p2: Point3, p3: Point3, p4: Point3) -> Result<Self> {
        let knots = KnotVector::from_sorted(vec![0.0, 0.0, 1.0, 1.0]);
        Self::try_new(
            1,
            1,
            knots.clone(),
            knots,
            vec![vec![p1, p4], vec![p2, p3]],
            vec![vec![1.0; 2]; 2],
        )
    }

    /// Surface through a sequence of section curves.
    ///
    /// Sections must share degree, knot vector and control point count; they
    /// become the `v` direction, while `u` interpolates across the sections
    /// with `min(degree, sections - 1)`.
    pub fn lofted(sections: &[NurbsCurve], degree: usize) -> Result<Self> {
        let first = match sections {
            [first, _, ..] => first,
            _ => {
                return Err(NurbsError::InvalidArgument(
                    "loft needs at least two sections".into(),
                ))
            }
        };
        if let Some(i) = sections.iter().position(|c| {
            c.degree() != first.degree()
                || c.knots() != first.knots()
                || c.control_points().len() != first.control_points().len()
        }) {
            return Err(NurbsError::DimensionMismatch(format!(
                "section {} is not compatible with section 0",
                i
            )));
        }
        let degree_u = degree.min(sections.len() - 1);

        let columns: Vec<Vec<HomogeneousPoint>> = (0..first.control_points().len())
            .map(|j| sections.iter().map(|c| c.homogeneous_points()[j]).collect())
            .collect();
        let (knots_u, solved) = interpolate::interpolate_rows(&columns, degree_u)?;

        let grid: Vec<Vec<HomogeneousPoint>> = (0..sections.len())
            .map(|i| solved.iter().map(|column| column[i]).collect())
            .collect();
        let control_points = grid
            .iter()
            .map(|row| row.iter().map(|h| h.truncate() / h.w).collect())
            .collect();
        let weights = grid
            .iter()
            .map(|row| row.iter().map(|h| h.w).collect())
            .collect();

        log::debug!(
            "lofted {} sections into a {}x{} control grid",
            sections.len(),
            sections.len(),
            first.control_points().len()
        );
        Self::try_new(
            degree_u,
            first.degree(),
            knots_u,
            first.knots().clone(),
            control_points,
            weights,
        )
    }

    pub fn degree_u(&self) -> usize {
        self.degree_u
    }

    pub fn degree_v(&self) -> usize {
        self.degree_v
    }

    pub fn knots_u(&self) -> &KnotVector {
        &self.knots_u
    }

    pub fn knots_v(&self) -> &KnotVector {
        &self.knots_v
    }

    pub fn control_points(&self) -> &[Vec<Point3>] {
        &self.control_points
    }

    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    pub fn is_rational(&self) -> bool {
        self.weights
            .iter()
            .flatten()
            .any(|&w| !approx::abs_diff_eq!(w, 1.0, epsilon = 1e-12))
    }
}

impl Validate for NurbsSurface {
    fn validate(&self) -> Result<()> {
        let rows = self.control_points.len();
        let cols = self.control_points.first().map_or(0, Vec::len);
        if rows == 0 || cols == 0 {
            return Err(NurbsError::InvalidArgument(
                "surface control grid is empty".into(),
            ));
        }
        if let Some(i) = self.control_points.iter().position(|r| r.len() != cols) {
            return Err(NurbsError::DimensionMismatch(format!(
                "control row {} has {} points, expected {}",
                i,
                self.control_points[i].len(),
                cols
            )));
        }
        if self.weights.len() != rows || self.weights.iter().any(|r| r.len() != cols) {
            return Err(NurbsError::DimensionMismatch(format!(
                "weight grid does not match the {}x{} control grid",
                rows, cols
            )));
        }
        if let Some(w) = self
            .weights
            .iter()
            .flatten()
            .find(|w| !(w.is_finite() && **w > 0.0))
        {
            return Err(NurbsError::InvalidArgument(format!(
                "weights must be positive, got {}",
                w
            )));
        }
        if self.control_points.iter().flatten().any(|p| !p.is_finite()) {
            return Err(NurbsError::InvalidArgument(
                "control points must be finite".into(),
            ));
        }
        self.knots_u.validate_for(self.degree_u, rows)?;
        self.knots_v.validate_for(self.degree_v, cols)
    }
}

impl Surface for NurbsSurface {
    fn domain_u(&self) -> (f64, f64) {
        self.knots_u.domain(self.degree_u)
    }

    fn domain_v(&self) -> (f64, f64) {
        self.knots_v.domain(self.degree_v)
    }

    fn point_at(&self, u: f64, v: f64) -> Result<Point3> {
        evaluate::rational_surface_point(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.homogeneous,
            u,
            v,
        )
    }

    fn derivatives_at(&self, u: f64, v: f64, order: usize) -> Result<Vec<Vec<Vector3>>> {
        evaluate::rational_surface_derivatives(
            self.degree_u,
            self.degree_v,
            &self.knots_u,
            &self.knots_v,
            &self.homogeneous,
            u,
            v,
            order,
        )
    }
}
