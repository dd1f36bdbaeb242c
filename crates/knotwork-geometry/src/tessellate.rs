//! Tessellation utilities for converting curves and surfaces to discrete representations.

use knotwork_core::{NurbsError, Result, Tolerance};
use knotwork_math::{vector::distance_to_segment, Point3};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::curve::Curve;
use crate::surface::Surface;

/// A curve point paired with the parameter it was evaluated at.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub t: f64,
    pub point: Point3,
}

impl Sample {
    pub fn new(t: f64, point: Point3) -> Self {
        Self { t, point }
    }
}

/// Split samples into parallel parameter and point lists.
pub fn unzip_samples(samples: &[Sample]) -> (Vec<f64>, Vec<Point3>) {
    samples.iter().map(|s| (s.t, s.point)).unzip()
}

/// Maximum recursion depth for adaptive subdivision.
const MAX_DEPTH: u32 = 12;

/// Settings for [`adaptive_sample_with`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveOptions {
    /// Largest accepted distance of an interval's midpoint and quarter points
    /// from its chord.
    pub tolerance: f64,
    /// Intervals at this depth are accepted without further checks.
    pub max_depth: u32,
    /// Intervals narrower than this (in parameter space) are not split.
    pub min_interval: f64,
}

impl Default for AdaptiveOptions {
    fn default() -> Self {
        Self {
            tolerance: Tolerance::MAX_TOLERANCE,
            max_depth: MAX_DEPTH,
            min_interval: Tolerance::EPSILON,
        }
    }
}

impl AdaptiveOptions {
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }
}

/// Sample `count` evenly spaced parameters over the curve's domain, both ends
/// included.
pub fn regular_sample(curve: &dyn Curve, count: usize) -> Result<Vec<Sample>> {
    if count < 2 {
        return Err(NurbsError::InvalidArgument(format!(
            "regular sampling needs at least 2 samples, got {}",
            count
        )));
    }
    let (t_min, t_max) = curve.domain();
    let step = (t_max - t_min) / (count - 1) as f64;

    let samples = (0..count)
        .into_par_iter()
        .map(|i| -> Result<Sample> {
            let t = if i == count - 1 {
                t_max
            } else {
                t_min + step * i as f64
            };
            Ok(Sample::new(t, curve.point_at(t)?))
        })
        .collect::<Result<Vec<_>>>()?;

    log::debug!("regular sample: {} points over [{}, {}]", count, t_min, t_max);
    Ok(samples)
}

/// Adaptive sampling with the given chordal `tolerance` and default limits.
///
/// A non-positive tolerance is replaced by [`Tolerance::MAX_TOLERANCE`].
pub fn adaptive_sample(curve: &dyn Curve, tolerance: f64) -> Result<Vec<Sample>> {
    adaptive_sample_with(curve, &AdaptiveOptions::with_tolerance(tolerance))
}

/// Convert a curve to samples using adaptive subdivision.
///
/// Intervals are bisected while the midpoint or either quarter point lies
/// farther than the tolerance from the chord between the interval ends.
///
/// Degree-1 curves return their control points at their knot parameters
/// instead. Control points sharing a parameter are reported once, so a
/// [`Polyline`](crate::curve::Polyline) with repeated vertices yields fewer
/// samples than it has vertices.
pub fn adaptive_sample_with(curve: &dyn Curve, options: &AdaptiveOptions) -> Result<Vec<Sample>> {
    if curve.degree() == 1 {
        return Ok(control_polygon_samples(curve));
    }

    let tolerance = Tolerance::sanitize(options.tolerance);
    let (t_min, t_max) = curve.domain();
    let p_min = curve.point_at(t_min)?;
    let p_max = curve.point_at(t_max)?;

    let mut samples = vec![Sample::new(t_min, p_min)];
    let mut stack = vec![(Sample::new(t_min, p_min), Sample::new(t_max, p_max), 0u32)];
    let mut depth_hits = 0usize;

    while let Some((start, end, depth)) = stack.pop() {
        if depth >= options.max_depth {
            depth_hits += 1;
            samples.push(end);
            continue;
        }
        if end.t - start.t < options.min_interval {
            samples.push(end);
            continue;
        }

        let t_mid = (start.t + end.t) * 0.5;
        let mid = Sample::new(t_mid, curve.point_at(t_mid)?);
        let mut deviation = distance_to_segment(mid.point, start.point, end.point);
        // An inflected span can cross its chord at the midpoint.
        for s in [0.25, 0.75] {
            if deviation > tolerance {
                break;
            }
            let t = start.t + (end.t - start.t) * s;
            let quarter = curve.point_at(t)?;
            deviation = deviation.max(distance_to_segment(quarter, start.point, end.point));
        }

        if deviation > tolerance {
            // Right half first so the left half is popped next.
            stack.push((mid, end, depth + 1));
            stack.push((start, mid, depth + 1));
        } else {
            samples.push(end);
        }
    }

    if depth_hits > 0 {
        log::warn!(
            "adaptive sample hit the depth limit {} on {} interval(s)",
            options.max_depth,
            depth_hits
        );
    }
    log::debug!(
        "adaptive sample: {} points at tolerance {}",
        samples.len(),
        tolerance
    );
    Ok(samples)
}

/// Control points of a degree-1 curve with the knots they sit at.
fn control_polygon_samples(curve: &dyn Curve) -> Vec<Sample> {
    let nurbs = curve.to_nurbs();
    let knots = &nurbs.knots()[1..];
    let mut samples: Vec<Sample> = Vec::with_capacity(nurbs.control_points().len());
    for (&t, &point) in knots.iter().zip(nurbs.control_points()) {
        if samples.last().map_or(true, |last| t > last.t) {
            samples.push(Sample::new(t, point));
        }
    }
    samples
}

/// Convert a surface to a triangle mesh using uniform parameter subdivision.
///
/// # Arguments
/// * `surface` - The surface to tessellate
/// * `u_divs` - Number of divisions in the u direction
/// * `v_divs` - Number of divisions in the v direction
///
/// # Returns
/// A tuple of `(vertices, triangles)` where each triangle is an array of 3 vertex indices.
pub fn surface_to_triangles(
    surface: &dyn Surface,
    u_divs: usize,
    v_divs: usize,
) -> Result<(Vec<Point3>, Vec<[u32; 3]>)> {
    if u_divs == 0 || v_divs == 0 {
        return Err(NurbsError::InvalidArgument(format!(
            "surface tessellation needs positive divisions, got {}x{}",
            u_divs, v_divs
        )));
    }
    let (u_min, u_max) = surface.domain_u();
    let (v_min, v_max) = surface.domain_v();

    let u_count = u_divs + 1;
    let v_count = v_divs + 1;
    let at = |min: f64, max: f64, i: usize, divs: usize| {
        if i == divs {
            max
        } else {
            min + (max - min) * i as f64 / divs as f64
        }
    };

    let vertices = (0..u_count * v_count)
        .into_par_iter()
        .map(|k| {
            let (i, j) = (k / v_count, k % v_count);
            surface.point_at(at(u_min, u_max, i, u_divs), at(v_min, v_max, j, v_divs))
        })
        .collect::<Result<Vec<_>>>()?;

    // Two triangles per quad
    let idx = |i: usize, j: usize| (i * v_count + j) as u32;
    let mut triangles = Vec::with_capacity(u_divs * v_divs * 2);
    for i in 0..u_divs {
        for j in 0..v_divs {
            triangles.push([idx(i, j), idx(i + 1, j), idx(i + 1, j + 1)]);
            triangles.push([idx(i, j), idx(i + 1, j + 1), idx(i, j + 1)]);
        }
    }

    log::debug!(
        "surface tessellation: {} vertices, {} triangles",
        vertices.len(),
        triangles.len()
    );
    Ok((vertices, triangles))
}
