//! Global interpolation: chord-length parameters, averaged knots and the
//! collocation system solved with [`Matrix`].

use knotwork_core::{NurbsError, Result, Tolerance};
use knotwork_math::{vector::from_homogeneous, HomogeneousPoint, Matrix};

use super::basis::basis_functions;
use super::knot::{span_index, KnotVector};

/// Chord-length parameters shared by several point rows.
///
/// Every row must have the same length; the parameter step between
/// consecutive indices is the average of the rows' chord lengths, so one
/// collocation matrix serves all of them.
pub fn chord_parameters(rows: &[Vec<HomogeneousPoint>]) -> Result<Vec<f64>> {
    let count = rows.first().map_or(0, Vec::len);
    if count < 2 {
        return Err(NurbsError::InvalidArgument(
            "interpolation needs at least two points".into(),
        ));
    }
    if rows.iter().any(|r| r.len() != count) {
        return Err(NurbsError::DimensionMismatch(
            "interpolation rows differ in length".into(),
        ));
    }

    let mut steps = vec![0.0; count - 1];
    for row in rows {
        for (i, w) in row.windows(2).enumerate() {
            steps[i] += (from_homogeneous(w[1]) - from_homogeneous(w[0])).length();
        }
    }
    let total: f64 = steps.iter().sum();
    if total < Tolerance::EPSILON {
        return Err(NurbsError::DegenerateGeometry(
            "interpolation points are coincident".into(),
        ));
    }

    let mut params = Vec::with_capacity(count);
    let mut acc = 0.0;
    params.push(0.0);
    for step in &steps[..count - 2] {
        acc += step;
        params.push(acc / total);
    }
    params.push(1.0);
    Ok(params)
}

/// Clamped knot vector obtained by averaging `degree` consecutive parameters.
pub fn averaged_knots(params: &[f64], degree: usize) -> Result<KnotVector> {
    let n = params.len();
    let mut knots = vec![0.0; degree + 1];
    for j in 1..n - degree {
        let avg = params[j..j + degree].iter().sum::<f64>() / degree as f64;
        knots.push(avg);
    }
    knots.extend(std::iter::repeat(1.0).take(degree + 1));
    KnotVector::new(knots)
}

/// Interpolate each row of points with a curve of `degree`, all rows sharing
/// the returned knot vector.
///
/// Returns the knots and, per row, the homogeneous control points. The system
/// matrix is factored once and solved for every coordinate of every row.
pub fn interpolate_rows(
    rows: &[Vec<HomogeneousPoint>],
    degree: usize,
) -> Result<(KnotVector, Vec<Vec<HomogeneousPoint>>)> {
    if degree == 0 {
        return Err(NurbsError::InvalidArgument("degree must be positive".into()));
    }
    let params = chord_parameters(rows)?;
    let count = params.len();
    if count <= degree {
        return Err(NurbsError::InvalidArgument(format!(
            "degree {} interpolation needs at least {} points, got {}",
            degree,
            degree + 1,
            count
        )));
    }
    let knots = averaged_knots(&params, degree)?;

    let mut system = vec![vec![0.0; count]; count];
    for (row, &t) in system.iter_mut().zip(&params) {
        let span = span_index(degree, &knots, count - 1, t);
        for (j, b) in basis_functions(degree, &knots, span, t).into_iter().enumerate() {
            row[span - degree + j] = b;
        }
    }
    let a = Matrix::from_rows(&system)?;

    let rhs = Matrix::from_fn(count, 4 * rows.len(), |r, c| rows[c / 4][r][c % 4])?;
    let solution = a.solve(&rhs)?;

    // Solution row `r` holds control point `r` of every input row, four
    // columns each.
    let mut control_rows = vec![Vec::with_capacity(count); rows.len()];
    for values in solution.to_rows() {
        for (control, xyzw) in control_rows.iter_mut().zip(values.chunks_exact(4)) {
            control.push(HomogeneousPoint::new(xyzw[0], xyzw[1], xyzw[2], xyzw[3]));
        }
    }

    log::trace!(
        "interpolated {} row(s) of {} points with degree {}",
        rows.len(),
        count,
        degree
    );
    Ok((knots, control_rows))
}
