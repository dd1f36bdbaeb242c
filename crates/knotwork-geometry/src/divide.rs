//! Division of curves into segments of equal or bounded arc length.

use knotwork_core::{NurbsError, Result, Tolerance};
use serde::{Deserialize, Serialize};

use crate::analyze::ArcLengthTable;
use crate::curve::Curve;
use crate::tessellate::Sample;

/// Parameters produced by [`divide_by_length`] with the arc length of each
/// segment between consecutive parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthDivision {
    pub parameters: Vec<f64>,
    pub lengths: Vec<f64>,
}

fn length_table(curve: &dyn Curve) -> Result<ArcLengthTable> {
    let table = ArcLengthTable::new(curve)?;
    if table.total() < Tolerance::EPSILON {
        return Err(NurbsError::InvalidArgument(
            "cannot divide a zero-length curve".into(),
        ));
    }
    Ok(table)
}

/// Parameters splitting the curve into `segments` pieces of equal arc length.
///
/// Returns `segments + 1` parameters starting and ending at the domain ends.
pub fn divide_by_count(curve: &dyn Curve, segments: usize) -> Result<Vec<f64>> {
    if segments < 2 {
        return Err(NurbsError::InvalidArgument(format!(
            "division needs at least 2 segments, got {}",
            segments
        )));
    }
    let table = length_table(curve)?;
    let (t_min, t_max) = curve.domain();
    let step = table.total() / segments as f64;

    let mut params = Vec::with_capacity(segments + 1);
    params.push(t_min);
    for i in 1..segments {
        params.push(table.parameter_at(step * i as f64)?);
    }
    params.push(t_max);

    log::debug!(
        "divided curve of length {} into {} segments",
        table.total(),
        segments
    );
    Ok(params)
}

/// Parameters every `segment_length` of arc length from the start, closed by
/// the domain end.
///
/// The last segment covers whatever length remains and may be shorter.
pub fn divide_by_length(curve: &dyn Curve, segment_length: f64) -> Result<LengthDivision> {
    if !(segment_length > 0.0) {
        return Err(NurbsError::InvalidArgument(format!(
            "segment length must be positive, got {}",
            segment_length
        )));
    }
    let table = length_table(curve)?;
    let total = table.total();
    let (t_min, t_max) = curve.domain();
    // Remainders below this are absorbed into the previous segment.
    let slack = total * 1e-9;

    let mut parameters = vec![t_min];
    let mut lengths = Vec::new();
    let mut previous = 0.0;
    let mut k = 1usize;
    loop {
        let target = segment_length * k as f64;
        if target >= total - slack {
            break;
        }
        parameters.push(table.parameter_at(target)?);
        lengths.push(target - previous);
        previous = target;
        k += 1;
    }
    parameters.push(t_max);
    lengths.push(total - previous);

    log::debug!(
        "divided curve of length {} by {} into {} segments",
        total,
        segment_length,
        lengths.len()
    );
    Ok(LengthDivision {
        parameters,
        lengths,
    })
}

/// Points dividing the curve into `segments` pieces of equal arc length.
pub fn divide_into_samples(curve: &dyn Curve, segments: usize) -> Result<Vec<Sample>> {
    samples_at(curve, &divide_by_count(curve, segments)?)
}

/// Points dividing the curve into segments no longer than `max_length`.
///
/// With `equal_lengths`, the length is first reduced to
/// `total / ceil(total / max_length)` so all segments come out equal.
pub fn divide_by_max_length(
    curve: &dyn Curve,
    max_length: f64,
    equal_lengths: bool,
) -> Result<Vec<Sample>> {
    if !(max_length > 0.0) {
        return Err(NurbsError::InvalidArgument(format!(
            "segment length must be positive, got {}",
            max_length
        )));
    }
    let length = if equal_lengths {
        let total = length_table(curve)?.total();
        total / (total / max_length).ceil()
    } else {
        max_length
    };
    let division = divide_by_length(curve, length)?;
    samples_at(curve, &division.parameters)
}

/// Evaluate the curve at each parameter.
pub fn samples_at(curve: &dyn Curve, params: &[f64]) -> Result<Vec<Sample>> {
    params
        .iter()
        .map(|&t| -> Result<Sample> { Ok(Sample::new(t, curve.point_at(t)?)) })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::curve_length;
    use crate::curve::{Line, NurbsCurve};
    use approx::assert_abs_diff_eq;
    use knotwork_math::DVec3;

    #[test]
    fn test_divide_line_by_count() {
        let line = Line::new(DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0));
        let params = divide_by_count(&line, 4).unwrap();
        assert_eq!(params.len(), 5);
        for (i, t) in params.iter().enumerate() {
            assert_abs_diff_eq!(*t, i as f64 * 0.25, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_divide_by_length_remainder() {
        let line = Line::new(DVec3::ZERO, DVec3::new(10.0, 0.0, 0.0));
        let division = divide_by_length(&line, 3.0).unwrap();
        assert_eq!(division.parameters.len(), 5);
        assert_eq!(division.lengths.len(), 4);
        assert_abs_diff_eq!(division.parameters[1], 0.3, epsilon = 1e-10);
        assert_eq!(*division.parameters.last().unwrap(), 1.0);
        assert_abs_diff_eq!(division.lengths[3], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_invalid_requests() {
        let line = Line::new(DVec3::ZERO, DVec3::X);
        assert!(matches!(divide_by_count(&line, 1), Err(NurbsError::InvalidArgument(_))));
        assert!(matches!(divide_by_length(&line, 0.0), Err(NurbsError::InvalidArgument(_))));
        assert!(matches!(divide_by_length(&line, -2.0), Err(NurbsError::InvalidArgument(_))));
        assert!(matches!(
            divide_by_max_length(&line, f64::NAN, true),
            Err(NurbsError::InvalidArgument(_))
        ));

        let point = Line::new(DVec3::ONE, DVec3::ONE);
        assert!(matches!(divide_by_count(&point, 3), Err(NurbsError::InvalidArgument(_))));
    }

    #[test]
    fn test_equal_length_division() {
        let curve = NurbsCurve::from_points(
            3,
            vec![
                DVec3::new(0.0, 0.0, 0.0),
                DVec3::new(2.0, 4.0, 0.0),
                DVec3::new(5.0, -1.0, 2.0),
                DVec3::new(7.0, 3.0, 0.0),
                DVec3::new(9.0, 0.0, 1.0),
            ],
        )
        .unwrap();
        let total = curve_length(&curve).unwrap();
        let samples = divide_by_max_length(&curve, 2.0, true).unwrap();
        let segments = samples.len() - 1;
        assert_eq!(segments as f64, (total / 2.0).ceil());

        // Chord sums over a fine sampling of each piece
        let expected = total / segments as f64;
        for w in samples.windows(2) {
            let steps = 4000;
            let mut prev = w[0].point;
            let mut len = 0.0;
            for i in 1..=steps {
                let t = w[0].t + (w[1].t - w[0].t) * i as f64 / steps as f64;
                let p = curve.point_at(t).unwrap();
                len += (p - prev).length();
                prev = p;
            }
            assert_abs_diff_eq!(len, expected, epsilon = 1e-4);
        }
    }
}
