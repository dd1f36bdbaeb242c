/// Numeric tolerances shared by the evaluators and samplers.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance;

impl Tolerance {
    /// Smallest magnitude treated as non-zero by the evaluators.
    pub const EPSILON: f64 = 1e-10;
    /// Tightest sampling tolerance; substituted for non-positive requests.
    pub const MAX_TOLERANCE: f64 = 1e-6;

    /// Replace a non-positive (or NaN) sampling tolerance with [`Self::MAX_TOLERANCE`].
    pub fn sanitize(tolerance: f64) -> f64 {
        if tolerance > 0.0 {
            tolerance
        } else {
            Self::MAX_TOLERANCE
        }
    }
}
