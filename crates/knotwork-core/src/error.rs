use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NurbsError {
    /// Parameter outside the curve or surface domain.
    #[error("Domain error: {0}")]
    Domain(String),

    /// Knot, control point, weight or matrix shapes disagree.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The geometric quantity is undefined at this input (zero tangent,
    /// parallel partials, coincident points, singular system).
    #[error("Degenerate geometry: {0}")]
    DegenerateGeometry(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, NurbsError>;
