//! knotwork geometry: NURBS curves and surfaces, sampling, arc length and frames.

pub mod analyze;
pub mod curve;
pub mod divide;
pub mod frame;
pub mod nurbs;
pub mod surface;
pub mod tessellate;

pub use analyze::{curve_length, parameter_at_length, ArcLengthTable};
pub use curve::{Curve, Line, NurbsCurve, Polyline};
pub use divide::{divide_by_count, divide_by_length, divide_by_max_length, LengthDivision};
pub use frame::{perpendicular_frames, Frame};
pub use nurbs::KnotVector;
pub use surface::{NurbsSurface, Surface, SurfaceDirection};
pub use tessellate::{adaptive_sample, adaptive_sample_with, regular_sample, AdaptiveOptions, Sample};
