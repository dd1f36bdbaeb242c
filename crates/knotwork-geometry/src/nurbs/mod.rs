//! NURBS core algorithms: knot vectors, basis functions, rational evaluation,
//! knot refinement and interpolation.

pub mod basis;
pub mod evaluate;
pub mod interpolate;
pub mod knot;
pub mod refine;

pub use basis::{basis_function_derivatives, basis_functions};
pub use knot::{span_index, KnotVector};
