pub mod error;
pub mod tolerance;
pub mod traits;

pub use error::{NurbsError, Result};
pub use tolerance::Tolerance;
pub use traits::Validate;
