//! crac-core: numeric foundation for the CRAC controller workspace.
//!
//! Contains:
//! - numeric (Real + float helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
