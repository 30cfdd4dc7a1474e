//! OCLint module
//!
//! Provides:
//! - Violation model and XML report parsing
//! - Rule catalog parsing and rule classification

mod rules;
mod violations;

pub use rules::*;
pub use violations::*;
