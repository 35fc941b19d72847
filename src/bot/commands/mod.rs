//! Discord command implementations organized by category.

/// General utility commands
pub mod general;

/// Price lookup and staff access commands
pub mod price;

pub use general::*;
pub use price::*;
