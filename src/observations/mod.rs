//! Audit trail of (message, label, keyword) facts for dictionary promotion.

pub mod builder;
pub mod error;


pub use builder::{IdStrategy, ObservationBuilder};
pub use error::ObservationError;
