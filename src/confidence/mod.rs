//! Composite confidence calibration.
//!
//! The classifier's own confidence is only one of four weighted signals. The others come from
//! trusted data: catalog scores of the resolved keywords, how much evidence backs the topic,
//! and how ambiguous the keyword lemmas are across labels ([`CollisionIndex`]).

pub mod calibrator;
pub mod collision;
pub mod error;


pub use calibrator::{CalibrationWeights, ConfidenceCalibrator};
pub use collision::{CollisionIndex, CollisionSource, load_collision_index};
pub use error::ConfidenceError;
