//! Catalog resolution: the trust boundary for keyword metadata.
//!
//! The classifier may only name candidates by id. Every other keyword field is copied from
//! the [`CandidateCatalog`](crate::model::CandidateCatalog); values echoed by the classifier
//! are never read, only reported as `redundant_field` warnings.

pub mod error;
pub mod resolver;

#[cfg(test)]
mod tests;

pub use error::ResolveError;
pub use resolver::{CatalogResolver, Resolution};
