//! Evidence verification against the canonical text.
//!
//! Quotes are located by exact substring search first, then by a fuzzy sliding-window
//! search. Spans are always recomputed here; an untrusted span is only kept for audit.
//!
//! All offsets are character offsets into the canonical text, not byte offsets.

pub mod policy;
pub mod similarity;
pub mod types;
pub mod verifier;

#[cfg(test)]
mod tests;

pub use policy::{EvidencePolicy, PolicyOutcome};
pub use similarity::{LcsBound, MatchBlock, Matcher, WindowMatch};
pub use types::{EvidenceConfig, EvidenceVerification, RawEvidence};
pub use verifier::EvidenceVerifier;
