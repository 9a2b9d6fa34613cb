//! Deterministic randomness and resource identifiers.
//!
//! Kindling must reproduce byte-identical output for a fixed seed. To make that possible every
//! random decision in a generation run (ages, names, measurement values, identifiers) is drawn
//! from one [`SeededRandom`] instance that is threaded through the whole run.
//!
//! This crate provides:
//! - [`SeededRandom`], the single seeded stream. It is backed by ChaCha8, whose output is
//!   specified independently of platform and word size.
//! - [`ResourceId`], the canonical identifier wrapper used for both durable and transport-local
//!   record identities.
//!
//! ## Canonical identifier form
//! - Length: 36
//! - Lowercase hexadecimal in the 8-4-4-4-12 hyphenated layout
//! - Example: `550e8400-e29b-41d4-a716-446655440000`
//!
//! Identifiers minted from a [`SeededRandom`] are derived byte-by-byte from the seeded stream, so
//! they are reproducible just like every other draw.
//!
//! ## One stream per run
//! Every call advances the shared stream. Two instances built from the same seed produce the same
//! sequence, but only if they receive exactly the same sequence of calls, so a run must own exactly
//! one instance and never fork it.

mod id;
mod source;

// Re-export public types
pub use id::ResourceId;
pub use source::SeededRandom;

/// Error type for random-source and identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum RandomError {
    /// Invalid input provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A weighted draw was requested over weights that cannot form a distribution.
    #[error("Invalid weights: {0}")]
    InvalidWeights(String),
}

/// Result type for random-source operations.
pub type RandomResult<T> = Result<T, RandomError>;
