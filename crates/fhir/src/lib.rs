//! FHIR wire/boundary support for the Kindling synthetic record generator.
//!
//! This crate provides **wire models** and **format helpers** for the resources the generator
//! emits:
//! - typed models for every supported resource kind and the `Bundle` container
//! - a structural validation capability ([`schema::construct`]) that every generated resource
//!   passes through
//! - an R4 down-conversion pass ([`r4::adapt_bundle`]) applied to rendered JSON
//!
//! It knows nothing about profiles, rules or randomness; those live in `kindling-core`.

pub mod bundle;
pub mod datatypes;
pub mod kind;
pub mod r4;
pub mod resource;
pub mod resources;
pub mod schema;

pub use bundle::{Bundle, BundleEntry, BundleEntryRequest, BundleType, HttpVerb};
pub use kind::ResourceKind;
pub use resource::Resource;
pub use resources::{
    Condition, Coverage, DiagnosticReport, Encounter, Gender, Immunization, MedicationRequest,
    Observation, ObservationValue, Patient, RelatedPerson,
};

// Re-export ResourceId from kindling_random crate
pub use kindling_random::ResourceId;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("{kind} is missing required field {path}")]
    MissingField { kind: ResourceKind, path: String },

    #[error("{kind} has invalid value '{value}' at {path}")]
    InvalidValue {
        kind: ResourceKind,
        path: String,
        value: String,
    },

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
