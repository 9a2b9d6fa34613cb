//! # Kindling Core
//!
//! Synthetic clinical record generation.
//!
//! This crate turns a declarative profile (or a built-in persona) into FHIR bundles:
//! - demographic sampling and the record factory build subjects and their records
//! - the rule engine expands each profile rule into records for one subject at a time
//! - the identity map and reconciliation keep every reference pointing at a record in the run
//! - the bundle assembler splits the run's records into transport-ready bundles
//!
//! Every random decision is drawn from one seeded stream per run, so a fixed seed and a fixed
//! `now` reproduce the same output.
//!
//! **No I/O concerns beyond loading inputs**: rendering, R4 down-conversion and writing files
//! belong in the `kindling` binary.

pub mod assembler;
pub mod config;
pub mod constants;
pub mod definitions;
pub mod demographics;
pub mod factory;
pub mod filter;
pub mod generator;
pub mod identity;
pub mod persona;
pub mod profile;
pub mod rules;
pub mod schedule;
pub mod validation;
pub mod validator;

mod error;

pub use assembler::BundleAssembler;
pub use config::{GenerateOptions, GeneratorConfig, TransportMode};
pub use error::{KindlingError, KindlingResult};
pub use filter::ResourceFilter;
pub use generator::{GenerateOutput, Generator};
pub use identity::IdentityMap;
pub use persona::{Persona, PersonaLoader};
pub use profile::{load_profile, Profile};
pub use validator::ValidationReport;
