//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the generator. The intent is to avoid reading the clock or process-wide
//! environment variables in the middle of a run, which would make output depend on when and
//! where a test happens to execute.

use crate::constants::DEFAULT_BUNDLE_SIZE;
use crate::{KindlingError, KindlingResult};
use chrono::{DateTime, Utc};
use fhir::BundleType;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Generator configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    now: DateTime<Utc>,
    seed: Option<u64>,
    persona_dir: Option<PathBuf>,
}

impl GeneratorConfig {
    /// Create a new `GeneratorConfig`.
    ///
    /// `now` is the instant every relative date ("30 days ago") is measured from.
    pub fn new(now: DateTime<Utc>, seed: Option<u64>, persona_dir: Option<PathBuf>) -> Self {
        Self {
            now,
            seed,
            persona_dir,
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn persona_dir(&self) -> Option<&Path> {
        self.persona_dir.as_deref()
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self::new(Utc::now(), None, None)
    }
}

/// How records are identified to the receiving server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransportMode {
    /// Durable ids are replaced by transport-local `urn:uuid:` ids; the server assigns ids.
    #[default]
    Create,
    /// Durable ids are kept and upserted with `PUT Kind/{id}`.
    Preserve,
    /// Anonymised like `Create`, but each entry is a conditional create keyed on its business
    /// identifier.
    Conditional,
}

impl TransportMode {
    /// Whether records lose their durable id in transport.
    pub fn anonymises(self) -> bool {
        matches!(self, TransportMode::Create | TransportMode::Conditional)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransportMode::Create => "create",
            TransportMode::Preserve => "preserve",
            TransportMode::Conditional => "conditional",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransportMode {
    type Err = KindlingError;

    /// Accepts the mode names and the request-method spellings used on the command line.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "create" | "post" => Ok(TransportMode::Create),
            "preserve" | "put" => Ok(TransportMode::Preserve),
            "conditional" => Ok(TransportMode::Conditional),
            other => Err(KindlingError::Configuration(format!(
                "unknown transport mode '{other}' (expected POST, PUT or CONDITIONAL)"
            ))),
        }
    }
}

/// Parse a container type, reporting failures as configuration errors.
pub fn parse_container_type(input: &str) -> KindlingResult<BundleType> {
    input
        .parse::<BundleType>()
        .map_err(|e| KindlingError::Configuration(e.to_string()))
}

/// Per-call generation options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Number of subjects in cohort mode. Ignored in single mode.
    pub count: usize,
    pub container_type: BundleType,
    /// Maximum entries per output bundle.
    pub max_size: usize,
    pub transport_mode: TransportMode,
}

impl GenerateOptions {
    /// Rejects options that cannot produce any valid output.
    pub fn validate(&self) -> KindlingResult<()> {
        if self.max_size == 0 {
            return Err(KindlingError::Configuration(
                "bundle size must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            count: 1,
            container_type: BundleType::Transaction,
            max_size: DEFAULT_BUNDLE_SIZE,
            transport_mode: TransportMode::Create,
        }
    }
}
