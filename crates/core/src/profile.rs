//! Generation profiles.
//!
//! A profile is the declarative input to one generation run. It is read once, from YAML or JSON,
//! and treated as read-only afterwards.
//!
//! Responsibilities:
//! - the typed profile model (`Profile`, `Rule`, `Actions` and friends)
//! - parsing rule conditions once, into [`RuleCondition`]
//! - loading a profile from disk with path-qualified schema errors
//! - converting a persona into a single-subject profile

use crate::constants::{DEFAULT_AGE_MAX, DEFAULT_AGE_MIN, DEFAULT_BUNDLE_SIZE, DEFAULT_PROFILE_VERSION};
use crate::definitions::{
    ConditionDef, CoverageDef, DiagnosticReportDef, EncounterDef, ImmunizationDef, MedicationDef,
    ObservationDef, PatientDefinition, RelatedPersonDef,
};
use crate::persona::Persona;
use crate::{KindlingError, KindlingResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// One fully specified subject; rules fire unconditionally.
    Single,
    /// `count` sampled subjects; rules fire against each subject's sampled context.
    #[default]
    Cohort,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct AgeRange {
    #[serde(default = "default_age_min")]
    pub min: i64,

    #[serde(default = "default_age_max")]
    pub max: i64,
}

fn default_age_min() -> i64 {
    DEFAULT_AGE_MIN
}

fn default_age_max() -> i64 {
    DEFAULT_AGE_MAX
}

impl Default for AgeRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_AGE_MIN,
            max: DEFAULT_AGE_MAX,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct GenderDistribution {
    /// Gender name to relative weight. A `BTreeMap` keeps draw order stable across runs.
    #[serde(default)]
    pub distribution: BTreeMap<String, f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Demographics {
    #[serde(default)]
    pub age: AgeRange,

    #[serde(default)]
    pub gender: GenderDistribution,
}

/// The field a rule condition compares against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContextField {
    Age,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Comparison {
    GreaterThan,
}

/// A rule's `when.condition`, parsed once when the profile is loaded.
///
/// Expressions that do not parse are kept as [`RuleCondition::Unrecognised`] and never match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RuleCondition {
    #[default]
    Always,
    Compare {
        field: ContextField,
        op: Comparison,
        value: i64,
    },
    Unrecognised(String),
}

impl RuleCondition {
    pub fn parse(expression: &str) -> Self {
        let trimmed = expression.trim();
        if trimmed.eq_ignore_ascii_case("true") {
            return RuleCondition::Always;
        }

        if let Some((field, value)) = trimmed.split_once('>') {
            let field = match field.trim().to_ascii_lowercase().as_str() {
                "age" => Some(ContextField::Age),
                _ => None,
            };
            if let (Some(field), Ok(value)) = (field, value.trim().parse::<i64>()) {
                return RuleCondition::Compare {
                    field,
                    op: Comparison::GreaterThan,
                    value,
                };
            }
        }

        RuleCondition::Unrecognised(trimmed.to_string())
    }
}

impl From<String> for RuleCondition {
    fn from(expression: String) -> Self {
        RuleCondition::parse(&expression)
    }
}

impl fmt::Display for RuleCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleCondition::Always => f.write_str("true"),
            RuleCondition::Compare {
                field: ContextField::Age,
                op: Comparison::GreaterThan,
                value,
            } => write!(f, "age > {value}"),
            RuleCondition::Unrecognised(text) => f.write_str(text),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct When {
    #[serde(default)]
    pub condition: RuleCondition,
}

/// The `then` block of a rule: one list per record kind it can produce.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Actions {
    #[serde(default)]
    pub add_conditions: Vec<ConditionDef>,

    #[serde(default)]
    pub add_observations: Vec<ObservationDef>,

    #[serde(default)]
    pub meds: Vec<MedicationDef>,

    #[serde(default)]
    pub related_persons: Vec<RelatedPersonDef>,

    #[serde(default)]
    pub diagnostic_reports: Vec<DiagnosticReportDef>,

    #[serde(default)]
    pub immunizations: Vec<ImmunizationDef>,

    #[serde(default)]
    pub coverage: Vec<CoverageDef>,

    #[serde(default)]
    pub encounters: Vec<EncounterDef>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Rule {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub when: When,

    #[serde(default)]
    pub then: Actions,
}

impl Rule {
    /// Name used in log lines; falls back to the condition text.
    pub fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("when {}", self.when.condition))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ResourceSection {
    /// Resource kinds the author expects the profile to produce. Informational only.
    #[serde(default)]
    pub include: Vec<String>,

    #[serde(default)]
    pub rules: Vec<Rule>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OutputSection {
    #[serde(default = "default_output_mode")]
    pub mode: String,

    #[serde(default = "default_bundle_size")]
    pub bundle_size: usize,
}

fn default_output_mode() -> String {
    "transaction".to_string()
}

fn default_bundle_size() -> usize {
    DEFAULT_BUNDLE_SIZE
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            mode: default_output_mode(),
            bundle_size: DEFAULT_BUNDLE_SIZE,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Profile {
    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default)]
    pub mode: Mode,

    #[serde(default)]
    pub demographics: Demographics,

    #[serde(default)]
    pub single_patient: PatientDefinition,

    #[serde(default)]
    pub resources: ResourceSection,

    #[serde(default)]
    pub output: OutputSection,
}

fn default_version() -> String {
    DEFAULT_PROFILE_VERSION.to_string()
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            version: default_version(),
            mode: Mode::default(),
            demographics: Demographics::default(),
            single_patient: PatientDefinition::default(),
            resources: ResourceSection::default(),
            output: OutputSection::default(),
        }
    }
}

impl Profile {
    /// A single-subject profile built from a persona.
    pub fn from_persona(persona: &Persona) -> Self {
        Self {
            version: default_version(),
            mode: Mode::Single,
            demographics: Demographics::default(),
            single_patient: persona.patient.clone(),
            resources: persona.resources.clone(),
            output: persona.output.clone(),
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.resources.rules
    }

    /// Parse a profile from YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, String> {
        parse_yaml(text, "Profile")
    }

    /// Parse a profile from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, String> {
        parse_json(text, "Profile")
    }
}

/// Load a profile from a `.yaml`, `.yml` or `.json` file.
///
/// # Errors
///
/// - [`KindlingError::ProfileNotFound`] if `path` does not exist,
/// - [`KindlingError::UnsupportedFormat`] for any other extension,
/// - [`KindlingError::Io`] if the file cannot be read,
/// - [`KindlingError::ProfileParse`] if the document does not match the profile schema.
pub fn load_profile(path: &Path) -> KindlingResult<Profile> {
    if !path.exists() {
        return Err(KindlingError::ProfileNotFound(path.to_path_buf()));
    }

    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let parse: fn(&str) -> Result<Profile, String> = match extension.as_str() {
        "yaml" | "yml" => Profile::from_yaml_str,
        "json" => Profile::from_json_str,
        _ => {
            return Err(KindlingError::UnsupportedFormat {
                path: path.to_path_buf(),
                extension,
            })
        }
    };

    let text = fs::read_to_string(path).map_err(|source| KindlingError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let profile = parse(&text).map_err(|message| KindlingError::ProfileParse {
        path: path.to_path_buf(),
        message,
    })?;

    tracing::debug!(
        path = %path.display(),
        mode = ?profile.mode,
        rules = profile.rules().len(),
        "loaded profile"
    );

    Ok(profile)
}

/// Deserialize YAML text, reporting where in the document a mismatch happened.
pub(crate) fn parse_yaml<T: DeserializeOwned>(text: &str, what: &str) -> Result<T, String> {
    let deserializer = serde_yaml::Deserializer::from_str(text);
    serde_path_to_error::deserialize::<_, T>(deserializer)
        .map_err(|err| schema_mismatch(what, err.path().to_string(), err.into_inner()))
}

pub(crate) fn parse_json<T: DeserializeOwned>(text: &str, what: &str) -> Result<T, String> {
    let mut deserializer = serde_json::Deserializer::from_str(text);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer)
        .map_err(|err| schema_mismatch(what, err.path().to_string(), err.into_inner()))
}

fn schema_mismatch(what: &str, path: String, source: impl fmt::Display) -> String {
    let path = if path.is_empty() || path == "." {
        "<root>"
    } else {
        path.as_str()
    };
    format!("{what} schema mismatch at {path}: {source}")
}
