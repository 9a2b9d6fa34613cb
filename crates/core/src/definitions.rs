//! Declarative record definitions as they appear in profiles and personas.
//!
//! Every field is optional; the record factory supplies defaults for anything left out. Field
//! names follow the profile file format, which mixes `snake_case` and FHIR-style `camelCase`
//! keys, so several fields accept both spellings.

use fhir::Gender;
use serde::Deserialize;

/// A code given as `{system, value|code, display}`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CodeDef {
    #[serde(default)]
    pub system: Option<String>,

    #[serde(default, alias = "code")]
    pub value: Option<String>,

    #[serde(default)]
    pub display: Option<String>,
}

/// Either a bare string or a full code block.
///
/// How the bare string is read depends on the field: a reason becomes free text, an
/// immunization site becomes a code.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Coded {
    Plain(String),
    Full(CodeDef),
}

/// A scalar or a list of scalars.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: Clone> OneOrMany<T> {
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            OneOrMany::One(item) => vec![item.clone()],
            OneOrMany::Many(items) => items.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct NameDef {
    #[serde(default)]
    pub family: Option<String>,

    #[serde(default)]
    pub given: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct IdentifierDef {
    #[serde(default)]
    pub system: Option<String>,

    #[serde(default)]
    pub value: Option<String>,

    #[serde(default, rename = "use")]
    pub use_: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct AddressDef {
    #[serde(default)]
    pub line: Vec<String>,

    #[serde(default)]
    pub city: Option<String>,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(default, rename = "postalCode", alias = "postal_code")]
    pub postal_code: Option<String>,

    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct TelecomDef {
    #[serde(default)]
    pub system: Option<String>,

    #[serde(default)]
    pub value: Option<String>,

    #[serde(default, rename = "use")]
    pub use_: Option<String>,
}

/// The subject record itself (`single_patient` in a profile, `patient` in a persona).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PatientDefinition {
    #[serde(default)]
    pub name: NameDef,

    #[serde(default)]
    pub gender: Option<Gender>,

    #[serde(default, rename = "birthDate", alias = "birth_date")]
    pub birth_date: Option<String>,

    #[serde(default)]
    pub identifiers: Vec<IdentifierDef>,

    #[serde(default)]
    pub address: Option<AddressDef>,

    #[serde(default)]
    pub telecom: Vec<TelecomDef>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct OnsetDef {
    #[serde(default)]
    pub years_ago: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ConditionDef {
    #[serde(default)]
    pub code: CodeDef,

    #[serde(default)]
    pub onset: OnsetDef,
}

/// The `times` block of a repeated observation.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct TimingSpec {
    #[serde(default)]
    pub qty: Option<u32>,

    #[serde(default)]
    pub days_ago: Option<i64>,

    #[serde(default)]
    pub lookback_months: Option<f64>,

    #[serde(default)]
    pub lookback_days: Option<i64>,

    #[serde(default)]
    pub spacing_days: Option<i64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
pub struct RangeDef {
    #[serde(default)]
    pub min: f64,

    #[serde(default = "default_range_max")]
    pub max: f64,
}

fn default_range_max() -> f64 {
    100.0
}

impl Default for RangeDef {
    fn default() -> Self {
        Self {
            min: 0.0,
            max: default_range_max(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct QuantityDef {
    #[serde(default)]
    pub value: Option<f64>,

    #[serde(default)]
    pub unit: Option<String>,

    #[serde(default)]
    pub system: Option<String>,

    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ObservationDef {
    #[serde(default)]
    pub loinc: Option<String>,

    #[serde(default)]
    pub display: Option<String>,

    #[serde(default, alias = "valueType")]
    pub value_type: Option<String>,

    /// Explicit value; its expected shape depends on `value_type`.
    #[serde(default)]
    pub value: Option<serde_json::Value>,

    #[serde(default)]
    pub range: Option<RangeDef>,

    #[serde(default)]
    pub unit: Option<String>,

    #[serde(default, rename = "valueQuantity")]
    pub value_quantity: Option<QuantityDef>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub positive: Option<bool>,

    #[serde(default)]
    pub reference_range: Option<serde_json::Value>,

    #[serde(default)]
    pub times: Option<TimingSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AdherenceDef {
    #[serde(default)]
    pub prob: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct MedicationDef {
    #[serde(default)]
    pub rxnorm: Option<String>,

    #[serde(default)]
    pub display: Option<String>,

    /// Doses per day.
    #[serde(default)]
    pub frequency: Option<f64>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub intent: Option<String>,

    #[serde(default, alias = "durationDays")]
    pub duration_days: Option<i64>,

    #[serde(default, alias = "completedDaysAgo")]
    pub completed_days_ago: Option<i64>,

    #[serde(default, alias = "startDaysAgo")]
    pub start_days_ago: Option<i64>,

    #[serde(default)]
    pub sig: Option<String>,

    #[serde(default)]
    pub instructions: Option<String>,

    #[serde(default)]
    pub priority: Option<String>,

    #[serde(default)]
    pub reason: Option<Coded>,

    #[serde(default)]
    pub adherence: Option<AdherenceDef>,

    #[serde(default)]
    pub notes: Option<OneOrMany<String>>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct EncounterDef {
    #[serde(default)]
    pub class: Option<Coded>,

    #[serde(default)]
    pub class_system: Option<String>,

    #[serde(default)]
    pub class_display: Option<String>,

    #[serde(default, rename = "type")]
    pub type_: Option<CodeDef>,

    #[serde(default)]
    pub days_ago: Option<i64>,

    #[serde(default, alias = "durationHours")]
    pub duration_hours: Option<f64>,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub reason: Option<Coded>,

    #[serde(default)]
    pub performer: Option<String>,

    #[serde(default, rename = "serviceProvider", alias = "service_provider")]
    pub service_provider: Option<String>,

    #[serde(default)]
    pub qty: Option<u32>,

    #[serde(default)]
    pub spread_months: Option<i64>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RelatedPersonDef {
    #[serde(default)]
    pub name: NameDef,

    #[serde(default)]
    pub relationship: Option<Coded>,

    #[serde(default)]
    pub active: Option<bool>,

    #[serde(default)]
    pub gender: Option<Gender>,

    #[serde(default, rename = "birthDate", alias = "birth_date")]
    pub birth_date: Option<String>,

    #[serde(default)]
    pub identifiers: Vec<IdentifierDef>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct DiagnosticReportDef {
    #[serde(default)]
    pub code: CodeDef,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub category: Option<CodeDef>,

    #[serde(default)]
    pub days_ago: Option<i64>,

    #[serde(default)]
    pub conclusion: Option<String>,

    #[serde(default, rename = "effectiveDateTime")]
    pub effective_date_time: Option<String>,

    #[serde(default)]
    pub performer: Option<String>,

    #[serde(default)]
    pub observations: Vec<ObservationDef>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct ImmunizationDef {
    #[serde(default)]
    pub vaccine: CodeDef,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub days_ago: Option<i64>,

    #[serde(default, rename = "doseNumber")]
    pub dose_number: Option<u32>,

    #[serde(default, rename = "lotNumber")]
    pub lot_number: Option<String>,

    #[serde(default)]
    pub site: Option<Coded>,

    #[serde(default)]
    pub route: Option<Coded>,

    #[serde(default)]
    pub performer: Option<String>,

    #[serde(default, rename = "notGiven")]
    pub not_given: Option<bool>,

    #[serde(default)]
    pub qty: Option<u32>,
}

/// Who pays for a coverage: one reference, several, or a `{reference}` block.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PayorDef {
    One(String),
    Many(Vec<String>),
    Reference { reference: String },
}

impl PayorDef {
    pub fn references(&self) -> Vec<String> {
        match self {
            PayorDef::One(reference) | PayorDef::Reference { reference } => {
                vec![reference.clone()]
            }
            PayorDef::Many(references) => references.clone(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CoveragePeriodDef {
    #[serde(default)]
    pub start_days_ago: Option<i64>,

    #[serde(default)]
    pub start: Option<String>,

    #[serde(default)]
    pub end_days_ago: Option<i64>,

    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct CoverageDef {
    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub kind: Option<String>,

    #[serde(default, rename = "type")]
    pub type_: Option<CodeDef>,

    #[serde(default)]
    pub subscriber: Option<String>,

    #[serde(default)]
    pub payor: Option<PayorDef>,

    #[serde(default)]
    pub period: Option<CoveragePeriodDef>,

    #[serde(default)]
    pub identifier: Option<IdentifierDef>,

    #[serde(default)]
    pub relationship: Option<Coded>,
}
