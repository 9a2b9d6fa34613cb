//! Wire models for the nine resource kinds the generator produces.
//!
//! Shapes follow FHIR R5 (for example `MedicationRequest.medication` is a `CodeableReference` and
//! `Encounter.class` is a list). Down-conversion for R4 receivers lives in [`crate::r4`].
//!
//! `id` is optional on every resource: it is stripped when records are anonymised for transport.

use crate::datatypes::{
    Address, Annotation, CodeableConcept, CodeableReference, ContactPoint, Dosage, HumanName,
    Identifier, Period, Quantity, Reference,
};
use crate::FhirError;
use kindling_random::ResourceId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// FHIR `AdministrativeGender`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Unknown => "unknown",
        }
    }
}

impl FromStr for Gender {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            "unknown" => Ok(Gender::Unknown),
            other => Err(FhirError::InvalidInput(format!(
                "gender must be male, female, other or unknown, got '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub clinical_status: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_status: Option<CodeableConcept>,

    pub code: CodeableConcept,

    pub subject: Reference,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub onset_date_time: Option<String>,
}

/// The single `value[x]` choice an Observation carries.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ObservationValue {
    #[serde(rename = "valueQuantity")]
    Quantity(Quantity),
    #[serde(rename = "valueBoolean")]
    Boolean(bool),
    #[serde(rename = "valueString")]
    String(String),
    #[serde(rename = "valueInteger")]
    Integer(i64),
    #[serde(rename = "valueCodeableConcept")]
    CodeableConcept(CodeableConcept),
}

impl Default for ObservationValue {
    fn default() -> Self {
        ObservationValue::Quantity(Quantity::default())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,

    pub status: String,

    pub code: CodeableConcept,

    pub subject: Reference,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<String>,

    #[serde(flatten)]
    pub value: ObservationValue,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reference_range: Vec<serde_json::Value>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispenseRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validity_period: Option<Period>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_supply_duration: Option<Quantity>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,

    pub status: String,

    pub intent: String,

    pub medication: CodeableReference,

    pub subject: Reference,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub authored_on: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dosage_instruction: Vec<Dosage>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reason_code: Vec<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub note: Vec<Annotation>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dispense_request: Option<DispenseRequest>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EncounterReason {
    #[serde(rename = "use", default, skip_serializing_if = "Vec::is_empty")]
    pub use_: Vec<CodeableConcept>,
}

/// Participant entry shared by Encounter and Immunization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub actor: Reference,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Encounter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,

    pub status: String,

    #[serde(rename = "class", default, skip_serializing_if = "Vec::is_empty")]
    pub class_: Vec<CodeableConcept>,

    #[serde(rename = "type", default, skip_serializing_if = "Vec::is_empty")]
    pub type_: Vec<CodeableConcept>,

    pub subject: Reference,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_period: Option<Period>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reason: Vec<EncounterReason>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participant: Vec<Participant>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_provider: Option<Reference>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedPerson {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,

    pub patient: Reference,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relationship: Vec<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,

    pub status: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category: Vec<CodeableConcept>,

    pub code: CodeableConcept,

    pub subject: Reference,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result: Vec<Reference>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub performer: Vec<Reference>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Immunization {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,

    pub status: String,

    pub vaccine_code: CodeableConcept,

    pub patient: Reference,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurrence_date_time: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub dose_quantity: Option<Quantity>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub lot_number: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub site: Option<CodeableConcept>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub performer: Vec<Participant>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_source: Option<bool>,
}

impl Immunization {
    /// The dose number carried in `doseQuantity.value`.
    pub fn dose_number(&self) -> Option<u32> {
        let value = self.dose_quantity.as_ref()?.value?;
        (value >= 1.0 && value.fract() == 0.0).then_some(value as u32)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoveragePaymentBy {
    pub party: Reference,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coverage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,

    pub status: String,

    pub kind: String,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<CodeableConcept>,

    pub beneficiary: Reference,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscriber: Option<Reference>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub payment_by: Vec<CoveragePaymentBy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<CodeableConcept>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatypes::Coding;

    #[test]
    fn observation_value_flattens_to_choice_key() {
        let observation = Observation {
            status: "final".into(),
            code: CodeableConcept::from_coding(Coding::new("http://loinc.org", "4548-4", None)),
            subject: Reference::new("Patient/p1"),
            value: ObservationValue::Quantity(Quantity {
                value: Some(7.2),
                unit: Some("%".into()),
                ..Quantity::default()
            }),
            ..Observation::default()
        };

        let json = serde_json::to_value(&observation).expect("serialise");
        assert_eq!(json["valueQuantity"]["value"], 7.2);
        assert!(json.get("value").is_none());
        assert!(json.get("id").is_none());

        let back: Observation = serde_json::from_value(json).expect("deserialise");
        assert_eq!(back, observation);
    }

    #[test]
    fn boolean_value_uses_value_boolean() {
        let observation = Observation {
            value: ObservationValue::Boolean(true),
            ..Observation::default()
        };
        let json = serde_json::to_value(&observation).expect("serialise");
        assert_eq!(json["valueBoolean"], true);
    }

    #[test]
    fn gender_parses_case_insensitively() {
        assert_eq!("Female".parse::<Gender>().expect("valid"), Gender::Female);
        match "robot".parse::<Gender>() {
            Err(FhirError::InvalidInput(msg)) => assert!(msg.contains("robot")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn encounter_renames_keyword_fields() {
        let encounter = Encounter {
            status: "finished".into(),
            class_: vec![CodeableConcept::from_text("ambulatory")],
            type_: vec![CodeableConcept::from_text("General examination")],
            subject: Reference::new("Patient/p1"),
            ..Encounter::default()
        };
        let json = serde_json::to_value(&encounter).expect("serialise");
        assert!(json.get("class").is_some());
        assert!(json.get("type").is_some());
        assert!(json.get("class_").is_none());
    }

    #[test]
    fn dose_number_reads_whole_quantities() {
        let mut immunization = Immunization {
            dose_quantity: Some(Quantity {
                value: Some(2.0),
                ..Quantity::default()
            }),
            ..Immunization::default()
        };
        assert_eq!(immunization.dose_number(), Some(2));

        immunization.dose_quantity = None;
        assert_eq!(immunization.dose_number(), None);
    }
}
