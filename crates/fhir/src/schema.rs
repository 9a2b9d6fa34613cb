//! Structural validation for resources before they are handed to the generator.
//!
//! Every resource the generator emits is obtained through [`construct`], which checks the
//! required elements and coded value sets of its kind and reports the first violation by field
//! path (for example `Condition.code.coding[0].code`).
//!
//! Only the rules the generator can actually break are checked; this is not a full FHIR
//! profile validator.

use crate::datatypes::{CodeableConcept, Reference};
use crate::resources::ObservationValue;
use crate::{FhirError, FhirResult, Resource, ResourceKind};

const OBSERVATION_STATUS: &[&str] = &[
    "registered",
    "preliminary",
    "final",
    "amended",
    "corrected",
    "cancelled",
    "entered-in-error",
    "unknown",
];

const MEDICATION_REQUEST_STATUS: &[&str] = &[
    "active",
    "on-hold",
    "ended",
    "stopped",
    "completed",
    "cancelled",
    "entered-in-error",
    "draft",
    "unknown",
];

const MEDICATION_REQUEST_INTENT: &[&str] = &[
    "proposal",
    "plan",
    "order",
    "original-order",
    "reflex-order",
    "filler-order",
    "instance-order",
    "option",
];

const ENCOUNTER_STATUS: &[&str] = &[
    "planned",
    "in-progress",
    "on-hold",
    "discharged",
    "completed",
    "finished",
    "cancelled",
    "discontinued",
    "entered-in-error",
    "unknown",
];

const DIAGNOSTIC_REPORT_STATUS: &[&str] = &[
    "registered",
    "partial",
    "preliminary",
    "modified",
    "final",
    "amended",
    "corrected",
    "appended",
    "cancelled",
    "entered-in-error",
    "unknown",
];

const IMMUNIZATION_STATUS: &[&str] = &["completed", "entered-in-error", "not-done"];

const COVERAGE_STATUS: &[&str] = &["active", "cancelled", "draft", "entered-in-error"];

const COVERAGE_KIND: &[&str] = &["insurance", "self-pay", "other"];

/// Validates `record` and returns it as a [`Resource`].
///
/// # Errors
///
/// Returns [`FhirError::MissingField`] or [`FhirError::InvalidValue`] naming the offending
/// field path when the record breaks a structural rule of its kind.
pub fn construct(record: impl Into<Resource>) -> FhirResult<Resource> {
    let resource = record.into();
    validate(&resource)?;
    Ok(resource)
}

/// Checks an already-built resource.
///
/// # Errors
///
/// See [`construct`].
pub fn validate(resource: &Resource) -> FhirResult<()> {
    let check = Check {
        kind: resource.kind(),
    };
    match resource {
        Resource::Patient(r) => {
            if r.name.is_empty() {
                return Err(check.missing("name"));
            }
            Ok(())
        }
        Resource::Condition(r) => {
            check.coded(&r.code, "code")?;
            check.reference(&r.subject, "subject")
        }
        Resource::Observation(r) => {
            check.one_of(&r.status, "status", OBSERVATION_STATUS)?;
            check.coded(&r.code, "code")?;
            check.reference(&r.subject, "subject")?;
            if let ObservationValue::CodeableConcept(concept) = &r.value {
                check.coded(concept, "valueCodeableConcept")?;
            }
            Ok(())
        }
        Resource::MedicationRequest(r) => {
            check.one_of(&r.status, "status", MEDICATION_REQUEST_STATUS)?;
            check.one_of(&r.intent, "intent", MEDICATION_REQUEST_INTENT)?;
            match (&r.medication.concept, &r.medication.reference) {
                (Some(concept), _) => check.coded(concept, "medication.concept")?,
                (None, Some(reference)) => check.reference(reference, "medication.reference")?,
                (None, None) => return Err(check.missing("medication")),
            }
            check.reference(&r.subject, "subject")
        }
        Resource::Encounter(r) => {
            check.one_of(&r.status, "status", ENCOUNTER_STATUS)?;
            match r.class_.first() {
                Some(class) => check.coded(class, "class[0]")?,
                None => return Err(check.missing("class")),
            }
            check.reference(&r.subject, "subject")
        }
        Resource::RelatedPerson(r) => {
            match r.relationship.first() {
                Some(relationship) => check.coded(relationship, "relationship[0]")?,
                None => return Err(check.missing("relationship")),
            }
            check.reference(&r.patient, "patient")
        }
        Resource::DiagnosticReport(r) => {
            check.one_of(&r.status, "status", DIAGNOSTIC_REPORT_STATUS)?;
            check.coded(&r.code, "code")?;
            check.reference(&r.subject, "subject")?;
            for (index, result) in r.result.iter().enumerate() {
                check.reference(result, &format!("result[{index}]"))?;
            }
            Ok(())
        }
        Resource::Immunization(r) => {
            check.one_of(&r.status, "status", IMMUNIZATION_STATUS)?;
            check.coded(&r.vaccine_code, "vaccineCode")?;
            check.reference(&r.patient, "patient")
        }
        Resource::Coverage(r) => {
            check.one_of(&r.status, "status", COVERAGE_STATUS)?;
            check.one_of(&r.kind, "kind", COVERAGE_KIND)?;
            check.reference(&r.beneficiary, "beneficiary")?;
            for (index, payer) in r.payment_by.iter().enumerate() {
                check.reference(&payer.party, &format!("paymentBy[{index}].party"))?;
            }
            Ok(())
        }
    }
}

struct Check {
    kind: ResourceKind,
}

impl Check {
    fn missing(&self, path: &str) -> FhirError {
        FhirError::MissingField {
            kind: self.kind,
            path: format!("{}.{path}", self.kind),
        }
    }

    fn invalid(&self, path: &str, value: &str) -> FhirError {
        FhirError::InvalidValue {
            kind: self.kind,
            path: format!("{}.{path}", self.kind),
            value: value.to_string(),
        }
    }

    fn one_of(&self, value: &str, path: &str, allowed: &[&str]) -> FhirResult<()> {
        if value.is_empty() {
            return Err(self.missing(path));
        }
        if !allowed.contains(&value) {
            return Err(self.invalid(path, value));
        }
        Ok(())
    }

    fn reference(&self, reference: &Reference, path: &str) -> FhirResult<()> {
        if reference.reference.trim().is_empty() {
            return Err(self.missing(&format!("{path}.reference")));
        }
        Ok(())
    }

    /// A concept must carry a non-empty code in its first coding, or free text.
    fn coded(&self, concept: &CodeableConcept, path: &str) -> FhirResult<()> {
        match concept.coding.first() {
            Some(coding) => match coding.code.as_deref() {
                Some(code) if !code.trim().is_empty() => Ok(()),
                _ => Err(self.missing(&format!("{path}.coding[0].code"))),
            },
            None if concept.text.as_deref().is_some_and(|t| !t.trim().is_empty()) => Ok(()),
            None => Err(self.missing(&format!("{path}.coding"))),
        }
    }
}
