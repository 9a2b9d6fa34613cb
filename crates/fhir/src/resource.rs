//! The `Resource` tagged union and its kind-independent accessors.
//!
//! Responsibilities:
//! - Serialise any resource with its `resourceType` discriminator
//! - Expose id, kind and business identifier without callers matching on every variant
//! - Enumerate every reference-bearing field so identifiers can be rewritten in one place

use crate::datatypes::{Identifier, Reference};
use crate::resources::{
    Condition, Coverage, DiagnosticReport, Encounter, Immunization, MedicationRequest,
    Observation, Patient, RelatedPerson,
};
use crate::ResourceKind;
use kindling_random::ResourceId;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Patient(Patient),
    Condition(Condition),
    Observation(Observation),
    MedicationRequest(MedicationRequest),
    Encounter(Encounter),
    RelatedPerson(RelatedPerson),
    DiagnosticReport(DiagnosticReport),
    Immunization(Immunization),
    Coverage(Coverage),
}

/// Applies `$body` to the inner struct of whichever variant `$resource` holds.
macro_rules! each_variant {
    ($resource:expr, $inner:ident => $body:expr) => {
        match $resource {
            Resource::Patient($inner) => $body,
            Resource::Condition($inner) => $body,
            Resource::Observation($inner) => $body,
            Resource::MedicationRequest($inner) => $body,
            Resource::Encounter($inner) => $body,
            Resource::RelatedPerson($inner) => $body,
            Resource::DiagnosticReport($inner) => $body,
            Resource::Immunization($inner) => $body,
            Resource::Coverage($inner) => $body,
        }
    };
}

impl Resource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::Patient(_) => ResourceKind::Patient,
            Resource::Condition(_) => ResourceKind::Condition,
            Resource::Observation(_) => ResourceKind::Observation,
            Resource::MedicationRequest(_) => ResourceKind::MedicationRequest,
            Resource::Encounter(_) => ResourceKind::Encounter,
            Resource::RelatedPerson(_) => ResourceKind::RelatedPerson,
            Resource::DiagnosticReport(_) => ResourceKind::DiagnosticReport,
            Resource::Immunization(_) => ResourceKind::Immunization,
            Resource::Coverage(_) => ResourceKind::Coverage,
        }
    }

    pub fn id(&self) -> Option<ResourceId> {
        each_variant!(self, r => r.id)
    }

    pub fn set_id(&mut self, id: Option<ResourceId>) {
        each_variant!(self, r => r.id = id)
    }

    /// The first identifier usable as a conditional-create match key.
    ///
    /// Only kinds that carry business identifiers return anything.
    pub fn business_identifier(&self) -> Option<&Identifier> {
        let identifiers: &[Identifier] = match self {
            Resource::Patient(r) => &r.identifier,
            Resource::RelatedPerson(r) => &r.identifier,
            Resource::Coverage(r) => &r.identifier,
            _ => &[],
        };
        identifiers
            .iter()
            .find(|identifier| identifier.search_token().is_some())
    }

    /// Every reference-bearing field, in document order.
    pub fn references(&self) -> Vec<&Reference> {
        match self {
            Resource::Patient(_) => Vec::new(),
            Resource::Condition(r) => vec![&r.subject],
            Resource::Observation(r) => vec![&r.subject],
            Resource::MedicationRequest(r) => {
                let mut refs = vec![&r.subject];
                refs.extend(r.medication.reference.as_ref());
                refs
            }
            Resource::Encounter(r) => {
                let mut refs = vec![&r.subject];
                refs.extend(r.participant.iter().map(|p| &p.actor));
                refs.extend(r.service_provider.as_ref());
                refs
            }
            Resource::RelatedPerson(r) => vec![&r.patient],
            Resource::DiagnosticReport(r) => {
                let mut refs = vec![&r.subject];
                refs.extend(r.result.iter());
                refs.extend(r.performer.iter());
                refs
            }
            Resource::Immunization(r) => {
                let mut refs = vec![&r.patient];
                refs.extend(r.performer.iter().map(|p| &p.actor));
                refs
            }
            Resource::Coverage(r) => {
                let mut refs = vec![&r.beneficiary];
                refs.extend(r.subscriber.as_ref());
                refs.extend(r.payment_by.iter().map(|p| &p.party));
                refs
            }
        }
    }

    /// Mutable counterpart of [`references`](Self::references).
    pub fn references_mut(&mut self) -> Vec<&mut Reference> {
        match self {
            Resource::Patient(_) => Vec::new(),
            Resource::Condition(r) => vec![&mut r.subject],
            Resource::Observation(r) => vec![&mut r.subject],
            Resource::MedicationRequest(r) => {
                let mut refs = vec![&mut r.subject];
                refs.extend(r.medication.reference.as_mut());
                refs
            }
            Resource::Encounter(r) => {
                let mut refs = vec![&mut r.subject];
                refs.extend(r.participant.iter_mut().map(|p| &mut p.actor));
                refs.extend(r.service_provider.as_mut());
                refs
            }
            Resource::RelatedPerson(r) => vec![&mut r.patient],
            Resource::DiagnosticReport(r) => {
                let mut refs = vec![&mut r.subject];
                refs.extend(r.result.iter_mut());
                refs.extend(r.performer.iter_mut());
                refs
            }
            Resource::Immunization(r) => {
                let mut refs = vec![&mut r.patient];
                refs.extend(r.performer.iter_mut().map(|p| &mut p.actor));
                refs
            }
            Resource::Coverage(r) => {
                let mut refs = vec![&mut r.beneficiary];
                refs.extend(r.subscriber.as_mut());
                refs.extend(r.payment_by.iter_mut().map(|p| &mut p.party));
                refs
            }
        }
    }

    /// The reference naming the patient this resource belongs to, where the kind has one.
    pub fn subject(&self) -> Option<&Reference> {
        match self {
            Resource::Patient(_) => None,
            Resource::Condition(r) => Some(&r.subject),
            Resource::Observation(r) => Some(&r.subject),
            Resource::MedicationRequest(r) => Some(&r.subject),
            Resource::Encounter(r) => Some(&r.subject),
            Resource::RelatedPerson(r) => Some(&r.patient),
            Resource::DiagnosticReport(r) => Some(&r.subject),
            Resource::Immunization(r) => Some(&r.patient),
            Resource::Coverage(r) => Some(&r.beneficiary),
        }
    }
}

macro_rules! impl_from_variant {
    ($($kind:ident),* $(,)?) => {
        $(
            impl From<$kind> for Resource {
                fn from(value: $kind) -> Self {
                    Resource::$kind(value)
                }
            }
        )*
    };
}

impl_from_variant!(
    Patient,
    Condition,
    Observation,
    MedicationRequest,
    Encounter,
    RelatedPerson,
    DiagnosticReport,
    Immunization,
    Coverage,
);
