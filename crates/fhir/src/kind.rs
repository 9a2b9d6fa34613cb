//! The closed set of resource kinds the generator can produce.

use crate::FhirError;
use std::{fmt, str::FromStr};

/// Resource kinds, in the order they are listed in profiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Patient,
    Condition,
    Observation,
    MedicationRequest,
    Encounter,
    RelatedPerson,
    DiagnosticReport,
    Immunization,
    Coverage,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 9] = [
        ResourceKind::Patient,
        ResourceKind::Condition,
        ResourceKind::Observation,
        ResourceKind::MedicationRequest,
        ResourceKind::Encounter,
        ResourceKind::RelatedPerson,
        ResourceKind::DiagnosticReport,
        ResourceKind::Immunization,
        ResourceKind::Coverage,
    ];

    /// The FHIR `resourceType` string.
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Patient => "Patient",
            ResourceKind::Condition => "Condition",
            ResourceKind::Observation => "Observation",
            ResourceKind::MedicationRequest => "MedicationRequest",
            ResourceKind::Encounter => "Encounter",
            ResourceKind::RelatedPerson => "RelatedPerson",
            ResourceKind::DiagnosticReport => "DiagnosticReport",
            ResourceKind::Immunization => "Immunization",
            ResourceKind::Coverage => "Coverage",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = FhirError;

    /// Matches resource type names case-insensitively, ignoring surrounding whitespace.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| FhirError::InvalidInput(format!("unknown resource type '{wanted}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_resource_type_names() {
        assert_eq!(
            "MedicationRequest".parse::<ResourceKind>().expect("known kind"),
            ResourceKind::MedicationRequest
        );
        assert_eq!(
            " observation ".parse::<ResourceKind>().expect("known kind"),
            ResourceKind::Observation
        );
    }

    #[test]
    fn rejects_unknown_resource_type() {
        match "Procedure".parse::<ResourceKind>() {
            Err(FhirError::InvalidInput(msg)) => assert!(msg.contains("Procedure")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn display_matches_wire_name() {
        for kind in ResourceKind::ALL {
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }
}
