//! Structural checks over rendered bundles.
//!
//! Works on the JSON form rather than the typed model so it accepts both the internal shape
//! and the R4 wire shape, and so a malformed file still gets a report instead of a parse error.
//!
//! Findings are graded: errors make the bundle invalid, warnings and info do not.

use crate::{KindlingError, KindlingResult};
use fhir::Bundle;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

const BUNDLE_TYPES: &[&str] = &[
    "transaction",
    "collection",
    "document",
    "message",
    "history",
    "searchset",
    "batch",
];
const REQUEST_METHODS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];
const GENDERS: &[&str] = &["male", "female", "other", "unknown"];
const OBSERVATION_STATUSES: &[&str] = &[
    "registered",
    "preliminary",
    "final",
    "amended",
    "corrected",
    "cancelled",
    "entered-in-error",
    "unknown",
];
const MEDICATION_REQUEST_STATUSES: &[&str] = &[
    "active",
    "on-hold",
    "cancelled",
    "completed",
    "entered-in-error",
    "stopped",
    "draft",
    "unknown",
];
const MEDICATION_REQUEST_INTENTS: &[&str] = &[
    "proposal",
    "plan",
    "order",
    "original-order",
    "reflex-order",
    "filler-order",
    "instance-order",
    "option",
];
const ENCOUNTER_STATUSES: &[&str] = &[
    "planned",
    "arrived",
    "triaged",
    "in-progress",
    "onleave",
    "finished",
    "completed",
    "cancelled",
    "entered-in-error",
    "unknown",
];

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "✓ Validation passed")?;
        } else {
            write!(f, "✗ Validation failed")?;
        }
        for (title, messages) in [
            ("Errors", &self.errors),
            ("Warnings", &self.warnings),
            ("Info", &self.info),
        ] {
            if messages.is_empty() {
                continue;
            }
            write!(f, "\n{title} ({}):", messages.len())?;
            for message in messages {
                write!(f, "\n  - {message}")?;
            }
        }
        Ok(())
    }
}

/// Validate a generated bundle.
///
/// # Errors
///
/// Returns [`KindlingError::Serialization`] if the bundle cannot be rendered to JSON.
pub fn validate_bundle(bundle: &Bundle) -> KindlingResult<ValidationReport> {
    let value = serde_json::to_value(bundle)?;
    Ok(validate_value(&value))
}

/// Validate bundle JSON text. Text that is not JSON yields a report with one error.
pub fn validate_json(text: &str) -> ValidationReport {
    match serde_json::from_str::<Value>(text) {
        Ok(value) => validate_value(&value),
        Err(err) => ValidationReport {
            errors: vec![format!("Invalid JSON: {err}")],
            ..ValidationReport::default()
        },
    }
}

/// # Errors
///
/// Returns [`KindlingError::Io`] if the file cannot be read.
pub fn validate_file(path: &Path) -> KindlingResult<ValidationReport> {
    let text = fs::read_to_string(path).map_err(|source| KindlingError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(validate_json(&text))
}

/// Validate an already parsed bundle document.
pub fn validate_value(bundle: &Value) -> ValidationReport {
    let mut report = ValidationReport::default();

    let resource_type = str_field(bundle, "resourceType");
    if resource_type != Some("Bundle") {
        report.error(format!(
            "Invalid resourceType: {}",
            resource_type.unwrap_or("<missing>")
        ));
        return report;
    }

    let bundle_type = str_field(bundle, "type");
    match bundle_type {
        None => report.error("Bundle missing type"),
        Some(kind) if !BUNDLE_TYPES.contains(&kind) => {
            report.error(format!("Invalid bundle type: {kind}"))
        }
        Some(_) => {}
    }

    if str_field(bundle, "id").is_none() {
        report.warning("Bundle missing id");
    }
    if str_field(bundle, "timestamp").is_none() {
        report.warning("Bundle missing timestamp");
    }

    let entries = bundle
        .get("entry")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    if entries.is_empty() {
        report.warning("Bundle has no entries");
        return report;
    }

    report
        .info
        .push(format!("Bundle contains {} entries", entries.len()));
    check_entries(entries, bundle_type == Some("transaction"), &mut report);
    report
}

fn check_entries(entries: &[Value], transaction: bool, report: &mut ValidationReport) {
    let mut targets: HashSet<String> = HashSet::new();
    let mut references: Vec<(usize, &'static str, String)> = Vec::new();

    for (index, entry) in entries.iter().enumerate() {
        let Some(resource) = entry.get("resource").filter(|r| r.is_object()) else {
            report.error(format!("Entry {index} missing resource"));
            continue;
        };

        let full_url = str_field(entry, "fullUrl");
        match full_url {
            Some(url) => {
                targets.insert(url.to_string());
            }
            None => report.warning(format!("Entry {index} missing fullUrl")),
        }

        if transaction {
            check_request(index, entry.get("request"), report);
        }

        let Some(kind) = str_field(resource, "resourceType") else {
            report.error(format!("Entry {index} resource missing resourceType"));
            continue;
        };

        match str_field(resource, "id") {
            Some(id) => {
                targets.insert(format!("{kind}/{id}"));
            }
            None if full_url.is_none() => {
                report.warning(format!("Resource {index} ({kind}) has neither id nor fullUrl"))
            }
            None => {}
        }

        check_resource(index, kind, resource, report);

        for field in ["subject", "patient", "beneficiary"] {
            if let Some(reference) = resource
                .get(field)
                .and_then(|value| str_field(value, "reference"))
            {
                references.push((index, field, reference.to_string()));
            }
        }
    }

    for (index, field, reference) in references {
        if !targets.contains(&reference) {
            report.warning(format!(
                "Resource {index} has {field} reference to non-existent resource: {reference}"
            ));
        }
    }
}

fn check_request(index: usize, request: Option<&Value>, report: &mut ValidationReport) {
    let Some(request) = request else {
        report.error(format!(
            "Entry {index} missing request (required for transaction bundle)"
        ));
        return;
    };
    match str_field(request, "method") {
        None => report.error(format!("Entry {index} missing request.method")),
        Some(method) if !REQUEST_METHODS.contains(&method) => {
            report.error(format!("Entry {index} invalid request.method: {method}"))
        }
        Some(_) => {}
    }
    if str_field(request, "url").is_none() {
        report.error(format!("Entry {index} missing request.url"));
    }
}

fn check_resource(index: usize, kind: &str, resource: &Value, report: &mut ValidationReport) {
    let mut check = Check {
        index,
        kind,
        resource,
        report,
    };

    match kind {
        "Patient" => {
            if !check.present("name") {
                check.report.error(format!("Patient {index} missing name"));
            }
            check.coded_status("gender", GENDERS, false);
            if !check.present("birthDate") {
                check
                    .report
                    .warning(format!("Patient {index} missing birthDate"));
            }
        }
        "Condition" => {
            check.require(&["code", "subject"]);
            check.recommend(&["clinicalStatus", "verificationStatus"]);
        }
        "Observation" => {
            check.coded_status("status", OBSERVATION_STATUSES, true);
            check.require(&["code", "subject"]);
        }
        "MedicationRequest" => {
            check.coded_status("status", MEDICATION_REQUEST_STATUSES, true);
            check.coded_status("intent", MEDICATION_REQUEST_INTENTS, true);
            if !check.any_present(&["medication", "medicationCodeableConcept", "medicationReference"])
            {
                check
                    .report
                    .error(format!("MedicationRequest {index} missing medication"));
            }
            check.require(&["subject"]);
        }
        "Encounter" => {
            check.coded_status("status", ENCOUNTER_STATUSES, true);
            check.require(&["class", "subject"]);
        }
        "RelatedPerson" => check.require(&["patient"]),
        "DiagnosticReport" => check.require(&["status", "code", "subject"]),
        "Immunization" => check.require(&["status", "vaccineCode", "patient"]),
        "Coverage" => check.require(&["status", "beneficiary"]),
        other => check
            .report
            .warning(format!("Resource {index} has unexpected type {other}")),
    }
}

struct Check<'a> {
    index: usize,
    kind: &'a str,
    resource: &'a Value,
    report: &'a mut ValidationReport,
}

impl Check<'_> {
    fn present(&self, field: &str) -> bool {
        match self.resource.get(field) {
            None | Some(Value::Null) => false,
            Some(Value::Array(items)) => !items.is_empty(),
            Some(Value::String(text)) => !text.is_empty(),
            Some(_) => true,
        }
    }

    fn any_present(&self, fields: &[&str]) -> bool {
        fields.iter().any(|field| self.present(field))
    }

    fn require(&mut self, fields: &[&str]) {
        for field in fields {
            if !self.present(field) {
                self.report
                    .error(format!("{} {} missing {field}", self.kind, self.index));
            }
        }
    }

    fn recommend(&mut self, fields: &[&str]) {
        for field in fields {
            if !self.present(field) {
                self.report
                    .warning(format!("{} {} missing {field}", self.kind, self.index));
            }
        }
    }

    /// A code-valued field drawn from a fixed value set.
    fn coded_status(&mut self, field: &str, allowed: &[&str], required: bool) {
        match str_field(self.resource, field) {
            None if required => self
                .report
                .error(format!("{} {} missing {field}", self.kind, self.index)),
            None => self
                .report
                .warning(format!("{} {} missing {field}", self.kind, self.index)),
            Some(value) if !allowed.contains(&value) => self.report.error(format!(
                "{} {} invalid {field}: {value}",
                self.kind, self.index
            )),
            Some(_) => {}
        }
    }
}

fn str_field<'a>(value: &'a Value, field: &str) -> Option<&'a str> {
    value
        .get(field)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_transaction() -> Value {
        json!({
            "resourceType": "Bundle",
            "id": "b1",
            "type": "transaction",
            "timestamp": "2025-06-01T12:00:00+00:00",
            "entry": [
                {
                    "fullUrl": "urn:uuid:p1",
                    "resource": {
                        "resourceType": "Patient",
                        "name": [{"family": "Doe"}],
                        "gender": "female",
                        "birthDate": "1970-01-01"
                    },
                    "request": {"method": "POST", "url": "Patient"}
                },
                {
                    "fullUrl": "urn:uuid:c1",
                    "resource": {
                        "resourceType": "Condition",
                        "code": {"text": "x"},
                        "subject": {"reference": "urn:uuid:p1"},
                        "clinicalStatus": {"text": "active"},
                        "verificationStatus": {"text": "confirmed"}
                    },
                    "request": {"method": "POST", "url": "Condition"}
                }
            ]
        })
    }

    #[test]
    fn clean_bundle_passes() {
        let report = validate_value(&minimal_transaction());
        assert!(report.is_valid(), "{report}");
        assert!(report.warnings.is_empty(), "{report}");
        assert_eq!(report.info, vec!["Bundle contains 2 entries"]);
        assert!(report.to_string().starts_with("✓ Validation passed"));
    }

    #[test]
    fn transaction_entries_need_requests() {
        let mut bundle = minimal_transaction();
        bundle["entry"][1]
            .as_object_mut()
            .expect("entry object")
            .remove("request");
        bundle["entry"][0]["request"]["method"] = json!("FETCH");

        let report = validate_value(&bundle);
        assert!(!report.is_valid());
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("Entry 1 missing request")));
        assert!(report
            .errors
            .iter()
            .any(|e| e.contains("invalid request.method: FETCH")));
        assert!(report.to_string().starts_with("✗ Validation failed"));
    }

    #[test]
    fn dangling_subject_is_a_warning() {
        let mut bundle = minimal_transaction();
        bundle["entry"][1]["resource"]["subject"]["reference"] = json!("urn:uuid:elsewhere");
        let report = validate_value(&bundle);
        assert!(report.is_valid());
        assert!(report.warnings[0].contains("non-existent resource: urn:uuid:elsewhere"));
    }

    #[test]
    fn per_kind_required_fields() {
        let bundle = json!({
            "resourceType": "Bundle",
            "id": "b2",
            "type": "collection",
            "timestamp": "2025-06-01T12:00:00+00:00",
            "entry": [
                {"fullUrl": "urn:uuid:o1", "resource": {"resourceType": "Observation", "status": "guess"}},
                {"fullUrl": "urn:uuid:m1", "resource": {"resourceType": "MedicationRequest", "status": "active", "intent": "order"}},
                {"fullUrl": "urn:uuid:i1", "resource": {"resourceType": "Immunization", "status": "completed"}}
            ]
        });
        let report = validate_value(&bundle);
        let errors = report.errors.join("\n");
        assert!(errors.contains("Observation 0 invalid status: guess"), "{errors}");
        assert!(errors.contains("Observation 0 missing code"), "{errors}");
        assert!(errors.contains("MedicationRequest 1 missing medication"), "{errors}");
        assert!(errors.contains("Immunization 2 missing vaccineCode"), "{errors}");
    }

    #[test]
    fn r4_medication_shape_is_accepted() {
        let bundle = json!({
            "resourceType": "Bundle",
            "id": "b3",
            "type": "collection",
            "timestamp": "2025-06-01T12:00:00+00:00",
            "entry": [{
                "fullUrl": "urn:uuid:m1",
                "resource": {
                    "resourceType": "MedicationRequest",
                    "status": "active",
                    "intent": "order",
                    "medicationCodeableConcept": {"text": "metformin"},
                    "subject": {"reference": "Patient/p1"}
                }
            }]
        });
        let report = validate_value(&bundle);
        assert!(report.is_valid(), "{report}");
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn not_json_or_not_a_bundle() {
        let report = validate_json("{not json");
        assert!(report.errors[0].starts_with("Invalid JSON"));

        let report = validate_json(r#"{"resourceType": "Patient"}"#);
        assert_eq!(report.errors, vec!["Invalid resourceType: Patient"]);
    }

    #[test]
    fn validate_file_reads_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bundle.json");
        fs::write(&path, minimal_transaction().to_string()).expect("write");
        assert!(validate_file(&path).expect("read").is_valid());

        assert!(matches!(
            validate_file(&dir.path().join("missing.json")),
            Err(KindlingError::Io { .. })
        ));
    }
}
