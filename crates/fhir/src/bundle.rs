//! FHIR `Bundle` wire model.
//!
//! Responsibilities:
//! - Define the container and per-entry transport metadata (`fullUrl`, `request`)
//! - Parse bundles back from JSON with a field path on schema mismatch
//! - Render the timestamp format receivers expect

use crate::{FhirError, FhirResult, Resource};
use chrono::{DateTime, Utc};
use kindling_random::ResourceId;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Formats an instant the way every generated `dateTime`/`instant` is rendered.
pub fn format_instant(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S+00:00").to_string()
}

/// Formats the date part only (`birthDate`, `onsetDateTime`, period bounds).
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BundleType {
    #[default]
    Transaction,
    Collection,
}

impl BundleType {
    pub fn as_str(self) -> &'static str {
        match self {
            BundleType::Transaction => "transaction",
            BundleType::Collection => "collection",
        }
    }
}

impl fmt::Display for BundleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BundleType {
    type Err = FhirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "transaction" => Ok(BundleType::Transaction),
            "collection" => Ok(BundleType::Collection),
            other => Err(FhirError::InvalidInput(format!(
                "bundle type must be 'transaction' or 'collection', got '{other}'"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpVerb {
    Post,
    Put,
}

/// The `request` element of a transaction entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntryRequest {
    pub method: HttpVerb,

    pub url: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_none_exist: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_none_match: Option<String>,
}

impl BundleEntryRequest {
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: HttpVerb::Post,
            url: url.into(),
            if_none_exist: None,
            if_none_match: None,
        }
    }

    /// POST guarded by a search query; the server skips the create when the query matches.
    pub fn conditional_post(url: impl Into<String>, if_none_exist: impl Into<String>) -> Self {
        Self {
            if_none_exist: Some(if_none_exist.into()),
            ..Self::post(url)
        }
    }

    /// PUT that only succeeds when no resource exists at `url` yet.
    pub fn put_if_absent(url: impl Into<String>) -> Self {
        Self {
            method: HttpVerb::Put,
            url: url.into(),
            if_none_exist: None,
            if_none_match: Some("*".to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    pub full_url: String,

    pub resource: Resource,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<BundleEntryRequest>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    pub resource_type: String,

    pub id: ResourceId,

    #[serde(rename = "type")]
    pub type_: BundleType,

    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<BundleEntry>,
}

impl Bundle {
    pub fn new(id: ResourceId, type_: BundleType, timestamp: DateTime<Utc>) -> Self {
        Self {
            resource_type: "Bundle".to_string(),
            id,
            type_,
            timestamp: format_instant(timestamp),
            entry: Vec::new(),
        }
    }

    /// Parse a bundle from JSON text.
    ///
    /// Uses `serde_path_to_error` so a mismatch reports where in the document it happened
    /// (for example `entry[3].resource.subject`).
    ///
    /// # Errors
    ///
    /// Returns [`FhirError::Translation`] when the JSON does not match the wire schema, and
    /// [`FhirError::InvalidInput`] when `resourceType` is not `Bundle`.
    pub fn parse_json(json_text: &str) -> FhirResult<Self> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        let bundle: Bundle = match serde_path_to_error::deserialize(&mut deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(FhirError::Translation(format!(
                    "Bundle schema mismatch at {path}: {source}"
                )));
            }
        };

        if bundle.resource_type != "Bundle" {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Bundle', got '{}'",
                bundle.resource_type
            )));
        }

        Ok(bundle)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entry.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 5)
            .single()
            .expect("valid fixed time")
    }

    fn bundle_id() -> ResourceId {
        ResourceId::parse("550e8400-e29b-41d4-a716-446655440000").expect("valid id")
    }

    #[test]
    fn timestamp_uses_utc_offset_form() {
        assert_eq!(format_instant(fixed_now()), "2024-03-01T12:30:05+00:00");
        assert_eq!(format_date(fixed_now()), "2024-03-01");
    }

    #[test]
    fn empty_bundle_omits_entry_array() {
        let bundle = Bundle::new(bundle_id(), BundleType::Collection, fixed_now());
        let json = serde_json::to_value(&bundle).expect("serialise");
        assert_eq!(json["resourceType"], "Bundle");
        assert_eq!(json["type"], "collection");
        assert!(json.get("entry").is_none());
    }

    #[test]
    fn request_helpers_render_guards() {
        let json = serde_json::to_value(BundleEntryRequest::put_if_absent("Patient/abc"))
            .expect("serialise");
        assert_eq!(
            json,
            serde_json::json!({ "method": "PUT", "url": "Patient/abc", "ifNoneMatch": "*" })
        );

        let json = serde_json::to_value(BundleEntryRequest::conditional_post(
            "Patient",
            "identifier=sys|v",
        ))
        .expect("serialise");
        assert_eq!(json["method"], "POST");
        assert_eq!(json["ifNoneExist"], "identifier=sys|v");
    }

    #[test]
    fn bundle_type_parses_case_insensitively() {
        assert_eq!(
            "Transaction".parse::<BundleType>().expect("valid"),
            BundleType::Transaction
        );
        assert!("batch".parse::<BundleType>().is_err());
    }

    #[test]
    fn parse_json_reports_path_on_mismatch() {
        let text = r#"{
            "resourceType": "Bundle",
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "type": "collection",
            "timestamp": "2024-03-01T12:30:05+00:00",
            "entry": [
                { "fullUrl": "urn:uuid:x", "resource": { "resourceType": "Condition", "subject": 7 } }
            ]
        }"#;
        match Bundle::parse_json(text) {
            Err(FhirError::Translation(msg)) => assert!(msg.contains("entry[0]"), "{msg}"),
            other => panic!("expected Translation, got {other:?}"),
        }
    }

    #[test]
    fn parse_json_rejects_wrong_resource_type() {
        let text = r#"{
            "resourceType": "Patient",
            "id": "550e8400-e29b-41d4-a716-446655440000",
            "type": "collection",
            "timestamp": "2024-03-01T12:30:05+00:00"
        }"#;
        match Bundle::parse_json(text) {
            Err(FhirError::InvalidInput(msg)) => assert!(msg.contains("Patient")),
            other => panic!("expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn parse_json_round_trips_rendered_bundle() {
        let bundle = Bundle::new(bundle_id(), BundleType::Transaction, fixed_now());
        let text = serde_json::to_string(&bundle).expect("serialise");
        assert_eq!(Bundle::parse_json(&text).expect("parse"), bundle);
    }
}
