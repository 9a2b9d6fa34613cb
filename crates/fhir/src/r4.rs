//! Down-conversion of rendered bundles for FHIR R4 receivers.
//!
//! The wire models follow R5. R4 servers reject a handful of R5 element shapes, so rendered
//! JSON is rewritten just before it is written out:
//! - `MedicationRequest.medication` (CodeableReference) becomes `medicationCodeableConcept` or
//!   `medicationReference`
//! - `Encounter.class` (list of concepts) becomes a single `Coding`, `actualPeriod` becomes
//!   `period` and `reason[].use` becomes `reasonCode`
//! - `Coverage.paymentBy[].party` becomes `payor` and the R5-only `kind` is dropped
//!
//! Every rewrite only fires when the R5 element is present, so adapting twice is the same as
//! adapting once.

use serde_json::{Map, Value};

/// Adapts every entry resource of a rendered bundle.
pub fn adapt_bundle(mut bundle: Value) -> Value {
    if let Some(entries) = bundle.get_mut("entry").and_then(Value::as_array_mut) {
        for entry in entries {
            if let Some(resource) = entry.get_mut("resource") {
                adapt_resource(resource);
            }
        }
    }
    bundle
}

/// Adapts a single rendered resource in place.
pub fn adapt_resource(resource: &mut Value) {
    let Some(object) = resource.as_object_mut() else {
        return;
    };
    match object.get("resourceType").and_then(Value::as_str) {
        Some("MedicationRequest") => adapt_medication_request(object),
        Some("Encounter") => adapt_encounter(object),
        Some("Coverage") => adapt_coverage(object),
        _ => {}
    }
}

fn adapt_medication_request(object: &mut Map<String, Value>) {
    let Some(Value::Object(mut medication)) = object.remove("medication") else {
        return;
    };
    if let Some(concept) = medication.remove("concept") {
        object.insert("medicationCodeableConcept".to_string(), concept);
    } else if let Some(reference) = medication.remove("reference") {
        object.insert("medicationReference".to_string(), reference);
    }
}

fn adapt_encounter(object: &mut Map<String, Value>) {
    if let Some(Value::Array(classes)) = object.get("class") {
        let coding = classes
            .first()
            .and_then(|class| class.get("coding"))
            .and_then(|coding| coding.get(0))
            .cloned();
        match coding {
            Some(coding) => {
                object.insert("class".to_string(), coding);
            }
            None => {
                object.remove("class");
            }
        }
    }

    if let Some(period) = object.remove("actualPeriod") {
        object.insert("period".to_string(), period);
    }

    if let Some(Value::Array(reasons)) = object.remove("reason") {
        let codes: Vec<Value> = reasons
            .into_iter()
            .filter_map(|mut reason| reason.get_mut("use").map(Value::take))
            .flat_map(|uses| match uses {
                Value::Array(items) => items,
                other => vec![other],
            })
            .collect();
        if !codes.is_empty() {
            object.insert("reasonCode".to_string(), Value::Array(codes));
        }
    }
}

fn adapt_coverage(object: &mut Map<String, Value>) {
    if let Some(Value::Array(payers)) = object.remove("paymentBy") {
        let payor: Vec<Value> = payers
            .into_iter()
            .filter_map(|mut payer| payer.get_mut("party").map(Value::take))
            .collect();
        if !payor.is_empty() {
            object.insert("payor".to_string(), Value::Array(payor));
        }
    }
    object.remove("kind");
}
