use chrono::{TimeZone, Utc};
use fhir::{Bundle, HttpVerb, Resource, ResourceId, ResourceKind};
use kindling_core::identity::reconcile;
use kindling_core::{
    GenerateOptions, Generator, GeneratorConfig, IdentityMap, Profile, ResourceFilter,
    TransportMode,
};
use kindling_random::SeededRandom;
use std::collections::HashSet;

fn config(seed: u64) -> GeneratorConfig {
    GeneratorConfig::new(
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        Some(seed),
        None,
    )
}

fn persona_bundles(name: &str, mode: TransportMode) -> Vec<Bundle> {
    let options = GenerateOptions {
        transport_mode: mode,
        ..GenerateOptions::default()
    };
    Generator::from_persona(name, config(42))
        .expect("persona")
        .generate(&options)
        .expect("generate")
        .into_bundles()
}

#[test]
fn create_mode_references_close_over_the_bundle() {
    for persona in ["mary_diabetes", "john_asthma", "linda_hypertension", "david_healthy"] {
        let bundles = persona_bundles(persona, TransportMode::Create);
        assert_eq!(bundles.len(), 1, "{persona}");
        let bundle = &bundles[0];

        let full_urls: HashSet<_> = bundle
            .entry
            .iter()
            .map(|entry| entry.full_url.as_str())
            .collect();
        assert_eq!(full_urls.len(), bundle.len(), "{persona}: fullUrls are unique");

        for entry in &bundle.entry {
            assert!(entry.resource.id().is_none(), "{persona}: id stripped");
            for reference in entry.resource.references() {
                let target = reference.reference.as_str();
                if target.starts_with("urn:uuid:") {
                    assert!(full_urls.contains(target), "{persona}: dangling {target}");
                } else if let Some((_, id)) = reference.relative_parts() {
                    assert!(
                        ResourceId::parse(id).is_err(),
                        "{persona}: durable id leaked in {target}"
                    );
                }
            }
        }
    }
}

#[test]
fn related_person_references_close_too() {
    let bundles = persona_bundles("john_asthma", TransportMode::Create);
    let related: Vec<_> = bundles[0]
        .entry
        .iter()
        .filter(|entry| entry.resource.kind() == ResourceKind::RelatedPerson)
        .collect();
    assert_eq!(related.len(), 2);
}

#[test]
fn preserve_mode_keeps_durable_ids() {
    let bundles = persona_bundles("mary_diabetes", TransportMode::Preserve);
    let bundle = &bundles[0];

    let patient = &bundle.entry[0];
    let patient_id = patient.resource.id().expect("preserved id");
    assert_eq!(patient.full_url, format!("urn:uuid:{patient_id}"));

    for entry in &bundle.entry {
        let id = entry.resource.id().expect("preserved id");
        let request = entry.request.as_ref().expect("transaction request");
        assert_eq!(request.method, HttpVerb::Put);
        assert_eq!(request.url, format!("{}/{id}", entry.resource.kind()));
        if let Some(subject) = entry.resource.subject() {
            assert_eq!(subject.reference, format!("Patient/{patient_id}"));
        }
    }
}

#[test]
fn conditional_mode_guards_every_create() {
    let bundles = persona_bundles("linda_hypertension", TransportMode::Conditional);
    let bundle = &bundles[0];

    let patient_request = bundle.entry[0].request.as_ref().expect("request");
    assert_eq!(
        patient_request.if_none_exist.as_deref(),
        Some("identifier=http://hospital.example/mrn|MRN-LINDA-0003")
    );

    for entry in &bundle.entry {
        let request = entry.request.as_ref().expect("request");
        assert_eq!(request.method, HttpVerb::Post);
        assert!(request.if_none_exist.is_some());
        assert!(entry.resource.id().is_none());
    }
}

#[test]
fn collection_bundles_carry_no_requests() {
    let bundles = persona_bundles("david_healthy", TransportMode::Create);
    let options = Generator::from_persona("david_healthy", config(42))
        .expect("persona")
        .default_options()
        .expect("options");
    assert_eq!(options.container_type, fhir::BundleType::Collection);
    assert!(bundles[0].entry.iter().all(|entry| entry.request.is_some()));

    let bundles = Generator::from_persona("david_healthy", config(42))
        .expect("persona")
        .generate(&options)
        .expect("generate")
        .into_bundles();
    assert!(bundles[0].entry.iter().all(|entry| entry.request.is_none()));
}

#[test]
fn filter_keeps_only_listed_kinds_and_their_subject() {
    let filter: ResourceFilter = "Observation,Immunization".parse().expect("filter");
    let bundles = Generator::from_persona("mary_diabetes", config(42))
        .expect("persona")
        .with_resource_filter(filter)
        .generate(&GenerateOptions::default())
        .expect("generate")
        .into_bundles();

    let kinds: HashSet<_> = bundles[0]
        .entry
        .iter()
        .map(|entry| entry.resource.kind())
        .collect();
    assert_eq!(
        kinds,
        HashSet::from([
            ResourceKind::Patient,
            ResourceKind::Observation,
            ResourceKind::Immunization
        ])
    );
    assert_eq!(bundles[0].entry[0].resource.kind(), ResourceKind::Patient);
}

#[test]
fn reconcile_twice_changes_nothing() {
    let mut rng = SeededRandom::new(Some(8));
    let mut map = IdentityMap::new(TransportMode::Create);
    let patient = map.assign(&mut rng).expect("assign");

    let bundles = persona_bundles("mary_diabetes", TransportMode::Preserve);
    let mut records: Vec<Resource> = bundles[0]
        .entry
        .iter()
        .map(|entry| entry.resource.clone())
        .collect();
    if let Some(Resource::Condition(condition)) = records.get_mut(1) {
        condition.subject.reference = format!("Patient/{patient}");
    }

    assert_eq!(reconcile(&mut records, &map), 1);
    let once = records.clone();
    assert_eq!(reconcile(&mut records, &map), 0);
    assert_eq!(records, once);
}

#[test]
fn rendered_bundles_read_back_through_the_wire_model() {
    for mode in [TransportMode::Create, TransportMode::Preserve] {
        let bundles = persona_bundles("john_asthma", mode);
        let text = serde_json::to_string(&bundles[0]).expect("serialize");
        let parsed = Bundle::parse_json(&text).expect("parse");
        assert_eq!(parsed, bundles[0]);
    }
}

fn dangling_references(bundles: &[Bundle]) -> Vec<String> {
    let full_urls: HashSet<_> = bundles
        .iter()
        .flat_map(|bundle| bundle.entry.iter().map(|entry| entry.full_url.as_str()))
        .collect();
    bundles
        .iter()
        .flat_map(|bundle| bundle.entry.iter())
        .flat_map(|entry| {
            entry
                .resource
                .references()
                .into_iter()
                .map(move |reference| (entry.resource.kind(), reference.reference.as_str()))
        })
        .filter(|(_, target)| target.starts_with("urn:uuid:") && !full_urls.contains(target))
        .map(|(kind, target)| format!("{kind} -> {target}"))
        .collect()
}

#[test]
fn related_person_filter_keeps_the_relative_patient() {
    let filter: ResourceFilter = "RelatedPerson".parse().expect("filter");
    let bundles = Generator::from_persona("john_asthma", config(42))
        .expect("persona")
        .with_resource_filter(filter)
        .generate(&GenerateOptions::default())
        .expect("generate")
        .into_bundles();

    let kinds: Vec<_> = bundles[0]
        .entry
        .iter()
        .map(|entry| entry.resource.kind())
        .collect();
    assert_eq!(
        kinds,
        vec![
            ResourceKind::Patient,
            ResourceKind::Patient,
            ResourceKind::RelatedPerson,
            ResourceKind::RelatedPerson
        ]
    );
    assert_eq!(dangling_references(&bundles), Vec::<String>::new());
}

#[test]
fn cohort_references_close_across_subjects_and_chunks() {
    let profile = Profile::from_yaml_str(
        r#"
mode: cohort
resources:
  rules:
    - then:
        related_persons:
          - name: {family: Reyes, given: [Ana]}
            relationship: sibling
            gender: female
        diagnostic_reports:
          - code: {system: "http://loinc.org", value: "58410-2", display: "CBC panel"}
            observations:
              - loinc: 718-7
                range: {min: 12.0, max: 16.0}
                unit: g/dL
              - loinc: 6690-2
                range: {min: 4.0, max: 11.0}
                unit: "10*3/uL"
        encounters:
          - qty: 2
"#,
    )
    .expect("profile");
    let options = GenerateOptions {
        count: 6,
        max_size: 3,
        transport_mode: TransportMode::Create,
        ..GenerateOptions::default()
    };
    let bundles = Generator::new(profile, config(17))
        .generate(&options)
        .expect("generate")
        .into_bundles();

    // 6 subjects x (patient + relative + 2 related persons + 2 observations + report + 2 visits)
    assert_eq!(bundles.iter().map(Bundle::len).sum::<usize>(), 54);
    assert_eq!(bundles.len(), 18);
    assert!(bundles.iter().all(|bundle| bundle.len() <= 3));

    let urn_references = bundles
        .iter()
        .flat_map(|bundle| bundle.entry.iter())
        .flat_map(|entry| entry.resource.references())
        .filter(|reference| reference.reference.starts_with("urn:uuid:"))
        .count();
    // every subject-bound record plus two report results per subject
    assert_eq!(urn_references, 6 * (2 + 2 + 1 + 2 + 2));
    assert_eq!(dangling_references(&bundles), Vec::<String>::new());
}
