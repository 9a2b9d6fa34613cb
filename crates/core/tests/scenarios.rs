use chrono::{DateTime, Duration, TimeZone, Utc};
use fhir::{Bundle, Resource, ResourceKind};
use kindling_core::{GenerateOptions, Generator, GeneratorConfig, KindlingError, Profile};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
}

fn config(seed: u64) -> GeneratorConfig {
    GeneratorConfig::new(now(), Some(seed), None)
}

fn profile(yaml: &str) -> Profile {
    Profile::from_yaml_str(yaml).expect("profile should parse")
}

fn resources(bundles: &[Bundle]) -> Vec<&Resource> {
    bundles
        .iter()
        .flat_map(|bundle| bundle.entry.iter().map(|entry| &entry.resource))
        .collect()
}

fn parse_instant(text: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(text)
        .expect("rfc3339 timestamp")
        .with_timezone(&Utc)
}

const SINGLE_DIABETES: &str = r#"
mode: single
single_patient:
  name: {family: Jones, given: [Mary]}
  gender: female
  birthDate: "1967-04-12"
resources:
  rules:
    - when: {condition: "age > 50"}
      then:
        add_conditions:
          - code: {system: "http://snomed.info/sct", value: "44054006", display: "Diabetes mellitus type 2"}
        add_observations:
          - loinc: 4548-4
            range: {min: 6.5, max: 8.5}
            unit: "%"
        meds:
          - rxnorm: "860975"
            display: metformin
"#;

#[test]
fn single_mode_fires_rules_without_age_context() {
    let generator = Generator::new(profile(SINGLE_DIABETES), config(42));
    let bundles = generator
        .generate(&GenerateOptions::default())
        .expect("generate")
        .into_bundles();
    assert_eq!(bundles.len(), 1);

    let kinds: Vec<_> = resources(&bundles).iter().map(|r| r.kind()).collect();
    assert_eq!(
        kinds,
        vec![
            ResourceKind::Patient,
            ResourceKind::Condition,
            ResourceKind::Observation,
            ResourceKind::MedicationRequest
        ]
    );

    let json = serde_json::to_string(&bundles[0]).expect("serialize");
    assert!(json.contains("\"44054006\""));
    assert!(json.contains("\"4548-4\""));
    assert!(json.contains("\"860975\""));
}

#[test]
fn cohort_of_25_splits_into_10_10_5() {
    let generator = Generator::new(profile("mode: cohort\n"), config(7));
    let options = GenerateOptions {
        count: 25,
        max_size: 10,
        ..GenerateOptions::default()
    };
    let bundles = generator.generate(&options).expect("generate").into_bundles();
    let sizes: Vec<_> = bundles.iter().map(Bundle::len).collect();
    assert_eq!(sizes, vec![10, 10, 5]);
}

#[test]
fn lookback_measurements_stay_inside_window() {
    let yaml = r#"
mode: single
resources:
  rules:
    - then:
        add_observations:
          - loinc: 4548-4
            times: {qty: 3, lookback_months: 3}
"#;
    let generator = Generator::new(profile(yaml), config(3));
    let bundles = generator
        .generate(&GenerateOptions::default())
        .expect("generate")
        .into_bundles();

    let times: Vec<_> = resources(&bundles)
        .into_iter()
        .filter_map(|resource| match resource {
            Resource::Observation(observation) => observation
                .effective_date_time
                .as_deref()
                .map(parse_instant),
            _ => None,
        })
        .collect();
    assert_eq!(times.len(), 3);

    let earliest = times.iter().min().expect("earliest");
    let latest = times.iter().max().expect("latest");
    assert!(*latest - *earliest <= Duration::days(95));
    assert!(times.iter().all(|t| *t <= now()));
}

#[test]
fn repeated_immunization_is_spaced_and_numbered() {
    let yaml = r#"
mode: single
resources:
  rules:
    - then:
        immunizations:
          - vaccine: {system: "http://hl7.org/fhir/sid/cvx", code: "208"}
            qty: 2
            days_ago: 180
"#;
    let generator = Generator::new(profile(yaml), config(4));
    let bundles = generator
        .generate(&GenerateOptions::default())
        .expect("generate")
        .into_bundles();

    let doses: Vec<_> = resources(&bundles)
        .into_iter()
        .filter_map(|resource| match resource {
            Resource::Immunization(immunization) => Some((
                immunization.occurrence_date_time.as_deref().map(parse_instant),
                immunization.dose_number(),
            )),
            _ => None,
        })
        .collect();

    assert_eq!(
        doses,
        vec![
            (Some(now() - Duration::days(180)), Some(1)),
            (Some(now() - Duration::days(150)), Some(2)),
        ]
    );
}

#[test]
fn related_person_is_symmetric() {
    let yaml = r#"
mode: single
single_patient:
  name: {family: Jones, given: [Mary]}
  gender: female
  birthDate: "1967-04-12"
resources:
  rules:
    - then:
        related_persons:
          - name: {family: Jones, given: [Emily]}
            relationship: parent
            gender: female
"#;
    let generator = Generator::new(profile(yaml), config(5));
    let bundles = generator
        .generate(&GenerateOptions::default())
        .expect("generate")
        .into_bundles();
    let all = resources(&bundles);

    let patients = all
        .iter()
        .filter(|r| r.kind() == ResourceKind::Patient)
        .count();
    assert_eq!(patients, 2);

    let codes: Vec<_> = all
        .iter()
        .filter_map(|resource| match resource {
            Resource::RelatedPerson(person) => person
                .relationship
                .first()
                .and_then(|concept| concept.first_code())
                .map(str::to_string),
            _ => None,
        })
        .collect();
    assert_eq!(codes, vec!["PRN".to_string(), "CHILD".to_string()]);

    let full_urls: Vec<_> = bundles[0]
        .entry
        .iter()
        .map(|entry| entry.full_url.as_str())
        .collect();
    let anchors: Vec<_> = all
        .iter()
        .filter_map(|resource| match resource {
            Resource::RelatedPerson(person) => Some(person.patient.reference.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(anchors, vec![full_urls[0], full_urls[1]]);
}

#[test]
fn same_seed_same_identifiers() {
    let run = || {
        let generator = Generator::from_persona("mary_diabetes", config(1234)).expect("persona");
        let bundles = generator
            .generate(&GenerateOptions::default())
            .expect("generate")
            .into_bundles();
        serde_json::to_value(&bundles).expect("serialize")
    };
    assert_eq!(run(), run());

    let other = Generator::from_persona("mary_diabetes", config(4321))
        .expect("persona")
        .generate(&GenerateOptions::default())
        .expect("generate")
        .into_bundles();
    assert_ne!(run(), serde_json::to_value(&other).expect("serialize"));
}

#[test]
fn cohort_determinism_spans_demographics() {
    let yaml = r#"
mode: cohort
demographics:
  age: {min: 30, max: 80}
  gender:
    distribution: {female: 0.6, male: 0.4}
resources:
  rules:
    - when: {condition: "age > 55"}
      then:
        add_conditions:
          - code: {value: "38341003"}
"#;
    let options = GenerateOptions {
        count: 12,
        max_size: 5,
        ..GenerateOptions::default()
    };
    let first = Generator::new(profile(yaml), config(99))
        .generate(&options)
        .expect("generate");
    let second = Generator::new(profile(yaml), config(99))
        .generate(&options)
        .expect("generate");
    assert_eq!(first, second);
}

#[test]
fn offsets_beyond_the_calendar_fail_with_the_field_name() {
    let cases = [
        (
            "immunizations:\n          - vaccine: {code: \"208\"}\n            days_ago: 1000000000",
            "Immunization.days_ago",
        ),
        (
            "meds:\n          - rxnorm: \"860975\"\n            completed_days_ago: 9223372036854775000\n            duration_days: 10000",
            "MedicationRequest.completed_days_ago + duration_days",
        ),
        (
            "encounters:\n          - qty: 2\n            spread_months: 9223372036854775000",
            "Encounter.spread_months",
        ),
        (
            "add_conditions:\n          - code: {value: \"44054006\"}\n            onset: {years_ago: 100000000}",
            "Condition.onset.years_ago",
        ),
    ];

    for (action, field) in cases {
        let yaml = format!("mode: single\nresources:\n  rules:\n    - then:\n        {action}\n");
        let generator = Generator::new(profile(&yaml), config(8));
        match generator.generate(&GenerateOptions::default()) {
            Err(KindlingError::Configuration(message)) => {
                assert!(message.contains(field), "{field}: {message}")
            }
            other => panic!("expected Configuration for {field}, got {other:?}"),
        }
    }
}
