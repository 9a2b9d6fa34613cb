use chrono::{TimeZone, Utc};
use kindling_core::validator::{validate_bundle, validate_json};
use kindling_core::{
    GenerateOptions, Generator, GeneratorConfig, KindlingError, PersonaLoader, TransportMode,
};
use std::fs;
use std::path::PathBuf;

fn config(seed: u64, persona_dir: Option<PathBuf>) -> GeneratorConfig {
    GeneratorConfig::new(
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        Some(seed),
        persona_dir,
    )
}

#[test]
fn profile_file_drives_a_cohort() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("elderly.yaml");
    fs::write(
        &path,
        r#"
version: "0.1"
mode: cohort
demographics:
  age: {min: 70, max: 85}
resources:
  include: [Patient, Condition, Encounter]
  rules:
    - name: heart failure
      when: {condition: "age > 60"}
      then:
        add_conditions:
          - code: {system: "http://snomed.info/sct", value: "84114007", display: "Heart failure"}
        encounters:
          - qty: 2
output:
  mode: collection
  bundle_size: 4
"#,
    )
    .expect("write profile");

    let generator = Generator::from_selection(Some(&path), None, config(11, None)).expect("load");
    let options = GenerateOptions {
        count: 3,
        ..generator.default_options().expect("options")
    };
    let bundles = generator.generate(&options).expect("generate").into_bundles();

    // 3 subjects x (patient + condition + 2 encounters) in bundles of 4
    assert_eq!(bundles.len(), 3);
    assert!(bundles.iter().all(|bundle| bundle.len() == 4));
    for bundle in &bundles {
        let report = validate_bundle(bundle).expect("render");
        assert!(report.is_valid(), "{report}");
    }
}

#[test]
fn missing_profile_is_a_load_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    match Generator::from_selection(Some(&dir.path().join("nope.yaml")), None, config(1, None)) {
        Err(KindlingError::ProfileNotFound(path)) => assert!(path.ends_with("nope.yaml")),
        other => panic!("expected ProfileNotFound, got {other:?}"),
    }
}

#[test]
fn persona_dir_from_config_is_searched() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("ruth_ckd.yaml"),
        r#"
name: ruth_ckd
patient:
  name: {family: Okafor, given: [Ruth]}
  gender: female
resources:
  rules:
    - then:
        add_conditions:
          - code: {value: "431855005", display: "Chronic kidney disease stage 1"}
"#,
    )
    .expect("write persona");

    let loader = PersonaLoader::new(Some(dir.path().to_path_buf()));
    assert!(loader
        .list()
        .expect("list")
        .contains(&"ruth_ckd".to_string()));

    let generator =
        Generator::from_persona("ruth_ckd", config(2, Some(dir.path().to_path_buf())))
            .expect("persona");
    let bundles = generator
        .generate(&GenerateOptions::default())
        .expect("generate")
        .into_bundles();
    let json = serde_json::to_string(&bundles[0]).expect("serialize");
    assert!(json.contains("431855005"));
    assert!(json.contains("Okafor"));
}

#[test]
fn unknown_persona_names_alternatives() {
    match Generator::from_persona("nobody", config(3, None)) {
        Err(KindlingError::PersonaNotFound { name, available }) => {
            assert_eq!(name, "nobody");
            assert_eq!(available.len(), 4);
        }
        other => panic!("expected PersonaNotFound, got {other:?}"),
    }
}

#[test]
fn every_builtin_persona_validates_in_every_mode() {
    let names = PersonaLoader::default().list().expect("list");
    for name in &names {
        for mode in [
            TransportMode::Create,
            TransportMode::Preserve,
            TransportMode::Conditional,
        ] {
            let options = GenerateOptions {
                transport_mode: mode,
                ..GenerateOptions::default()
            };
            let bundles = Generator::from_persona(name, config(5, None))
                .expect("persona")
                .generate(&options)
                .expect("generate")
                .into_bundles();
            for bundle in &bundles {
                let report = validate_bundle(bundle).expect("render");
                assert!(report.is_valid(), "{name} {mode}: {report}");
                assert!(report.warnings.is_empty(), "{name} {mode}: {report}");
            }
        }
    }
}

#[test]
fn r4_output_still_validates() {
    let bundles = Generator::from_persona("mary_diabetes", config(6, None))
        .expect("persona")
        .generate(&GenerateOptions::default())
        .expect("generate")
        .into_bundles();
    let value = serde_json::to_value(&bundles[0]).expect("serialize");
    let adapted = fhir::r4::adapt_bundle(value);
    assert!(adapted.to_string().contains("medicationCodeableConcept"));

    let report = validate_json(&adapted.to_string());
    assert!(report.is_valid(), "{report}");
}
