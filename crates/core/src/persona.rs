//! Persona library.
//!
//! A persona is a hand-authored single subject plus the rules that give it a clinical story.
//! The built-in personas are compiled into the binary; an optional directory of `.yaml`,
//! `.yml` or `.json` files can add personas or override built-ins of the same name.

use crate::definitions::PatientDefinition;
use crate::profile::{parse_json, parse_yaml, OutputSection, ResourceSection};
use crate::validation::validate_persona_name;
use crate::{KindlingError, KindlingResult};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

const BUILTIN_PERSONAS: &[(&str, &str)] = &[
    (
        "david_healthy",
        include_str!("../personas/david_healthy.yaml"),
    ),
    ("john_asthma", include_str!("../personas/john_asthma.yaml")),
    (
        "linda_hypertension",
        include_str!("../personas/linda_hypertension.yaml"),
    ),
    (
        "mary_diabetes",
        include_str!("../personas/mary_diabetes.yaml"),
    ),
];

const PERSONA_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct Persona {
    /// Defaults to the name the persona was loaded under.
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub patient: PatientDefinition,

    #[serde(default)]
    pub resources: ResourceSection,

    #[serde(default)]
    pub output: OutputSection,
}

/// Loads personas by name, caching each one for the lifetime of the loader.
#[derive(Debug, Default)]
pub struct PersonaLoader {
    dir: Option<PathBuf>,
    cache: HashMap<String, Persona>,
}

impl PersonaLoader {
    /// `dir` is searched before the built-ins.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self {
            dir,
            cache: HashMap::new(),
        }
    }

    /// Load the persona called `name`.
    ///
    /// # Errors
    ///
    /// - [`KindlingError::Configuration`] if `name` is not a safe file stem,
    /// - [`KindlingError::PersonaNotFound`] if neither the directory nor the built-ins have it,
    /// - [`KindlingError::Io`] if a persona file exists but cannot be read,
    /// - [`KindlingError::PersonaParse`] if the document does not match the persona schema.
    pub fn load(&mut self, name: &str) -> KindlingResult<&Persona> {
        validate_persona_name(name)?;

        if !self.cache.contains_key(name) {
            let persona = self.read(name)?;
            tracing::debug!(persona = %name, rules = persona.resources.rules.len(), "loaded persona");
            self.cache.insert(name.to_string(), persona);
        }

        self.cache
            .get(name)
            .ok_or_else(|| KindlingError::PersonaNotFound {
                name: name.to_string(),
                available: Vec::new(),
            })
    }

    /// Every persona name this loader can resolve, sorted and without duplicates.
    ///
    /// # Errors
    ///
    /// Returns [`KindlingError::Io`] if the persona directory exists but cannot be listed.
    pub fn list(&self) -> KindlingResult<Vec<String>> {
        let mut names: BTreeSet<String> = BUILTIN_PERSONAS
            .iter()
            .map(|(name, _)| name.to_string())
            .collect();

        if let Some(dir) = self.dir.as_deref().filter(|dir| dir.is_dir()) {
            let entries = fs::read_dir(dir).map_err(|source| KindlingError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            for entry in entries.flatten() {
                let path = entry.path();
                if has_persona_extension(&path) {
                    if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                        names.insert(stem.to_string());
                    }
                }
            }
        }

        Ok(names.into_iter().collect())
    }

    fn read(&self, name: &str) -> KindlingResult<Persona> {
        if let Some(path) = self.find_on_disk(name) {
            let text = fs::read_to_string(&path).map_err(|source| KindlingError::Io {
                path: path.clone(),
                source,
            })?;
            let is_json = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
            let parsed = if is_json {
                parse_json::<Persona>(&text, "Persona")
            } else {
                parse_yaml::<Persona>(&text, "Persona")
            };
            return finish(name, parsed);
        }

        if let Some((_, text)) = BUILTIN_PERSONAS.iter().find(|(builtin, _)| *builtin == name) {
            return finish(name, parse_yaml::<Persona>(text, "Persona"));
        }

        Err(KindlingError::PersonaNotFound {
            name: name.to_string(),
            available: self.list()?,
        })
    }

    fn find_on_disk(&self, name: &str) -> Option<PathBuf> {
        let dir = self.dir.as_deref()?;
        PERSONA_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{name}.{ext}")))
            .find(|path| path.is_file())
    }
}

fn has_persona_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            PERSONA_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

fn finish(name: &str, parsed: Result<Persona, String>) -> KindlingResult<Persona> {
    let mut persona = parsed.map_err(|message| KindlingError::PersonaParse {
        name: name.to_string(),
        message,
    })?;
    if persona.name.is_empty() {
        persona.name = name.to_string();
    }
    Ok(persona)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fhir::Gender;

    #[test]
    fn lists_builtins_sorted() {
        let loader = PersonaLoader::default();
        assert_eq!(
            loader.list().expect("list"),
            vec![
                "david_healthy",
                "john_asthma",
                "linda_hypertension",
                "mary_diabetes"
            ]
        );
    }

    #[test]
    fn every_builtin_parses() {
        let mut loader = PersonaLoader::default();
        for (name, _) in BUILTIN_PERSONAS {
            let persona = loader.load(name).expect("builtin persona parses");
            assert_eq!(persona.name, *name);
            assert!(!persona.resources.rules.is_empty());
        }
    }

    #[test]
    fn mary_is_a_female_jones_with_diabetes() {
        let mut loader = PersonaLoader::default();
        let mary = loader.load("mary_diabetes").expect("load");
        assert_eq!(mary.patient.gender, Some(Gender::Female));
        assert_eq!(mary.patient.name.family.as_deref(), Some("Jones"));
        let codes: Vec<_> = mary.resources.rules[0]
            .then
            .add_conditions
            .iter()
            .filter_map(|condition| condition.code.value.as_deref())
            .collect();
        assert_eq!(codes, vec!["44054006"]);
    }

    #[test]
    fn unknown_persona_lists_alternatives() {
        let mut loader = PersonaLoader::default();
        match loader.load("nonexistent") {
            Err(KindlingError::PersonaNotFound { name, available }) => {
                assert_eq!(name, "nonexistent");
                assert!(available.contains(&"mary_diabetes".to_string()));
            }
            other => panic!("expected PersonaNotFound, got {other:?}"),
        }
    }

    #[test]
    fn path_like_names_are_refused() {
        let mut loader = PersonaLoader::default();
        assert!(matches!(
            loader.load("../mary_diabetes"),
            Err(KindlingError::Configuration(_))
        ));
    }

    #[test]
    fn directory_personas_extend_and_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("mary_diabetes.yaml"),
            "patient:\n  name:\n    family: Override\n",
        )
        .expect("write");
        fs::write(
            dir.path().join("sam_copd.json"),
            r#"{"name": "sam_copd", "patient": {"gender": "male"}}"#,
        )
        .expect("write");
        fs::write(dir.path().join("notes.txt"), "ignored").expect("write");

        let mut loader = PersonaLoader::new(Some(dir.path().to_path_buf()));
        let names = loader.list().expect("list");
        assert!(names.contains(&"sam_copd".to_string()));
        assert!(!names.contains(&"notes".to_string()));
        assert_eq!(names.iter().filter(|n| *n == "mary_diabetes").count(), 1);

        let mary = loader.load("mary_diabetes").expect("load override");
        assert_eq!(mary.patient.name.family.as_deref(), Some("Override"));
        assert_eq!(mary.name, "mary_diabetes");

        let sam = loader.load("sam_copd").expect("load json");
        assert_eq!(sam.patient.gender, Some(Gender::Male));
    }

    #[test]
    fn bad_persona_file_reports_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("broken.yaml"),
            "patient:\n  gender: robot\n",
        )
        .expect("write");
        let mut loader = PersonaLoader::new(Some(dir.path().to_path_buf()));
        match loader.load("broken") {
            Err(KindlingError::PersonaParse { name, message }) => {
                assert_eq!(name, "broken");
                assert!(message.contains("patient.gender"), "{message}");
            }
            other => panic!("expected PersonaParse, got {other:?}"),
        }
    }

    #[test]
    fn loads_are_cached() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("temp.yaml");
        fs::write(&path, "description: first\n").expect("write");

        let mut loader = PersonaLoader::new(Some(dir.path().to_path_buf()));
        let first = loader.load("temp").expect("load").description.clone();
        fs::write(&path, "description: second\n").expect("rewrite");
        let second = loader.load("temp").expect("load").description.clone();
        assert_eq!(first, second);
        assert_eq!(second.as_deref(), Some("first"));
    }
}
