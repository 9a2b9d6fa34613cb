//! Generation runs.
//!
//! A [`Generator`] owns one read-only [`Profile`] and drives a run: one subject in single mode
//! or `count` sampled subjects in cohort mode, each followed by its rule-expanded records, then
//! bundle assembly over everything the run produced. Each call to [`Generator::generate`] starts
//! from a fresh random stream and a fresh identity map, so the same seed always yields the same
//! identifiers.

use crate::assembler::BundleAssembler;
use crate::config::{parse_container_type, GenerateOptions, GeneratorConfig};
use crate::demographics;
use crate::factory::RecordFactory;
use crate::filter::ResourceFilter;
use crate::identity::{reconcile, IdentityMap};
use crate::persona::PersonaLoader;
use crate::profile::{load_profile, Mode, Profile};
use crate::rules::{RuleEngine, Subject, SubjectContext};
use crate::{KindlingError, KindlingResult};
use fhir::{Bundle, Resource};
use kindling_random::SeededRandom;
use std::path::Path;

/// The result of a run: a single bundle when exactly one was produced.
#[derive(Clone, Debug, PartialEq)]
pub enum GenerateOutput {
    Single(Bundle),
    Many(Vec<Bundle>),
}

impl GenerateOutput {
    fn from_bundles(mut bundles: Vec<Bundle>) -> Self {
        if bundles.len() == 1 {
            if let Some(bundle) = bundles.pop() {
                return GenerateOutput::Single(bundle);
            }
        }
        GenerateOutput::Many(bundles)
    }

    pub fn bundles(&self) -> &[Bundle] {
        match self {
            GenerateOutput::Single(bundle) => std::slice::from_ref(bundle),
            GenerateOutput::Many(bundles) => bundles,
        }
    }

    pub fn into_bundles(self) -> Vec<Bundle> {
        match self {
            GenerateOutput::Single(bundle) => vec![bundle],
            GenerateOutput::Many(bundles) => bundles,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Generator {
    profile: Profile,
    config: GeneratorConfig,
    filter: Option<ResourceFilter>,
}

impl Generator {
    pub fn new(profile: Profile, config: GeneratorConfig) -> Self {
        Self {
            profile,
            config,
            filter: None,
        }
    }

    /// # Errors
    ///
    /// Returns the load error from [`load_profile`].
    pub fn from_profile_path(path: &Path, config: GeneratorConfig) -> KindlingResult<Self> {
        let profile = load_profile(path)?;
        Ok(Self::new(profile, config))
    }

    /// Build a single-mode generator from a persona, searching `config.persona_dir()` first.
    ///
    /// # Errors
    ///
    /// Returns the load error from [`PersonaLoader::load`].
    pub fn from_persona(name: &str, config: GeneratorConfig) -> KindlingResult<Self> {
        let mut loader = PersonaLoader::new(config.persona_dir().map(Path::to_path_buf));
        let profile = Profile::from_persona(loader.load(name)?);
        Ok(Self::new(profile, config))
    }

    /// Build a generator from exactly one of a profile path or a persona name.
    ///
    /// # Errors
    ///
    /// Returns [`KindlingError::Configuration`] if both or neither are given, otherwise the
    /// load error of whichever was selected.
    pub fn from_selection(
        profile: Option<&Path>,
        persona: Option<&str>,
        config: GeneratorConfig,
    ) -> KindlingResult<Self> {
        match (profile, persona) {
            (Some(path), None) => Self::from_profile_path(path, config),
            (None, Some(name)) => Self::from_persona(name, config),
            (Some(_), Some(_)) => Err(KindlingError::Configuration(
                "cannot specify both a profile and a persona".into(),
            )),
            (None, None) => Err(KindlingError::Configuration(
                "must specify either a profile or a persona".into(),
            )),
        }
    }

    /// Keep only these resource kinds in every subject's output.
    pub fn with_resource_filter(mut self, filter: ResourceFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Options taken from the profile's `output` section.
    ///
    /// # Errors
    ///
    /// Returns [`KindlingError::Configuration`] if the section names an unknown bundle type.
    pub fn default_options(&self) -> KindlingResult<GenerateOptions> {
        self.options_with_bundle_type(None)
    }

    /// Like [`Generator::default_options`], but an explicit `bundle_type` replaces the profile's
    /// `output.mode`, which is then never parsed.
    ///
    /// # Errors
    ///
    /// Returns [`KindlingError::Configuration`] if the bundle type in effect is unknown.
    pub fn options_with_bundle_type(
        &self,
        bundle_type: Option<&str>,
    ) -> KindlingResult<GenerateOptions> {
        let mode = bundle_type.unwrap_or(self.profile.output.mode.as_str());
        Ok(GenerateOptions {
            container_type: parse_container_type(mode)?,
            max_size: self.profile.output.bundle_size,
            ..GenerateOptions::default()
        })
    }

    /// Run the profile and assemble its bundles.
    ///
    /// Either every bundle is returned or nothing is: the first error ends the run.
    ///
    /// # Errors
    ///
    /// - [`KindlingError::Configuration`] for unusable options or demographic weights,
    /// - [`KindlingError::Schema`] if a record cannot be constructed.
    pub fn generate(&self, options: &GenerateOptions) -> KindlingResult<GenerateOutput> {
        options.validate()?;

        let mut rng = SeededRandom::new(self.config.seed());
        let mut map = IdentityMap::new(options.transport_mode);
        let factory = RecordFactory::new(self.config.now());
        let engine = RuleEngine::new(factory);

        let subjects = match self.profile.mode {
            Mode::Single => 1,
            Mode::Cohort => options.count,
        };

        tracing::info!(
            mode = ?self.profile.mode,
            subjects,
            seed = rng.seed(),
            transport_mode = %options.transport_mode,
            bundle_type = %options.container_type,
            "starting generation run"
        );

        let mut records = Vec::new();
        for index in 0..subjects {
            let subject_records = match self.profile.mode {
                Mode::Single => self.single_subject(&mut rng, &mut map, factory, engine)?,
                Mode::Cohort => self.cohort_subject(&mut rng, &mut map, factory, engine)?,
            };
            tracing::debug!(subject = index, records = subject_records.len(), "subject generated");
            records.extend(subject_records);
        }

        let rewritten = reconcile(&mut records, &map);
        if rewritten > 0 {
            tracing::debug!(rewritten, "reconciled durable references");
        }

        let assembler = BundleAssembler::new(
            options.container_type,
            options.transport_mode,
            options.max_size,
            self.config.now(),
        )?;
        let record_count = records.len();
        let bundles = assembler.assemble(records, &map, &mut rng)?;

        tracing::info!(
            records = record_count,
            bundles = bundles.len(),
            "generation run complete"
        );
        Ok(GenerateOutput::from_bundles(bundles))
    }

    fn single_subject(
        &self,
        rng: &mut SeededRandom,
        map: &mut IdentityMap,
        factory: RecordFactory,
        engine: RuleEngine,
    ) -> KindlingResult<Vec<Resource>> {
        let patient_id = map.assign(rng)?;
        let patient = factory.patient(rng, &self.profile.single_patient, Some(patient_id))?;
        self.expand_subject(rng, map, engine, patient, None)
    }

    fn cohort_subject(
        &self,
        rng: &mut SeededRandom,
        map: &mut IdentityMap,
        factory: RecordFactory,
        engine: RuleEngine,
    ) -> KindlingResult<Vec<Resource>> {
        let (definition, context) =
            demographics::sample(rng, &self.profile.demographics, self.config.now())?;
        let patient_id = map.assign(rng)?;
        let patient = factory.patient(rng, &definition, Some(patient_id))?;
        self.expand_subject(rng, map, engine, patient, Some(context))
    }

    fn expand_subject(
        &self,
        rng: &mut SeededRandom,
        map: &mut IdentityMap,
        engine: RuleEngine,
        patient: Resource,
        context: Option<SubjectContext>,
    ) -> KindlingResult<Vec<Resource>> {
        let subject = Subject::from_patient(&patient, map, context)?;
        let mut records = vec![patient];

        for rule in self.profile.rules() {
            if let Some(expanded) = engine.evaluate_and_expand(rng, map, rule, &subject)? {
                records.extend(expanded);
            }
        }

        Ok(match &self.filter {
            Some(filter) => filter.apply(records, map),
            None => records,
        })
    }
}
