//! Rule engine.
//!
//! A rule pairs a parsed [`RuleCondition`] with a set of action lists. When the condition holds
//! for a subject, every action is expanded into records through the [`RecordFactory`], each
//! record minted through the run's [`IdentityMap`] so references between them are already in
//! transport form.
//!
//! Responsibilities:
//! - evaluating conditions against a subject's sampled context
//! - expanding each action category, including repeated doses and visits
//! - the symmetric related-person protocol
//! - building a diagnostic report after the observations it cites

use crate::constants::{DOSE_SPACING_DAYS, ENCOUNTER_SPREAD_MONTHS, RELATED_PERSON_PATIENT_SYSTEM};
use crate::definitions::{
    CodeDef, Coded, DiagnosticReportDef, EncounterDef, IdentifierDef, ImmunizationDef, NameDef,
    PatientDefinition, RelatedPersonDef,
};
use crate::factory::{relationship_code, RecordFactory};
use crate::identity::IdentityMap;
use crate::profile::{Comparison, ContextField, Rule, RuleCondition};
use crate::schedule::{out_of_range, Schedule};
use crate::{KindlingError, KindlingResult};
use fhir::datatypes::HumanName;
use fhir::{Gender, Resource, ResourceId, ResourceKind};
use kindling_random::SeededRandom;

/// What rule conditions are evaluated against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubjectContext {
    pub age: Option<i64>,
    pub gender: Gender,
}

impl SubjectContext {
    fn field(&self, field: ContextField) -> i64 {
        match field {
            ContextField::Age => self.age.unwrap_or(0),
        }
    }
}

impl RuleCondition {
    /// Whether this condition fires for `context`.
    ///
    /// Unrecognised expressions never fire.
    pub fn matches(&self, context: &SubjectContext) -> bool {
        match self {
            RuleCondition::Always => true,
            RuleCondition::Compare {
                field,
                op: Comparison::GreaterThan,
                value,
            } => context.field(*field) > *value,
            RuleCondition::Unrecognised(_) => false,
        }
    }
}

/// The subject a rule expands around.
#[derive(Clone, Debug)]
pub struct Subject {
    pub id: ResourceId,
    /// How records refer to this subject (`urn:uuid:` or `Patient/` form).
    pub reference: String,
    pub name: Option<HumanName>,
    pub gender: Option<Gender>,
    pub birth_date: Option<String>,
    /// `None` in single mode, where every rule fires.
    pub context: Option<SubjectContext>,
}

impl Subject {
    /// Describe a freshly built Patient record as a rule subject.
    ///
    /// # Errors
    ///
    /// Returns [`KindlingError::Configuration`] if `record` is not a Patient with an id.
    pub fn from_patient(
        record: &Resource,
        map: &IdentityMap,
        context: Option<SubjectContext>,
    ) -> KindlingResult<Self> {
        let Resource::Patient(patient) = record else {
            return Err(KindlingError::Configuration(format!(
                "rule subject must be a Patient, got {}",
                record.kind()
            )));
        };
        let id = patient.id.ok_or_else(|| {
            KindlingError::Configuration("rule subject has no durable id".into())
        })?;
        Ok(Self {
            id,
            reference: map.reference_for(ResourceKind::Patient, &id),
            name: patient.name.first().cloned(),
            gender: patient.gender,
            birth_date: patient.birth_date.clone(),
            context,
        })
    }
}

/// Expands rules into records for one subject at a time.
#[derive(Clone, Copy, Debug)]
pub struct RuleEngine {
    factory: RecordFactory,
}

impl RuleEngine {
    pub fn new(factory: RecordFactory) -> Self {
        Self { factory }
    }

    /// Evaluate `rule` for `subject` and, if it fires, build every record it asks for.
    ///
    /// Returns `Ok(None)` when the rule is skipped. Any construction error aborts the whole
    /// expansion; no partial record list is returned.
    pub fn evaluate_and_expand(
        &self,
        rng: &mut SeededRandom,
        map: &mut IdentityMap,
        rule: &Rule,
        subject: &Subject,
    ) -> KindlingResult<Option<Vec<Resource>>> {
        if let Some(context) = &subject.context {
            if let RuleCondition::Unrecognised(expression) = &rule.when.condition {
                tracing::warn!(
                    rule = %rule.label(),
                    expression = %expression,
                    "unrecognised rule condition, skipping"
                );
                return Ok(None);
            }
            if !rule.when.condition.matches(context) {
                tracing::debug!(rule = %rule.label(), subject = %subject.id, "rule skipped");
                return Ok(None);
            }
        }

        let records = self.expand(rng, map, rule, subject)?;
        tracing::debug!(
            rule = %rule.label(),
            subject = %subject.id,
            records = records.len(),
            "rule fired"
        );
        Ok(Some(records))
    }

    fn expand(
        &self,
        rng: &mut SeededRandom,
        map: &mut IdentityMap,
        rule: &Rule,
        subject: &Subject,
    ) -> KindlingResult<Vec<Resource>> {
        let actions = &rule.then;
        let reference = subject.reference.as_str();
        let mut records = Vec::new();

        for def in &actions.add_conditions {
            let id = map.assign(rng)?;
            records.push(self.factory.condition(rng, reference, def, Some(id))?);
        }

        for def in &actions.add_observations {
            let schedule = Schedule::from_spec(def.times.as_ref());
            for when in schedule.time_points(rng, self.factory.now())? {
                let id = map.assign(rng)?;
                records.push(
                    self.factory
                        .observation(rng, reference, def, Some(when), Some(id))?,
                );
            }
        }

        for def in &actions.meds {
            let id = map.assign(rng)?;
            records.push(self.factory.medication_request(rng, reference, def, Some(id))?);
        }

        for def in &actions.related_persons {
            records.extend(self.related_pair(rng, map, subject, def)?);
        }

        for def in &actions.diagnostic_reports {
            records.extend(self.report_with_observations(rng, map, reference, def)?);
        }

        for def in &actions.immunizations {
            for dose in immunization_doses(def)? {
                let id = map.assign(rng)?;
                records.push(self.factory.immunization(rng, reference, &dose, Some(id))?);
            }
        }

        for def in &actions.coverage {
            let id = map.assign(rng)?;
            records.push(self.factory.coverage(rng, reference, def, Some(id))?);
        }

        for def in &actions.encounters {
            for visit in encounter_visits(def)? {
                let id = map.assign(rng)?;
                records.push(self.factory.encounter(rng, reference, &visit, Some(id))?);
            }
        }

        Ok(records)
    }

    /// A new Patient for the related person plus one RelatedPerson in each direction.
    ///
    /// The first RelatedPerson hangs off the original subject with the stated relationship and
    /// carries the new Patient's durable id. The second hangs off the new Patient with the
    /// inverse relationship and describes the original subject.
    fn related_pair(
        &self,
        rng: &mut SeededRandom,
        map: &mut IdentityMap,
        subject: &Subject,
        def: &RelatedPersonDef,
    ) -> KindlingResult<Vec<Resource>> {
        let person_id = map.assign(rng)?;
        let person_def = PatientDefinition {
            name: def.name.clone(),
            gender: Some(def.gender.unwrap_or_default()),
            birth_date: def.birth_date.clone(),
            identifiers: def.identifiers.clone(),
            phone: def.phone.clone(),
            email: def.email.clone(),
            ..PatientDefinition::default()
        };
        let person = self.factory.patient(rng, &person_def, Some(person_id))?;

        let forward_id = map.assign(rng)?;
        let forward_def = RelatedPersonDef {
            name: def.name.clone(),
            relationship: def.relationship.clone(),
            active: Some(def.active.unwrap_or(true)),
            gender: def.gender,
            birth_date: def.birth_date.clone(),
            identifiers: vec![cross_link(&person_id)],
            ..RelatedPersonDef::default()
        };
        let forward =
            self.factory
                .related_person(rng, &subject.reference, &forward_def, Some(forward_id))?;

        let inverse_id = map.assign(rng)?;
        let inverse_def = RelatedPersonDef {
            name: subject
                .name
                .as_ref()
                .map(|name| NameDef {
                    family: name.family.clone(),
                    given: Some(name.given.clone()),
                })
                .unwrap_or_default(),
            relationship: def.relationship.as_ref().map(inverse_relationship),
            active: Some(true),
            gender: subject.gender,
            birth_date: subject.birth_date.clone(),
            identifiers: vec![cross_link(&subject.id)],
            ..RelatedPersonDef::default()
        };
        let person_reference = map.reference_for(ResourceKind::Patient, &person_id);
        let inverse =
            self.factory
                .related_person(rng, &person_reference, &inverse_def, Some(inverse_id))?;

        Ok(vec![person, forward, inverse])
    }

    fn report_with_observations(
        &self,
        rng: &mut SeededRandom,
        map: &mut IdentityMap,
        reference: &str,
        def: &DiagnosticReportDef,
    ) -> KindlingResult<Vec<Resource>> {
        let mut records = Vec::new();
        let mut results = Vec::new();

        for observation in &def.observations {
            let schedule = Schedule::from_spec(observation.times.as_ref());
            for when in schedule.time_points(rng, self.factory.now())? {
                let id = map.assign(rng)?;
                records.push(self.factory.observation(
                    rng,
                    reference,
                    observation,
                    Some(when),
                    Some(id),
                )?);
                results.push(map.reference_for(ResourceKind::Observation, &id));
            }
        }

        let id = map.assign(rng)?;
        records.push(
            self.factory
                .diagnostic_report(rng, reference, def, results, Some(id))?,
        );
        Ok(records)
    }
}

fn cross_link(patient: &ResourceId) -> IdentifierDef {
    IdentifierDef {
        system: Some(RELATED_PERSON_PATIENT_SYSTEM.to_string()),
        value: Some(patient.to_string()),
        use_: Some("official".to_string()),
    }
}

/// The relationship as seen from the other side.
///
/// Free text maps through the inverse table; a coded relationship is mapped by its RoleCode.
/// Anything unknown is its own inverse.
pub fn inverse_relationship(relationship: &Coded) -> Coded {
    match relationship {
        Coded::Plain(text) => {
            let lower = text.to_ascii_lowercase();
            Coded::Plain(inverse_name(&lower).unwrap_or(lower.as_str()).to_string())
        }
        Coded::Full(code) => {
            let name = code.value.as_deref().and_then(name_for_code);
            match name.and_then(inverse_name) {
                Some(inverse) => {
                    let (value, display) = relationship_code(inverse);
                    Coded::Full(CodeDef {
                        system: code.system.clone(),
                        value: Some(value),
                        display: Some(display),
                    })
                }
                None => Coded::Full(code.clone()),
            }
        }
    }
}

fn inverse_name(relationship: &str) -> Option<&'static str> {
    match relationship {
        "parent" => Some("child"),
        "child" => Some("parent"),
        "spouse" => Some("spouse"),
        "sibling" => Some("sibling"),
        "guardian" => Some("child"),
        "emergency" => Some("emergency"),
        _ => None,
    }
}

fn name_for_code(code: &str) -> Option<&'static str> {
    ["parent", "child", "spouse", "sibling", "guardian", "emergency"]
        .into_iter()
        .find(|name| relationship_code(name).0 == code)
}

/// Expand a repeated immunization into one definition per dose.
///
/// With an anchor, dose `i` lands `i * 30` days more recently and is numbered `i + 1`.
pub fn immunization_doses(def: &ImmunizationDef) -> KindlingResult<Vec<ImmunizationDef>> {
    let qty = def.qty.unwrap_or(1).max(1);
    let Some(anchor) = def.days_ago.filter(|_| qty > 1) else {
        return Ok(vec![def.clone(); qty as usize]);
    };
    (0..qty)
        .map(|i| -> KindlingResult<ImmunizationDef> {
            let days_ago = anchor
                .checked_sub(i64::from(i) * DOSE_SPACING_DAYS)
                .ok_or_else(|| out_of_range("Immunization.days_ago", anchor))?;
            Ok(ImmunizationDef {
                days_ago: Some(days_ago),
                dose_number: Some(i + 1),
                ..def.clone()
            })
        })
        .collect()
}

/// Expand a repeated encounter into one definition per visit, spread over `spread_months`.
pub fn encounter_visits(def: &EncounterDef) -> KindlingResult<Vec<EncounterDef>> {
    let qty = def.qty.unwrap_or(1).max(1);
    let spread_months = def.spread_months.unwrap_or(ENCOUNTER_SPREAD_MONTHS);
    if qty == 1 || spread_months <= 0 {
        return Ok(vec![def.clone(); qty as usize]);
    }

    let days_between = spread_months
        .checked_mul(30)
        .ok_or_else(|| out_of_range("Encounter.spread_months", spread_months))?
        / i64::from(qty);
    let base = def.days_ago.unwrap_or(0);
    (0..qty)
        .map(|i| -> KindlingResult<EncounterDef> {
            let days_ago = i64::from(i)
                .checked_mul(days_between)
                .and_then(|shift| base.checked_add(shift))
                .ok_or_else(|| out_of_range("Encounter.days_ago", base))?;
            Ok(EncounterDef {
                days_ago: Some(days_ago),
                ..def.clone()
            })
        })
        .collect()
}
