//! Demographic sampling for cohort subjects.
//!
//! Each cohort subject gets an age, a gender, and a name drawn from the profile's
//! demographics section, always in that order so a seed reproduces the same cohort.

use crate::constants::{FAMILY_NAMES, FEMALE_NAMES, MALE_NAMES};
use crate::definitions::{NameDef, PatientDefinition};
use crate::profile::Demographics;
use crate::rules::SubjectContext;
use crate::schedule::{days_before, out_of_range};
use crate::{KindlingError, KindlingResult};
use chrono::{DateTime, Utc};
use fhir::bundle::format_date;
use fhir::Gender;
use kindling_random::SeededRandom;

/// Draw one subject's demographics.
///
/// Returns the patient definition handed to the record factory and the context rules are
/// evaluated against.
///
/// # Errors
///
/// Returns [`KindlingError::Configuration`] if the gender distribution has unusable weights,
/// names a gender that is not `male`, `female`, `other` or `unknown`, or if the sampled age puts
/// the birth date outside the representable range.
pub fn sample(
    rng: &mut SeededRandom,
    demographics: &Demographics,
    now: DateTime<Utc>,
) -> KindlingResult<(PatientDefinition, SubjectContext)> {
    let age = rng.int_range(demographics.age.min, demographics.age.max);

    let gender = if demographics.gender.distribution.is_empty() {
        *rng.choose(&[Gender::Male, Gender::Female])
            .unwrap_or(&Gender::Unknown)
    } else {
        let weights: Vec<(&str, f64)> = demographics
            .gender
            .distribution
            .iter()
            .map(|(name, weight)| (name.as_str(), *weight))
            .collect();
        let picked = rng
            .weighted_choice(&weights)
            .map_err(|e| KindlingError::Configuration(format!("gender distribution: {e}")))?;
        picked
            .parse::<Gender>()
            .map_err(|e| KindlingError::Configuration(format!("gender distribution: {e}")))?
    };

    let given_pool = if gender == Gender::Female {
        FEMALE_NAMES
    } else {
        MALE_NAMES
    };
    let given = rng.choose(given_pool).map(|name| name.to_string());
    let family = rng.choose(FAMILY_NAMES).map(|name| name.to_string());

    let days = age
        .checked_mul(365)
        .ok_or_else(|| out_of_range("demographics.age", age))?;
    let birth_date = format_date(days_before(now, days, "demographics.age")?);

    let definition = PatientDefinition {
        name: NameDef {
            family,
            given: given.map(|name| vec![name]),
        },
        gender: Some(gender),
        birth_date: Some(birth_date),
        ..PatientDefinition::default()
    };

    Ok((
        definition,
        SubjectContext {
            age: Some(age),
            gender,
        },
    ))
}
