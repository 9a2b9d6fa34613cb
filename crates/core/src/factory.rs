//! Record factory.
//!
//! One construction operation per resource kind. Each takes the subject reference string the
//! record hangs off, a declarative definition, and an optional pre-assigned id; anything the
//! definition leaves out is defaulted. Every record leaves through [`fhir::schema::construct`],
//! so a definition with no usable code fails here with a [`KindlingError::Schema`] instead of
//! reaching a bundle.
//!
//! Random draws happen only where a default actually needs one, in field order, so the same
//! definition and seed always produce the same record.

use crate::constants::*;
use crate::definitions::{
    CodeDef, Coded, ConditionDef, CoverageDef, DiagnosticReportDef, EncounterDef, IdentifierDef,
    ImmunizationDef, MedicationDef, ObservationDef, PatientDefinition, RelatedPersonDef,
};
use crate::schedule::{days_after, days_before, out_of_range};
use crate::KindlingResult;
use chrono::{DateTime, Duration, Utc};
use fhir::bundle::{format_date, format_instant};
use fhir::datatypes::{
    Address, Annotation, CodeableConcept, CodeableReference, Coding, ContactPoint, Dosage,
    HumanName, Identifier, Period, Quantity, Reference, Timing, TimingRepeat,
};
use fhir::resources::{
    CoveragePaymentBy, DispenseRequest, EncounterReason, Participant,
};
use fhir::{
    schema, Condition, Coverage, DiagnosticReport, Encounter, Immunization,
    MedicationRequest, Observation, ObservationValue, Patient, RelatedPerson, Resource,
    ResourceId,
};
use kindling_random::SeededRandom;
use serde_json::Value;

/// Builds records of every supported kind, relative to a fixed "now".
#[derive(Clone, Copy, Debug)]
pub struct RecordFactory {
    now: DateTime<Utc>,
}

impl RecordFactory {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    fn days_ago(&self, field: &str, days: i64) -> KindlingResult<DateTime<Utc>> {
        days_before(self.now, days, field)
    }

    pub fn patient(
        &self,
        rng: &mut SeededRandom,
        def: &PatientDefinition,
        id: Option<ResourceId>,
    ) -> KindlingResult<Resource> {
        let id = id.unwrap_or_else(|| rng.resource_id());

        let mut identifier: Vec<Identifier> = def.identifiers.iter().map(identifier_from).collect();
        if identifier.is_empty() {
            let mrn = format!("MRN-{}", rng.resource_id().short());
            identifier.push(Identifier::new(MRN_SYSTEM, mrn));
        }

        let address = match &def.address {
            Some(address) => Address {
                line: address.line.clone(),
                city: address.city.clone(),
                state: address.state.clone(),
                postal_code: address.postal_code.clone(),
                country: Some(
                    address
                        .country
                        .clone()
                        .unwrap_or_else(|| DEFAULT_ADDRESS_COUNTRY.to_string()),
                ),
            },
            None => default_address(),
        };

        let mut telecom: Vec<ContactPoint> = def
            .telecom
            .iter()
            .map(|entry| ContactPoint {
                system: entry.system.clone(),
                value: entry.value.clone(),
                use_: entry.use_.clone(),
            })
            .collect();
        telecom.extend(contact_shorthand(def.phone.as_deref(), def.email.as_deref()));
        if telecom.is_empty() {
            telecom = DEFAULT_TELECOM
                .iter()
                .map(|(system, value, use_)| contact(system, value, use_))
                .collect();
        }

        let patient = Patient {
            id: Some(id),
            identifier,
            name: vec![human_name(def.name.family.as_deref(), def.name.given.as_deref())],
            gender: Some(def.gender.unwrap_or_default()),
            birth_date: def.birth_date.clone(),
            address: vec![address],
            telecom,
        };

        Ok(schema::construct(patient)?)
    }

    pub fn condition(
        &self,
        rng: &mut SeededRandom,
        subject: &str,
        def: &ConditionDef,
        id: Option<ResourceId>,
    ) -> KindlingResult<Resource> {
        let id = id.unwrap_or_else(|| rng.resource_id());

        let years_ago = def.onset.years_ago.filter(|years| *years != 0.0).unwrap_or(1.0);
        let seconds = (years_ago * 365.0 * 86_400.0) as i64;
        let onset = Duration::try_seconds(seconds)
            .and_then(|delta| self.now.checked_sub_signed(delta))
            .ok_or_else(|| out_of_range("Condition.onset.years_ago", years_ago))?;

        let condition = Condition {
            id: Some(id),
            clinical_status: Some(status_concept(
                CONDITION_CLINICAL_SYSTEM,
                CONDITION_CLINICAL_STATUS,
            )),
            verification_status: Some(status_concept(
                CONDITION_VER_STATUS_SYSTEM,
                CONDITION_VERIFICATION_STATUS,
            )),
            code: concept_from(&def.code, SNOMED_SYSTEM),
            subject: Reference::new(subject),
            onset_date_time: Some(format_date(onset)),
        };

        Ok(schema::construct(condition)?)
    }

    /// `effective` comes from a time-point schedule; without one the observation lands 1 to 30
    /// days ago.
    pub fn observation(
        &self,
        rng: &mut SeededRandom,
        subject: &str,
        def: &ObservationDef,
        effective: Option<DateTime<Utc>>,
        id: Option<ResourceId>,
    ) -> KindlingResult<Resource> {
        let id = id.unwrap_or_else(|| rng.resource_id());

        let code = CodeableConcept::from_coding(Coding {
            system: Some(LOINC_SYSTEM.to_string()),
            code: def.loinc.clone(),
            display: Some(def.display.clone().unwrap_or_default()),
        });

        let effective = match effective {
            Some(at) => at,
            None => {
                let days = rng.int_range(1, 30);
                self.days_ago("Observation.effective", days)?
            }
        };

        let value_type = def
            .value_type
            .as_deref()
            .unwrap_or("quantity")
            .to_ascii_lowercase();

        let value = match value_type.as_str() {
            "boolean" | "flag" => ObservationValue::Boolean(def.positive.unwrap_or(true)),
            "string" | "text" => ObservationValue::String(match &def.value {
                Some(value) => value_text(value),
                None => def.display.clone().unwrap_or_default(),
            }),
            "integer" | "int" => {
                let explicit = def.value.as_ref().and_then(value_as_i64);
                let integer = match explicit {
                    Some(integer) => integer,
                    None => sample_range(rng, def) as i64,
                };
                ObservationValue::Integer(integer)
            }
            "codeableconcept" | "coded" | "code" => match &def.value {
                Some(Value::Object(map)) => {
                    let field = |key: &str| map.get(key).and_then(Value::as_str).map(str::to_string);
                    ObservationValue::CodeableConcept(CodeableConcept::from_coding(Coding {
                        system: Some(field("system").unwrap_or_else(|| LOINC_SYSTEM.to_string())),
                        code: field("code").or_else(|| field("value")),
                        display: field("display"),
                    }))
                }
                Some(other) => ObservationValue::String(value_text(other)),
                None => ObservationValue::String(String::new()),
            },
            other => {
                if other != "quantity" {
                    tracing::warn!(
                        value_type = other,
                        loinc = def.loinc.as_deref().unwrap_or(""),
                        "unknown observation value_type, using quantity"
                    );
                }
                ObservationValue::Quantity(self.quantity(rng, def))
            }
        };

        let observation = Observation {
            id: Some(id),
            status: def
                .status
                .clone()
                .unwrap_or_else(|| OBSERVATION_STATUS.to_string()),
            code,
            subject: Reference::new(subject),
            effective_date_time: Some(format_instant(effective)),
            value,
            reference_range: def.reference_range.iter().cloned().collect(),
        };

        Ok(schema::construct(observation)?)
    }

    fn quantity(&self, rng: &mut SeededRandom, def: &ObservationDef) -> Quantity {
        let value = match def.value.as_ref().and_then(Value::as_f64) {
            Some(value) => value,
            None => sample_range(rng, def),
        };
        let unit = def
            .unit
            .clone()
            .filter(|unit| !unit.is_empty())
            .unwrap_or_else(|| "1".to_string());

        match &def.value_quantity {
            Some(overrides) => Quantity {
                value: Some(overrides.value.unwrap_or(value)),
                unit: Some(overrides.unit.clone().unwrap_or_else(|| unit.clone())),
                system: Some(
                    overrides
                        .system
                        .clone()
                        .unwrap_or_else(|| UCUM_SYSTEM.to_string()),
                ),
                code: Some(
                    overrides
                        .code
                        .clone()
                        .or_else(|| overrides.unit.clone())
                        .unwrap_or(unit),
                ),
            },
            None => Quantity {
                value: Some(value),
                unit: Some(unit.clone()),
                system: Some(UCUM_SYSTEM.to_string()),
                code: Some(unit),
            },
        }
    }

    pub fn medication_request(
        &self,
        rng: &mut SeededRandom,
        subject: &str,
        def: &MedicationDef,
        id: Option<ResourceId>,
    ) -> KindlingResult<Resource> {
        let id = id.unwrap_or_else(|| rng.resource_id());

        let frequency = def.frequency.unwrap_or(1.0);
        let frequency = if frequency < 1.0 { 1 } else { frequency as u32 };

        let status = match (&def.status, def.completed_days_ago) {
            (Some(status), _) => status.clone(),
            (None, Some(_)) => "completed".to_string(),
            (None, None) => MEDICATION_REQUEST_STATUS.to_string(),
        };

        let start = match (def.start_days_ago, def.completed_days_ago, def.duration_days) {
            (Some(start), _, _) => self.days_ago("MedicationRequest.start_days_ago", start)?,
            (None, Some(completed), Some(duration)) => {
                let days = completed.checked_add(duration).ok_or_else(|| {
                    out_of_range(
                        "MedicationRequest.completed_days_ago + duration_days",
                        format!("{completed} + {duration}"),
                    )
                })?;
                self.days_ago("MedicationRequest.completed_days_ago + duration_days", days)?
            }
            _ => self.now,
        };
        let end = match (def.completed_days_ago, def.duration_days) {
            (Some(completed), _) => {
                Some(self.days_ago("MedicationRequest.completed_days_ago", completed)?)
            }
            (None, Some(duration)) => {
                Some(days_after(start, duration, "MedicationRequest.duration_days")?)
            }
            (None, None) => None,
        };
        let bounds = Period {
            start: Some(format_instant(start)),
            end: end.map(format_instant),
        };

        let dosage = Dosage {
            text: Some(def.sig.clone().unwrap_or_else(|| MEDICATION_SIG.to_string())),
            timing: Some(Timing {
                repeat: Some(TimingRepeat {
                    frequency: Some(frequency),
                    period: Some(1.0),
                    period_unit: Some("d".to_string()),
                    bounds_period: Some(bounds.clone()),
                }),
            }),
            patient_instruction: def.instructions.clone(),
        };

        let reason_code = match &def.reason {
            Some(Coded::Full(code)) => vec![concept_from(code, SNOMED_SYSTEM)],
            Some(Coded::Plain(text)) => vec![CodeableConcept::from_text(text.clone())],
            None => Vec::new(),
        };

        let mut note = Vec::new();
        if let Some(prob) = def.adherence.as_ref().and_then(|adherence| adherence.prob) {
            note.push(Annotation {
                text: format!("Estimated adherence probability: {prob}"),
            });
        }
        if let Some(notes) = &def.notes {
            note.extend(notes.to_vec().into_iter().map(|text| Annotation { text }));
        }

        let medication = MedicationRequest {
            id: Some(id),
            status,
            intent: def
                .intent
                .clone()
                .unwrap_or_else(|| MEDICATION_REQUEST_INTENT.to_string()),
            medication: CodeableReference {
                concept: Some(CodeableConcept::from_coding(Coding {
                    system: Some(RXNORM_SYSTEM.to_string()),
                    code: def.rxnorm.clone(),
                    display: Some(def.display.clone().unwrap_or_default()),
                })),
                reference: None,
            },
            subject: Reference::new(subject),
            authored_on: Some(format_instant(start)),
            dosage_instruction: vec![dosage],
            priority: def.priority.clone(),
            reason_code,
            note,
            dispense_request: Some(DispenseRequest {
                validity_period: Some(bounds),
                expected_supply_duration: def.duration_days.map(|days| Quantity {
                    value: Some(days as f64),
                    unit: Some("day".to_string()),
                    system: Some(UCUM_SYSTEM.to_string()),
                    code: Some("d".to_string()),
                }),
            }),
        };

        Ok(schema::construct(medication)?)
    }

    pub fn encounter(
        &self,
        rng: &mut SeededRandom,
        subject: &str,
        def: &EncounterDef,
        id: Option<ResourceId>,
    ) -> KindlingResult<Resource> {
        let id = id.unwrap_or_else(|| rng.resource_id());

        let class = match &def.class {
            Some(Coded::Full(code)) => Coding {
                system: Some(
                    code.system
                        .clone()
                        .unwrap_or_else(|| V3_ACT_CODE_SYSTEM.to_string()),
                ),
                code: Some(code.value.clone().unwrap_or_else(|| ENCOUNTER_CLASS.to_string())),
                display: code.display.clone(),
            },
            Some(Coded::Plain(code)) if !code.is_empty() => Coding {
                system: Some(
                    def.class_system
                        .clone()
                        .unwrap_or_else(|| V3_ACT_CODE_SYSTEM.to_string()),
                ),
                code: Some(code.clone()),
                display: Some(
                    def.class_display
                        .clone()
                        .unwrap_or_else(|| ENCOUNTER_CLASS_DISPLAY.to_string()),
                ),
            },
            _ => Coding::new(
                V3_ACT_CODE_SYSTEM,
                ENCOUNTER_CLASS,
                Some(ENCOUNTER_CLASS_DISPLAY.to_string()),
            ),
        };

        let type_ = match &def.type_ {
            Some(code) => concept_from(code, SNOMED_SYSTEM),
            None => CodeableConcept::from_coding(Coding::new(
                SNOMED_SYSTEM,
                ENCOUNTER_TYPE_CODE,
                Some(ENCOUNTER_TYPE_DISPLAY.to_string()),
            )),
        };

        let days_ago = match def.days_ago {
            Some(days) => days,
            None => rng.int_range(1, 90),
        };
        let start = self.days_ago("Encounter.days_ago", days_ago)?;
        let hours = def.duration_hours.unwrap_or(ENCOUNTER_DURATION_HOURS);
        let end = Duration::try_seconds((hours * 3_600.0).round() as i64)
            .and_then(|length| start.checked_add_signed(length))
            .ok_or_else(|| out_of_range("Encounter.duration_hours", hours))?;

        let reason = match &def.reason {
            Some(Coded::Plain(text)) => vec![EncounterReason {
                use_: vec![CodeableConcept::from_text(text.clone())],
            }],
            Some(Coded::Full(code)) => vec![EncounterReason {
                use_: vec![concept_from(code, SNOMED_SYSTEM)],
            }],
            None => Vec::new(),
        };

        let encounter = Encounter {
            id: Some(id),
            status: def
                .status
                .clone()
                .unwrap_or_else(|| ENCOUNTER_STATUS.to_string()),
            class_: vec![CodeableConcept::from_coding(class)],
            type_: vec![type_],
            subject: Reference::new(subject),
            actual_period: Some(Period {
                start: Some(format_instant(start)),
                end: Some(format_instant(end)),
            }),
            reason,
            participant: def
                .performer
                .iter()
                .map(|actor| Participant {
                    actor: Reference::new(actor.clone()),
                })
                .collect(),
            service_provider: def.service_provider.clone().map(Reference::new),
        };

        Ok(schema::construct(encounter)?)
    }

    /// `subject` is the Patient this person is functionally tied to.
    pub fn related_person(
        &self,
        rng: &mut SeededRandom,
        subject: &str,
        def: &RelatedPersonDef,
        id: Option<ResourceId>,
    ) -> KindlingResult<Resource> {
        let id = id.unwrap_or_else(|| rng.resource_id());

        let relationship = match &def.relationship {
            Some(Coded::Plain(text)) => {
                let (code, display) = relationship_code(text);
                Coding::new(V3_ROLE_CODE_SYSTEM, code, Some(display))
            }
            Some(Coded::Full(code)) => Coding {
                system: Some(
                    code.system
                        .clone()
                        .unwrap_or_else(|| V3_ROLE_CODE_SYSTEM.to_string()),
                ),
                code: code.value.clone(),
                display: code.display.clone(),
            },
            None => Coding {
                system: Some(V3_ROLE_CODE_SYSTEM.to_string()),
                code: None,
                display: None,
            },
        };

        let identifier = def
            .identifiers
            .iter()
            .map(|ident| Identifier {
                use_: Some(ident.use_.clone().unwrap_or_else(|| "official".to_string())),
                system: ident.system.clone(),
                value: ident.value.clone(),
            })
            .collect();

        let related = RelatedPerson {
            id: Some(id),
            identifier,
            active: Some(def.active.unwrap_or(true)),
            patient: Reference::new(subject),
            relationship: vec![CodeableConcept::from_coding(relationship)],
            name: vec![human_name(def.name.family.as_deref(), def.name.given.as_deref())],
            gender: def.gender,
            birth_date: def.birth_date.clone(),
            telecom: contact_shorthand(def.phone.as_deref(), def.email.as_deref()),
        };

        Ok(schema::construct(related)?)
    }

    /// `results` are the references of the observations built for this report.
    pub fn diagnostic_report(
        &self,
        rng: &mut SeededRandom,
        subject: &str,
        def: &DiagnosticReportDef,
        results: Vec<String>,
        id: Option<ResourceId>,
    ) -> KindlingResult<Resource> {
        let id = id.unwrap_or_else(|| rng.resource_id());

        let category = match &def.category {
            Some(code) => Coding {
                system: Some(code.system.clone().unwrap_or_else(|| V2_0074_SYSTEM.to_string())),
                code: Some(
                    code.value
                        .clone()
                        .unwrap_or_else(|| DIAGNOSTIC_REPORT_CATEGORY.to_string()),
                ),
                display: Some(
                    code.display
                        .clone()
                        .unwrap_or_else(|| DIAGNOSTIC_REPORT_CATEGORY_DISPLAY.to_string()),
                ),
            },
            None => Coding::new(
                V2_0074_SYSTEM,
                DIAGNOSTIC_REPORT_CATEGORY,
                Some(DIAGNOSTIC_REPORT_CATEGORY_DISPLAY.to_string()),
            ),
        };

        let days_ago = match def.days_ago {
            Some(days) => days,
            None => rng.int_range(1, 30),
        };
        let issued = format_instant(self.days_ago("DiagnosticReport.days_ago", days_ago)?);

        let report = DiagnosticReport {
            id: Some(id),
            status: def
                .status
                .clone()
                .unwrap_or_else(|| DIAGNOSTIC_REPORT_STATUS.to_string()),
            category: vec![CodeableConcept::from_coding(category)],
            code: concept_from(&def.code, LOINC_SYSTEM),
            subject: Reference::new(subject),
            effective_date_time: Some(
                def.effective_date_time
                    .clone()
                    .unwrap_or_else(|| issued.clone()),
            ),
            issued: Some(issued),
            result: results.into_iter().map(Reference::new).collect(),
            conclusion: def.conclusion.clone(),
            performer: def.performer.iter().cloned().map(Reference::new).collect(),
        };

        Ok(schema::construct(report)?)
    }

    pub fn immunization(
        &self,
        rng: &mut SeededRandom,
        subject: &str,
        def: &ImmunizationDef,
        id: Option<ResourceId>,
    ) -> KindlingResult<Resource> {
        let id = id.unwrap_or_else(|| rng.resource_id());

        let days_ago = match def.days_ago {
            Some(days) => days,
            None => rng.int_range(30, 365),
        };

        let occurred = self.days_ago("Immunization.days_ago", days_ago)?;

        let immunization = Immunization {
            id: Some(id),
            status: def
                .status
                .clone()
                .unwrap_or_else(|| IMMUNIZATION_STATUS.to_string()),
            vaccine_code: concept_from(&def.vaccine, CVX_SYSTEM),
            patient: Reference::new(subject),
            occurrence_date_time: Some(format_instant(occurred)),
            dose_quantity: def.dose_number.filter(|dose| *dose > 0).map(|dose| Quantity {
                value: Some(f64::from(dose)),
                ..Quantity::default()
            }),
            lot_number: def.lot_number.clone(),
            site: def.site.as_ref().map(|site| coded_concept(site, V3_ACT_SITE_SYSTEM)),
            route: def.route.as_ref().map(|route| coded_concept(route, V3_ROUTE_SYSTEM)),
            performer: def
                .performer
                .iter()
                .map(|actor| Participant {
                    actor: Reference::new(actor.clone()),
                })
                .collect(),
            primary_source: (def.not_given == Some(true)).then_some(false),
        };

        Ok(schema::construct(immunization)?)
    }

    pub fn coverage(
        &self,
        rng: &mut SeededRandom,
        subject: &str,
        def: &CoverageDef,
        id: Option<ResourceId>,
    ) -> KindlingResult<Resource> {
        let id = id.unwrap_or_else(|| rng.resource_id());

        let type_ = def.type_.as_ref().map(|code| {
            CodeableConcept::from_coding(Coding {
                system: Some(
                    code.system
                        .clone()
                        .unwrap_or_else(|| V3_ACT_CODE_SYSTEM.to_string()),
                ),
                code: Some(
                    code.value
                        .clone()
                        .unwrap_or_else(|| COVERAGE_TYPE_CODE.to_string()),
                ),
                display: Some(
                    code.display
                        .clone()
                        .unwrap_or_else(|| COVERAGE_TYPE_DISPLAY.to_string()),
                ),
            })
        });

        let payors = match &def.payor {
            Some(payor) => payor.references(),
            None => vec![DEFAULT_PAYOR.to_string()],
        };

        let period = match &def.period {
            Some(period) => {
                let start = match period.start_days_ago {
                    Some(days) => Some(format_date(
                        self.days_ago("Coverage.period.start_days_ago", days)?,
                    )),
                    None => period.start.clone(),
                };
                let end = match period.end_days_ago {
                    Some(days) => Some(format_date(
                        self.days_ago("Coverage.period.end_days_ago", days)?,
                    )),
                    None => period.end.clone(),
                };
                (start.is_some() || end.is_some()).then_some(Period { start, end })
            }
            None => None,
        };

        let identifier = def
            .identifier
            .iter()
            .map(|ident| Identifier {
                use_: ident.use_.clone(),
                system: Some(
                    ident
                        .system
                        .clone()
                        .unwrap_or_else(|| INSURANCE_ID_SYSTEM.to_string()),
                ),
                value: ident.value.clone(),
            })
            .collect();

        let coverage = Coverage {
            id: Some(id),
            status: def
                .status
                .clone()
                .unwrap_or_else(|| COVERAGE_STATUS.to_string()),
            kind: def.kind.clone().unwrap_or_else(|| COVERAGE_KIND.to_string()),
            type_,
            beneficiary: Reference::new(subject),
            subscriber: Some(Reference::new(
                def.subscriber.clone().unwrap_or_else(|| subject.to_string()),
            )),
            payment_by: payors
                .into_iter()
                .map(|party| CoveragePaymentBy {
                    party: Reference::new(party),
                })
                .collect(),
            period,
            identifier,
            relationship: def
                .relationship
                .as_ref()
                .map(|relationship| coded_concept(relationship, SUBSCRIBER_RELATIONSHIP_SYSTEM)),
        };

        Ok(schema::construct(coverage)?)
    }
}

/// Map a free-text relationship to its RoleCode and display text.
///
/// Unknown relationships pass through as their upper-cased self.
pub fn relationship_code(relationship: &str) -> (String, String) {
    let known = match relationship.to_ascii_lowercase().as_str() {
        "parent" => Some(("PRN", "parent")),
        "child" => Some(("CHILD", "child")),
        "spouse" => Some(("SPS", "spouse")),
        "sibling" => Some(("SIB", "sibling")),
        "guardian" => Some(("GUARD", "guardian")),
        "emergency" => Some(("C", "emergency contact")),
        _ => None,
    };
    match known {
        Some((code, display)) => (code.to_string(), display.to_string()),
        None => (relationship.to_uppercase(), relationship.to_string()),
    }
}

fn concept_from(code: &CodeDef, default_system: &str) -> CodeableConcept {
    CodeableConcept::from_coding(Coding {
        system: Some(
            code.system
                .clone()
                .unwrap_or_else(|| default_system.to_string()),
        ),
        code: code.value.clone(),
        display: code.display.clone(),
    })
}

/// A bare string is taken as the code itself.
fn coded_concept(coded: &Coded, system: &str) -> CodeableConcept {
    let coding = match coded {
        Coded::Plain(code) => Coding::new(system, code.clone(), None),
        Coded::Full(code) => Coding {
            system: Some(system.to_string()),
            code: code.value.clone(),
            display: code.display.clone(),
        },
    };
    CodeableConcept::from_coding(coding)
}

fn status_concept(system: &str, code: &str) -> CodeableConcept {
    CodeableConcept::from_coding(Coding::new(system, code, None))
}

fn identifier_from(def: &IdentifierDef) -> Identifier {
    Identifier {
        use_: def.use_.clone(),
        system: def.system.clone(),
        value: def.value.clone(),
    }
}

fn human_name(family: Option<&str>, given: Option<&[String]>) -> HumanName {
    HumanName {
        family: Some(family.unwrap_or(DEFAULT_FAMILY_NAME).to_string()),
        given: given
            .map(<[String]>::to_vec)
            .unwrap_or_else(|| vec![DEFAULT_GIVEN_NAME.to_string()]),
    }
}

fn contact(system: &str, value: &str, use_: &str) -> ContactPoint {
    ContactPoint {
        system: Some(system.to_string()),
        value: Some(value.to_string()),
        use_: Some(use_.to_string()),
    }
}

fn contact_shorthand(phone: Option<&str>, email: Option<&str>) -> Vec<ContactPoint> {
    let mut telecom = Vec::new();
    if let Some(phone) = phone.filter(|phone| !phone.is_empty()) {
        telecom.push(contact("phone", phone, "home"));
    }
    if let Some(email) = email.filter(|email| !email.is_empty()) {
        telecom.push(contact("email", email, "home"));
    }
    telecom
}

fn default_address() -> Address {
    Address {
        line: vec![DEFAULT_ADDRESS_LINE.to_string()],
        city: Some(DEFAULT_ADDRESS_CITY.to_string()),
        state: Some(DEFAULT_ADDRESS_STATE.to_string()),
        postal_code: Some(DEFAULT_ADDRESS_POSTAL_CODE.to_string()),
        country: Some(DEFAULT_ADDRESS_COUNTRY.to_string()),
    }
}

/// Uniform draw over the definition's range, rounded to two decimals.
fn sample_range(rng: &mut SeededRandom, def: &ObservationDef) -> f64 {
    let range = def.range.unwrap_or_default();
    let raw = rng.float_range(range.min, range.max);
    (raw * 100.0).round() / 100.0
}

fn value_as_i64(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|float| float as i64))
        .or_else(|| value.as_str().and_then(|text| text.trim().parse().ok()))
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
