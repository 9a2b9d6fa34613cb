//! Constants used throughout the Kindling core crate.
//!
//! Code-system URLs, default demographic pools and per-resource defaults live here so the
//! factory and rule engine agree on them.

/// Medical record number identifier system.
pub const MRN_SYSTEM: &str = "http://hospital.example/mrn";
pub const SNOMED_SYSTEM: &str = "http://snomed.info/sct";
pub const LOINC_SYSTEM: &str = "http://loinc.org";
pub const RXNORM_SYSTEM: &str = "http://www.nlm.nih.gov/research/umls/rxnorm";
pub const CVX_SYSTEM: &str = "http://hl7.org/fhir/sid/cvx";
pub const UCUM_SYSTEM: &str = "http://unitsofmeasure.org";
pub const CONDITION_CLINICAL_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-clinical";
pub const CONDITION_VER_STATUS_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/condition-ver-status";
pub const V3_ACT_CODE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-ActCode";
pub const V3_ROLE_CODE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-RoleCode";
pub const V3_ACT_SITE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-ActSite";
pub const V3_ROUTE_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/v3-RouteOfAdministration";
pub const V2_0074_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v2-0074";
pub const SUBSCRIBER_RELATIONSHIP_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/subscriber-relationship";

/// Identifier system cross-linking a RelatedPerson to the Patient record of that same person.
pub const RELATED_PERSON_PATIENT_SYSTEM: &str = "http://example.org/fhir/related-person-patient";

/// Default identifier system for insurance member ids.
pub const INSURANCE_ID_SYSTEM: &str = "http://example.org/insurance-id";

/// Payor used when a coverage definition names none.
pub const DEFAULT_PAYOR: &str = "Organization/default-insurance";

pub const MALE_NAMES: &[&str] = &[
    "John",
    "David",
    "Michael",
    "Robert",
    "William",
    "James",
    "Joseph",
    "Charles",
    "Thomas",
    "Christopher",
];

pub const FEMALE_NAMES: &[&str] = &[
    "Mary",
    "Linda",
    "Sarah",
    "Emma",
    "Jennifer",
    "Patricia",
    "Elizabeth",
    "Susan",
    "Jessica",
    "Margaret",
];

pub const FAMILY_NAMES: &[&str] = &[
    "Smith",
    "Johnson",
    "Brown",
    "Jones",
    "Miller",
    "Davis",
    "Garcia",
    "Rodriguez",
    "Wilson",
    "Martinez",
];

pub const DEFAULT_AGE_MIN: i64 = 18;
pub const DEFAULT_AGE_MAX: i64 = 90;

pub const DEFAULT_FAMILY_NAME: &str = "Doe";
pub const DEFAULT_GIVEN_NAME: &str = "John";

pub const DEFAULT_ADDRESS_LINE: &str = "123 Main Street";
pub const DEFAULT_ADDRESS_CITY: &str = "Boston";
pub const DEFAULT_ADDRESS_STATE: &str = "MA";
pub const DEFAULT_ADDRESS_POSTAL_CODE: &str = "02134";
pub const DEFAULT_ADDRESS_COUNTRY: &str = "US";

/// `(system, value, use)` contact points given to subjects with no telecom of their own.
pub const DEFAULT_TELECOM: &[(&str, &str, &str)] = &[
    ("phone", "555-1234", "home"),
    ("email", "patient@example.com", "home"),
];

pub const CONDITION_CLINICAL_STATUS: &str = "active";
pub const CONDITION_VERIFICATION_STATUS: &str = "confirmed";
pub const OBSERVATION_STATUS: &str = "final";
pub const MEDICATION_REQUEST_STATUS: &str = "active";
pub const MEDICATION_REQUEST_INTENT: &str = "order";
pub const MEDICATION_SIG: &str = "Take as directed";
pub const ENCOUNTER_STATUS: &str = "finished";
pub const ENCOUNTER_CLASS: &str = "AMB";
pub const ENCOUNTER_CLASS_DISPLAY: &str = "ambulatory";
pub const ENCOUNTER_TYPE_CODE: &str = "162673000";
pub const ENCOUNTER_TYPE_DISPLAY: &str = "General examination";
pub const ENCOUNTER_DURATION_HOURS: f64 = 1.0;
pub const DIAGNOSTIC_REPORT_STATUS: &str = "final";
pub const DIAGNOSTIC_REPORT_CATEGORY: &str = "LAB";
pub const DIAGNOSTIC_REPORT_CATEGORY_DISPLAY: &str = "Laboratory";
pub const IMMUNIZATION_STATUS: &str = "completed";
pub const COVERAGE_STATUS: &str = "active";
pub const COVERAGE_KIND: &str = "insurance";
pub const COVERAGE_TYPE_CODE: &str = "EHCPOL";
pub const COVERAGE_TYPE_DISPLAY: &str = "Extended healthcare";

/// Days between successive doses of a repeated immunization.
pub const DOSE_SPACING_DAYS: i64 = 30;

/// Window, in months, over which repeated encounters are spread when none is given.
pub const ENCOUNTER_SPREAD_MONTHS: i64 = 12;

pub const DEFAULT_BUNDLE_SIZE: usize = 100;
pub const DEFAULT_PROFILE_VERSION: &str = "0.1";

/// Default tracing directive used by the CLI when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "kindling=info";
