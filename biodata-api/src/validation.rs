//! Biodata form contract.
//!
//! Every field is described once in [`FIELDS`]; cross-field requirements live in
//! [`CROSS_RULES`]. Rules are checked in table order and the first violation is
//! reported. The same table produces [`example_biodata`].

use chrono::{Datelike, NaiveDate};
use serde_json::{json, Map, Value};

use biodata_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Complexion, Gender, ImmigrationStatus, MaritalStatus, ProfileFields, ReligiousPractice};

#[derive(Debug, Clone, Copy)]
pub enum UpperBound {
    Fixed(i64),
    CurrentYear,
}

impl UpperBound {
    fn resolve(self, today: NaiveDate) -> i64 {
        match self {
            UpperBound::Fixed(max) => max,
            UpperBound::CurrentYear => i64::from(today.year()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Required string of at least `min` characters after trimming and at most
    /// `max` characters as stored.
    Text { min: usize, max: Option<usize>, message: &'static str },
    OptionalText { max: Option<usize> },
    Choice(&'static [&'static str]),
    /// `YYYY-MM-DD`, not in the future.
    Date { message: &'static str },
    Integer { min: i64, max: UpperBound },
    Flag,
    /// Boolean that must be `true`.
    Consent { message: &'static str },
    /// Optional list of `{gender, age, maritalStatus, profession?}`.
    Siblings,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
}

const fn rule(name: &'static str, label: &'static str, kind: FieldKind) -> FieldRule {
    FieldRule { name, label, kind }
}

/// `VARCHAR(255)` columns.
const LINE: Option<usize> = Some(255);
/// `VARCHAR(50)` columns.
const SHORT: Option<usize> = Some(50);
/// `TEXT` columns.
const UNBOUNDED: Option<usize> = None;

const fn required(min: usize, max: Option<usize>, message: &'static str) -> FieldKind {
    FieldKind::Text { min, max, message }
}

const fn optional(max: Option<usize>) -> FieldKind {
    FieldKind::OptionalText { max }
}

pub const FIELDS: &[FieldRule] = &[
    // Basic info
    rule("name", "Name", required(2, LINE, "Name must be at least 2 characters")),
    rule("gender", "Gender", FieldKind::Choice(Gender::VARIANTS)),
    rule("dateOfBirth", "Date of birth", FieldKind::Date { message: "Date of birth is required" }),
    rule("countryOfBirth", "Country of birth", required(1, LINE, "Country of birth is required")),
    rule("height", "Height", required(1, SHORT, "Height is required")),
    rule("complexion", "Complexion", FieldKind::Choice(Complexion::VARIANTS)),
    // Education
    rule("educationDegree", "Education degree", required(1, LINE, "Education degree is required")),
    rule("educationDegreeOther", "Other education degree", optional(LINE)),
    rule("educationSubject", "Education subject", required(1, LINE, "Education subject is required")),
    rule("educationYear", "Education year", FieldKind::Integer { min: 1980, max: UpperBound::CurrentYear }),
    rule("educationInstitute", "Education institute", required(1, LINE, "Education institute is required")),
    // Profession
    rule("profession", "Profession", required(1, LINE, "Profession is required")),
    rule("professionOther", "Other profession", optional(LINE)),
    rule("company", "Company", optional(LINE)),
    rule("maritalStatus", "Marital status", FieldKind::Choice(MaritalStatus::VARIANTS)),
    // Parents
    rule("fatherOccupation", "Father occupation", required(1, LINE, "Father occupation is required")),
    rule("fatherEducation", "Father education", optional(LINE)),
    rule("motherOccupation", "Mother occupation", required(1, LINE, "Mother occupation is required")),
    rule("motherEducation", "Mother education", optional(LINE)),
    rule("parentsLocation", "Parents location", required(1, LINE, "Parents location is required")),
    // Current status
    rule("currentResidence", "Current residence", required(1, LINE, "Current residence is required")),
    rule("citizenship", "Citizenship", required(1, LINE, "Citizenship is required")),
    rule("immigrationStatus", "Immigration status", FieldKind::Choice(ImmigrationStatus::VARIANTS)),
    rule("immigrationDetails", "Immigration details", optional(UNBOUNDED)),
    // Preferences
    rule("willingToRelocate", "Willing to relocate", FieldKind::Flag),
    rule("willingToLiveWithInLaws", "Willing to live with in-laws", FieldKind::Flag),
    // Religious practice
    rule("religiousPractice", "Religious practice", FieldKind::Choice(ReligiousPractice::VARIANTS)),
    rule("praysFiveTimeDaily", "Prays five times daily", FieldKind::Flag),
    rule("attendsMosqueRegularly", "Attends mosque regularly", FieldKind::Flag),
    rule("halaalEarning", "Halaal earning", FieldKind::Flag),
    rule("halaalFood", "Halaal food", FieldKind::Flag),
    // Lifestyle
    rule("drinksAlcohol", "Drinks alcohol", FieldKind::Flag),
    rule("smokes", "Smokes", FieldKind::Flag),
    rule("hobbies", "Hobbies", optional(UNBOUNDED)),
    rule("hasPets", "Has pets", FieldKind::Flag),
    rule("petDetails", "Pet details", optional(UNBOUNDED)),
    // Spouse preferences
    rule("spouseAgeRangeMin", "Minimum spouse age", FieldKind::Integer { min: 18, max: UpperBound::Fixed(65) }),
    rule("spouseAgeRangeMax", "Maximum spouse age", FieldKind::Integer { min: 18, max: UpperBound::Fixed(65) }),
    rule("spouseEducation", "Spouse education", optional(LINE)),
    rule("spouseCitizenship", "Spouse citizenship", optional(LINE)),
    rule("spouseMinHeight", "Spouse minimum height", optional(SHORT)),
    // About
    rule("aboutYou", "About you", required(50, UNBOUNDED, "Please write at least 50 characters about yourself")),
    rule(
        "aboutSpouse",
        "About your spouse",
        required(50, UNBOUNDED, "Please write at least 50 characters about your ideal spouse"),
    ),
    rule("siblings", "Siblings", FieldKind::Siblings),
    // Consent
    rule("hasParentConsent", "Parent consent", FieldKind::Consent { message: "Parent consent is required" }),
    rule(
        "agreedToTerms",
        "Terms and conditions",
        FieldKind::Consent { message: "You must agree to terms and conditions" },
    ),
];

pub struct CrossRule {
    pub field: &'static str,
    pub message: &'static str,
    pub holds: fn(&Map<String, Value>) -> bool,
}

fn has_text(body: &Map<String, Value>, field: &str) -> bool {
    body.get(field)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty())
}

fn is_other(body: &Map<String, Value>, field: &str, other: &str) -> bool {
    body.get(field).and_then(Value::as_str) == Some(other)
}

pub const CROSS_RULES: &[CrossRule] = &[
    CrossRule {
        field: "spouseAgeRangeMax",
        message: "Minimum spouse age cannot be greater than maximum spouse age",
        holds: |body| {
            let min = body.get("spouseAgeRangeMin").and_then(Value::as_i64);
            let max = body.get("spouseAgeRangeMax").and_then(Value::as_i64);
            matches!((min, max), (Some(min), Some(max)) if min <= max)
        },
    },
    CrossRule {
        field: "educationDegreeOther",
        message: "Please specify your education degree",
        holds: |body| !is_other(body, "educationDegree", "Other") || has_text(body, "educationDegreeOther"),
    },
    CrossRule {
        field: "professionOther",
        message: "Please specify your profession",
        holds: |body| !is_other(body, "profession", "Other") || has_text(body, "professionOther"),
    },
    CrossRule {
        field: "immigrationDetails",
        message: "Please provide immigration details",
        holds: |body| {
            !is_other(body, "immigrationStatus", ImmigrationStatus::Other.as_str())
                || has_text(body, "immigrationDetails")
        },
    },
];

fn violation(field: &str, message: impl Into<String>) -> AppError {
    AppError::with_details(ErrorCode::ValidationError, message, json!({ "field": field }))
}

fn within(rule: &FieldRule, text: &str, max: Option<usize>) -> AppResult<()> {
    match max {
        Some(max) if text.chars().count() > max => Err(violation(
            rule.name,
            format!("{} must be at most {max} characters", rule.label),
        )),
        _ => Ok(()),
    }
}

fn check_field(rule: &FieldRule, value: Option<&Value>, today: NaiveDate) -> AppResult<()> {
    let value = value.filter(|v| !v.is_null());
    let fail = |message: String| Err(violation(rule.name, message));

    match rule.kind {
        FieldKind::Text { min, max, message } => match value.and_then(Value::as_str) {
            Some(text) if text.trim().chars().count() >= min => within(rule, text, max),
            _ => fail(message.to_string()),
        },
        FieldKind::OptionalText { max } => match value {
            None => Ok(()),
            Some(Value::String(text)) => within(rule, text, max),
            Some(_) => fail(format!("{} must be text", rule.label)),
        },
        FieldKind::Choice(variants) => match value.and_then(Value::as_str) {
            Some(choice) if variants.contains(&choice) => Ok(()),
            _ => fail(format!("{} must be one of {}", rule.label, variants.join(", "))),
        },
        FieldKind::Date { message } => {
            let raw = match value.and_then(Value::as_str).map(str::trim) {
                Some(raw) if !raw.is_empty() => raw,
                _ => return fail(message.to_string()),
            };
            match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                Ok(date) if date > today => fail(format!("{} cannot be in the future", rule.label)),
                Ok(_) => Ok(()),
                Err(_) => fail(format!("{} must be a valid date (YYYY-MM-DD)", rule.label)),
            }
        }
        FieldKind::Integer { min, max } => {
            let max = max.resolve(today);
            match value.and_then(Value::as_i64) {
                Some(n) if (min..=max).contains(&n) => Ok(()),
                _ => fail(format!("{} must be a whole number between {min} and {max}", rule.label)),
            }
        }
        FieldKind::Flag => match value {
            Some(Value::Bool(_)) => Ok(()),
            _ => fail(format!("{} must be true or false", rule.label)),
        },
        FieldKind::Consent { message } => match value {
            Some(Value::Bool(true)) => Ok(()),
            _ => fail(message.to_string()),
        },
        FieldKind::Siblings => match value {
            None => Ok(()),
            Some(Value::Array(items)) if items.iter().all(is_valid_sibling) => Ok(()),
            Some(_) => fail("Each sibling needs a gender, an age and a marital status".to_string()),
        },
    }
}

fn is_valid_sibling(item: &Value) -> bool {
    let Some(sibling) = item.as_object() else {
        return false;
    };
    let choice = |field: &str, variants: &[&str]| {
        sibling
            .get(field)
            .and_then(Value::as_str)
            .is_some_and(|v| variants.contains(&v))
    };
    let age_ok = sibling
        .get("age")
        .and_then(Value::as_i64)
        .is_some_and(|age| (0..=120).contains(&age));
    let profession_ok = matches!(sibling.get("profession"), None | Some(Value::Null) | Some(Value::String(_)));

    choice("gender", Gender::VARIANTS) && choice("maritalStatus", MaritalStatus::VARIANTS) && age_ok && profession_ok
}

/// Checks a submitted form against the field table and cross-field rules and
/// returns the typed biodata. Blank optional text is stored as absent.
pub fn validate_biodata(input: &Value, today: NaiveDate) -> AppResult<ProfileFields> {
    let body = input
        .as_object()
        .ok_or_else(|| AppError::validation("Request body must be a JSON object"))?;

    for rule in FIELDS {
        check_field(rule, body.get(rule.name), today)?;
    }
    for cross in CROSS_RULES {
        if !(cross.holds)(body) {
            return Err(violation(cross.field, cross.message));
        }
    }

    let mut cleaned = Map::with_capacity(FIELDS.len());
    for rule in FIELDS {
        let value = match (rule.kind, body.get(rule.name)) {
            (FieldKind::OptionalText { .. }, Some(Value::String(s))) if s.trim().is_empty() => Value::Null,
            (FieldKind::Siblings, None | Some(Value::Null)) => Value::Array(Vec::new()),
            (_, Some(value)) => value.clone(),
            (_, None) => Value::Null,
        };
        cleaned.insert(rule.name.to_string(), value);
    }

    serde_json::from_value(Value::Object(cleaned)).map_err(|e| {
        tracing::warn!(error = %e, "validated biodata did not deserialize");
        AppError::validation("Invalid profile data")
    })
}

fn sample_text(label: &str, min: usize) -> String {
    let mut text = format!("Sample {}", label.to_lowercase());
    while text.chars().count() < min {
        text.push_str(", described in a little more detail");
    }
    text
}

/// A payload that passes [`validate_biodata`], built from the field table.
pub fn example_biodata() -> Value {
    let mut body = Map::with_capacity(FIELDS.len());
    for rule in FIELDS {
        let value = match rule.kind {
            FieldKind::Text { min, .. } => Value::String(sample_text(rule.label, min)),
            FieldKind::OptionalText { .. } => Value::Null,
            FieldKind::Choice(variants) => json!(variants[0]),
            FieldKind::Date { .. } => json!("1995-06-15"),
            FieldKind::Integer { min, .. } => json!(min),
            FieldKind::Flag => json!(false),
            FieldKind::Consent { .. } => json!(true),
            FieldKind::Siblings => json!([]),
        };
        body.insert(rule.name.to_string(), value);
    }
    Value::Object(body)
}
