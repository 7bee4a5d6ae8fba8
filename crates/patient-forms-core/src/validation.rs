//! Field-level checks applied to a [`PatientForm`] before it is sent.

use std::fmt;
use std::sync::LazyLock;

use thiserror::Error;
use time::Date;

use crate::patient::{Field, PatientForm};
use crate::time::{format_fhir_date, parse_fhir_date, today_utc};

/// Phone number: digits only, 10 to 14 of them
static PHONE_REGEX: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[0-9]{10,14}$").expect("Invalid phone regex"));

/// Which form the record is submitted from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    /// Gender may be left unselected
    Create,
    /// Gender is required
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(Field),

    #[error("{0} must not contain commas")]
    ContainsComma(Field),

    #[error("phoneNumber must be 10 to 14 digits")]
    InvalidPhone,

    #[error("birthDate must be a date in YYYY-MM-DD format")]
    InvalidDate,

    #[error("birthDate must not be after {0}")]
    FutureDate(String),
}

impl ValidationError {
    pub fn field(&self) -> Field {
        match self {
            Self::Required(field) | Self::ContainsComma(field) => *field,
            Self::InvalidPhone => Field::PhoneNumber,
            Self::InvalidDate | Self::FutureDate(_) => Field::BirthDate,
        }
    }
}

/// All violations found in one form, at most one per field
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn for_field(&self, field: Field) -> Option<&ValidationError> {
        self.0.iter().find(|e| e.field() == field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msgs: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "Invalid patient: {}", msgs.join("; "))
    }
}

/// Validate a form against today's date.
pub fn validate(form: &PatientForm, mode: FormMode) -> Result<(), ValidationErrors> {
    validate_at(form, mode, today_utc())
}

/// Validate a form, treating `today` as the latest acceptable birth date.
pub fn validate_at(
    form: &PatientForm,
    mode: FormMode,
    today: Date,
) -> Result<(), ValidationErrors> {
    let checks = [
        check_name(Field::GivenName, &form.given_name, true),
        check_name(Field::MiddleNames, &form.middle_names, false),
        check_name(Field::FamilyName, &form.family_name, true),
        check_gender(form, mode),
        check_phone(&form.phone_number),
        check_birth_date(&form.birth_date, today),
    ];

    let errors: Vec<ValidationError> = checks.into_iter().flatten().collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(errors))
    }
}

fn check_name(field: Field, value: &str, required: bool) -> Option<ValidationError> {
    if required && value.trim().is_empty() {
        Some(ValidationError::Required(field))
    } else if value.contains(',') {
        Some(ValidationError::ContainsComma(field))
    } else {
        None
    }
}

fn check_gender(form: &PatientForm, mode: FormMode) -> Option<ValidationError> {
    match (mode, form.gender) {
        (FormMode::Update, None) => Some(ValidationError::Required(Field::Gender)),
        _ => None,
    }
}

fn check_phone(phone: &str) -> Option<ValidationError> {
    if phone.is_empty() {
        Some(ValidationError::Required(Field::PhoneNumber))
    } else if !PHONE_REGEX.is_match(phone) {
        Some(ValidationError::InvalidPhone)
    } else {
        None
    }
}

fn check_birth_date(birth_date: &str, today: Date) -> Option<ValidationError> {
    if birth_date.trim().is_empty() {
        return Some(ValidationError::Required(Field::BirthDate));
    }
    match parse_fhir_date(birth_date) {
        Ok(date) if date > today => Some(ValidationError::FutureDate(format_fhir_date(today))),
        Ok(_) => None,
        Err(_) => Some(ValidationError::InvalidDate),
    }
}
