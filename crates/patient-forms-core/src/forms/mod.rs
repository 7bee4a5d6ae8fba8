//! Form controllers for the create, update and search views.
//!
//! Each controller owns one immutable state snapshot per form instance. State
//! only changes through `reduce`, a pure transition from the previous snapshot
//! and an action; the controller swaps the result in atomically. Failures are
//! logged and stored as the form's error message, never returned.

mod create;
mod search;
mod update;

pub use create::{CreateAction, CreateForm, CreateState};
pub use search::{SearchAction, SearchFilters, SearchForm, SearchOutcome, SearchState};
pub use update::{UpdateAction, UpdateForm, UpdateState};

use crate::error::FormsError;
use crate::patient::{Field, PatientForm};

/// Progress of the last operation a form started
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormStatus {
    #[default]
    Idle,
    Loading,
    Success,
    Error(String),
}

impl FormStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Error(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Apply a raw input value to one field of the flat record.
///
/// The gender input accepts the enumerated values; anything else clears it,
/// like the blank "Select a gender" option.
pub(crate) fn edit_field(fields: &PatientForm, field: Field, value: &str) -> PatientForm {
    let mut next = fields.clone();
    match field {
        Field::GivenName => next.given_name = value.to_string(),
        Field::MiddleNames => next.middle_names = value.to_string(),
        Field::FamilyName => next.family_name = value.to_string(),
        Field::Gender => next.gender = value.parse().ok(),
        Field::PhoneNumber => next.phone_number = value.to_string(),
        Field::BirthDate => next.birth_date = value.to_string(),
    }
    next
}

/// Log a failure and turn it into the message shown on the form.
pub(crate) fn failure_message(operation: &'static str, err: &FormsError) -> String {
    if err.is_client_side() {
        tracing::warn!(operation, error = %err, "patient form rejected");
    } else {
        tracing::error!(operation, error = %err, status = ?err.status(), "patient request failed");
    }
    err.to_string()
}
