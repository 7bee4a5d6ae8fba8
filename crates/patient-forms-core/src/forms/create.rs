use std::sync::Arc;

use arc_swap::ArcSwap;

use super::{FormStatus, edit_field, failure_message};
use crate::client::{FhirClient, ensure_ok, location_id, read_json};
use crate::error::{FormsError, Result};
use crate::patient::{Field, PATIENT, Patient, PatientForm};
use crate::validation::{FormMode, validate};

/// Snapshot of the create form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateState {
    pub fields: PatientForm,
    pub status: FormStatus,
    /// Id assigned by the server; set once the patient exists and the
    /// view should move on to it
    pub created_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateAction {
    Edit(Field, String),
    Replace(PatientForm),
    Submitted,
    Created(Option<String>),
    Failed(String),
}

impl CreateState {
    pub fn reduce(&self, action: CreateAction) -> Self {
        match action {
            CreateAction::Edit(field, value) => Self {
                fields: edit_field(&self.fields, field, &value),
                ..self.clone()
            },
            CreateAction::Replace(fields) => Self {
                fields,
                ..self.clone()
            },
            CreateAction::Submitted => Self {
                status: FormStatus::Loading,
                created_id: None,
                ..self.clone()
            },
            CreateAction::Created(id) => Self {
                status: FormStatus::Success,
                created_id: id,
                ..self.clone()
            },
            CreateAction::Failed(msg) => Self {
                status: FormStatus::Error(msg),
                ..self.clone()
            },
        }
    }
}

/// Controller behind the "create patient" view
pub struct CreateForm {
    client: FhirClient,
    state: ArcSwap<CreateState>,
}

impl CreateForm {
    /// Blank form
    pub fn new(client: FhirClient) -> Self {
        Self {
            client,
            state: ArcSwap::from_pointee(CreateState::default()),
        }
    }

    pub fn state(&self) -> Arc<CreateState> {
        self.state.load_full()
    }

    pub fn dispatch(&self, action: CreateAction) -> Arc<CreateState> {
        self.state.rcu(|s| s.reduce(action.clone()));
        self.state()
    }

    pub fn edit(&self, field: Field, value: impl Into<String>) -> Arc<CreateState> {
        self.dispatch(CreateAction::Edit(field, value.into()))
    }

    /// Validate and POST the current fields.
    ///
    /// On failure the fields are kept so they can be corrected and resubmitted.
    pub async fn submit(&self) -> Arc<CreateState> {
        let fields = self.state().fields.clone();
        if let Err(errors) = validate(&fields, FormMode::Create) {
            let msg = failure_message("create", &FormsError::from(errors));
            return self.dispatch(CreateAction::Failed(msg));
        }

        self.dispatch(CreateAction::Submitted);
        match self.post(&fields).await {
            Ok(id) => {
                tracing::info!(id = id.as_deref().unwrap_or("?"), "patient created");
                self.dispatch(CreateAction::Created(id))
            }
            Err(e) => self.dispatch(CreateAction::Failed(failure_message("create", &e))),
        }
    }

    async fn post(&self, fields: &PatientForm) -> Result<Option<String>> {
        let resp = ensure_ok(self.client.create(PATIENT, fields).await?)?;
        let location_id = location_id(&resp, PATIENT);
        let body = read_json(resp).await?;
        let body_id = if body.is_null() {
            None
        } else {
            Patient::from_json_lenient(body).id
        };
        Ok(body_id.or(location_id))
    }
}
