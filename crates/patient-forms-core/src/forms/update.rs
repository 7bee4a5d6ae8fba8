use std::sync::Arc;

use arc_swap::ArcSwap;

use super::{FormStatus, edit_field, failure_message};
use crate::client::{FhirClient, ensure_ok, read_json};
use crate::error::{FormsError, Result};
use crate::mapper;
use crate::patient::{Field, PATIENT, Patient, PatientForm};
use crate::validation::{FormMode, validate};

/// Snapshot of the update/delete form for one patient
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateState {
    pub id: String,
    pub fields: PatientForm,
    pub status: FormStatus,
    pub loaded: bool,
    pub updated: bool,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateAction {
    Started,
    Loaded(PatientForm),
    Edit(Field, String),
    Updated,
    Deleted,
    Failed(String),
}

impl UpdateState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn reduce(&self, action: UpdateAction) -> Self {
        match action {
            UpdateAction::Started => Self {
                status: FormStatus::Loading,
                updated: false,
                ..self.clone()
            },
            UpdateAction::Loaded(fields) => Self {
                fields,
                status: FormStatus::Success,
                loaded: true,
                ..self.clone()
            },
            UpdateAction::Edit(field, value) => Self {
                fields: edit_field(&self.fields, field, &value),
                ..self.clone()
            },
            UpdateAction::Updated => Self {
                status: FormStatus::Success,
                updated: true,
                ..self.clone()
            },
            UpdateAction::Deleted => Self {
                fields: PatientForm::default(),
                status: FormStatus::Success,
                deleted: true,
                ..self.clone()
            },
            UpdateAction::Failed(msg) => Self {
                status: FormStatus::Error(msg),
                ..self.clone()
            },
        }
    }
}

/// Controller behind the "update patient" view, keyed by the patient id
pub struct UpdateForm {
    client: FhirClient,
    state: ArcSwap<UpdateState>,
}

impl UpdateForm {
    pub fn new(client: FhirClient, id: impl Into<String>) -> Self {
        Self {
            client,
            state: ArcSwap::from_pointee(UpdateState::new(id)),
        }
    }

    pub fn state(&self) -> Arc<UpdateState> {
        self.state.load_full()
    }

    pub fn dispatch(&self, action: UpdateAction) -> Arc<UpdateState> {
        self.state.rcu(|s| s.reduce(action.clone()));
        self.state()
    }

    pub fn edit(&self, field: Field, value: impl Into<String>) -> Arc<UpdateState> {
        self.dispatch(UpdateAction::Edit(field, value.into()))
    }

    /// Fetch the patient and populate the fields from it.
    pub async fn load(&self) -> Arc<UpdateState> {
        let id = self.state().id.clone();
        self.dispatch(UpdateAction::Started);
        match self.fetch(&id).await {
            Ok(fields) => self.dispatch(UpdateAction::Loaded(fields)),
            Err(e) => self.dispatch(UpdateAction::Failed(failure_message("load", &e))),
        }
    }

    /// Validate and PUT the current fields.
    pub async fn submit(&self) -> Arc<UpdateState> {
        let state = self.state();
        if let Err(e) = self.check_open(&state) {
            return self.dispatch(UpdateAction::Failed(failure_message("update", &e)));
        }
        if let Err(errors) = validate(&state.fields, FormMode::Update) {
            let msg = failure_message("update", &FormsError::from(errors));
            return self.dispatch(UpdateAction::Failed(msg));
        }

        self.dispatch(UpdateAction::Started);
        match self.put(&state.id, &state.fields).await {
            Ok(()) => {
                tracing::info!(id = %state.id, "patient updated");
                self.dispatch(UpdateAction::Updated)
            }
            Err(e) => self.dispatch(UpdateAction::Failed(failure_message("update", &e))),
        }
    }

    /// DELETE the patient; the form is cleared and closed on success.
    pub async fn delete(&self) -> Arc<UpdateState> {
        let state = self.state();
        if state.deleted {
            return self.dispatch(UpdateAction::Failed(failure_message(
                "delete",
                &FormsError::FormClosed,
            )));
        }

        self.dispatch(UpdateAction::Started);
        match self.remove(&state.id).await {
            Ok(()) => {
                tracing::info!(id = %state.id, "patient deleted");
                self.dispatch(UpdateAction::Deleted)
            }
            Err(e) => self.dispatch(UpdateAction::Failed(failure_message("delete", &e))),
        }
    }

    fn check_open(&self, state: &UpdateState) -> Result<()> {
        if state.deleted {
            Err(FormsError::FormClosed)
        } else if !state.loaded {
            Err(FormsError::NotLoaded)
        } else {
            Ok(())
        }
    }

    async fn fetch(&self, id: &str) -> Result<PatientForm> {
        let resp = ensure_ok(self.client.get_by_id(PATIENT, id).await?)?;
        let patient = Patient::from_json_lenient(read_json(resp).await?);
        Ok(mapper::from_wire(&patient))
    }

    async fn put(&self, id: &str, fields: &PatientForm) -> Result<()> {
        ensure_ok(self.client.update(PATIENT, id, fields).await?)?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        ensure_ok(self.client.delete(PATIENT, id).await?)?;
        Ok(())
    }
}
