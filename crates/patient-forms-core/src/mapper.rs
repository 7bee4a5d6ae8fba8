//! Conversion between the flat [`PatientForm`] and the FHIR [`Patient`].
//!
//! Flat to wire always emits exactly one name entry. Wire to flat reads only
//! the first name entry and the first phone contact point; everything else
//! is dropped. None of these functions fail: absent values become `""`.

use crate::patient::{ContactPoint, HumanName, Patient, PatientForm};

/// Build the resource body for a create (`POST`).
pub fn to_wire_create(form: &PatientForm) -> Patient {
    Patient {
        telecom: vec![ContactPoint::phone(form.phone_number.clone())],
        ..base_resource(form)
    }
}

/// Build the resource body for an update (`PUT`).
///
/// The phone number is not sent on update; `telecom` stays empty and is
/// omitted from the JSON.
pub fn to_wire_update(form: &PatientForm, id: &str) -> Patient {
    Patient {
        id: Some(id.to_string()),
        ..base_resource(form)
    }
}

/// Flatten a resource for display and editing.
pub fn from_wire(patient: &Patient) -> PatientForm {
    let name = patient.primary_name();
    let given = name.map(|n| n.given.as_slice()).unwrap_or_default();

    PatientForm {
        id: patient.id.clone(),
        given_name: given.first().cloned().unwrap_or_default(),
        middle_names: given.get(1..).map(|rest| rest.join(" ")).unwrap_or_default(),
        family_name: name.and_then(|n| n.family.clone()).unwrap_or_default(),
        gender: patient.gender,
        phone_number: patient.phone().unwrap_or_default().to_string(),
        birth_date: patient.birth_date.clone().unwrap_or_default(),
    }
}

/// Split middle names on single spaces, dropping empty tokens.
pub fn split_middle_names(middle_names: &str) -> impl Iterator<Item = &str> {
    middle_names.split(' ').filter(|token| !token.is_empty())
}

fn base_resource(form: &PatientForm) -> Patient {
    let given = std::iter::once(form.given_name.clone())
        .chain(split_middle_names(&form.middle_names).map(str::to_string))
        .collect();

    Patient {
        name: vec![HumanName {
            family: Some(form.family_name.clone()),
            given,
        }],
        gender: form.gender,
        birth_date: Some(form.birth_date.clone()),
        ..Patient::default()
    }
}
