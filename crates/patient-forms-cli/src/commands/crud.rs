use anyhow::Result;
use colored::Colorize;
use patient_forms_core::forms::{CreateForm, UpdateForm};
use patient_forms_core::{FhirClient, Field, FormStatus, PatientForm};

use crate::cli::{OutputFormat, PatientArgs};
use crate::output::{print_patient, print_success};

/// Field edits carried by the command line flags, in form order
fn edits(args: &PatientArgs) -> Vec<(Field, &str)> {
    [
        (Field::GivenName, &args.given),
        (Field::MiddleNames, &args.middle),
        (Field::FamilyName, &args.family),
        (Field::PhoneNumber, &args.phone),
        (Field::Gender, &args.gender),
        (Field::BirthDate, &args.birth_date),
    ]
    .into_iter()
    .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
    .collect()
}

fn check(status: &FormStatus) -> Result<()> {
    match status.error() {
        Some(msg) => anyhow::bail!("{msg}"),
        None => Ok(()),
    }
}

pub async fn create(client: &FhirClient, args: &PatientArgs, format: OutputFormat) -> Result<()> {
    let form = CreateForm::new(client.clone());
    for (field, value) in edits(args) {
        form.edit(field, value);
    }

    let state = form.submit().await;
    check(&state.status)?;

    let Some(id) = state.created_id.as_deref() else {
        print_success("Created Patient (server returned no id)");
        return Ok(());
    };
    print_success(&format!("Created {}/{}", "Patient".cyan(), id.cyan()));

    // Continue to the new patient's view, as the form does after creating.
    show(client, id, format).await
}

pub async fn show(client: &FhirClient, id: &str, format: OutputFormat) -> Result<()> {
    let form = UpdateForm::new(client.clone(), id);
    let state = form.load().await;
    check(&state.status)?;
    print_patient(&state.fields, format);
    Ok(())
}

pub async fn update(
    client: &FhirClient,
    id: &str,
    args: &PatientArgs,
    format: OutputFormat,
) -> Result<()> {
    let saved = save(client, id, args).await?;
    print_success(&format!("Updated {}/{}", "Patient".cyan(), id.cyan()));
    print_patient(&saved, format);
    Ok(())
}

/// Load, overlay the flags, PUT, then read the patient back as the server
/// stored it.
async fn save(client: &FhirClient, id: &str, args: &PatientArgs) -> Result<PatientForm> {
    let form = UpdateForm::new(client.clone(), id);
    check(&form.load().await.status)?;

    let edits = edits(args);
    if edits.is_empty() {
        anyhow::bail!("Nothing to update. Pass at least one field, e.g. --family <name>");
    }
    for (field, value) in edits {
        form.edit(field, value);
    }
    if args.phone.is_some() {
        tracing::warn!("phone number changes are not sent on update");
    }

    check(&form.submit().await.status)?;

    let stored = UpdateForm::new(client.clone(), id);
    let state = stored.load().await;
    check(&state.status)?;
    Ok(state.fields.clone())
}

pub async fn delete(client: &FhirClient, id: &str) -> Result<()> {
    let form = UpdateForm::new(client.clone(), id);
    let state = form.delete().await;
    check(&state.status)?;
    print_success(&format!("Deleted {}/{}", "Patient".cyan(), id.cyan()));
    Ok(())
}
