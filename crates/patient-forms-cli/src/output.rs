use colored::Colorize;
use patient_forms_core::forms::SearchState;
use patient_forms_core::{Gender, PatientForm};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{s}"),
        Err(e) => print_error(&format!("Failed to render JSON: {e}")),
    }
}

fn gender_label(gender: Option<Gender>) -> &'static str {
    gender.map(|g| g.label()).unwrap_or("")
}

pub fn print_patient(patient: &PatientForm, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(patient),
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["ID", patient.id.as_deref().unwrap_or("-")]);
            builder.push_record(["First Name", patient.given_name.as_str()]);
            builder.push_record(["Middle Name(s)", patient.middle_names.as_str()]);
            builder.push_record(["Last Name", patient.family_name.as_str()]);
            builder.push_record(["Phone Number", patient.phone_number.as_str()]);
            builder.push_record(["Gender", gender_label(patient.gender)]);
            builder.push_record(["Date of Birth", patient.birth_date.as_str()]);
            let table = builder.build().with(Style::rounded()).to_string();
            println!("{table}");
        }
    }
}

/// Render one page of search results with its navigation state.
pub fn print_page(state: &SearchState, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&PageView::from(state)),
        OutputFormat::Table => print_page_table(state),
    }
}

fn print_page_table(state: &SearchState) {
    if state.rows.is_empty() {
        println!("No patients found.");
        return;
    }

    let mut builder = Builder::default();
    builder.push_record([
        "ID",
        "First Name(s)",
        "Family Name",
        "Gender",
        "Date of Birth",
        "Phone Number",
    ]);
    for row in &state.rows {
        builder.push_record([
            row.id.as_deref().unwrap_or("-"),
            row.full_given().as_str(),
            row.family_name.as_str(),
            gender_label(row.gender),
            row.birth_date.as_str(),
            row.phone_number.as_str(),
        ]);
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");

    if let Some(total) = state.total {
        println!("Total: {total}");
    }
    if let Some(next) = &state.links.next {
        println!("{} {}", "Next:".cyan(), next);
    }
    if let Some(previous) = &state.links.previous {
        println!("{} {}", "Previous:".cyan(), previous);
    }
}

#[derive(Serialize)]
struct PageView<'a> {
    patients: &'a [PatientForm],
    #[serde(skip_serializing_if = "Option::is_none")]
    total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    previous: Option<&'a str>,
}

impl<'a> From<&'a SearchState> for PageView<'a> {
    fn from(state: &'a SearchState) -> Self {
        Self {
            patients: &state.rows,
            total: state.total,
            next: state.links.next.as_ref().map(|l| l.as_str()),
            previous: state.links.previous.as_ref().map(|l| l.as_str()),
        }
    }
}
