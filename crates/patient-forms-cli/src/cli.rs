use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "patient-forms")]
#[command(about = "Create, search, update and delete FHIR Patients from the terminal")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// FHIR base URL (overrides config and PATIENT_FORMS_URL env var)
    #[arg(short, long, global = true, env = "PATIENT_FORMS_URL")]
    pub server: Option<String>,

    /// Config profile name
    #[arg(short, long, global = true, env = "PATIENT_FORMS_PROFILE", default_value = "default")]
    pub profile: String,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,
}

#[derive(Clone, Copy, ValueEnum, Default, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new patient
    Create(PatientArgs),
    /// Show a patient by id
    Show(IdArgs),
    /// Update a patient (loads it, applies the given fields, saves it)
    Update(UpdateArgs),
    /// Delete a patient
    Delete(IdArgs),
    /// Search patients, one page at a time
    Search(SearchArgs),
    /// Manage CLI configuration
    Config(ConfigArgs),
}

/// Patient form fields
#[derive(clap::Args, Default, Clone)]
pub struct PatientArgs {
    /// First name
    #[arg(long)]
    pub given: Option<String>,
    /// Middle name(s), separated by spaces
    #[arg(long)]
    pub middle: Option<String>,
    /// Last name
    #[arg(long)]
    pub family: Option<String>,
    /// Phone number, 10 to 14 digits
    #[arg(long)]
    pub phone: Option<String>,
    /// male, female, other or unknown
    #[arg(long)]
    pub gender: Option<String>,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub birth_date: Option<String>,
}

#[derive(clap::Args)]
pub struct IdArgs {
    /// Patient id
    pub id: String,
}

#[derive(clap::Args)]
pub struct UpdateArgs {
    /// Patient id
    pub id: String,
    #[command(flatten)]
    pub fields: PatientArgs,
}

#[derive(clap::Args)]
pub struct SearchArgs {
    /// First name filter
    #[arg(long)]
    pub given: Option<String>,
    /// Last name filter
    #[arg(long)]
    pub family: Option<String>,
    /// Phone number filter
    #[arg(long)]
    pub telecom: Option<String>,
    /// Number of results per page
    #[arg(long)]
    pub count: Option<u32>,
    /// Fetch a page link returned by an earlier search
    #[arg(long, conflicts_with_all = ["given", "family", "telecom", "count"])]
    pub page_url: Option<String>,
    /// Page through results interactively (n = next, p = previous, q = quit)
    #[arg(long)]
    pub browse: bool,
}

#[derive(clap::Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current config
    Show,
    /// Set config value
    Set(ConfigSetArgs),
}

#[derive(clap::Args)]
pub struct ConfigSetArgs {
    /// Key to set (server, format)
    pub key: String,
    /// Value
    pub value: String,
}
