pub mod bundle;
pub mod client;
pub mod error;
pub mod forms;
pub mod mapper;
pub mod patient;
pub mod search;
pub mod time;
pub mod validation;

pub use bundle::{Bundle, BundleEntry, BundleLink, PageLinks};
pub use client::{DEFAULT_BASE_URL, FhirClient, ensure_ok, read_json};
pub use error::{FormsError, Result};
pub use forms::{CreateForm, FormStatus, SearchFilters, SearchForm, SearchOutcome, UpdateForm};
pub use mapper::{from_wire, to_wire_create, to_wire_update};
pub use patient::{ContactPoint, Field, Gender, HumanName, PATIENT, Patient, PatientForm};
pub use search::{PageLink, SearchQuery, SearchTarget};
pub use validation::{FormMode, ValidationError, ValidationErrors, validate};
