//! Patient representations: the flat form record and the nested FHIR resource.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Resource type handled by the forms
pub const PATIENT: &str = "Patient";

/// `ContactPoint.system` value carrying the phone number
pub const PHONE_SYSTEM: &str = "phone";

/// Administrative gender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown gender: {0:?}. Expected one of male, female, other, unknown")]
pub struct UnknownGender(pub String);

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
            Gender::Unknown => "unknown",
        }
    }

    /// Capitalized label used by the list view
    pub fn label(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
            Gender::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = UnknownGender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            "unknown" => Ok(Gender::Unknown),
            _ => Err(UnknownGender(s.to_string())),
        }
    }
}

/// Flat, form-friendly patient record.
///
/// Every text field is a plain string so that a form can be edited field by
/// field; blank means "not provided".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientForm {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub middle_names: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub birth_date: String,
}

impl PatientForm {
    /// All given names (first name followed by middle names) joined by spaces
    pub fn full_given(&self) -> String {
        std::iter::once(self.given_name.as_str())
            .chain(self.middle_names.split(' '))
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One field of the flat record, used by forms to address edits and errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    GivenName,
    MiddleNames,
    FamilyName,
    Gender,
    PhoneNumber,
    BirthDate,
}

impl Field {
    pub fn name(&self) -> &'static str {
        match self {
            Field::GivenName => "givenName",
            Field::MiddleNames => "middleNames",
            Field::FamilyName => "familyName",
            Field::Gender => "gender",
            Field::PhoneNumber => "phoneNumber",
            Field::BirthDate => "birthDate",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// FHIR `HumanName` subset used by the forms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanName {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

/// FHIR `ContactPoint` subset used by the forms
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ContactPoint {
    pub fn phone(value: impl Into<String>) -> Self {
        Self {
            system: Some(PHONE_SYSTEM.to_string()),
            value: Some(value.into()),
        }
    }

    pub fn is_phone(&self) -> bool {
        self.system.as_deref() == Some(PHONE_SYSTEM)
    }
}

/// FHIR Patient resource as exchanged with the server.
///
/// Members the forms never touch are ignored on read and never written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(default = "patient_resource_type")]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanName>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,
    #[serde(
        default,
        serialize_with = "serialize_gender",
        deserialize_with = "deserialize_gender"
    )]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
}

fn patient_resource_type() -> String {
    PATIENT.to_string()
}

impl Default for Patient {
    fn default() -> Self {
        Self {
            resource_type: patient_resource_type(),
            id: None,
            name: Vec::new(),
            telecom: Vec::new(),
            gender: None,
            birth_date: None,
        }
    }
}

impl Patient {
    /// Parse a resource body, degrading a body of the wrong shape to an empty
    /// patient instead of failing.
    pub fn from_json_lenient(value: serde_json::Value) -> Self {
        match serde_json::from_value::<Patient>(value) {
            Ok(patient) => patient,
            Err(e) => {
                tracing::warn!(error = %e, "unexpected Patient shape, using empty values");
                Patient::default()
            }
        }
    }

    /// First name entry, the only one the forms read
    pub fn primary_name(&self) -> Option<&HumanName> {
        self.name.first()
    }

    /// Value of the first phone contact point
    pub fn phone(&self) -> Option<&str> {
        self.telecom
            .iter()
            .find(|c| c.is_phone())
            .and_then(|c| c.value.as_deref())
    }
}

// The form always sends `gender`; an unset gender goes out as "".
fn serialize_gender<S>(gender: &Option<Gender>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(gender.as_ref().map(Gender::as_str).unwrap_or(""))
}

fn deserialize_gender<'de, D>(deserializer: D) -> Result<Option<Gender>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(|v| v.as_str())
        .and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_gender_from_str() {
        assert_eq!("female".parse::<Gender>().unwrap(), Gender::Female);
        assert_eq!(" Male ".parse::<Gender>().unwrap(), Gender::Male);
        assert!("".parse::<Gender>().is_err());
        assert!("robot".parse::<Gender>().is_err());
    }

    #[test]
    fn test_gender_label() {
        assert_eq!(Gender::Unknown.label(), "Unknown");
        assert_eq!(Gender::Other.to_string(), "other");
    }

    #[test]
    fn test_patient_ignores_unknown_members() {
        let patient: Patient = serde_json::from_value(json!({
            "resourceType": "Patient",
            "id": "p1",
            "meta": {"versionId": "3"},
            "active": true,
            "name": [{"use": "official", "family": "Smith", "given": ["Jane"]}],
            "telecom": [{"system": "phone", "value": "5551234567", "use": "home"}],
            "gender": "female",
            "birthDate": "1990-01-01"
        }))
        .unwrap();

        assert_eq!(patient.id.as_deref(), Some("p1"));
        assert_eq!(patient.gender, Some(Gender::Female));
        assert_eq!(patient.phone(), Some("5551234567"));
        assert_eq!(patient.primary_name().unwrap().family.as_deref(), Some("Smith"));
    }

    #[test]
    fn test_patient_unknown_gender_degrades_to_none() {
        let patient: Patient =
            serde_json::from_value(json!({"resourceType": "Patient", "gender": "robot"})).unwrap();
        assert_eq!(patient.gender, None);

        let patient: Patient =
            serde_json::from_value(json!({"resourceType": "Patient", "gender": 7})).unwrap();
        assert_eq!(patient.gender, None);
    }

    #[test]
    fn test_patient_serializes_blank_gender() {
        let value = serde_json::to_value(Patient::default()).unwrap();
        assert_eq!(value, json!({"resourceType": "Patient", "gender": ""}));
    }

    #[test]
    fn test_from_json_lenient_wrong_shape() {
        let patient = Patient::from_json_lenient(json!({"name": "not-a-list"}));
        assert_eq!(patient, Patient::default());

        let patient = Patient::from_json_lenient(json!("oops"));
        assert!(patient.name.is_empty());
    }

    #[test]
    fn test_full_given() {
        let form = PatientForm {
            given_name: "Jane".into(),
            middle_names: "Ann  Marie".into(),
            ..Default::default()
        };
        assert_eq!(form.full_given(), "Jane Ann Marie");
    }
}
