//! Search result envelope and page link extraction.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::patient::Patient;
use crate::search::PageLink;

pub const RELATION_NEXT: &str = "next";
pub const RELATION_PREVIOUS: &str = "previous";

/// FHIR `Bundle` subset returned by a search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default)]
    pub link: Vec<BundleLink>,
    #[serde(default)]
    pub entry: Vec<BundleEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleLink {
    #[serde(default)]
    pub relation: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<Value>,
}

impl Bundle {
    /// Parse a search body; a body of the wrong shape reads as an empty page.
    pub fn from_json_lenient(value: Value) -> Self {
        match serde_json::from_value::<Bundle>(value) {
            Ok(bundle) => bundle,
            Err(e) => {
                tracing::warn!(error = %e, "unexpected Bundle shape, treating as empty");
                Bundle::default()
            }
        }
    }

    /// URL of the first link with the given relation
    pub fn link_url(&self, relation: &str) -> Option<&str> {
        self.link
            .iter()
            .find(|l| l.relation == relation)
            .map(|l| l.url.as_str())
    }

    /// Patients carried by the entries, in order
    pub fn patients(&self) -> Vec<Patient> {
        self.entry
            .iter()
            .filter_map(|e| e.resource.clone())
            .map(Patient::from_json_lenient)
            .collect()
    }
}

/// Navigation available from one result page.
///
/// A missing link means the boundary in that direction was reached.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLinks {
    pub next: Option<PageLink>,
    pub previous: Option<PageLink>,
}

impl PageLinks {
    pub fn from_bundle(bundle: &Bundle) -> Self {
        Self {
            next: page_link(bundle, RELATION_NEXT),
            previous: page_link(bundle, RELATION_PREVIOUS),
        }
    }

    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }
}

fn page_link(bundle: &Bundle, relation: &str) -> Option<PageLink> {
    let url = bundle.link_url(relation)?;
    match PageLink::parse(url) {
        Ok(link) => Some(link),
        Err(e) => {
            tracing::warn!(relation, url, error = %e, "ignoring unusable page link");
            None
        }
    }
}
