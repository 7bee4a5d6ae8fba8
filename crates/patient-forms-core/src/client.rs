//! Thin HTTP client for the FHIR REST API.
//!
//! Every call is attempted once and returns the raw response; status codes
//! are left to the caller (see [`ensure_ok`]).

use reqwest::{Method, RequestBuilder, Response};
use serde_json::Value;

use crate::error::{FormsError, Result};
use crate::mapper;
use crate::patient::PatientForm;
use crate::search::SearchTarget;

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/fhir";

const JSON_CONTENT_TYPE: &str = "application/json";
const FHIR_JSON_ACCEPT: &str = "application/fhir+json";

#[derive(Debug, Clone)]
pub struct FhirClient {
    http: reqwest::Client,
    base_url: String,
}

impl Default for FhirClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl FhirClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resource_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        tracing::debug!(method = method.as_str(), url, "sending FHIR request");
        self.http
            .request(method, url)
            .header(reqwest::header::ACCEPT, FHIR_JSON_ACCEPT)
    }

    async fn send(&self, req: RequestBuilder) -> Result<Response> {
        let resp = req.send().await?;
        tracing::debug!(status = resp.status().as_u16(), url = %resp.url(), "FHIR response");
        Ok(resp)
    }

    /// Run a search. Queries are resolved against the base URL, page links
    /// are requested verbatim.
    pub async fn search(&self, target: &SearchTarget) -> Result<Response> {
        let url = match target {
            SearchTarget::Query(query) => self.resource_url(&query.to_relative()),
            SearchTarget::Page(link) => link.as_str().to_string(),
        };
        self.send(self.request(Method::GET, &url)).await
    }

    pub async fn get_by_id(&self, resource_type: &str, id: &str) -> Result<Response> {
        let url = self.resource_url(&format!("{resource_type}/{id}"));
        self.send(self.request(Method::GET, &url)).await
    }

    pub async fn create(&self, resource_type: &str, form: &PatientForm) -> Result<Response> {
        let url = self.resource_url(resource_type);
        let body = mapper::to_wire_create(form);
        let req = self
            .request(Method::POST, &url)
            .header(reqwest::header::CONTENT_TYPE, JSON_CONTENT_TYPE)
            .json(&body);
        self.send(req).await
    }

    pub async fn update(
        &self,
        resource_type: &str,
        id: &str,
        form: &PatientForm,
    ) -> Result<Response> {
        let url = self.resource_url(&format!("{resource_type}/{id}"));
        let body = mapper::to_wire_update(form, id);
        let req = self
            .request(Method::PUT, &url)
            .header(reqwest::header::CONTENT_TYPE, JSON_CONTENT_TYPE)
            .json(&body);
        self.send(req).await
    }

    pub async fn delete(&self, resource_type: &str, id: &str) -> Result<Response> {
        let url = self.resource_url(&format!("{resource_type}/{id}"));
        let req = self
            .request(Method::DELETE, &url)
            .header(reqwest::header::CONTENT_TYPE, JSON_CONTENT_TYPE);
        self.send(req).await
    }
}

/// Turn a non-success response into [`FormsError::RequestFailed`].
pub fn ensure_ok(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(FormsError::request_failed(status))
    }
}

/// Resource id named by the `Location` header of a create response,
/// e.g. `http://host/fhir/Patient/123/_history/1`.
pub fn location_id(resp: &Response, resource_type: &str) -> Option<String> {
    let location = resp.headers().get(reqwest::header::LOCATION)?.to_str().ok()?;
    id_from_location(location, resource_type)
}

fn id_from_location(location: &str, resource_type: &str) -> Option<String> {
    let mut segments = location.split('?').next()?.split('/');
    segments.find(|s| *s == resource_type)?;
    segments
        .next()
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Read a response body as JSON; an empty body reads as `null`.
pub async fn read_json(resp: Response) -> Result<Value> {
    let body = resp.text().await?;
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&body)?)
}
