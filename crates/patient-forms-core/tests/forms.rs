//! Form controllers end to end against a fake FHIR server.

use std::sync::Arc;
use std::time::Duration;

use patient_forms_core::forms::{CreateForm, SearchFilters, SearchForm, SearchOutcome, UpdateForm};
use patient_forms_core::{FhirClient, Field, FormStatus, Gender, PatientForm, SearchQuery};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> FhirClient {
    FhirClient::new(&format!("{}/fhir", server.uri()))
}

fn fill_jane(form: &CreateForm) {
    form.edit(Field::GivenName, "Jane");
    form.edit(Field::MiddleNames, "Ann Marie");
    form.edit(Field::FamilyName, "Smith");
    form.edit(Field::PhoneNumber, "5551234567");
    form.edit(Field::Gender, "female");
    form.edit(Field::BirthDate, "1990-01-01");
}

fn patient_json(id: &str, given: &[&str], family: &str) -> Value {
    json!({
        "resourceType": "Patient",
        "id": id,
        "name": [{"family": family, "given": given}],
        "telecom": [{"system": "email", "value": "x@y.z"}, {"system": "phone", "value": "5550000000"}],
        "gender": "male",
        "birthDate": "1980-02-02"
    })
}

fn bundle_json(patients: Vec<Value>, links: Vec<(&str, String)>) -> Value {
    json!({
        "resourceType": "Bundle",
        "type": "searchset",
        "total": patients.len(),
        "link": links
            .into_iter()
            .map(|(relation, url)| json!({"relation": relation, "url": url}))
            .collect::<Vec<_>>(),
        "entry": patients
            .into_iter()
            .map(|resource| json!({"resource": resource}))
            .collect::<Vec<_>>(),
    })
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test]
async fn test_create_success_records_created_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fhir/Patient"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"resourceType": "Patient", "id": "p-100"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let form = CreateForm::new(client_for(&server));
    fill_jane(&form);

    let state = form.submit().await;
    assert_eq!(state.status, FormStatus::Success);
    assert_eq!(state.created_id.as_deref(), Some("p-100"));
}

#[tokio::test]
async fn test_create_uses_location_when_body_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fhir/Patient"))
        .respond_with(
            ResponseTemplate::new(201)
                .insert_header("Location", format!("{}/fhir/Patient/p-9/_history/1", server.uri())),
        )
        .mount(&server)
        .await;

    let form = CreateForm::new(client_for(&server));
    fill_jane(&form);

    let state = form.submit().await;
    assert_eq!(state.created_id.as_deref(), Some("p-9"));
}

#[tokio::test]
async fn test_create_422_sets_error_and_does_not_navigate() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/fhir/Patient"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&server)
        .await;

    let form = CreateForm::new(client_for(&server));
    fill_jane(&form);

    let state = form.submit().await;
    let msg = state.status.error().expect("error state");
    assert!(msg.contains("422"), "{msg}");
    assert_eq!(msg, "Request failed: 422 Unprocessable Entity");
    assert_eq!(state.created_id, None);
    // Fields survive so the user can correct and resubmit.
    assert_eq!(state.fields.family_name, "Smith");
    assert_eq!(state.fields.middle_names, "Ann Marie");
}

// =============================================================================
// Update / delete
// =============================================================================

#[tokio::test]
async fn test_update_form_load_edit_submit() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fhir/Patient/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patient_json(
            "p1",
            &["John", "Q", "Public"],
            "Doe",
        )))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/fhir/Patient/p1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resourceType": "Patient", "id": "p1"})))
        .expect(1)
        .mount(&server)
        .await;

    let form = UpdateForm::new(client_for(&server), "p1");
    let state = form.load().await;
    assert!(state.loaded);
    assert_eq!(
        state.fields,
        PatientForm {
            id: Some("p1".into()),
            given_name: "John".into(),
            middle_names: "Q Public".into(),
            family_name: "Doe".into(),
            gender: Some(Gender::Male),
            phone_number: "5550000000".into(),
            birth_date: "1980-02-02".into(),
        }
    );

    form.edit(Field::FamilyName, "Roe");
    form.edit(Field::PhoneNumber, "5559999999");
    let state = form.submit().await;
    assert!(state.updated);
    assert_eq!(state.status, FormStatus::Success);

    let requests = server.received_requests().await.unwrap();
    let put = requests.iter().find(|r| r.method.as_str() == "PUT").unwrap();
    let sent: Value = serde_json::from_slice(&put.body).unwrap();
    assert_eq!(sent["id"], "p1");
    assert_eq!(sent["name"][0]["family"], "Roe");
    assert_eq!(sent["name"][0]["given"], json!(["John", "Q", "Public"]));
    // The edited phone number is not transmitted on update.
    assert!(sent.get("telecom").is_none());
}

#[tokio::test]
async fn test_update_requires_gender() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fhir/Patient/p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resourceType": "Patient",
            "id": "p2",
            "name": [{"family": "Doe", "given": ["Jo"]}],
            "telecom": [{"system": "phone", "value": "5551112222"}],
            "birthDate": "1999-09-09"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let form = UpdateForm::new(client_for(&server), "p2");
    form.load().await;

    let state = form.submit().await;
    assert!(state.status.error().unwrap().contains("gender is required"));
    assert!(!state.updated);
}

#[tokio::test]
async fn test_submit_before_load_is_rejected() {
    let form = UpdateForm::new(FhirClient::new("http://127.0.0.1:9/fhir"), "p3");
    let state = form.submit().await;
    assert_eq!(state.status.error(), Some("Patient form has not been loaded"));
}

#[tokio::test]
async fn test_load_failure_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fhir/Patient/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let form = UpdateForm::new(client_for(&server), "missing");
    let state = form.load().await;
    assert!(!state.loaded);
    assert_eq!(state.status.error(), Some("Request failed: 404 Not Found"));
}

#[tokio::test]
async fn test_delete_clears_and_closes_form() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fhir/Patient/p4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patient_json("p4", &["Ann"], "Lee")))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/fhir/Patient/p4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resourceType": "OperationOutcome"})))
        .expect(1)
        .mount(&server)
        .await;

    let form = UpdateForm::new(client_for(&server), "p4");
    form.load().await;

    let state = form.delete().await;
    assert!(state.deleted);
    assert_eq!(state.fields, PatientForm::default());

    // A second delete never reaches the server (expect(1) above).
    let state = form.delete().await;
    assert!(state.status.error().unwrap().contains("deleted"));
    let state = form.submit().await;
    assert!(state.status.error().unwrap().contains("deleted"));
}

#[tokio::test]
async fn test_failed_delete_keeps_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fhir/Patient/p5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(patient_json("p5", &["Ann"], "Lee")))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/fhir/Patient/p5"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let form = UpdateForm::new(client_for(&server), "p5");
    form.load().await;

    let state = form.delete().await;
    assert!(!state.deleted);
    assert_eq!(state.fields.family_name, "Lee");
    assert_eq!(state.status.error(), Some("Request failed: 409 Conflict"));
}

// =============================================================================
// Search
// =============================================================================

#[tokio::test]
async fn test_search_walks_pages() {
    let server = MockServer::start().await;
    let page2 = format!("{}/fhir?_getpages=s1&_getpagesoffset=10", server.uri());
    let page1 = format!("{}/fhir?_getpages=s1&_getpagesoffset=0", server.uri());

    Mock::given(method("GET"))
        .and(path("/fhir/Patient"))
        .and(query_param("_count", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bundle_json(
            vec![patient_json("1", &["Ann"], "Lee")],
            vec![("self", "ignored".into()), ("next", page2.clone())],
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fhir"))
        .and(query_param("_getpagesoffset", "10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bundle_json(
            vec![patient_json("2", &["Bob", "B"], "Ray")],
            vec![("previous", page1.clone())],
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fhir"))
        .and(query_param("_getpagesoffset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bundle_json(
            vec![patient_json("1", &["Ann"], "Lee")],
            vec![("next", page2.clone())],
        )))
        .mount(&server)
        .await;

    let form = SearchForm::new(client_for(&server));

    let SearchOutcome::Applied(state) = form.load_initial().await else {
        panic!("initial page not applied");
    };
    assert_eq!(state.rows.len(), 1);
    assert_eq!(state.rows[0].given_name, "Ann");
    assert!(state.links.has_next());
    assert!(!state.links.has_previous());
    assert_eq!(form.previous().await, SearchOutcome::AtBoundary);

    let SearchOutcome::Applied(state) = form.next().await else {
        panic!("next page not applied");
    };
    assert_eq!(state.rows[0].id.as_deref(), Some("2"));
    assert_eq!(state.rows[0].middle_names, "B");
    assert!(!state.links.has_next());
    assert_eq!(state.links.previous.as_ref().unwrap().as_str(), page1);
    assert_eq!(form.next().await, SearchOutcome::AtBoundary);

    let SearchOutcome::Applied(state) = form.previous().await else {
        panic!("previous page not applied");
    };
    assert_eq!(state.rows[0].id.as_deref(), Some("1"));
}

#[tokio::test]
async fn test_search_submit_uses_filters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fhir/Patient"))
        .and(query_param("given", "Ann Marie"))
        .and(query_param("telecom", "555"))
        .respond_with(ResponseTemplate::new(200).set_body_json(bundle_json(vec![], vec![])))
        .expect(1)
        .mount(&server)
        .await;

    let form = SearchForm::new(client_for(&server));
    form.set_filters(SearchFilters {
        given: "Ann Marie".into(),
        family: String::new(),
        telecom: "555".into(),
    });

    let SearchOutcome::Applied(state) = form.submit().await else {
        panic!("search not applied");
    };
    assert!(state.rows.is_empty());
    assert_eq!(state.status, FormStatus::Success);
}

#[tokio::test]
async fn test_search_bundle_without_entries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fhir/Patient"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"resourceType": "Bundle", "total": 0})))
        .mount(&server)
        .await;

    let form = SearchForm::new(client_for(&server));
    let SearchOutcome::Applied(state) = form.load_initial().await else {
        panic!("search not applied");
    };
    assert!(state.rows.is_empty());
    assert_eq!(state.total, Some(0));
    assert!(!state.links.has_next());
}

#[tokio::test]
async fn test_search_failure_sets_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fhir/Patient"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let form = SearchForm::new(client_for(&server));
    let SearchOutcome::Applied(state) = form.load_initial().await else {
        panic!("search not applied");
    };
    assert_eq!(state.status.error(), Some("Request failed: 500 Internal Server Error"));
}

#[tokio::test]
async fn test_last_search_wins() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/fhir/Patient"))
        .and(query_param("family", "Slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(bundle_json(vec![patient_json("slow", &["S"], "Slow")], vec![]))
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/fhir/Patient"))
        .and(query_param("family", "Fast"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(bundle_json(vec![patient_json("fast", &["F"], "Fast")], vec![])),
        )
        .mount(&server)
        .await;

    let form = SearchForm::new(client_for(&server));
    let slow = SearchQuery::new("Patient").param("family", "Slow");
    let fast = SearchQuery::new("Patient").param("family", "Fast");

    let (first, second) = tokio::join!(form.run(slow.into()), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        form.run(fast.clone().into()).await
    });

    assert_eq!(first, SearchOutcome::Superseded);
    assert!(matches!(second, SearchOutcome::Applied(_)));

    let state = form.state();
    assert_eq!(state.rows.len(), 1);
    assert_eq!(state.rows[0].id.as_deref(), Some("fast"));
    assert_eq!(state.current, Some(fast.into()));
    assert_eq!(state.status, FormStatus::Success);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_last_search_wins_across_threads() {
    let server = MockServer::start().await;
    for (family, delay) in [("Slow", 300), ("Fast", 0)] {
        Mock::given(method("GET"))
            .and(path("/fhir/Patient"))
            .and(query_param("family", family))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(bundle_json(
                        vec![patient_json(&family.to_lowercase(), &["X"], family)],
                        vec![],
                    ))
                    .set_delay(Duration::from_millis(delay)),
            )
            .mount(&server)
            .await;
    }

    let form = Arc::new(SearchForm::new(client_for(&server)));
    let slow = SearchQuery::new("Patient").param("family", "Slow");
    let fast = SearchQuery::new("Patient").param("family", "Fast");

    let first = tokio::spawn({
        let form = Arc::clone(&form);
        async move { form.run(slow.into()).await }
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    let second = tokio::spawn({
        let form = Arc::clone(&form);
        let fast = fast.clone();
        async move { form.run(fast.into()).await }
    });

    let (first, second) = (first.await.unwrap(), second.await.unwrap());
    assert_eq!(first, SearchOutcome::Superseded);
    assert!(matches!(second, SearchOutcome::Applied(_)));

    let state = form.state();
    assert_eq!(state.rows[0].id.as_deref(), Some("fast"));
    assert_eq!(state.current, Some(fast.into()));
    assert_eq!(state.status, FormStatus::Success);
}
