use reqwest::Client;
use roster::{
    RegistrationForm, RemoteError, Status, Store,
    registration::{NewRegistration, RegistrationPatch},
    validation::validate,
};
use serde_json::{Value, json};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_partial_json, header, method, path, query_param},
};

const ANON_KEY: &str = "anon-key";

fn row(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "team_name": "Null Pointers",
        "team_members": [{ "name": "Asha Rao", "email": "asha@college.edu" }],
        "contact_email": "asha@college.edu",
        "contact_phone": "9876543210",
        "institution": "State College",
        "year_of_study": "2",
        "department": "CSE",
        "problem_statement": "Agentic AI",
        "problem_domain": "Agentic AI",
        "status": status,
        "payment_screenshot": null,
        "created_at": "2025-11-02T10:15:00+00:00"
    })
}

fn new_registration() -> NewRegistration {
    validate(&RegistrationForm {
        team_name: "Null Pointers".to_string(),
        leader_name: "Asha Rao".to_string(),
        email: "asha@college.edu".to_string(),
        phone: "9876543210".to_string(),
        college: "State College".to_string(),
        year: "2".to_string(),
        department: "CSE".to_string(),
        problem_domain: "Agentic AI".to_string(),
        ..Default::default()
    })
    .unwrap()
}

async fn setup() -> (MockServer, Store) {
    let server = MockServer::start().await;
    let store = Store::new(Client::new(), &format!("{}/", server.uri()), ANON_KEY);

    (server, store)
}

#[tokio::test]
async fn test_insert_returns_stored_row() {
    let (server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/registrations"))
        .and(header("apikey", ANON_KEY))
        .and(header("authorization", "Bearer anon-key"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!([{ "team_name": "Null Pointers", "status": "pending" }])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([row("reg-1", "pending")])))
        .expect(1)
        .mount(&server)
        .await;

    let stored = store.insert_registration(&new_registration()).await.unwrap();

    assert_eq!(stored.id, "reg-1");
    assert_eq!(stored.leader_name(), "Asha Rao");
}

#[tokio::test]
async fn test_service_message_is_surfaced() {
    let (server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/registrations"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "code": "42501",
            "message": "new row violates row-level security policy for table \"registrations\""
        })))
        .mount(&server)
        .await;

    let error = store.insert_registration(&new_registration()).await.unwrap_err();

    match error {
        RemoteError::Service { status, message } => {
            assert_eq!(status, 401);
            assert!(message.contains("row-level security"));
        }
        other => panic!("expected service error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_status_update_uses_user_token() {
    let (server, store) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/registrations"))
        .and(query_param("id", "eq.reg-1"))
        .and(header("authorization", "Bearer admin-jwt"))
        .and(body_partial_json(json!({ "status": "approved" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row("reg-1", "approved")])))
        .expect(1)
        .mount(&server)
        .await;

    let updated = store
        .authorized("admin-jwt")
        .update_registration("reg-1", &RegistrationPatch::status(Status::Approved))
        .await
        .unwrap();

    assert_eq!(updated.status, Status::Approved);
}

#[tokio::test]
async fn test_empty_update_is_not_found() {
    let (server, store) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/registrations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let error = store
        .update_registration("missing", &RegistrationPatch::payment("https://x".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(error, RemoteError::NotFound));
}

#[tokio::test]
async fn test_count_reads_content_range() {
    let (server, store) = setup().await;

    Mock::given(method("HEAD"))
        .and(path("/rest/v1/registrations"))
        .and(header("prefer", "count=exact"))
        .respond_with(ResponseTemplate::new(200).insert_header("content-range", "0-24/42"))
        .mount(&server)
        .await;

    assert_eq!(store.count_registrations().await.unwrap(), 42);
}

#[tokio::test]
async fn test_contact_emails_skip_blanks() {
    let (server, store) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/registrations"))
        .and(query_param("select", "contact_email"))
        .and(query_param("contact_email", "not.is.null"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "contact_email": "a@b.co" },
            { "contact_email": "" },
            { "contact_email": null },
            { "contact_email": "c@d.co" }
        ])))
        .mount(&server)
        .await;

    assert_eq!(store.contact_emails().await.unwrap(), vec!["a@b.co", "c@d.co"]);
}

#[tokio::test]
async fn test_upload_object_headers() {
    let (server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path("/storage/v1/object/payments/payment-screenshots/reg-1_1.png"))
        .and(header("content-type", "image/png"))
        .and(header("x-upsert", "false"))
        .and(header("cache-control", "max-age=3600"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Key": "payments/x" })))
        .expect(1)
        .mount(&server)
        .await;

    store
        .upload_object("payments", "payment-screenshots/reg-1_1.png", "image/png", vec![1, 2, 3])
        .await
        .unwrap();

    assert_eq!(
        store.public_url("payments", "payment-screenshots/reg-1_1.png"),
        format!(
            "{}/storage/v1/object/public/payments/payment-screenshots/reg-1_1.png",
            server.uri()
        )
    );
}

#[tokio::test]
async fn test_sign_in_failure_message() {
    let (server, store) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let error = store.sign_in("admin@zayathon.dev", "wrong").await.unwrap_err();

    assert_eq!(error.to_string(), "Invalid login credentials");
}
