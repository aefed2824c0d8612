//! Service-level coverage for the users endpoints, backed by the in-memory
//! store.

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::InMemoryUserStore;
use crate::domain::user::{DEFAULT_ABOUT, DEFAULT_PHOTOURL};

fn test_state() -> web::Data<HttpState> {
    web::Data::new(HttpState::new(Arc::new(InMemoryUserStore::default())))
}

fn test_app(
    state: web::Data<HttpState>,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(state)
        .service(signup)
        .service(fetch_user)
        .service(feed)
        .service(update_user)
        .service(delete_user)
}

fn alice_payload() -> Value {
    json!({
        "firstName": "Alice",
        "email": "a@example.com",
        "password": "Str0ng!Pass",
        "age": 30,
    })
}

async fn signup_alice<S>(app: &S) -> Value
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let request = actix_test::TestRequest::post()
        .uri("/signup")
        .set_json(alice_payload())
        .to_request();
    let response = actix_test::call_service(app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    actix_test::read_body_json(response).await
}

#[actix_web::test]
async fn signup_returns_created_record_with_defaults() {
    let app = actix_test::init_service(test_app(test_state())).await;
    let body = signup_alice(&app).await;

    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some("User created successfully")
    );
    let user = body.get("user").expect("user in response");
    assert_eq!(user.get("firstName").and_then(Value::as_str), Some("Alice"));
    assert_eq!(user.get("lastName").and_then(Value::as_str), Some(""));
    assert_eq!(
        user.get("about").and_then(Value::as_str),
        Some(DEFAULT_ABOUT)
    );
    assert_eq!(
        user.get("photourl").and_then(Value::as_str),
        Some(DEFAULT_PHOTOURL)
    );
    assert_eq!(
        user.get("skills").and_then(Value::as_array).map(Vec::len),
        Some(0)
    );
    assert!(user.get("id").and_then(Value::as_str).is_some());
    assert!(user.get("createdAt").and_then(Value::as_str).is_some());
    assert!(user.get("updatedAt").and_then(Value::as_str).is_some());
}

#[actix_web::test]
async fn signup_rejects_weak_password_and_persists_nothing() {
    let app = actix_test::init_service(test_app(test_state())).await;
    let request = actix_test::TestRequest::post()
        .uri("/signup")
        .set_json(json!({
            "firstName": "Alice",
            "email": "a@example.com",
            "password": "weakpass",
            "age": 30,
        }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("code").and_then(Value::as_str),
        Some("invalid_request")
    );

    let feed_res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/feed").to_request(),
    )
    .await;
    let users: Value = actix_test::read_body_json(feed_res).await;
    assert_eq!(users.as_array().map(Vec::len), Some(0));
}

#[actix_web::test]
async fn signup_without_a_body_reports_the_first_missing_field() {
    let app = actix_test::init_service(test_app(test_state())).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post().uri("/signup").to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some("missing required field: firstName")
    );
}

#[actix_web::test]
async fn signup_rejects_duplicate_email_and_keeps_the_original() {
    let app = actix_test::init_service(test_app(test_state())).await;
    signup_alice(&app).await;

    let request = actix_test::TestRequest::post()
        .uri("/signup")
        .set_json(json!({
            "firstName": "Mallory",
            "email": "a@example.com",
            "password": "An0ther!Pass",
            "age": 44,
        }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    let details = body.get("details").expect("details");
    assert_eq!(
        details.get("code").and_then(Value::as_str),
        Some("duplicate_email")
    );

    let fetch_res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/users")
            .set_json(json!({ "email": "a@example.com" }))
            .to_request(),
    )
    .await;
    let stored: Value = actix_test::read_body_json(fetch_res).await;
    assert_eq!(
        stored.get("firstName").and_then(Value::as_str),
        Some("Alice")
    );
}

#[actix_web::test]
async fn fetch_user_returns_the_stored_record() {
    let app = actix_test::init_service(test_app(test_state())).await;
    let created = signup_alice(&app).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/users")
            .set_json(json!({ "email": "a@example.com" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(&body, created.get("user").expect("created user"));
}

#[actix_web::test]
async fn fetch_user_without_email_is_a_bad_request() {
    let app = actix_test::init_service(test_app(test_state())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/users").to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some("Email is required")
    );
}

#[actix_web::test]
async fn fetch_user_with_unknown_email_is_not_found() {
    let app = actix_test::init_service(test_app(test_state())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/users")
            .set_json(json!({ "email": "nobody@example.com" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some("No user found")
    );
}

#[actix_web::test]
async fn feed_lists_every_user() {
    let app = actix_test::init_service(test_app(test_state())).await;
    signup_alice(&app).await;
    let request = actix_test::TestRequest::post()
        .uri("/signup")
        .set_json(json!({
            "firstName": "Bob",
            "email": "b@example.com",
            "password": "An0ther!Pass",
            "age": 25,
        }))
        .to_request();
    let response = actix_test::call_service(&app, request).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let feed_res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri("/feed").to_request(),
    )
    .await;
    assert_eq!(feed_res.status(), StatusCode::OK);
    let users: Value = actix_test::read_body_json(feed_res).await;
    assert_eq!(users.as_array().map(Vec::len), Some(2));
}

fn created_user_id(body: &Value) -> String {
    body.get("user")
        .and_then(|user| user.get("id"))
        .and_then(Value::as_str)
        .expect("created user id")
        .to_owned()
}

#[actix_web::test]
async fn update_rejects_fields_outside_the_allow_list() {
    let app = actix_test::init_service(test_app(test_state())).await;
    let created = signup_alice(&app).await;
    let id = created_user_id(&created);

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("/user/{id}"))
            .set_json(json!({ "skills": ["go", "rust"] }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some("Invalid update fields")
    );

    // The whole request was rejected; nothing changed.
    let fetch_res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/users")
            .set_json(json!({ "email": "a@example.com" }))
            .to_request(),
    )
    .await;
    let stored: Value = actix_test::read_body_json(fetch_res).await;
    assert_eq!(&stored, created.get("user").expect("created user"));
}

#[actix_web::test]
async fn update_rejects_mixed_allowed_and_disallowed_keys() {
    let app = actix_test::init_service(test_app(test_state())).await;
    let created = signup_alice(&app).await;
    let id = created_user_id(&created);

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("/user/{id}"))
            .set_json(json!({ "firstName": "Alicia", "email": "new@example.com" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let fetch_res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/users")
            .set_json(json!({ "email": "a@example.com" }))
            .to_request(),
    )
    .await;
    let stored: Value = actix_test::read_body_json(fetch_res).await;
    assert_eq!(
        stored.get("firstName").and_then(Value::as_str),
        Some("Alice")
    );
}

#[actix_web::test]
async fn update_applies_allowed_fields() {
    let app = actix_test::init_service(test_app(test_state())).await;
    let created = signup_alice(&app).await;
    let id = created_user_id(&created);

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("/user/{id}"))
            .set_json(json!({ "firstName": "Alicia", "age": 31 }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some("User updated successfully")
    );
    let user = body.get("user").expect("updated user");
    assert_eq!(
        user.get("firstName").and_then(Value::as_str),
        Some("Alicia")
    );
    assert_eq!(user.get("age").and_then(Value::as_i64), Some(31));
    // Untouched fields survive.
    assert_eq!(
        user.get("email").and_then(Value::as_str),
        Some("a@example.com")
    );
}

#[actix_web::test]
async fn update_with_an_empty_body_succeeds_without_changes() {
    let app = actix_test::init_service(test_app(test_state())).await;
    let created = signup_alice(&app).await;
    let id = created_user_id(&created);

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("/user/{id}"))
            .set_json(json!({}))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    let user = body.get("user").expect("user in response");
    assert_eq!(
        user.get("firstName").and_then(Value::as_str),
        Some("Alice")
    );
}

#[actix_web::test]
async fn update_validation_failure_is_an_internal_error() {
    let app = actix_test::init_service(test_app(test_state())).await;
    let created = signup_alice(&app).await;
    let id = created_user_id(&created);

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("/user/{id}"))
            .set_json(json!({ "password": "weak" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some("Error updating user")
    );
}

#[actix_web::test]
async fn update_with_unknown_id_is_not_found() {
    let app = actix_test::init_service(test_app(test_state())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri("/user/3fa85f64-5717-4562-b3fc-2c963f66afa6")
            .set_json(json!({ "firstName": "Alicia" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some("User not found")
    );
}

#[actix_web::test]
async fn update_with_malformed_id_is_an_internal_error() {
    let app = actix_test::init_service(test_app(test_state())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri("/user/not-a-uuid")
            .set_json(json!({ "firstName": "Alicia" }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[actix_web::test]
async fn delete_removes_the_record_and_returns_its_snapshot() {
    let app = actix_test::init_service(test_app(test_state())).await;
    let created = signup_alice(&app).await;
    let id = created_user_id(&created);

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri(&format!("/user/{id}"))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some("User deleted successfully")
    );
    assert_eq!(body.get("user"), created.get("user"));

    let fetch_res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/users")
            .set_json(json!({ "email": "a@example.com" }))
            .to_request(),
    )
    .await;
    assert_eq!(fetch_res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn delete_with_unknown_id_is_not_found() {
    let app = actix_test::init_service(test_app(test_state())).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete()
            .uri("/user/3fa85f64-5717-4562-b3fc-2c963f66afa6")
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = actix_test::read_body_json(response).await;
    assert_eq!(
        body.get("message").and_then(Value::as_str),
        Some("No user found")
    );
}
