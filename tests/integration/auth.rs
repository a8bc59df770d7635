// tests/integration/auth.rs

use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue, StatusCode};
use serde_json::{json, Value};

use crate::common::{app, IDENTITY_SECRET};

#[tokio::test]
async fn callback_issues_a_token_for_a_new_user() {
    let app = app();
    let caller = app.sign_in("ada@example.com").await;

    let response = app.get(&caller, "/api/auth/session").await;
    response.assert_status_ok();
    let session: Value = response.json();
    assert_eq!(session["id"], json!(caller.id));
    assert_eq!(session["email"], "ada@example.com");
    assert_eq!(session["admin"], false);
    assert_eq!(session["pm"], false);
    assert_eq!(session["settings"], json!({}));
}

#[tokio::test]
async fn signing_in_twice_maps_to_the_same_user() {
    let app = app();
    let first = app.sign_in("ada@example.com").await;
    let second = app.sign_in("Ada@Example.com").await;
    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn callback_with_wrong_secret_is_unauthorized() {
    let app = app();
    let response = app
        .server
        .post("/api/auth/callback")
        .add_header(
            HeaderName::from_static("x-identity-secret"),
            HeaderValue::from_static("guess"),
        )
        .json(&json!({ "email": "mallory@example.com" }))
        .await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn callback_rejects_invalid_email() {
    let app = app();
    let response = app
        .server
        .post("/api/auth/callback")
        .add_header(
            HeaderName::from_static("x-identity-secret"),
            HeaderValue::from_static(IDENTITY_SECRET),
        )
        .json(&json!({ "email": "not-an-email" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let issues: Value = response.json();
    assert_eq!(issues[0]["path"], "email");
}

#[tokio::test]
async fn missing_or_bad_token_is_unauthorized() {
    let app = app();

    app.server
        .get("/api/auth/session")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    app.server
        .get("/api/projects/mine")
        .add_header(AUTHORIZATION, HeaderValue::from_static("Bearer not.a.token"))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn token_for_a_vanished_user_is_unauthorized() {
    let app = app();
    let issued = tokio_test::assert_ok!(app.state.tokens.issue(uuid::Uuid::new_v4()));
    app.server
        .get("/api/auth/session")
        .add_header(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", issued.token)).unwrap(),
        )
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}
