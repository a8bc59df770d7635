// tests/integration/organizations.rs

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{app, app_with_limit};

#[tokio::test]
async fn creating_an_organization_makes_the_caller_its_admin() {
    let app = app();
    let (owner, organization) = app.sign_in_with_organization("owner@example.com", "Acme").await;

    let session: Value = app.get(&owner, "/api/auth/session").await.json();
    assert_eq!(session["settings"]["organization"], json!(organization));
    assert_eq!(session["admin"], true);

    let organizations: Value = app.get(&owner, "/api/organizations").await.json();
    assert_eq!(organizations.as_array().unwrap().len(), 1);
    assert_eq!(organizations[0]["name"], "Acme");
}

#[tokio::test]
async fn empty_name_fails_validation() {
    let app = app();
    let caller = app.sign_in("owner@example.com").await;
    let response = app.post(&caller, "/api/organizations", json!({ "name": "" })).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let issues: Value = response.json();
    assert_eq!(issues[0]["path"], "name");
    assert_eq!(issues[0]["message"], "Name is required");
}

#[tokio::test]
async fn malformed_body_fails_validation() {
    let app = app();
    let caller = app.sign_in("owner@example.com").await;
    let response = app.post(&caller, "/api/organizations", json!({ "name": 42 })).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn switching_sets_the_active_organization_and_needs_membership() {
    let app = app();
    let (owner, first) = app.sign_in_with_organization("owner@example.com", "First").await;
    let second_response = app.post(&owner, "/api/organizations", json!({ "name": "Second" })).await;
    let second: uuid::Uuid = second_response.json::<Value>()["id"].as_str().unwrap().parse().unwrap();

    let response = app
        .put(
            &owner,
            &format!("/api/users/{}/settings/organization", owner.id),
            json!({ "organizationId": first }),
        )
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["organizationId"], json!(first));
    let session: Value = app.get(&owner, "/api/auth/session").await.json();
    assert_eq!(session["settings"]["organization"], json!(first));
    assert_ne!(first, second);

    let outsider = app.sign_in("outsider@example.com").await;
    app.put(
        &outsider,
        &format!("/api/users/{}/settings/organization", outsider.id),
        json!({ "organizationId": first }),
    )
    .await
    .assert_status(StatusCode::FORBIDDEN);

    app.put(
        &outsider,
        &format!("/api/users/{}/settings/organization", owner.id),
        json!({ "organizationId": first }),
    )
    .await
    .assert_status(StatusCode::FORBIDDEN);

    app.put(
        &owner,
        &format!("/api/users/{}/settings/organization", owner.id),
        json!({ "organizationId": uuid::Uuid::new_v4() }),
    )
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = app_with_limit(512);
    let caller = app.sign_in("owner@example.com").await;
    let response = app
        .post(&caller, "/api/organizations", json!({ "name": "x".repeat(4096) }))
        .await;
    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);

    app.post(&caller, "/api/organizations", json!({ "name": "Acme" }))
        .await
        .assert_status(StatusCode::CREATED);
}
