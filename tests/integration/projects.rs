// tests/integration/projects.rs

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::app;

#[tokio::test]
async fn project_update_requires_admin_or_manager() {
    let app = app();
    let (owner, organization) = app.sign_in_with_organization("owner@example.com", "Acme").await;
    let project = app.create_project(&owner, "Website").await;

    let member = app.sign_in("member@example.com").await;
    app.state.service.add_member(organization, member.id, false).await.unwrap();

    let path = format!("/api/projects/{}", project);
    app.patch(&member, &path, json!({ "description": "hijacked" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.post(&owner, &format!("{}/users", path), json!({ "user": member.id, "manager": true }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = app.patch(&member, &path, json!({ "name": "Website v2", "archived": false })).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["name"], "Website v2");

    let response = app.patch(&owner, &path, json!({ "description": "Relaunch" })).await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["name"], "Website v2");
    assert_eq!(body["description"], "Relaunch");
}

#[tokio::test]
async fn project_update_only_touches_supplied_fields() {
    let app = app();
    let (owner, _) = app.sign_in_with_organization("owner@example.com", "Acme").await;
    let project = app.create_project(&owner, "Website").await;
    let path = format!("/api/projects/{}", project);

    app.patch(&owner, &path, json!({ "description": "Relaunch", "archived": true }))
        .await
        .assert_status_ok();

    let body: Value = app.patch(&owner, &path, json!({ "name": "Website v2" })).await.json();
    assert_eq!(body["archived"], true);
    assert_eq!(body["description"], "Relaunch");

    let body: Value = app.patch(&owner, &path, json!({ "description": null })).await.json();
    assert_eq!(body["description"], Value::Null);
    assert_eq!(body["archived"], true);
    assert_eq!(body["name"], "Website v2");
}

#[tokio::test]
async fn manager_flag_shows_up_in_session() {
    let app = app();
    let (owner, _) = app.sign_in_with_organization("owner@example.com", "Acme").await;
    let project = app.create_project(&owner, "Website").await;
    let helper = app.sign_in("helper@example.com").await;

    let before: Value = app.get(&helper, "/api/auth/session").await.json();
    assert_eq!(before["pm"], false);

    app.post(
        &owner,
        &format!("/api/projects/{}/users", project),
        json!({ "user": helper.id, "manager": true }),
    )
    .await
    .assert_status(StatusCode::CREATED);

    let after: Value = app.get(&helper, "/api/auth/session").await.json();
    assert_eq!(after["pm"], true);
}

#[tokio::test]
async fn team_membership_is_unique_and_removable() {
    let app = app();
    let (owner, _) = app.sign_in_with_organization("owner@example.com", "Acme").await;
    let project = app.create_project(&owner, "Website").await;
    let member = app.sign_in("member@example.com").await;
    let team_path = format!("/api/projects/{}/users", project);

    app.post(&owner, &team_path, json!({ "user": member.id }))
        .await
        .assert_status(StatusCode::CREATED);
    app.post(&owner, &team_path, json!({ "user": member.id }))
        .await
        .assert_status(StatusCode::CONFLICT);
    app.post(&owner, &team_path, json!({ "user": uuid::Uuid::new_v4() }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let team: Value = app.get(&owner, &team_path).await.json();
    assert_eq!(team.as_array().unwrap().len(), 1);
    assert_eq!(team[0]["user"]["id"], json!(member.id));
    assert_eq!(team[0]["manager"], false);

    let mine: Value = app.get(&member, "/api/projects/mine").await.json();
    assert_eq!(mine.as_array().unwrap().len(), 1);

    app.delete(&owner, &team_path, json!({ "user": member.id }))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    app.delete(&owner, &team_path, json!({ "user": member.id }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_admins_see_only_their_projects() {
    let app = app();
    let (owner, organization) = app.sign_in_with_organization("owner@example.com", "Acme").await;
    let website = app.create_project(&owner, "Website").await;
    app.create_project(&owner, "Backoffice").await;

    let member = app.sign_in("member@example.com").await;
    app.state.service.add_member(organization, member.id, false).await.unwrap();
    app.state.service.switch_organization(member.id, organization).await.unwrap();
    app.state.service.add_project_user(website, member.id, false).await.unwrap();

    let all: Value = app.get(&owner, "/api/projects").await.json();
    assert_eq!(all.as_array().unwrap().len(), 2);

    let visible: Value = app.get(&member, "/api/projects").await.json();
    assert_eq!(visible.as_array().unwrap().len(), 1);
    assert_eq!(visible[0]["name"], "Website");
}

#[tokio::test]
async fn project_routes_enforce_guards_and_methods() {
    let app = app();
    let caller = app.sign_in("drifter@example.com").await;

    app.post(&caller, "/api/projects", json!({ "name": "Orphan" }))
        .await
        .assert_status(StatusCode::PRECONDITION_FAILED);

    app.patch(&caller, &format!("/api/projects/{}", uuid::Uuid::new_v4()), json!({}))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    app.put(&caller, "/api/projects", json!({}))
        .await
        .assert_status(StatusCode::METHOD_NOT_ALLOWED);
}
