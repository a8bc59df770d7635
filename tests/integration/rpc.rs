// tests/integration/rpc.rs

use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use serde_json::{json, Value};

use crate::common::{app, Caller, TestApp};

async fn query(app: &TestApp, caller: &Caller, procedure: &str, input: Value) -> axum_test::TestResponse {
    app.server
        .get(&format!("/api/trpc/{}", procedure))
        .add_query_param("input", input.to_string())
        .add_header(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", caller.token)).unwrap(),
        )
        .await
}

async fn mutate(app: &TestApp, caller: &Caller, procedure: &str, input: Value) -> axum_test::TestResponse {
    app.post(caller, &format!("/api/trpc/{}", procedure), input).await
}

fn data(response: &axum_test::TestResponse) -> Value {
    response.json::<Value>()["result"]["data"].clone()
}

#[tokio::test]
async fn organization_add_then_ticket_round_trip() {
    let app = app();
    let caller = app.sign_in("owner@example.com").await;

    let response = mutate(&app, &caller, "organization.add", json!({ "name": "Acme" })).await;
    response.assert_status_ok();
    let organization = data(&response);
    assert!(organization.is_string());

    let me = data(&query(&app, &caller, "user.me", Value::Null).await);
    assert_eq!(me["admin"], true);
    assert_eq!(me["settings"]["organization"], organization);

    let project = data(&mutate(&app, &caller, "project.add", json!({ "name": "Website" })).await);
    let status = data(&mutate(&app, &caller, "ticket.status.add", json!({ "value": "Open", "colour": "green" })).await);

    let ticket = data(
        &mutate(
            &app,
            &caller,
            "ticket.add",
            json!({ "projectId": project["id"], "title": "Crash", "description": "On save", "ticketStatusId": status["id"] }),
        )
        .await,
    );
    assert!(ticket.is_string());

    let detail = data(&query(&app, &caller, "ticket.get", json!({ "id": ticket })).await);
    assert_eq!(detail["ticketStatus"]["value"], "Open");
    assert_eq!(detail["history"][0]["newColour"], "green");

    let statuses = data(&query(&app, &caller, "ticket.status.getAll", Value::Null).await);
    assert_eq!(statuses.as_array().unwrap().len(), 1);

    let comment = data(
        &mutate(&app, &caller, "ticket.comment.add", json!({ "ticketId": ticket, "comment": "Reproduced" })).await,
    );
    assert_eq!(comment["comment"], "Reproduced");
}

#[tokio::test]
async fn wrong_method_and_unknown_procedure() {
    let app = app();
    let caller = app.sign_in("owner@example.com").await;

    let response = query(&app, &caller, "organization.add", json!({ "name": "Acme" })).await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.json::<Value>()["error"]["httpStatus"], 405);

    let response = mutate(&app, &caller, "ticket.getAll", json!({})).await;
    response.assert_status(StatusCode::METHOD_NOT_ALLOWED);

    let response = query(&app, &caller, "ticket.delete", Value::Null).await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn errors_are_wrapped() {
    let app = app();
    let caller = app.sign_in("drifter@example.com").await;

    let response = query(&app, &caller, "ticket.getAll", Value::Null).await;
    response.assert_status(StatusCode::PRECONDITION_FAILED);
    let error = response.json::<Value>()["error"].clone();
    assert_eq!(error["code"], "PRECONDITION_FAILED");
    assert_eq!(error["httpStatus"], 412);

    let response = mutate(&app, &caller, "organization.add", json!({ "name": "" })).await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.json::<Value>()["error"]["issues"][0]["path"], "name");

    let response = app.server.get("/api/trpc/user.me").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(response.json::<Value>()["error"]["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn project_update_role_guard_over_rpc() {
    let app = app();
    let (owner, organization) = app.sign_in_with_organization("owner@example.com", "Acme").await;
    let project = app.create_project(&owner, "Website").await;
    let member = app.sign_in("member@example.com").await;
    app.state.service.add_member(organization, member.id, false).await.unwrap();

    mutate(&app, &member, "project.update", json!({ "id": project, "description": "mine now" }))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    mutate(&app, &owner, "project.addUser", json!({ "id": project, "user": member.id, "manager": true }))
        .await
        .assert_status_ok();

    let updated = data(&mutate(&app, &member, "project.update", json!({ "id": project, "description": "ours" })).await);
    assert_eq!(updated["description"], "ours");

    let team = data(&query(&app, &member, "project.getUsers", json!({ "id": project })).await);
    assert_eq!(team[0]["manager"], true);
}
