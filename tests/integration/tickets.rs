// tests/integration/tickets.rs

use axum::http::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::common::app;

fn history_pairs(detail: &Value) -> Vec<(String, String, String)> {
    detail["history"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            (
                h["changeType"].as_str().unwrap().to_string(),
                h["previousValue"].as_str().unwrap().to_string(),
                h["newValue"].as_str().unwrap().to_string(),
            )
        })
        .collect()
}

#[tokio::test]
async fn create_records_one_history_row_per_classification() {
    let app = app();
    let (owner, _) = app.sign_in_with_organization("owner@example.com", "Acme").await;
    let project = app.create_project(&owner, "Website").await;
    let high = app.create_entry(&owner, "ticketPriorities", "High", "#ff0000", 1).await;
    let open = app.create_entry(&owner, "ticketStatuses", "Open", "#00ff00", 1).await;
    let bug = app.create_entry(&owner, "ticketTypes", "Bug", "#0000ff", 1).await;

    let response = app
        .post(
            &owner,
            "/api/tickets",
            json!({
                "projectId": project,
                "title": "Broken footer",
                "description": "Footer link 404s",
                "ticketPriorityId": high,
                "ticketStatusId": open,
                "ticketTypeId": bug,
            }),
        )
        .await;
    response.assert_status(StatusCode::CREATED);
    let id = response.json::<Value>()["id"].as_str().unwrap().to_string();

    let detail: Value = app.get(&owner, &format!("/api/tickets/{}", id)).await.json();
    assert_eq!(detail["title"], "Broken footer");
    assert_eq!(detail["ticketPriority"]["value"], "High");
    assert_eq!(detail["project"]["name"], "Website");
    assert_eq!(detail["creator"]["id"], json!(owner.id));

    let history = detail["history"].as_array().unwrap();
    assert_eq!(history.len(), 3);
    for row in history {
        assert_eq!(row["previousValue"], "Nil");
        assert_eq!(row["previousColour"], "black");
    }
}

#[tokio::test]
async fn low_high_null_produces_three_rows() {
    let app = app();
    let (owner, _) = app.sign_in_with_organization("owner@example.com", "Acme").await;
    let project = app.create_project(&owner, "Website").await;
    let low = app.create_entry(&owner, "ticketPriorities", "Low", "#888888", 3).await;
    let high = app.create_entry(&owner, "ticketPriorities", "High", "#ff0000", 1).await;

    let id = app
        .post(
            &owner,
            "/api/tickets",
            json!({ "projectId": project, "title": "Slow page", "description": "Takes 10s", "ticketPriorityId": low }),
        )
        .await
        .json::<Value>()["id"]
        .as_str()
        .unwrap()
        .to_string();
    let path = format!("/api/tickets/{}", id);

    app.patch(&owner, &path, json!({ "description": "Takes 10s", "ticketPriorityId": high }))
        .await
        .assert_status_ok();
    let response = app.patch(&owner, &path, json!({ "description": "Takes 10s" })).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["ticketPriorityId"], Value::Null);

    let detail: Value = app.get(&owner, &path).await.json();
    assert_eq!(detail["title"], "Slow page");
    let pairs = history_pairs(&detail);
    assert_eq!(pairs.len(), 3);
    for (previous, next) in [("Nil", "Low"), ("Low", "High"), ("High", "Nil")] {
        assert!(pairs.contains(&("Priority".to_string(), previous.to_string(), next.to_string())));
    }
}

#[tokio::test]
async fn description_only_update_records_nothing() {
    let app = app();
    let (owner, _) = app.sign_in_with_organization("owner@example.com", "Acme").await;
    let project = app.create_project(&owner, "Website").await;
    let open = app.create_entry(&owner, "ticketStatuses", "Open", "#00ff00", 1).await;

    let id = app
        .post(
            &owner,
            "/api/tickets",
            json!({ "projectId": project, "title": "Typo", "description": "Hompage", "ticketStatusId": open }),
        )
        .await
        .json::<Value>()["id"]
        .as_str()
        .unwrap()
        .to_string();
    let path = format!("/api/tickets/{}", id);

    app.patch(&owner, &path, json!({ "description": "Homepage", "ticketStatusId": open }))
        .await
        .assert_status_ok();
    let detail: Value = app.get(&owner, &path).await.json();
    assert_eq!(detail["history"].as_array().unwrap().len(), 1);
    assert_eq!(detail["description"], "Homepage");
}

#[tokio::test]
async fn invalid_ticket_input_is_reported_per_field() {
    let app = app();
    let (owner, _) = app.sign_in_with_organization("owner@example.com", "Acme").await;
    let project = app.create_project(&owner, "Website").await;

    let response = app
        .post(&owner, "/api/tickets", json!({ "projectId": project, "title": "", "description": "" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let issues: Value = response.json();
    let paths: Vec<&str> = issues.as_array().unwrap().iter().map(|i| i["path"].as_str().unwrap()).collect();
    assert_eq!(paths, ["description", "title"]);

    app.post(
        &owner,
        "/api/tickets",
        json!({ "projectId": Uuid::new_v4(), "title": "Lost", "description": "No project" }),
    )
    .await
    .assert_status(StatusCode::NOT_FOUND);

    app.post(
        &owner,
        "/api/tickets",
        json!({ "projectId": project, "title": "Odd", "description": "Unknown status", "ticketStatusId": Uuid::new_v4() }),
    )
    .await
    .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn taxonomy_is_listed_by_rank_then_value() {
    let app = app();
    let (owner, _) = app.sign_in_with_organization("owner@example.com", "Acme").await;
    app.create_entry(&owner, "ticketPriorities", "Low", "#888888", 3).await;
    app.create_entry(&owner, "ticketPriorities", "Urgent", "#ff0000", 1).await;
    app.create_entry(&owner, "ticketPriorities", "High", "#ff8800", 1).await;

    let entries: Value = app.get(&owner, "/api/tickets/ticketPriorities").await.json();
    let values: Vec<&str> = entries.as_array().unwrap().iter().map(|e| e["value"].as_str().unwrap()).collect();
    assert_eq!(values, ["High", "Urgent", "Low"]);

    let drifter = app.sign_in("drifter@example.com").await;
    app.get(&drifter, "/api/tickets/ticketStatuses")
        .await
        .assert_status(StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn comments_and_personal_listings() {
    let app = app();
    let (owner, organization) = app.sign_in_with_organization("owner@example.com", "Acme").await;
    let project = app.create_project(&owner, "Website").await;
    let helper = app.sign_in("helper@example.com").await;
    app.state.service.add_member(organization, helper.id, false).await.unwrap();

    let id = app
        .post(
            &owner,
            "/api/tickets",
            json!({ "projectId": project, "title": "Logo", "description": "Blurry", "assignedId": helper.id }),
        )
        .await
        .json::<Value>()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let response = app
        .post(&helper, &format!("/api/tickets/{}/comments", id), json!({ "comment": "On it" }))
        .await;
    response.assert_status(StatusCode::CREATED);
    app.post(&helper, &format!("/api/tickets/{}/comments", id), json!({ "comment": "" }))
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let detail: Value = app.get(&owner, &format!("/api/tickets/{}", id)).await.json();
    assert_eq!(detail["comments"][0]["comment"], "On it");
    assert_eq!(detail["comments"][0]["creator"]["id"], json!(helper.id));
    assert_eq!(detail["assigned"]["id"], json!(helper.id));

    let assigned: Value = app.get(&helper, "/api/tickets/assigned").await.json();
    assert_eq!(assigned.as_array().unwrap().len(), 1);
    let submitted: Value = app.get(&owner, "/api/tickets/submitted").await.json();
    assert_eq!(submitted.as_array().unwrap().len(), 1);
    let none: Value = app.get(&helper, "/api/tickets/submitted").await.json();
    assert!(none.as_array().unwrap().is_empty());

    let all: Value = app.get(&owner, "/api/tickets?archived=false").await.json();
    assert_eq!(all.as_array().unwrap().len(), 1);
    let archived: Value = app.get(&owner, "/api/tickets?archived=true").await.json();
    assert!(archived.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn dashboard_summarizes_the_active_organization() {
    let app = app();
    let (owner, _) = app.sign_in_with_organization("owner@example.com", "Acme").await;
    let project = app.create_project(&owner, "Website").await;
    let urgent = app.create_entry(&owner, "ticketPriorities", "Urgent", "#ff0000", 1).await;
    let open = app.create_entry(&owner, "ticketStatuses", "Open", "#00ff00", 1).await;

    app.post(
        &owner,
        "/api/tickets",
        json!({ "projectId": project, "title": "Outage", "description": "Site down", "ticketPriorityId": urgent, "ticketStatusId": open }),
    )
    .await
    .assert_status(StatusCode::CREATED);

    let response = app.get(&owner, "/api/dashboard").await;
    response.assert_status_ok();
    let dashboard: Value = response.json();
    assert_eq!(dashboard["activeProjects"], 1);
    assert_eq!(dashboard["importantTickets"], 1);
    assert_eq!(dashboard["unresolvedTickets"], 1);
    assert_eq!(dashboard["unassignedTickets"], 1);
    assert_eq!(
        dashboard["projects"][0]["status"],
        json!([{ "key": "Open", "colour": "#00ff00", "value": 1 }])
    );
    assert_eq!(dashboard["projects"][0]["type"], json!([]));
}

#[tokio::test]
async fn malformed_ids_and_filters_are_validation_failures() {
    let app = app();
    let (owner, _) = app.sign_in_with_organization("owner@example.com", "Acme").await;

    let response = app.get(&owner, "/api/tickets/not-a-uuid").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let issues: Value = response.json();
    assert_eq!(issues[0]["code"], "invalid_path");

    let response = app.get(&owner, "/api/tickets?archived=maybe").await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let issues: Value = response.json();
    assert_eq!(issues[0]["code"], "invalid_query");

    app.get(&owner, "/api/projects/42/users")
        .await
        .assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    app.get(&owner, &format!("/api/tickets/{}", Uuid::new_v4()))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}
