// tests/integration/common.rs

use std::time::Duration;

use axum::http::{header::AUTHORIZATION, HeaderName, HeaderValue};
use axum_test::{TestResponse, TestServer};
use pmtrack::{auth::TokenIssuer, create_router, AppState, TrackerService};
use serde_json::{json, Value};
use uuid::Uuid;

pub const IDENTITY_SECRET: &str = "integration-identity-secret";

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
}

pub struct Caller {
    pub id: Uuid,
    pub token: String,
}

pub fn app() -> TestApp {
    app_with_limit(1024 * 1024)
}

pub fn app_with_limit(max_request_size: usize) -> TestApp {
    let service = TrackerService::in_memory();
    let tokens = TokenIssuer::hmac(b"integration-jwt-secret", Duration::from_secs(3600));
    let state = AppState::new(service, tokens, Some(IDENTITY_SECRET.to_string()));
    let server = TestServer::new(create_router(state.clone(), max_request_size)).unwrap();
    TestApp { server, state }
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

impl TestApp {
    /// Sign in through the identity callback.
    pub async fn sign_in(&self, email: &str) -> Caller {
        let response = self
            .server
            .post("/api/auth/callback")
            .add_header(
                HeaderName::from_static("x-identity-secret"),
                HeaderValue::from_static(IDENTITY_SECRET),
            )
            .json(&json!({ "email": email, "name": email.split('@').next() }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        Caller {
            id: body["userId"].as_str().unwrap().parse().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Sign in and create an organization, which becomes the caller's active one.
    pub async fn sign_in_with_organization(&self, email: &str, organization: &str) -> (Caller, Uuid) {
        let caller = self.sign_in(email).await;
        let response = self
            .post(&caller, "/api/organizations", json!({ "name": organization }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let id = response.json::<Value>()["id"].as_str().unwrap().parse().unwrap();
        (caller, id)
    }

    pub async fn get(&self, caller: &Caller, path: &str) -> TestResponse {
        self.server.get(path).add_header(AUTHORIZATION, bearer(&caller.token)).await
    }

    pub async fn post(&self, caller: &Caller, path: &str, body: Value) -> TestResponse {
        self.server
            .post(path)
            .add_header(AUTHORIZATION, bearer(&caller.token))
            .json(&body)
            .await
    }

    pub async fn patch(&self, caller: &Caller, path: &str, body: Value) -> TestResponse {
        self.server
            .patch(path)
            .add_header(AUTHORIZATION, bearer(&caller.token))
            .json(&body)
            .await
    }

    pub async fn put(&self, caller: &Caller, path: &str, body: Value) -> TestResponse {
        self.server
            .put(path)
            .add_header(AUTHORIZATION, bearer(&caller.token))
            .json(&body)
            .await
    }

    pub async fn delete(&self, caller: &Caller, path: &str, body: Value) -> TestResponse {
        self.server
            .delete(path)
            .add_header(AUTHORIZATION, bearer(&caller.token))
            .json(&body)
            .await
    }

    pub async fn create_project(&self, caller: &Caller, name: &str) -> Uuid {
        let response = self.post(caller, "/api/projects", json!({ "name": name })).await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["id"].as_str().unwrap().parse().unwrap()
    }

    pub async fn create_entry(&self, caller: &Caller, collection: &str, value: &str, colour: &str, rank: i32) -> Uuid {
        let response = self
            .post(
                caller,
                &format!("/api/tickets/{}", collection),
                json!({ "value": value, "colour": colour, "rank": rank }),
            )
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["id"].as_str().unwrap().parse().unwrap()
    }
}
