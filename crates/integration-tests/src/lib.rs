//! Integration tests for Dragonfruit Market.
//!
//! These tests drive a running API server over HTTP. They require:
//! - A running `PostgreSQL` database with migrations applied
//!   (`df-cli migrate`)
//! - The API server running (`cargo run -p dragonfruit-api`)
//! - For admin flows: an admin account (`df-cli admin create`) with its
//!   credentials in `ADMIN_EMAIL` / `ADMIN_PASSWORD`
//!
//! Every test is `#[ignore]`d so `cargo test` stays hermetic; run them with
//! `cargo test -p dragonfruit-integration-tests -- --ignored`.

use reqwest::Client;
use serde_json::{Value, json};
use uuid::Uuid;

/// Base URL for the API (configurable via environment).
#[must_use]
pub fn base_url() -> String {
    std::env::var("MARKET_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Plain HTTP client.
#[must_use]
pub fn client() -> Client {
    Client::new()
}

/// A unique email per test run so reruns never collide.
#[must_use]
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@test.dragonfruit.example", Uuid::new_v4())
}

/// Join a fresh customer; returns (token, customer id).
pub async fn join_customer(client: &Client, email: &str) -> (String, String) {
    let resp = client
        .post(format!("{}/auth/customers/join", base_url()))
        .json(&json!({
            "email": email,
            "password": "correct horse battery",
            "nickname": "tester",
            "full_name": "Test Customer",
        }))
        .send()
        .await
        .expect("join request failed");
    assert_eq!(resp.status(), 200, "customer join should succeed");

    let body: Value = resp.json().await.expect("join response not JSON");
    (
        body["token"].as_str().expect("token missing").to_owned(),
        body["customer"]["id"]
            .as_str()
            .expect("customer id missing")
            .to_owned(),
    )
}

/// Join a fresh seller; returns (token, seller id).
pub async fn join_seller(client: &Client, email: &str) -> (String, String) {
    let resp = client
        .post(format!("{}/auth/sellers/join", base_url()))
        .json(&json!({
            "email": email,
            "password": "correct horse battery",
            "nickname": "test-seller",
        }))
        .send()
        .await
        .expect("join request failed");
    assert_eq!(resp.status(), 200, "seller join should succeed");

    let body: Value = resp.json().await.expect("join response not JSON");
    (
        body["token"].as_str().expect("token missing").to_owned(),
        body["seller"]["id"]
            .as_str()
            .expect("seller id missing")
            .to_owned(),
    )
}

/// Log the environment-configured admin in; returns its token.
pub async fn admin_token(client: &Client) -> String {
    let email = std::env::var("ADMIN_EMAIL").expect("ADMIN_EMAIL not set");
    let password = std::env::var("ADMIN_PASSWORD").expect("ADMIN_PASSWORD not set");

    let resp = client
        .post(format!("{}/auth/admins/login", base_url()))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("admin login request failed");
    assert_eq!(resp.status(), 200, "admin login should succeed");

    let body: Value = resp.json().await.expect("login response not JSON");
    body["token"].as_str().expect("token missing").to_owned()
}

/// Create a channel + section pair for sale tests; returns (channel_id,
/// section_id). Codes are unique per call.
pub async fn create_channel_and_section(client: &Client, admin_token: &str) -> (String, String) {
    let code = format!("ch-{}", Uuid::new_v4());
    let resp = client
        .post(format!("{}/admin/channels", base_url()))
        .bearer_auth(admin_token)
        .json(&json!({ "code": code, "name": "Test Channel" }))
        .send()
        .await
        .expect("channel create request failed");
    assert_eq!(resp.status(), 200, "channel create should succeed");
    let channel: Value = resp.json().await.expect("channel response not JSON");
    let channel_id = channel["id"].as_str().expect("channel id").to_owned();

    let resp = client
        .post(format!("{}/admin/channels/{channel_id}/sections", base_url()))
        .bearer_auth(admin_token)
        .json(&json!({ "code": format!("sec-{}", Uuid::new_v4()), "name": "Test Section" }))
        .send()
        .await
        .expect("section create request failed");
    assert_eq!(resp.status(), 200, "section create should succeed");
    let section: Value = resp.json().await.expect("section response not JSON");

    (channel_id, section["id"].as_str().expect("section id").to_owned())
}

/// Create a sale under the given seller; returns its id.
pub async fn create_sale(
    client: &Client,
    seller_token: &str,
    channel_id: &str,
    section_id: &str,
) -> String {
    let resp = client
        .post(format!("{}/seller/sales", base_url()))
        .bearer_auth(seller_token)
        .json(&json!({
            "channel_id": channel_id,
            "section_id": section_id,
            "code": "SKU-1",
            "name": "Test Sale",
            "price": "10000",
            "status": "active",
        }))
        .send()
        .await
        .expect("sale create request failed");
    assert_eq!(resp.status(), 200, "sale create should succeed");

    let sale: Value = resp.json().await.expect("sale response not JSON");
    sale["id"].as_str().expect("sale id").to_owned()
}

/// Assert the pagination envelope invariant: `pages == max(1,
/// ceil(records/limit))` and `current`/`limit` echo the request.
pub fn assert_envelope(body: &Value, expected_current: u64, expected_limit: u64) {
    let pagination = &body["pagination"];
    let records = pagination["records"].as_u64().expect("records");
    let limit = pagination["limit"].as_u64().expect("limit");
    let pages = pagination["pages"].as_u64().expect("pages");

    assert_eq!(pagination["current"].as_u64(), Some(expected_current));
    assert_eq!(limit, expected_limit);
    assert_eq!(pages, records.div_ceil(limit).max(1));
}
