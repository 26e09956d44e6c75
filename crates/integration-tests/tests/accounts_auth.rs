//! Integration tests for accounts and authentication.
//!
//! Run with: cargo test -p dragonfruit-integration-tests -- --ignored

use dragonfruit_integration_tests::{base_url, client, join_customer, unique_email};
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_duplicate_email_join_conflicts() {
    let client = client();
    let email = unique_email("dup-join");
    join_customer(&client, &email).await;

    let resp = client
        .post(format!("{}/auth/customers/join", base_url()))
        .json(&json!({
            "email": email,
            "password": "correct horse battery",
            "nickname": "second",
            "full_name": "Second Customer",
        }))
        .send()
        .await
        .expect("second join failed");
    assert_eq!(resp.status(), 409, "duplicate email join must conflict");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_login_rejects_wrong_password() {
    let client = client();
    let email = unique_email("login");
    join_customer(&client, &email).await;

    let resp = client
        .post(format!("{}/auth/customers/login", base_url()))
        .json(&json!({ "email": email, "password": "not the password" }))
        .send()
        .await
        .expect("login failed");
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_protected_routes_require_matching_role() {
    let client = client();

    // No token at all
    let resp = client
        .patch(format!("{}/customer/carts", base_url()))
        .json(&json!({}))
        .send()
        .await
        .expect("unauthenticated list failed");
    assert_eq!(resp.status(), 401);

    // A customer token is not a seller token
    let (token, _) = join_customer(&client, &unique_email("role")).await;
    let resp = client
        .post(format!("{}/seller/sales", base_url()))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .expect("cross-role create failed");
    assert_eq!(resp.status(), 403);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_profile_patch_distinguishes_null_from_missing() {
    let client = client();
    let (token, _) = join_customer(&client, &unique_email("profile")).await;

    // Set the phone
    let resp = client
        .put(format!("{}/customer/me", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "phone": "010-1234-5678" }))
        .send()
        .await
        .expect("profile update failed");
    assert_eq!(resp.status(), 200);
    let me: Value = resp.json().await.expect("profile not JSON");
    assert_eq!(me["phone"].as_str(), Some("010-1234-5678"));

    // A patch that omits the phone leaves it alone
    let resp = client
        .put(format!("{}/customer/me", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "nickname": "renamed" }))
        .send()
        .await
        .expect("profile update failed");
    let me: Value = resp.json().await.expect("profile not JSON");
    assert_eq!(me["nickname"].as_str(), Some("renamed"));
    assert_eq!(me["phone"].as_str(), Some("010-1234-5678"));

    // An explicit null clears it
    let resp = client
        .put(format!("{}/customer/me", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "phone": null }))
        .send()
        .await
        .expect("profile update failed");
    let me: Value = resp.json().await.expect("profile not JSON");
    assert_eq!(me["phone"], Value::Null);

    // Null on a non-nullable field is rejected
    let resp = client
        .put(format!("{}/customer/me", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "nickname": null }))
        .send()
        .await
        .expect("profile update failed");
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_dates_cross_the_wire_with_trailing_z() {
    let client = client();
    let (token, _) = join_customer(&client, &unique_email("dates")).await;

    let resp = client
        .get(format!("{}/customer/me", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("profile fetch failed");
    let me: Value = resp.json().await.expect("profile not JSON");

    let created_at = me["created_at"].as_str().expect("created_at string");
    assert!(
        created_at.ends_with('Z'),
        "dates must be ISO-8601 with trailing Z, got {created_at}"
    );
}
