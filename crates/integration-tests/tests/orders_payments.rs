//! Integration tests for orders and payments.
//!
//! Run with: cargo test -p dragonfruit-integration-tests -- --ignored

use dragonfruit_integration_tests::{
    assert_envelope, base_url, client, join_customer, unique_email,
};
use serde_json::{Value, json};

async fn create_order(client: &reqwest::Client, token: &str, total_price: &str) -> Value {
    let resp = client
        .post(format!("{}/customer/orders", base_url()))
        .bearer_auth(token)
        .json(&json!({ "total_price": total_price }))
        .send()
        .await
        .expect("order create failed");
    assert_eq!(resp.status(), 200);
    resp.json().await.expect("order not JSON")
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_sparse_status_patch_leaves_other_status_untouched() {
    let client = client();
    let (token, _) = join_customer(&client, &unique_email("order-patch")).await;

    let order = create_order(&client, &token, "10000").await;
    let order_id = order["id"].as_str().expect("order id");
    assert_eq!(order["order_status"].as_str(), Some("pending"));
    assert_eq!(order["payment_status"].as_str(), Some("pending"));
    assert_eq!(order["total_price"].as_str(), Some("10000"));

    // Patch payment_status only
    let resp = client
        .put(format!("{}/customer/orders/{order_id}", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "payment_status": "paid" }))
        .send()
        .await
        .expect("order update failed");
    assert_eq!(resp.status(), 200);

    // Re-fetch: order_status unchanged, payment_status moved
    let resp = client
        .get(format!("{}/customer/orders/{order_id}", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("order fetch failed");
    let fetched: Value = resp.json().await.expect("order not JSON");
    assert_eq!(fetched["order_status"].as_str(), Some("pending"));
    assert_eq!(fetched["payment_status"].as_str(), Some("paid"));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_order_listing_filters_and_envelope() {
    let client = client();
    let (token, customer_id) = join_customer(&client, &unique_email("order-list")).await;

    for total in ["1000", "2000", "3000"] {
        create_order(&client, &token, total).await;
    }

    // Filter predicate soundness: every element matches the filter
    let resp = client
        .patch(format!("{}/customer/orders", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "order_status": "pending", "limit": 2 }))
        .send()
        .await
        .expect("order list failed");
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.expect("list not JSON");
    assert_envelope(&body, 1, 2);
    assert_eq!(body["pagination"]["records"].as_u64(), Some(3));
    assert_eq!(body["pagination"]["pages"].as_u64(), Some(2));

    let data = body["data"].as_array().expect("data array");
    assert_eq!(data.len(), 2);
    for order in data {
        assert_eq!(order["order_status"].as_str(), Some("pending"));
        assert_eq!(order["customer_id"].as_str(), Some(customer_id.as_str()));
    }
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_order_ownership_is_enforced() {
    let client = client();
    let (owner_token, _) = join_customer(&client, &unique_email("order-a")).await;
    let (intruder_token, _) = join_customer(&client, &unique_email("order-b")).await;

    let order = create_order(&client, &owner_token, "5000").await;
    let order_id = order["id"].as_str().expect("order id");

    let resp = client
        .put(format!("{}/customer/orders/{order_id}", base_url()))
        .bearer_auth(&intruder_token)
        .json(&json!({ "order_status": "cancelled" }))
        .send()
        .await
        .expect("intruder update failed");
    assert_eq!(resp.status(), 403, "foreign order update must be forbidden");

    let resp = client
        .get(format!("{}/customer/orders/{order_id}", base_url()))
        .bearer_auth(&intruder_token)
        .send()
        .await
        .expect("intruder fetch failed");
    assert_eq!(resp.status(), 403, "foreign order fetch must be forbidden");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_payment_lifecycle_under_order() {
    let client = client();
    let (token, _) = join_customer(&client, &unique_email("payment")).await;

    let order = create_order(&client, &token, "7500").await;
    let order_id = order["id"].as_str().expect("order id");

    let resp = client
        .post(format!("{}/customer/orders/{order_id}/payments", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "method": "card", "amount": "7500" }))
        .send()
        .await
        .expect("payment create failed");
    assert_eq!(resp.status(), 200);
    let payment: Value = resp.json().await.expect("payment not JSON");
    assert_eq!(payment["status"].as_str(), Some("pending"));
    assert_eq!(payment["paid_at"], Value::Null);
    let payment_id = payment["id"].as_str().expect("payment id");

    // Settle it; paid_at is set explicitly by the caller
    let resp = client
        .put(format!(
            "{}/customer/orders/{order_id}/payments/{payment_id}",
            base_url()
        ))
        .bearer_auth(&token)
        .json(&json!({ "status": "paid", "paid_at": "2026-08-06T00:00:00Z" }))
        .send()
        .await
        .expect("payment update failed");
    assert_eq!(resp.status(), 200);
    let settled: Value = resp.json().await.expect("payment not JSON");
    assert_eq!(settled["status"].as_str(), Some("paid"));
    assert_eq!(settled["paid_at"].as_str(), Some("2026-08-06T00:00:00Z"));

    let resp = client
        .patch(format!("{}/customer/orders/{order_id}/payments", base_url()))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .expect("payment list failed");
    let body: Value = resp.json().await.expect("list not JSON");
    assert_eq!(body["pagination"]["records"].as_u64(), Some(1));
}
