//! Integration tests for customer carts and cart items.
//!
//! Run with: cargo test -p dragonfruit-integration-tests -- --ignored

use dragonfruit_integration_tests::{
    admin_token, assert_envelope, base_url, client, create_channel_and_section, create_sale,
    join_customer, join_seller, unique_email,
};
use serde_json::{Value, json};

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cart_create_then_list_scoped_to_owner() {
    let client = client();
    let (token, customer_id) = join_customer(&client, &unique_email("cart-owner")).await;

    // Create one active cart
    let resp = client
        .post(format!("{}/customer/carts", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "status": "active" }))
        .send()
        .await
        .expect("cart create failed");
    assert_eq!(resp.status(), 200);
    let cart: Value = resp.json().await.expect("cart not JSON");
    assert_eq!(cart["customer_id"].as_str(), Some(customer_id.as_str()));

    // Listing is forced to the caller: exactly one active cart comes back
    let resp = client
        .patch(format!("{}/customer/carts", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "status": "active" }))
        .send()
        .await
        .expect("cart list failed");
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.expect("list not JSON");
    assert_envelope(&body, 1, 20);
    let data = body["data"].as_array().expect("data array");
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["status"].as_str(), Some("active"));
    assert_eq!(data[0]["customer_id"].as_str(), Some(customer_id.as_str()));
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_deleted_cart_disappears_from_listing() {
    let client = client();
    let (token, _) = join_customer(&client, &unique_email("cart-delete")).await;

    let resp = client
        .post(format!("{}/customer/carts", base_url()))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .expect("cart create failed");
    let cart: Value = resp.json().await.expect("cart not JSON");
    let cart_id = cart["id"].as_str().expect("cart id");

    let resp = client
        .delete(format!("{}/customer/carts/{cart_id}", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("cart delete failed");
    assert_eq!(resp.status(), 204);

    // Soft-deleted rows never appear in the listing
    let resp = client
        .patch(format!("{}/customer/carts", base_url()))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .expect("cart list failed");
    let body: Value = resp.json().await.expect("list not JSON");
    assert!(
        body["data"]
            .as_array()
            .expect("data array")
            .iter()
            .all(|c| c["id"].as_str() != Some(cart_id)),
        "deleted cart must not be listed"
    );

    // Second delete of the same cart fails with not-found
    let resp = client
        .delete(format!("{}/customer/carts/{cart_id}", base_url()))
        .bearer_auth(&token)
        .send()
        .await
        .expect("second cart delete failed");
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
#[ignore = "Requires running API server, database, and admin credentials"]
async fn test_cart_item_double_delete_fails_second_time() {
    let client = client();
    let admin = admin_token(&client).await;
    let (channel_id, section_id) = create_channel_and_section(&client, &admin).await;

    let (seller_token, _) = join_seller(&client, &unique_email("item-seller")).await;
    let sale_id = create_sale(&client, &seller_token, &channel_id, &section_id).await;

    let (token, _) = join_customer(&client, &unique_email("item-owner")).await;

    let resp = client
        .post(format!("{}/customer/carts", base_url()))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .expect("cart create failed");
    let cart: Value = resp.json().await.expect("cart not JSON");
    let cart_id = cart["id"].as_str().expect("cart id");

    // Add a line; the unit price is snapshotted from the sale
    let resp = client
        .post(format!("{}/customer/carts/{cart_id}/items", base_url()))
        .bearer_auth(&token)
        .json(&json!({ "sale_id": sale_id, "quantity": 2 }))
        .send()
        .await
        .expect("item create failed");
    assert_eq!(resp.status(), 200);
    let item: Value = resp.json().await.expect("item not JSON");
    assert_eq!(item["unit_price"].as_str(), Some("10000"));
    let item_id = item["id"].as_str().expect("item id");

    // First delete succeeds, second fails with not-found
    let resp = client
        .delete(format!(
            "{}/customer/carts/{cart_id}/items/{item_id}",
            base_url()
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("item delete failed");
    assert_eq!(resp.status(), 204);

    let resp = client
        .delete(format!(
            "{}/customer/carts/{cart_id}/items/{item_id}",
            base_url()
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("second item delete failed");
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_cart_ownership_is_enforced() {
    let client = client();
    let (owner_token, _) = join_customer(&client, &unique_email("cart-a")).await;
    let (intruder_token, _) = join_customer(&client, &unique_email("cart-b")).await;

    let resp = client
        .post(format!("{}/customer/carts", base_url()))
        .bearer_auth(&owner_token)
        .json(&json!({}))
        .send()
        .await
        .expect("cart create failed");
    let cart: Value = resp.json().await.expect("cart not JSON");
    let cart_id = cart["id"].as_str().expect("cart id");

    let resp = client
        .put(format!("{}/customer/carts/{cart_id}", base_url()))
        .bearer_auth(&intruder_token)
        .json(&json!({ "status": "abandoned" }))
        .send()
        .await
        .expect("intruder update failed");
    assert_eq!(resp.status(), 403, "foreign cart update must be forbidden");
}

#[tokio::test]
#[ignore = "Requires running API server and database"]
async fn test_invalid_quantity_is_rejected() {
    let client = client();
    let (token, _) = join_customer(&client, &unique_email("cart-qty")).await;

    let resp = client
        .post(format!("{}/customer/carts", base_url()))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .expect("cart create failed");
    let cart: Value = resp.json().await.expect("cart not JSON");
    let cart_id = cart["id"].as_str().expect("cart id");

    let resp = client
        .post(format!("{}/customer/carts/{cart_id}/items", base_url()))
        .bearer_auth(&token)
        .json(&json!({
            "sale_id": "00000000-0000-4000-8000-000000000000",
            "quantity": -1,
        }))
        .send()
        .await
        .expect("item create failed");
    assert_eq!(resp.status(), 400, "negative quantity must be rejected");
}
