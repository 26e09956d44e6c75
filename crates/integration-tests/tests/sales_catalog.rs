//! Integration tests for the catalog and sale listings.
//!
//! Run with: cargo test -p dragonfruit-integration-tests -- --ignored

use dragonfruit_integration_tests::{
    admin_token, base_url, client, create_channel_and_section, create_sale, join_seller,
    unique_email,
};
use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
#[ignore = "Requires running API server, database, and admin credentials"]
async fn test_duplicate_option_group_code_conflicts() {
    let client = client();
    let admin = admin_token(&client).await;
    let (channel_id, section_id) = create_channel_and_section(&client, &admin).await;

    let (seller_token, _) = join_seller(&client, &unique_email("group-seller")).await;
    let sale_id = create_sale(&client, &seller_token, &channel_id, &section_id).await;

    let group = json!({ "code": "X", "name": "Size", "required": true });
    let resp = client
        .post(format!("{}/seller/sales/{sale_id}/option-groups", base_url()))
        .bearer_auth(&seller_token)
        .json(&group)
        .send()
        .await
        .expect("group create failed");
    assert_eq!(resp.status(), 200);

    // Same code under the same sale conflicts
    let resp = client
        .post(format!("{}/seller/sales/{sale_id}/option-groups", base_url()))
        .bearer_auth(&seller_token)
        .json(&group)
        .send()
        .await
        .expect("duplicate group create failed");
    assert_eq!(resp.status(), 409, "duplicate group code must conflict");

    let body: Value = resp.json().await.expect("conflict body not JSON");
    assert_eq!(body["error"].as_str(), Some("conflict"));
}

#[tokio::test]
#[ignore = "Requires running API server, database, and admin credentials"]
async fn test_duplicate_channel_code_conflicts() {
    let client = client();
    let admin = admin_token(&client).await;

    let code = format!("dup-{}", Uuid::new_v4());
    let channel = json!({ "code": code, "name": "Dup Channel" });

    let resp = client
        .post(format!("{}/admin/channels", base_url()))
        .bearer_auth(&admin)
        .json(&channel)
        .send()
        .await
        .expect("channel create failed");
    assert_eq!(resp.status(), 200);

    let resp = client
        .post(format!("{}/admin/channels", base_url()))
        .bearer_auth(&admin)
        .json(&channel)
        .send()
        .await
        .expect("duplicate channel create failed");
    assert_eq!(resp.status(), 409, "duplicate channel code must conflict");
}

#[tokio::test]
#[ignore = "Requires running API server, database, and admin credentials"]
async fn test_sale_mutation_requires_owner() {
    let client = client();
    let admin = admin_token(&client).await;
    let (channel_id, section_id) = create_channel_and_section(&client, &admin).await;

    let (owner_token, _) = join_seller(&client, &unique_email("sale-owner")).await;
    let (intruder_token, _) = join_seller(&client, &unique_email("sale-intruder")).await;
    let sale_id = create_sale(&client, &owner_token, &channel_id, &section_id).await;

    let resp = client
        .put(format!("{}/seller/sales/{sale_id}", base_url()))
        .bearer_auth(&intruder_token)
        .json(&json!({ "name": "hijacked" }))
        .send()
        .await
        .expect("intruder update failed");
    assert_eq!(resp.status(), 403, "foreign sale update must be forbidden");

    let resp = client
        .delete(format!("{}/seller/sales/{sale_id}", base_url()))
        .bearer_auth(&intruder_token)
        .send()
        .await
        .expect("intruder delete failed");
    assert_eq!(resp.status(), 403, "foreign sale delete must be forbidden");
}

#[tokio::test]
#[ignore = "Requires running API server, database, and admin credentials"]
async fn test_sale_listing_filters_apply() {
    let client = client();
    let admin = admin_token(&client).await;
    let (channel_id, section_id) = create_channel_and_section(&client, &admin).await;

    let (seller_token, seller_id) = join_seller(&client, &unique_email("list-seller")).await;
    create_sale(&client, &seller_token, &channel_id, &section_id).await;

    // Public listing filtered by seller and status: every row matches
    let resp = client
        .patch(format!("{}/sales", base_url()))
        .json(&json!({
            "seller_id": seller_id,
            "channel_id": channel_id,
            "status": "active",
        }))
        .send()
        .await
        .expect("sale list failed");
    assert_eq!(resp.status(), 200);

    let body: Value = resp.json().await.expect("list not JSON");
    let data = body["data"].as_array().expect("data array");
    assert_eq!(data.len(), 1);
    for sale in data {
        assert_eq!(sale["seller_id"].as_str(), Some(seller_id.as_str()));
        assert_eq!(sale["channel_id"].as_str(), Some(channel_id.as_str()));
        assert_eq!(sale["status"].as_str(), Some("active"));
    }

    // Unknown sort keys fall back to the default instead of failing
    let resp = client
        .patch(format!("{}/sales", base_url()))
        .json(&json!({ "seller_id": seller_id, "sort": "no-such-key" }))
        .send()
        .await
        .expect("sale list with bad sort failed");
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
#[ignore = "Requires running API server, database, and admin credentials"]
async fn test_sale_update_null_clears_nullable_fields_only() {
    let client = client();
    let admin = admin_token(&client).await;
    let (channel_id, section_id) = create_channel_and_section(&client, &admin).await;

    let (seller_token, _) = join_seller(&client, &unique_email("null-seller")).await;
    let sale_id = create_sale(&client, &seller_token, &channel_id, &section_id).await;

    // Set a description, then clear it with an explicit null
    let resp = client
        .put(format!("{}/seller/sales/{sale_id}", base_url()))
        .bearer_auth(&seller_token)
        .json(&json!({ "description": "limited run" }))
        .send()
        .await
        .expect("sale update failed");
    assert_eq!(resp.status(), 200);
    let sale: Value = resp.json().await.expect("sale not JSON");
    assert_eq!(sale["description"].as_str(), Some("limited run"));

    let resp = client
        .put(format!("{}/seller/sales/{sale_id}", base_url()))
        .bearer_auth(&seller_token)
        .json(&json!({ "description": null }))
        .send()
        .await
        .expect("sale null update failed");
    assert_eq!(resp.status(), 200);
    let sale: Value = resp.json().await.expect("sale not JSON");
    assert_eq!(sale["description"], Value::Null);

    // Null on a non-nullable column is a validation error
    let resp = client
        .put(format!("{}/seller/sales/{sale_id}", base_url()))
        .bearer_auth(&seller_token)
        .json(&json!({ "name": null }))
        .send()
        .await
        .expect("sale bad null update failed");
    assert_eq!(resp.status(), 400, "null name must be rejected");
}
