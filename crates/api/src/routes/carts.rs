//! Cart handlers. Everything here is scoped to the authenticated customer;
//! the list endpoint forces the owner filter from the token, never from the
//! request body.

use axum::http::StatusCode;
use axum::routing::{get, patch, post, put};
use axum::{
    Json, Router,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dragonfruit_core::{
    CartId, CartItemId, CartStatus, CustomerId, Money, Page, PageRequest, Patch, SaleId,
};

use crate::db::carts::{
    CartChanges, CartFilter, CartItemChanges, CartItemRepository, CartRepository, CartSortKey,
};
use crate::db::sales::SaleRepository;
use crate::error::{ApiError, Result};
use crate::middleware::auth::CustomerAuth;
use crate::models::cart::{Cart, CartItem};
use crate::state::AppState;

const CART_PAGE_LIMIT: u32 = 20;

/// Routes for this module.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customer/carts", post(create_cart).patch(list_carts))
        .route(
            "/customer/carts/{cart_id}",
            get(get_cart).put(update_cart).delete(delete_cart),
        )
        .route(
            "/customer/carts/{cart_id}/items",
            post(create_item).patch(list_items),
        )
        .route(
            "/customer/carts/{cart_id}/items/{item_id}",
            put(update_item).delete(delete_item),
        )
}

/// Wire shape of a cart.
#[derive(Debug, Serialize)]
pub struct CartDto {
    pub id: CartId,
    pub customer_id: CustomerId,
    pub status: CartStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Cart> for CartDto {
    fn from(cart: Cart) -> Self {
        Self {
            id: cart.id,
            customer_id: cart.customer_id,
            status: cart.status,
            note: cart.note,
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}

/// Wire shape of a cart item.
#[derive(Debug, Serialize)]
pub struct CartItemDto {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub sale_id: SaleId,
    pub quantity: i32,
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CartItem> for CartItemDto {
    fn from(item: CartItem) -> Self {
        Self {
            id: item.id,
            cart_id: item.cart_id,
            sale_id: item.sale_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// Cart create request.
#[derive(Debug, Default, Deserialize)]
pub struct CartCreateBody {
    /// New carts default to `active`.
    pub status: Option<CartStatus>,
    pub note: Option<String>,
}

/// `POST /customer/carts`
async fn create_cart(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Json(body): Json<CartCreateBody>,
) -> Result<Json<CartDto>> {
    let cart = CartRepository::new(state.pool())
        .create(
            CartId::new(state.ids().new_id()),
            customer_id,
            body.status.unwrap_or(CartStatus::Active),
            body.note.as_deref(),
            state.clock().now(),
        )
        .await?;

    Ok(Json(cart.into()))
}

/// Cart listing request. There is no `customer_id` field on purpose: the
/// filter always comes from the token.
#[derive(Debug, Default, Deserialize)]
pub struct CartListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub sort: Option<String>,
    pub status: Option<CartStatus>,
}

/// `PATCH /customer/carts`
async fn list_carts(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Json(body): Json<CartListRequest>,
) -> Result<Json<Page<CartDto>>> {
    let resolved = body.page.resolve(CART_PAGE_LIMIT);
    let filter = CartFilter {
        customer_id,
        status: body.status,
    };
    let sort = CartSortKey::from_param(body.sort.as_deref());

    let (records, carts) = CartRepository::new(state.pool())
        .search(&filter, sort, resolved)
        .await?;

    Ok(Json(Page::new(resolved, records, carts).map(CartDto::from)))
}

/// `GET /customer/carts/{cart_id}`
async fn get_cart(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path(cart_id): Path<CartId>,
) -> Result<Json<CartDto>> {
    let cart = require_owned_cart(&state, cart_id, customer_id).await?;
    Ok(Json(cart.into()))
}

/// Sparse patch for a cart. `status` is non-nullable; `note: null` clears
/// the note.
#[derive(Debug, Default, Deserialize)]
pub struct CartUpdateBody {
    #[serde(default)]
    pub status: Patch<CartStatus>,
    #[serde(default)]
    pub note: Patch<String>,
}

/// `PUT /customer/carts/{cart_id}`
async fn update_cart(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path(cart_id): Path<CartId>,
    Json(body): Json<CartUpdateBody>,
) -> Result<Json<CartDto>> {
    if matches!(body.status, Patch::Null) {
        return Err(ApiError::Validation("status cannot be null".to_owned()));
    }

    let cart = require_owned_cart(&state, cart_id, customer_id).await?;

    let changes = CartChanges {
        status: body.status,
        note: body.note,
    };
    let cart = CartRepository::new(state.pool())
        .update(cart.id, &changes, state.clock().now())
        .await?;

    Ok(Json(cart.into()))
}

/// `DELETE /customer/carts/{cart_id}`
async fn delete_cart(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path(cart_id): Path<CartId>,
) -> Result<StatusCode> {
    let cart = require_owned_cart(&state, cart_id, customer_id).await?;

    CartRepository::new(state.pool())
        .soft_delete(cart.id, state.clock().now())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Cart item create request. `cart_id`, when present, must match the path
/// parameter. The unit price is snapshotted from the sale at add time.
#[derive(Debug, Deserialize)]
pub struct CartItemCreateBody {
    pub cart_id: Option<CartId>,
    pub sale_id: SaleId,
    pub quantity: i32,
}

/// `POST /customer/carts/{cart_id}/items`
async fn create_item(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path(cart_id): Path<CartId>,
    Json(body): Json<CartItemCreateBody>,
) -> Result<Json<CartItemDto>> {
    if let Some(body_cart_id) = body.cart_id
        && body_cart_id != cart_id
    {
        return Err(ApiError::Validation(
            "body cart_id does not match the path".to_owned(),
        ));
    }
    if body.quantity <= 0 {
        return Err(ApiError::Validation("quantity must be positive".to_owned()));
    }

    let cart = require_owned_cart(&state, cart_id, customer_id).await?;

    let sale = SaleRepository::new(state.pool())
        .find_by_id(body.sale_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("sale".to_owned()))?;

    let item = CartItemRepository::new(state.pool())
        .create(
            CartItemId::new(state.ids().new_id()),
            cart.id,
            sale.id,
            body.quantity,
            sale.price,
            state.clock().now(),
        )
        .await?;

    Ok(Json(item.into()))
}

/// Cart item listing request.
#[derive(Debug, Default, Deserialize)]
pub struct CartItemListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
}

/// `PATCH /customer/carts/{cart_id}/items`
async fn list_items(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path(cart_id): Path<CartId>,
    Json(body): Json<CartItemListRequest>,
) -> Result<Json<Page<CartItemDto>>> {
    let cart = require_owned_cart(&state, cart_id, customer_id).await?;

    let resolved = body.page.resolve(CART_PAGE_LIMIT);
    let (records, items) = CartItemRepository::new(state.pool())
        .list_by_cart(cart.id, resolved)
        .await?;

    Ok(Json(Page::new(resolved, records, items).map(CartItemDto::from)))
}

/// Sparse patch for a cart item.
#[derive(Debug, Default, Deserialize)]
pub struct CartItemUpdateBody {
    #[serde(default)]
    pub quantity: Patch<i32>,
}

/// `PUT /customer/carts/{cart_id}/items/{item_id}`
async fn update_item(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path((cart_id, item_id)): Path<(CartId, CartItemId)>,
    Json(body): Json<CartItemUpdateBody>,
) -> Result<Json<CartItemDto>> {
    match body.quantity {
        Patch::Null => {
            return Err(ApiError::Validation("quantity cannot be null".to_owned()));
        }
        Patch::Value(quantity) if quantity <= 0 => {
            return Err(ApiError::Validation("quantity must be positive".to_owned()));
        }
        _ => {}
    }

    let cart = require_owned_cart(&state, cart_id, customer_id).await?;
    let repo = CartItemRepository::new(state.pool());
    let item = require_item_in_cart(&repo, item_id, cart.id).await?;

    let changes = CartItemChanges {
        quantity: body.quantity,
    };
    let item = repo.update(item.id, &changes, state.clock().now()).await?;

    Ok(Json(item.into()))
}

/// `DELETE /customer/carts/{cart_id}/items/{item_id}`
///
/// Hard delete. Deleting the same item twice fails the second time with
/// `NotFound`.
async fn delete_item(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Path((cart_id, item_id)): Path<(CartId, CartItemId)>,
) -> Result<StatusCode> {
    let cart = require_owned_cart(&state, cart_id, customer_id).await?;
    let repo = CartItemRepository::new(state.pool());
    let item = require_item_in_cart(&repo, item_id, cart.id).await?;

    repo.delete(item.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Load a live cart and verify the caller owns it.
async fn require_owned_cart(
    state: &AppState,
    cart_id: CartId,
    customer_id: CustomerId,
) -> Result<Cart> {
    let cart = CartRepository::new(state.pool())
        .find_by_id(cart_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("cart".to_owned()))?;

    if cart.customer_id != customer_id {
        return Err(ApiError::Forbidden(
            "cart belongs to a different customer".to_owned(),
        ));
    }
    Ok(cart)
}

/// Load a cart item and verify it hangs off the given cart.
async fn require_item_in_cart(
    repo: &CartItemRepository<'_>,
    item_id: CartItemId,
    cart_id: CartId,
) -> Result<CartItem> {
    let item = repo
        .find_by_id(item_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("cart item".to_owned()))?;

    if item.cart_id != cart_id {
        return Err(ApiError::NotFound("cart item".to_owned()));
    }
    Ok(item)
}
