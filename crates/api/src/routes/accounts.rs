//! Account handlers: customer self-service and admin customer management.

use axum::http::StatusCode;
use axum::routing::{get, patch};
use axum::{
    Json, Router,
    extract::{Path, State},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use dragonfruit_core::{AdminId, CustomerId, Email, Page, PageRequest, Patch, SellerId};

use crate::db::accounts::{CustomerChanges, CustomerFilter, CustomerRepository, CustomerSortKey};
use crate::error::{ApiError, Result};
use crate::middleware::auth::{AdminAuth, CustomerAuth};
use crate::models::accounts::{Admin, Customer, Seller};
use crate::state::AppState;

const CUSTOMER_PAGE_LIMIT: u32 = 20;

/// Routes for this module.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customer/me", get(get_me).put(update_me))
        .route("/admin/customers", patch(admin_list_customers))
        .route(
            "/admin/customers/{customer_id}",
            get(admin_get_customer).delete(admin_delete_customer),
        )
}

/// Wire shape of a customer, as seen by the customer.
#[derive(Debug, Serialize)]
pub struct CustomerDto {
    pub id: CustomerId,
    pub email: Email,
    pub nickname: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Customer> for CustomerDto {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            email: customer.email,
            nickname: customer.nickname,
            full_name: customer.full_name,
            phone: customer.phone,
            created_at: customer.created_at,
            updated_at: customer.updated_at,
        }
    }
}

/// Wire shape of a customer in the admin listing; includes the soft-delete
/// marker because the listing has an explicit deleted mode.
#[derive(Debug, Serialize)]
pub struct AdminCustomerDto {
    pub id: CustomerId,
    pub email: Email,
    pub nickname: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl From<Customer> for AdminCustomerDto {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            email: customer.email,
            nickname: customer.nickname,
            full_name: customer.full_name,
            phone: customer.phone,
            created_at: customer.created_at,
            updated_at: customer.updated_at,
            deleted_at: customer.deleted_at,
        }
    }
}

/// Wire shape of a seller.
#[derive(Debug, Serialize)]
pub struct SellerDto {
    pub id: SellerId,
    pub email: Email,
    pub nickname: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Seller> for SellerDto {
    fn from(seller: Seller) -> Self {
        Self {
            id: seller.id,
            email: seller.email,
            nickname: seller.nickname,
            created_at: seller.created_at,
            updated_at: seller.updated_at,
        }
    }
}

/// Wire shape of an admin.
#[derive(Debug, Serialize)]
pub struct AdminDto {
    pub id: AdminId,
    pub email: Email,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Admin> for AdminDto {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
            name: admin.name,
            created_at: admin.created_at,
            updated_at: admin.updated_at,
        }
    }
}

/// `GET /customer/me`
async fn get_me(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
) -> Result<Json<CustomerDto>> {
    let customer = CustomerRepository::new(state.pool())
        .find_by_id(customer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("customer".to_owned()))?;

    Ok(Json(customer.into()))
}

/// Sparse profile patch. `nickname` and `full_name` are non-nullable;
/// explicit `null` for them is a validation error, while `phone: null`
/// clears the phone.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerUpdateBody {
    #[serde(default)]
    pub nickname: Patch<String>,
    #[serde(default)]
    pub full_name: Patch<String>,
    #[serde(default)]
    pub phone: Patch<String>,
}

/// `PUT /customer/me`
async fn update_me(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Json(body): Json<CustomerUpdateBody>,
) -> Result<Json<CustomerDto>> {
    if matches!(body.nickname, Patch::Null) {
        return Err(ApiError::Validation("nickname cannot be null".to_owned()));
    }
    if matches!(body.full_name, Patch::Null) {
        return Err(ApiError::Validation("full_name cannot be null".to_owned()));
    }

    let changes = CustomerChanges {
        nickname: body.nickname,
        full_name: body.full_name,
        phone: body.phone,
    };

    let customer = CustomerRepository::new(state.pool())
        .update(customer_id, &changes, state.clock().now())
        .await?;

    Ok(Json(customer.into()))
}

/// Admin customer listing request.
#[derive(Debug, Default, Deserialize)]
pub struct CustomerListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub sort: Option<String>,
    /// OR-ed substring match over email, nickname, and full name.
    pub search: Option<String>,
    /// When true, list soft-deleted accounts instead of live ones.
    #[serde(default)]
    pub deleted: bool,
}

/// `PATCH /admin/customers`
async fn admin_list_customers(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Json(body): Json<CustomerListRequest>,
) -> Result<Json<Page<AdminCustomerDto>>> {
    let resolved = body.page.resolve(CUSTOMER_PAGE_LIMIT);
    let filter = CustomerFilter {
        search: body.search,
        deleted: body.deleted,
    };
    let sort = CustomerSortKey::from_param(body.sort.as_deref());

    let (records, customers) = CustomerRepository::new(state.pool())
        .search(&filter, sort, resolved)
        .await?;

    Ok(Json(
        Page::new(resolved, records, customers).map(AdminCustomerDto::from),
    ))
}

/// `GET /admin/customers/{customer_id}`
async fn admin_get_customer(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<AdminCustomerDto>> {
    let customer = CustomerRepository::new(state.pool())
        .find_by_id(customer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("customer".to_owned()))?;

    Ok(Json(customer.into()))
}

/// `DELETE /admin/customers/{customer_id}`
async fn admin_delete_customer(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Path(customer_id): Path<CustomerId>,
) -> Result<StatusCode> {
    CustomerRepository::new(state.pool())
        .soft_delete(customer_id, state.clock().now())
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
