//! Mileage / deposit ledger handlers.
//!
//! Admins post entries; customers read their own history and balances.

use axum::routing::{get, patch, post};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dragonfruit_core::{
    CustomerId, LedgerDirection, LedgerEntryId, LedgerKind, Money, Page, PageRequest,
};

use crate::db::accounts::CustomerRepository;
use crate::db::ledger::{LedgerFilter, LedgerRepository, NewLedgerEntry};
use crate::error::{ApiError, Result};
use crate::middleware::auth::{AdminAuth, CustomerAuth};
use crate::models::ledger::LedgerEntry;
use crate::state::AppState;

const LEDGER_PAGE_LIMIT: u32 = 20;

/// Routes for this module.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/admin/customers/{customer_id}/ledger", post(create_entry))
        .route("/admin/ledger", patch(admin_list_entries))
        .route("/customer/ledger", patch(list_my_entries))
        .route("/customer/ledger/balance", get(get_my_balance))
}

/// Wire shape of a ledger posting.
#[derive(Debug, Serialize)]
pub struct LedgerEntryDto {
    pub id: LedgerEntryId,
    pub customer_id: CustomerId,
    pub kind: LedgerKind,
    pub direction: LedgerDirection,
    pub amount: Money,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for LedgerEntryDto {
    fn from(entry: LedgerEntry) -> Self {
        Self {
            id: entry.id,
            customer_id: entry.customer_id,
            kind: entry.kind,
            direction: entry.direction,
            amount: entry.amount,
            reason: entry.reason,
            created_at: entry.created_at,
        }
    }
}

/// Ledger entry create request.
#[derive(Debug, Deserialize)]
pub struct LedgerEntryCreateBody {
    pub kind: LedgerKind,
    pub direction: LedgerDirection,
    pub amount: Money,
    pub reason: String,
}

/// `POST /admin/customers/{customer_id}/ledger`
async fn create_entry(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Path(customer_id): Path<CustomerId>,
    Json(body): Json<LedgerEntryCreateBody>,
) -> Result<Json<LedgerEntryDto>> {
    let customer = CustomerRepository::new(state.pool())
        .find_by_id(customer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("customer".to_owned()))?;

    let entry = LedgerRepository::new(state.pool())
        .create(NewLedgerEntry {
            id: LedgerEntryId::new(state.ids().new_id()),
            customer_id: customer.id,
            kind: body.kind,
            direction: body.direction,
            amount: body.amount,
            reason: body.reason,
            now: state.clock().now(),
        })
        .await?;

    Ok(Json(entry.into()))
}

/// Admin ledger listing request; may scope to one customer.
#[derive(Debug, Default, Deserialize)]
pub struct AdminLedgerListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub customer_id: Option<CustomerId>,
    pub kind: Option<LedgerKind>,
    pub direction: Option<LedgerDirection>,
}

/// `PATCH /admin/ledger`
async fn admin_list_entries(
    State(state): State<AppState>,
    AdminAuth(_admin_id): AdminAuth,
    Json(body): Json<AdminLedgerListRequest>,
) -> Result<Json<Page<LedgerEntryDto>>> {
    let resolved = body.page.resolve(LEDGER_PAGE_LIMIT);
    let filter = LedgerFilter {
        customer_id: body.customer_id,
        kind: body.kind,
        direction: body.direction,
    };

    let (records, entries) = LedgerRepository::new(state.pool())
        .search(&filter, resolved)
        .await?;

    Ok(Json(
        Page::new(resolved, records, entries).map(LedgerEntryDto::from),
    ))
}

/// Customer ledger listing request; the owner filter comes from the token.
#[derive(Debug, Default, Deserialize)]
pub struct LedgerListRequest {
    #[serde(flatten)]
    pub page: PageRequest,
    pub kind: Option<LedgerKind>,
    pub direction: Option<LedgerDirection>,
}

/// `PATCH /customer/ledger`
async fn list_my_entries(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Json(body): Json<LedgerListRequest>,
) -> Result<Json<Page<LedgerEntryDto>>> {
    let resolved = body.page.resolve(LEDGER_PAGE_LIMIT);
    let filter = LedgerFilter {
        customer_id: Some(customer_id),
        kind: body.kind,
        direction: body.direction,
    };

    let (records, entries) = LedgerRepository::new(state.pool())
        .search(&filter, resolved)
        .await?;

    Ok(Json(
        Page::new(resolved, records, entries).map(LedgerEntryDto::from),
    ))
}

/// Balance query: which balance to read.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    pub kind: LedgerKind,
}

/// Wire shape of a balance.
#[derive(Debug, Serialize)]
pub struct BalanceDto {
    pub kind: LedgerKind,
    pub balance: Decimal,
}

/// `GET /customer/ledger/balance?kind=mileage`
async fn get_my_balance(
    State(state): State<AppState>,
    CustomerAuth(customer_id): CustomerAuth,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceDto>> {
    let balance = LedgerRepository::new(state.pool())
        .balance(customer_id, query.kind)
        .await?;

    Ok(Json(BalanceDto {
        kind: query.kind,
        balance,
    }))
}
