//! Route handlers.
//!
//! One route per handler. Verb conventions, uniform across the API:
//! GET for detail, PATCH for search/list (filters travel in the JSON body),
//! POST for create, PUT for update, DELETE for delete.
//!
//! Role scoping lives in the path prefix: `/customer/...`, `/seller/...`,
//! `/admin/...` require the matching token; unprefixed paths are public.

pub mod accounts;
pub mod auth;
pub mod boards;
pub mod carts;
pub mod channels;
pub mod coupons;
pub mod ledger;
pub mod orders;
pub mod sales;

use axum::Router;

use crate::state::AppState;

/// Assemble every route group.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::routes())
        .merge(accounts::routes())
        .merge(channels::routes())
        .merge(sales::routes())
        .merge(carts::routes())
        .merge(orders::routes())
        .merge(coupons::routes())
        .merge(ledger::routes())
        .merge(boards::routes())
}
