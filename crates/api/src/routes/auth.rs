//! Join and login handlers.
//!
//! Passwords are hashed with argon2id; successful join/login answers with a
//! bearer token plus the actor profile. Admin accounts are created via the
//! CLI only, so admins get a login route and nothing else.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::password_hash::rand_core::OsRng;
use argon2::Argon2;
use axum::routing::post;
use axum::{Json, Router, extract::State};
use serde::{Deserialize, Serialize};

use dragonfruit_core::{AdminId, CustomerId, Email, Role, SellerId};

use crate::db::accounts::{
    AdminRepository, CustomerRepository, NewCustomer, NewSeller, SellerRepository,
};
use crate::error::{ApiError, Result};
use crate::state::AppState;

use super::accounts::{AdminDto, CustomerDto, SellerDto};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Routes for this module.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/customers/join", post(customer_join))
        .route("/auth/customers/login", post(customer_login))
        .route("/auth/sellers/join", post(seller_join))
        .route("/auth/sellers/login", post(seller_login))
        .route("/auth/admins/login", post(admin_login))
}

/// Hash a password for storage.
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

/// Check a password against a stored hash.
fn verify_password(stored_hash: &str, password: &str) -> bool {
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw).map_err(|e| ApiError::Validation(e.to_string()))
}

fn check_password_strength(password: &str) -> Result<()> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Customer join request.
#[derive(Debug, Deserialize)]
pub struct CustomerJoinBody {
    pub email: String,
    pub password: String,
    pub nickname: String,
    pub full_name: String,
    pub phone: Option<String>,
}

/// Token response for customers.
#[derive(Debug, Serialize)]
pub struct CustomerTokenDto {
    pub token: String,
    pub customer: CustomerDto,
}

/// `POST /auth/customers/join`
async fn customer_join(
    State(state): State<AppState>,
    Json(body): Json<CustomerJoinBody>,
) -> Result<Json<CustomerTokenDto>> {
    let email = parse_email(&body.email)?;
    check_password_strength(&body.password)?;

    let repo = CustomerRepository::new(state.pool());
    if repo.find_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("email already registered".to_owned()));
    }

    let now = state.clock().now();
    let customer = repo
        .create(NewCustomer {
            id: CustomerId::new(state.ids().new_id()),
            email,
            password_hash: hash_password(&body.password)?,
            nickname: body.nickname,
            full_name: body.full_name,
            phone: body.phone,
            now,
        })
        .await?;

    let token = state
        .tokens()
        .issue(customer.id.as_uuid(), Role::Customer, now)?;

    Ok(Json(CustomerTokenDto {
        token,
        customer: customer.into(),
    }))
}

/// Login request, shared by all roles.
#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// `POST /auth/customers/login`
async fn customer_login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<CustomerTokenDto>> {
    let email = parse_email(&body.email)?;
    let repo = CustomerRepository::new(state.pool());

    let credentials = repo
        .credentials_by_email(&email)
        .await?
        .filter(|c| verify_password(&c.password_hash, &body.password))
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_owned()))?;

    let customer = repo
        .find_by_id(CustomerId::new(credentials.id))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_owned()))?;

    let now = state.clock().now();
    let token = state.tokens().issue(credentials.id, Role::Customer, now)?;

    Ok(Json(CustomerTokenDto {
        token,
        customer: customer.into(),
    }))
}

/// Seller join request.
#[derive(Debug, Deserialize)]
pub struct SellerJoinBody {
    pub email: String,
    pub password: String,
    pub nickname: String,
}

/// Token response for sellers.
#[derive(Debug, Serialize)]
pub struct SellerTokenDto {
    pub token: String,
    pub seller: SellerDto,
}

/// `POST /auth/sellers/join`
async fn seller_join(
    State(state): State<AppState>,
    Json(body): Json<SellerJoinBody>,
) -> Result<Json<SellerTokenDto>> {
    let email = parse_email(&body.email)?;
    check_password_strength(&body.password)?;

    let repo = SellerRepository::new(state.pool());
    if repo.find_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict("email already registered".to_owned()));
    }

    let now = state.clock().now();
    let seller = repo
        .create(NewSeller {
            id: SellerId::new(state.ids().new_id()),
            email,
            password_hash: hash_password(&body.password)?,
            nickname: body.nickname,
            now,
        })
        .await?;

    let token = state.tokens().issue(seller.id.as_uuid(), Role::Seller, now)?;

    Ok(Json(SellerTokenDto {
        token,
        seller: seller.into(),
    }))
}

/// `POST /auth/sellers/login`
async fn seller_login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<SellerTokenDto>> {
    let email = parse_email(&body.email)?;
    let repo = SellerRepository::new(state.pool());

    let credentials = repo
        .credentials_by_email(&email)
        .await?
        .filter(|c| verify_password(&c.password_hash, &body.password))
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_owned()))?;

    let seller = repo
        .find_by_id(SellerId::new(credentials.id))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_owned()))?;

    let now = state.clock().now();
    let token = state.tokens().issue(credentials.id, Role::Seller, now)?;

    Ok(Json(SellerTokenDto {
        token,
        seller: seller.into(),
    }))
}

/// Token response for admins.
#[derive(Debug, Serialize)]
pub struct AdminTokenDto {
    pub token: String,
    pub admin: AdminDto,
}

/// `POST /auth/admins/login`
async fn admin_login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<AdminTokenDto>> {
    let email = parse_email(&body.email)?;
    let repo = AdminRepository::new(state.pool());

    let credentials = repo
        .credentials_by_email(&email)
        .await?
        .filter(|c| verify_password(&c.password_hash, &body.password))
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_owned()))?;

    let admin = repo
        .find_by_id(AdminId::new(credentials.id))
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid credentials".to_owned()))?;

    let now = state.clock().now();
    let token = state.tokens().issue(credentials.id, Role::Admin, now)?;

    Ok(Json(AdminTokenDto {
        token,
        admin: admin.into(),
    }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_round_trip() {
        let hash = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password(&hash, "hunter2hunter2"));
        assert!(!verify_password(&hash, "wrong-password"));
    }

    #[test]
    fn test_password_strength_floor() {
        assert!(check_password_strength("short").is_err());
        assert!(check_password_strength("long enough").is_ok());
    }
}
