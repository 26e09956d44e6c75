//! Admin account creation.
//!
//! Admins have no join endpoint; this command is the only way to mint one.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHasher, SaltString};
use rand::Rng;
use rand::distr::Alphanumeric;

use dragonfruit_api::db::accounts::{AdminRepository, NewAdmin};
use dragonfruit_core::{AdminId, Clock, Email, IdGen, RandomIds, SystemClock};

use super::{CommandError, connect};

const GENERATED_PASSWORD_LENGTH: usize = 24;

/// Create an admin account, generating a password when none is supplied.
#[allow(clippy::print_stdout)]
pub async fn create_account(
    email: &str,
    name: &str,
    password: Option<&str>,
) -> Result<(), CommandError> {
    let email = Email::parse(email).map_err(|e| CommandError::InvalidInput(e.to_string()))?;

    let generated;
    let password = match password {
        Some(p) => p,
        None => {
            generated = random_password();
            &generated
        }
    };

    let salt = SaltString::generate(&mut OsRng);
    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CommandError::InvalidInput(format!("password hashing failed: {e}")))?
        .to_string();

    let pool = connect().await?;
    let admin = AdminRepository::new(&pool)
        .create(NewAdmin {
            id: AdminId::new(RandomIds.new_id()),
            email,
            password_hash,
            name: name.to_owned(),
            now: SystemClock.now(),
        })
        .await?;

    tracing::info!("Created admin {} ({})", admin.name, admin.email);
    println!("admin id: {}", admin.id);
    println!("password: {password}");
    Ok(())
}

fn random_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(GENERATED_PASSWORD_LENGTH)
        .map(char::from)
        .collect()
}
