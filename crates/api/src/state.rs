//! Application state shared across handlers.

use std::sync::Arc;

use dragonfruit_core::{Clock, IdGen, RandomIds, SystemClock};
use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::middleware::auth::{AuthError, TokenSigner};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration. Time and
/// identifier generation go through the injected [`Clock`] / [`IdGen`] so
/// tests can pin both.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    tokens: TokenSigner,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGen>,
}

impl AppState {
    /// Create a new application state with production capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the token signing key cannot be derived.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, AuthError> {
        Self::with_capabilities(config, pool, Arc::new(SystemClock), Arc::new(RandomIds))
    }

    /// Create application state with explicit clock/id capabilities.
    ///
    /// # Errors
    ///
    /// Returns an error if the token signing key cannot be derived.
    pub fn with_capabilities(
        config: ApiConfig,
        pool: PgPool,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGen>,
    ) -> Result<Self, AuthError> {
        let tokens = TokenSigner::new(config.token_secret(), config.token_ttl_hours)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                tokens,
                clock,
                ids,
            }),
        })
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the token signer/verifier.
    #[must_use]
    pub fn tokens(&self) -> &TokenSigner {
        &self.inner.tokens
    }

    /// Get a reference to the clock capability.
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.inner.clock.as_ref()
    }

    /// Get a reference to the identifier capability.
    #[must_use]
    pub fn ids(&self) -> &dyn IdGen {
        self.inner.ids.as_ref()
    }
}
