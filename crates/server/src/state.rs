//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StoreConfig;
use crate::services::{MidtransClient, MidtransError, RajaOngkirClient, RajaOngkirError};

/// Error building the shared application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("payment gateway client: {0}")]
    Midtrans(#[from] MidtransError),
    #[error("shipping aggregator client: {0}")]
    RajaOngkir(#[from] RajaOngkirError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StoreConfig,
    pool: PgPool,
    rajaongkir: RajaOngkirClient,
    midtrans: MidtransClient,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Errors
    ///
    /// Returns an error if either external API client fails to build.
    pub fn new(config: StoreConfig, pool: PgPool) -> Result<Self, StateError> {
        let rajaongkir = RajaOngkirClient::new(&config.rajaongkir)?;
        let midtrans = MidtransClient::new(&config.midtrans)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                rajaongkir,
                midtrans,
            }),
        })
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the shipping aggregator client.
    #[must_use]
    pub fn rajaongkir(&self) -> &RajaOngkirClient {
        &self.inner.rajaongkir
    }

    /// Get a reference to the payment gateway client.
    #[must_use]
    pub fn midtrans(&self) -> &MidtransClient {
        &self.inner.midtrans
    }
}
