//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::services::notifications::EmailService;
use crate::services::razorpay::RazorpayClient;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`; provides access to the database pool,
/// configuration, the payment gateway client, and the (optional) mailer.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    razorpay: RazorpayClient,
    email: Option<EmailService>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// The mailer is constructed only when SMTP is configured; a relay
    /// configuration error disables email rather than failing startup,
    /// because notifications are best-effort by contract.
    #[must_use]
    pub fn new(config: ApiConfig, pool: PgPool) -> Self {
        let razorpay = RazorpayClient::new(&config.razorpay);

        let email = config.email.as_ref().and_then(|email_config| {
            match EmailService::new(email_config) {
                Ok(service) => Some(service),
                Err(e) => {
                    tracing::warn!(error = %e, "SMTP relay misconfigured, notifications disabled");
                    None
                }
            }
        });

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                razorpay,
                email,
            }),
        }
    }

    /// Get a reference to the configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the Razorpay client.
    #[must_use]
    pub fn razorpay(&self) -> &RazorpayClient {
        &self.inner.razorpay
    }

    /// Get a reference to the mailer, if SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }
}
