//! Admin account management commands.
//!
//! # Usage
//!
//! ```bash
//! olive-cli admin create -e admin@example.com -n "Admin Name" -p "a strong password"
//! ```
//!
//! # Environment Variables
//!
//! - `OLIVE_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use sqlx::PgPool;
use thiserror::Error;

use olive_edge_api::services::auth::hash_password;
use olive_edge_core::Email;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// Password hashing failed.
    #[error("Password hashing failed")]
    PasswordHash,

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),
}

/// Create a new admin account.
///
/// # Arguments
///
/// * `email` - Admin's email address
/// * `name` - Admin's display name
/// * `password` - Initial password
///
/// # Returns
///
/// The ID of the created account.
///
/// # Errors
///
/// Returns `AdminError` on invalid input, a duplicate email, or database
/// failure.
pub async fn create_user(email: &str, name: &str, password: &str) -> Result<i32, AdminError> {
    dotenvy::dotenv().ok();

    let email = Email::parse(email).map_err(|e| AdminError::InvalidEmail(e.to_string()))?;
    let password_hash = hash_password(password).map_err(|_| AdminError::PasswordHash)?;

    let database_url = super::database_url().map_err(AdminError::MissingEnvVar)?;

    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(&database_url).await?;

    tracing::info!("Creating admin account: {}", email);
    let (id,): (i32,) = sqlx::query_as(
        r"
        INSERT INTO users (email, name, password_hash, is_admin)
        VALUES ($1, $2, $3, TRUE)
        RETURNING id
        ",
    )
    .bind(email.as_str())
    .bind(name)
    .bind(&password_hash)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e
            && db_err.is_unique_violation()
        {
            return AdminError::UserExists(email.to_string());
        }
        AdminError::Database(e)
    })?;

    Ok(id)
}
