//! CLI command implementations.

pub mod admin;
pub mod migrate;
pub mod seed;

/// Resolve the database URL from `OLIVE_DATABASE_URL` or `DATABASE_URL`.
///
/// # Errors
///
/// Returns an error message naming the missing variable.
pub(crate) fn database_url() -> Result<String, &'static str> {
    std::env::var("OLIVE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| "OLIVE_DATABASE_URL (or DATABASE_URL) not set")
}
