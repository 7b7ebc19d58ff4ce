use thiserror::Error;

/// Transport or query failure from the data layer (database or object storage).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("storage transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("storage request rejected with status {0}")]
    Rejected(u16),
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}

/// Input failed coercion at the boundary, before any write was attempted.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("unknown {field} code `{value}`")]
    UnknownCode { field: &'static str, value: String },
}

/// Identity reconciliation failure during sign-in. Creation failures are
/// fatal to the attempt; metadata refresh failures are tolerated upstream
/// and never reach this type.
#[derive(Debug, Error)]
pub enum SignInError {
    #[error("failed to look up user record: {0}")]
    Lookup(#[source] StoreError),
    #[error("failed to create user record: {0}")]
    Create(#[source] StoreError),
}
