use diesel_async::pooled_connection::deadpool::PoolError;

/// Errors surfaced by the read/write contracts. The HTTP layer maps
/// `NotFound` and `Validation` to client errors; everything else is a
/// server error. No-data outcomes (empty rankings, zero metrics) are not
/// errors by policy and never reach this type.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(&'static str),

    #[error("invalid parameter: {0}")]
    Validation(String),

    #[error(transparent)]
    Database(#[from] diesel::result::Error),

    #[error(transparent)]
    Pool(#[from] PoolError),
}
