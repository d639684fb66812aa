use thiserror::Error;

/// ## Description
/// Errors raised while validating records, denom pairs and module parameters.
#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Both assets of a pair cannot be the same denom: {denom}")]
    SameDenoms { denom: String },

    #[error("Denom cannot be empty")]
    EmptyDenom,

    #[error("Invalid twap record for pool {pool_id}: {reason}")]
    InvalidRecord { pool_id: u64, reason: String },

    #[error("Invalid params: {reason}")]
    InvalidParams { reason: String },
}
