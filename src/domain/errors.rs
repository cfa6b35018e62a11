use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Insufficient stock for SKU {sku}")]
    InsufficientStock { sku: String },
    #[error("Cart has already been checked out")]
    CartAlreadyCheckedOut,
    #[error("Internal error: {0}")]
    Internal(String),
}
