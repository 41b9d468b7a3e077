use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckoutError {
    #[error("phone number is required")]
    MissingPhone,
    #[error("validation error: {0}")]
    ValidationError(String),
    #[error("gateway transport error: {0}")]
    TransportError(String),
    #[error("payment rejected: {0}")]
    Rejected(String),
    #[error("payment confirmation timed out")]
    TimedOut,
    #[error("payment cancelled")]
    Cancelled,
    #[error("invalid session state: {0}")]
    InvalidState(String),
}

impl From<reqwest::Error> for CheckoutError {
    fn from(err: reqwest::Error) -> Self {
        Self::TransportError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CheckoutError>;
