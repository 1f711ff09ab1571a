use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TokenError {
    #[error("Secure random source unavailable: {0}")]
    EntropyUnavailable(String),
}
