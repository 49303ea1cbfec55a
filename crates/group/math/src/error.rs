use thiserror::Error;

/// Result type for decimal operations.
pub type MathResult<T> = Result<T, MathError>;

/// Errors raised by decimal parsing and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MathError {
    #[error("invalid decimal string {input:?}: {reason}")]
    InvalidFormat { input: String, reason: String },

    #[error("expected a non-negative decimal, got {0}")]
    Negative(String),

    #[error("expected a positive decimal, got {0}")]
    NonPositive(String),

    #[error("decimal overflow in {0}")]
    Overflow(&'static str),

    #[error("result would be negative: {minuend} - {subtrahend}")]
    WouldBeNegative { minuend: String, subtrahend: String },

    #[error("division by zero")]
    DivisionByZero,
}
