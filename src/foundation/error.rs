/// Convenience result type used across Vignette.
pub type VignetteResult<T> = Result<T, VignetteError>;

/// Top-level error taxonomy used by the asset, render, pool and session APIs.
#[derive(thiserror::Error, Debug)]
pub enum VignetteError {
    /// The identifier did not resolve to stored bytes.
    #[error("asset not found: {0}")]
    NotFound(String),

    /// The stored bytes could not be interpreted as an image.
    #[error("decode failure: {0}")]
    DecodeFailure(String),

    /// A requested render size was empty or out of range.
    #[error("invalid size: {0}")]
    InvalidSize(String),

    /// A lifecycle operation was called in a state that does not allow it.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A surface was released twice or released to a pool that does not own it.
    #[error("pool corruption: {0}")]
    PoolCorruption(String),

    /// Invalid user-provided configuration or descriptor values.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VignetteError {
    /// Build a [`VignetteError::NotFound`] value.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Build a [`VignetteError::DecodeFailure`] value.
    pub fn decode_failure(msg: impl Into<String>) -> Self {
        Self::DecodeFailure(msg.into())
    }

    /// Build a [`VignetteError::InvalidSize`] value.
    pub fn invalid_size(msg: impl Into<String>) -> Self {
        Self::InvalidSize(msg.into())
    }

    /// Build a [`VignetteError::InvalidState`] value.
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    /// Build a [`VignetteError::PoolCorruption`] value.
    pub fn pool_corruption(msg: impl Into<String>) -> Self {
        Self::PoolCorruption(msg.into())
    }

    /// Build a [`VignetteError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
