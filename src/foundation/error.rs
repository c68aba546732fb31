/// Convenience result type used across the filter system.
pub type FilterResult<T> = Result<T, FilterError>;

/// Error taxonomy for the filter system.
///
/// `Contract` errors are programmer errors such as an unbalanced pop or a texture returned to the
/// wrong pool.
#[derive(thiserror::Error, Debug)]
pub enum FilterError {
    /// Invalid caller-provided data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Broken usage contract between the caller and the filter system.
    #[error("contract violation: {0}")]
    Contract(String),

    /// Surface allocation or binding failed in the backend.
    #[error("surface error: {0}")]
    Surface(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from the backend.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FilterError {
    /// Build a [`FilterError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`FilterError::Contract`] value.
    pub fn contract(msg: impl Into<String>) -> Self {
        Self::Contract(msg.into())
    }

    /// Build a [`FilterError::Surface`] value.
    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    /// Build a [`FilterError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for programmer errors that must never be retried.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::Contract(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
