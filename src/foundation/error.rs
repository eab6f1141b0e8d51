/// Convenience result type used across loopcomp.
pub type LoopcompResult<T> = Result<T, LoopcompError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum LoopcompError {
    /// Invalid caller-provided frames, placements or options.
    #[error("validation error: {0}")]
    Validation(String),

    /// Source bytes could not be decoded into frames.
    #[error("decode error: {0}")]
    Decode(String),

    /// The output encoder rejected the frame sequence.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing options and manifests.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LoopcompError {
    /// Build a [`LoopcompError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LoopcompError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`LoopcompError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`LoopcompError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
