/// Convenience result type used across pixelframe.
pub type PixelFrameResult<T> = Result<T, PixelFrameError>;

/// Top-level error taxonomy used by canvas APIs.
///
/// A full canvas and a rejected signature are not errors; they are reported as
/// [`crate::ClaimOutcome`] variants.
#[derive(thiserror::Error, Debug)]
pub enum PixelFrameError {
    /// Invalid user-provided input or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Snapshot could not be read, written, or did not describe a consistent canvas.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Rasterization or PNG encoding failed for a single render call.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PixelFrameError {
    /// Build a [`PixelFrameError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PixelFrameError::Persistence`] value.
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Build a [`PixelFrameError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`PixelFrameError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for failures that come from the snapshot store.
    pub fn is_persistence(&self) -> bool {
        matches!(self, Self::Persistence(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
