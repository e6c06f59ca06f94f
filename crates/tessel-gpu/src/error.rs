//! Error types for GPU resource operations
//!
//! Every variant describes a caller contract violation or an unrecoverable
//! backend failure. Nothing here is retried internally.

use tessel_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GpuError {
    /// Texture topology and payload shape do not belong together.
    #[error("Invalid combination of texture type {texture} and image data {payload}")]
    UnsupportedCombination {
        texture: &'static str,
        payload: &'static str,
    },

    /// The payload kind exists but has no upload path.
    #[error("Not implemented: uploading {payload} image data")]
    NotImplemented { payload: &'static str },

    #[error("Texture '{texture}' has format {expected} but image data has format {actual}")]
    FormatMismatch {
        texture: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Any operation, including a second release, on a released resource.
    #[error("{kind} '{label}' is already released")]
    UseAfterRelease { kind: &'static str, label: String },

    #[error("Texture '{texture}' has no pending upload data")]
    MissingUploadPayload { texture: String },

    /// A handle that the backend does not (or no longer) know about.
    #[error("Unknown or destroyed {kind} handle")]
    UnknownResource { kind: &'static str },

    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("Invalid image data: {0}")]
    InvalidPayload(String),

    /// Screen pass used before `apply_size` or a first render.
    #[error("Screen attachments are not allocated")]
    AttachmentsNotReady,

    #[error("Surface error: {0}")]
    Surface(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Config(#[from] CoreError),
}

impl GpuError {
    pub(crate) fn use_after_release<T: ?Sized>(label: impl Into<String>) -> Self {
        Self::UseAfterRelease {
            kind: short_type_name::<T>(),
            label: label.into(),
        }
    }
}

/// Last path segment of a type name, e.g. `GrowableBuffer`
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

pub type GpuResult<T> = std::result::Result<T, GpuError>;

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample;

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<Sample>(), "Sample");
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec");
    }

    #[test]
    fn test_messages_name_types() {
        let err = GpuError::UnsupportedCombination {
            texture: "TextureCube",
            payload: "ImageData2dArray",
        };
        assert_eq!(
            err.to_string(),
            "Invalid combination of texture type TextureCube and image data ImageData2dArray"
        );

        let err = GpuError::use_after_release::<Sample>("mesh index data");
        assert_eq!(err.to_string(), "Sample 'mesh index data' is already released");
    }
}
