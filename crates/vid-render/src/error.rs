//! Error types for renderer chain planning and render model validation

use crate::render_model::Axis;

/// Result alias used throughout this crate
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller passed a value the operation can not accept
    InvalidArgument,
}

/// Errors reported synchronously by planning and model construction
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// No renderer semantics were given, so there is nothing to plan
    #[error("invalid argument: renderer semantics list is empty")]
    EmptySemantics,

    /// Output and helper textures are the same storage, so roles can not alternate
    #[error("invalid argument: output and helper textures refer to the same storage")]
    AliasedStorage,

    /// The chain source is also the output or helper texture, so the first out-of-place renderer would sample its own target
    #[error("invalid argument: source texture refers to the same storage as the output or helper texture")]
    AliasedSource,

    /// Output and helper textures differ in size or pixel format
    #[error("invalid argument: output texture is {output:?} but helper texture is {helper:?}")]
    SizeMismatch {
        /// Size and format of the output texture
        output: (wgpu::Extent3d, wgpu::TextureFormat),
        /// Size and format of the helper texture
        helper: (wgpu::Extent3d, wgpu::TextureFormat),
    },

    /// A displacement scale was zero, negative, NaN or outside the positive finite `f32` range
    #[error("invalid argument: {axis} scale must be positive, got {value}")]
    NonPositiveScale {
        /// Axis the scale belongs to
        axis: Axis,
        /// The rejected value
        value: f64,
    },

    /// A raw shader channel value outside of the red/green/blue range
    #[error("invalid argument: displacement channel {0} is out of range")]
    ChannelOutOfRange(u32),
}

impl Error {
    /// Returns the classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::EmptySemantics | Error::AliasedStorage | Error::AliasedSource | Error::SizeMismatch { .. } | Error::NonPositiveScale { .. } | Error::ChannelOutOfRange(_) => ErrorKind::InvalidArgument,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_is_an_invalid_argument() {
        let errors = [
            Error::EmptySemantics,
            Error::AliasedStorage,
            Error::AliasedSource,
            Error::SizeMismatch {
                output: (wgpu::Extent3d { width: 4, height: 4, depth_or_array_layers: 1 }, wgpu::TextureFormat::Rgba8Unorm),
                helper: (wgpu::Extent3d { width: 2, height: 4, depth_or_array_layers: 1 }, wgpu::TextureFormat::Rgba8Unorm),
            },
            Error::NonPositiveScale { axis: Axis::Horizontal, value: 0.0 },
            Error::ChannelOutOfRange(7),
        ];

        for error in errors {
            assert_eq!(error.kind(), ErrorKind::InvalidArgument);
            assert!(error.to_string().starts_with("invalid argument:"));
        }
    }

    #[test]
    fn scale_error_names_the_axis() {
        let message = Error::NonPositiveScale { axis: Axis::Vertical, value: -2.0 }.to_string();
        assert_eq!(message, "invalid argument: vertical scale must be positive, got -2");
    }
}
