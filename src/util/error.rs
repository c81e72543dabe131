//! Error types for screenmatch.

use thiserror::Error;

/// Result alias for screenmatch operations.
pub type ScreenMatchResult<T> = std::result::Result<T, ScreenMatchError>;

/// Errors that can occur in the detection engine.
///
/// Per-tick matching failures (empty descriptor sets, homography estimation,
/// acceleration) are handled locally and never surface through this type;
/// these variants cover structural problems in inputs and the capture path.
#[derive(Debug, Error, PartialEq)]
pub enum ScreenMatchError {
    /// The image dimensions are invalid (zero or overflowing).
    #[error("invalid image dimensions {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// The stride is smaller than the row width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// The backing buffer is too small for the described image.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A mask buffer does not match its template's pixel count.
    #[error("mask has {got} pixels, template has {expected}")]
    MaskMismatch { expected: usize, got: usize },
    /// The template cannot produce a meaningful correlation score.
    #[error("degenerate template: {reason}")]
    DegenerateTemplate { reason: &'static str },
    /// A per-template match threshold outside the open interval (0, 1).
    #[error("threshold {value} is not strictly between 0 and 1")]
    ThresholdOutOfRange { value: f32 },
    /// An index into a configured list (scales) is out of range.
    #[error("{context} index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        index: usize,
        len: usize,
        context: &'static str,
    },
    /// No template could be loaded; the engine cannot start.
    #[error("no loadable templates")]
    NoTemplates,
    /// A capture backend failed to produce a frame.
    #[error("capture backend {backend} failed: {reason}")]
    CaptureFailed {
        backend: &'static str,
        reason: String,
    },
    /// The render sink rejected a presentation call.
    #[error("render sink failed: {reason}")]
    RenderSink { reason: String },
    /// Decoding or reading an image file failed.
    #[cfg(feature = "image-io")]
    #[error("image io error: {reason}")]
    ImageIo { reason: String },
}
