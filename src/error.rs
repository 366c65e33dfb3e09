//! Error types for the joint temperature library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// `OpenCV` operation failed
    #[cfg(feature = "camera")]
    #[error("OpenCV error: {0}")]
    OpenCV(#[from] opencv::Error),

    /// `ONNX` Runtime inference failed
    #[cfg(feature = "onnx")]
    #[error("ONNX Runtime error: {0}")]
    OnnxRuntime(#[from] ort::OrtError),

    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decoding or resizing failed
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// JSON serialization of a reading failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Model loading or inference error
    #[error("Model error: {0}")]
    ModelError(String),

    /// Model output processing error
    #[error("Model output error: {0}")]
    ModelOutputError(String),

    /// Heatmap or affinity field stack has an unexpected shape
    #[error("Model data format error: {0}")]
    ModelDataFormatError(String),

    /// The frame source failed to deliver a frame pair
    #[error("Frame source error: {0}")]
    FrameSource(String),

    /// The frame source did not deliver a frame pair in time
    #[error("Frame source timed out: {0}")]
    FrameTimeout(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::ModelDataFormatError("expected 19 heatmap channels, got 3".to_string());
        assert_eq!(
            err.to_string(),
            "Model data format error: expected 19 heatmap channels, got 3"
        );

        let err = Error::FrameTimeout("no frame within 5000 ms".to_string());
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
