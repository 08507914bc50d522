//! Error types for portrait cutout operations

use thiserror::Error;

/// Result type alias for portrait cutout operations
pub type Result<T> = std::result::Result<T, CutoutError>;

/// Comprehensive error types for the cutout pipeline
#[derive(Error, Debug)]
pub enum CutoutError {
    /// Input/output errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Image format or processing errors
    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// Malformed input dimensionality
    #[error("Shape error: {0}")]
    Shape(String),

    /// Class index outside the palette range; indicates a model/palette mismatch
    #[error("class index {index} outside palette range 0..{palette_len}")]
    PaletteIndex { index: usize, palette_len: usize },

    /// Mask and source dimensions disagree
    #[error("mask shape {mask:?} does not match source shape {source_shape:?}")]
    ShapeMismatch {
        mask: (usize, usize, usize),
        source_shape: (usize, usize, usize),
    },

    /// Structuring element does not fit inside the padded canvas
    #[error("structuring element {kernel:?} does not fit canvas {canvas:?}")]
    SizeMismatch {
        kernel: (usize, usize),
        canvas: (usize, usize),
    },

    /// No trained model found at startup; the process must not proceed to inference
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Backend inference errors
    #[error("Inference error: {0}")]
    Inference(String),

    /// Invalid configuration or parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unsupported file format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Generic processing errors
    #[error("Processing error: {0}")]
    Processing(String),
}

impl CutoutError {
    /// Create a new shape error
    pub fn shape<S: Into<String>>(msg: S) -> Self {
        Self::Shape(msg.into())
    }

    /// Create a new model-unavailable error
    pub fn model_unavailable<S: Into<String>>(msg: S) -> Self {
        Self::ModelUnavailable(msg.into())
    }

    /// Create a new inference error
    pub fn inference<S: Into<String>>(msg: S) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a new unsupported format error
    pub fn unsupported_format<S: Into<String>>(format: S) -> Self {
        Self::UnsupportedFormat(format.into())
    }

    /// Create a new processing error
    pub fn processing<S: Into<String>>(msg: S) -> Self {
        Self::Processing(msg.into())
    }

    /// Create file I/O error with operation context
    pub fn file_io_error<P: AsRef<std::path::Path>>(
        operation: &str,
        path: P,
        error: std::io::Error,
    ) -> Self {
        let path_display = path.as_ref().display();
        Self::Io(std::io::Error::new(
            error.kind(),
            format!("Failed to {} '{}': {}", operation, path_display, error),
        ))
    }

    /// Create processing error with stage context
    pub fn processing_stage_error(stage: &str, details: &str, input_info: Option<&str>) -> Self {
        let input_context = match input_info {
            Some(info) => format!(" (input: {})", info),
            None => String::new(),
        };

        Self::Processing(format!(
            "Processing failed at stage '{}'{}: {}",
            stage, input_context, details
        ))
    }
}
