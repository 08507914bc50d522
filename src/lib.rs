#![allow(clippy::too_many_lines)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::uninlined_format_args)]

//! # Portrait Cutout Library
//!
//! A Rust library for cutting portrait subjects out of photographs using
//! semantic segmentation with morphological mask regularization.
//!
//! The pipeline runs five stages on each image: mean-subtraction
//! preprocessing, model inference producing per-pixel class labels, palette
//! decoding of labels into a color mask, a padded elliptical morphological
//! closing that smooths the mask, and a multiplicative composite against
//! the source pixels. The result keeps the portrait at full intensity and
//! drives the background to black.
//!
//! ## Features
//!
//! - **Pure Rust Inference**: ONNX segmentation models via Tract, no
//!   external runtime dependencies
//! - **Format Support**: JPEG, PNG, TIFF (and WebP with `webp-support`)
//! - **Deterministic Pipeline**: identical inputs produce identical outputs
//! - **CLI Integration**: optional batch command-line driver (enable with
//!   the `cli` feature)
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use portrait_cutout::{cutout_portrait_from_bytes, CutoutConfig};
//!
//! # fn example(image_data: Vec<u8>) -> anyhow::Result<()> {
//! let config = CutoutConfig::builder()
//!     .model_path("model/portrait.onnx")
//!     .build()?;
//! let result = cutout_portrait_from_bytes(&image_data, &config)?;
//! result.save("output.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `tract` (default): Pure Rust inference backend
//! - `cli` (default): Command-line interface and progress reporting
//! - `webp-support` (default): WebP image format support
//!
//! ### Library-Only Usage
//!
//! ```toml
//! [dependencies]
//! portrait-cutout = { version = "0.1", default-features = false, features = ["tract"] }
//! ```

pub mod backends;
#[cfg(feature = "cli")]
pub mod cli;
pub mod composite;
pub mod config;
pub mod decode;
pub mod error;
pub mod inference;
pub mod morphology;
pub mod palette;
pub mod preprocess;
pub mod processor;
pub mod regularize;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;
pub mod types;

// Public API exports
pub use backends::*;
pub use composite::Compositor;
pub use config::{CutoutConfig, CutoutConfigBuilder};
pub use decode::LabelDecoder;
pub use error::{CutoutError, Result};
pub use inference::SegmentationBackend;
pub use morphology::{close, dilate, erode, StructuringElement};
pub use palette::{Palette, DEFAULT_NUM_CLASSES, MEAN_BGR, PORTRAIT_COLOR_SET};
pub use preprocess::ImagePreprocessor;
pub use processor::PortraitProcessor;
pub use regularize::{MaskRegularizer, DEFAULT_KERNEL_SIZE};
pub use services::ImageIOService;
pub use types::{
    ClassMap, ColorMask, CutoutResult, MaskStatistics, ModelInput, OutputImage,
    ProcessingMetadata, ProcessingTimings, RawImage,
};

#[cfg(feature = "cli")]
pub use tracing_config::{TracingConfig, TracingFormat};

/// Cut out the portrait in an image provided as bytes.
///
/// Decodes the image, runs the full pipeline with the Tract backend and
/// returns the composited result.
///
/// # Errors
/// Returns a processing error when the bytes cannot be decoded, a
/// `ModelUnavailable` error when the configured model cannot be loaded,
/// and stage-specific errors otherwise.
#[cfg(feature = "tract")]
pub fn cutout_portrait_from_bytes(
    image_bytes: &[u8],
    config: &CutoutConfig,
) -> Result<CutoutResult> {
    let image = image::load_from_memory(image_bytes)
        .map_err(|e| CutoutError::processing(format!("Failed to decode image from bytes: {e}")))?;
    cutout_portrait_from_image(&image, config)
}

/// Cut out the portrait in a pre-loaded `DynamicImage`.
///
/// # Errors
/// Returns `ModelUnavailable` when the configured model cannot be loaded
/// and stage-specific errors otherwise.
#[cfg(feature = "tract")]
pub fn cutout_portrait_from_image(
    image: &image::DynamicImage,
    config: &CutoutConfig,
) -> Result<CutoutResult> {
    let backend = Box::new(TractBackend::new());
    let mut processor = PortraitProcessor::new(config.clone(), backend)?;
    processor.process_image(image)
}

/// Cut out the portrait in an image file.
///
/// # Errors
/// Returns an I/O error when the file cannot be read, `ModelUnavailable`
/// when the configured model cannot be loaded, and stage-specific errors
/// otherwise.
#[cfg(feature = "tract")]
pub fn cutout_portrait_from_file<P: AsRef<std::path::Path>>(
    path: P,
    config: &CutoutConfig,
) -> Result<CutoutResult> {
    let backend = Box::new(TractBackend::new());
    let mut processor = PortraitProcessor::new(config.clone(), backend)?;
    processor.process_file(path.as_ref())
}
