//! Core types for the cutout pipeline

use crate::error::{CutoutError, Result};
use image::{DynamicImage, RgbImage};
use ndarray::{Array2, Array3, Array4};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Raw RGB pixels as loaded from disk, shape (height, width, 3).
pub type RawImage = Array3<u8>;

/// Normalized model input, shape (1, height, width, 3), channel-reversed
/// (BGR) with per-channel means subtracted.
pub type ModelInput = Array4<f32>;

/// Per-pixel class indices at native resolution, shape (height, width).
pub type ClassMap = Array2<usize>;

/// Palette-decoded color mask, shape (height, width, 3).
pub type ColorMask = Array3<f32>;

/// Unclamped composited output, shape (height, width, 3). Saturation happens
/// only when encoding to 8-bit.
pub type OutputImage = Array3<f32>;

/// Convert a decoded image into the (h, w, 3) raw pixel array the pipeline
/// operates on.
#[must_use]
pub fn raw_from_image(image: &DynamicImage) -> RawImage {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let mut raw = Array3::<u8>::zeros((height as usize, width as usize, 3));
    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..3 {
            raw[[y as usize, x as usize, c]] = pixel[c];
        }
    }
    raw
}

/// Convert an unclamped output array back into an 8-bit RGB image,
/// saturating each sample to 0..=255.
///
/// # Errors
/// Returns a `Shape` error if the array does not have 3 channels.
pub fn image_from_output(output: &OutputImage) -> Result<RgbImage> {
    let (height, width, channels) = output.dim();
    if channels != 3 {
        return Err(CutoutError::shape(format!(
            "expected 3 channels for encoding, got {}",
            channels
        )));
    }
    let mut image = RgbImage::new(width as u32, height as u32);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        for c in 0..3 {
            let sample = output[[y as usize, x as usize, c]];
            pixel[c] = sample.round().clamp(0.0, 255.0) as u8;
        }
    }
    Ok(image)
}

/// Result of one cutout operation
#[derive(Debug, Clone)]
pub struct CutoutResult {
    /// The composited output, unclamped floating point
    pub output: OutputImage,

    /// The regularized color mask used for compositing
    pub mask: ColorMask,

    /// Original image dimensions (width, height)
    pub original_dimensions: (u32, u32),

    /// Processing metadata
    pub metadata: ProcessingMetadata,

    /// Original input path (for logging purposes)
    pub input_path: Option<String>,
}

impl CutoutResult {
    /// Create a new cutout result
    #[must_use]
    pub fn new(
        output: OutputImage,
        mask: ColorMask,
        original_dimensions: (u32, u32),
        metadata: ProcessingMetadata,
    ) -> Self {
        Self {
            output,
            mask,
            original_dimensions,
            metadata,
            input_path: None,
        }
    }

    /// Create a new cutout result with input path
    #[must_use]
    pub fn with_input_path(
        output: OutputImage,
        mask: ColorMask,
        original_dimensions: (u32, u32),
        metadata: ProcessingMetadata,
        input_path: String,
    ) -> Self {
        Self {
            output,
            mask,
            original_dimensions,
            metadata,
            input_path: Some(input_path),
        }
    }

    /// Encode the output as an 8-bit RGB image, saturating out-of-range samples.
    pub fn to_image(&self) -> Result<RgbImage> {
        image_from_output(&self.output)
    }

    /// Save the output; the format is chosen from the file extension and
    /// missing parent directories are created.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let image = DynamicImage::ImageRgb8(self.to_image()?);
        crate::services::ImageIOService::save_image(&image, path)
    }

    /// Save and record encoding time in the metadata
    pub fn save_timed<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let encode_start = instant::Instant::now();
        self.save(path)?;
        self.metadata.timings.image_encode_ms = Some(encode_start.elapsed().as_millis() as u64);
        Ok(())
    }

    /// Get output dimensions (width, height)
    #[must_use]
    pub fn dimensions(&self) -> (u32, u32) {
        self.original_dimensions
    }

    /// Get detailed timing breakdown
    #[must_use]
    pub fn timings(&self) -> &ProcessingTimings {
        &self.metadata.timings
    }

    /// Foreground/background statistics of the regularized mask. A pixel is
    /// foreground when any mask channel is non-zero.
    #[must_use]
    pub fn mask_statistics(&self) -> MaskStatistics {
        let (height, width, _) = self.mask.dim();
        let total_pixels = height * width;
        let mut foreground_pixels = 0usize;
        for y in 0..height {
            for x in 0..width {
                if (0..3).any(|c| self.mask[[y, x, c]] > 0.0) {
                    foreground_pixels += 1;
                }
            }
        }
        let background_pixels = total_pixels - foreground_pixels;

        MaskStatistics {
            total_pixels,
            foreground_pixels,
            background_pixels,
            foreground_ratio: foreground_pixels as f32 / total_pixels as f32,
            background_ratio: background_pixels as f32 / total_pixels as f32,
        }
    }

    /// Get timing summary for display
    #[must_use]
    pub fn timing_summary(&self) -> String {
        let t = &self.metadata.timings;
        let mut summary = format!(
            "Total: {}ms | Decode: {}ms | Preprocess: {}ms | Inference: {}ms | Mask decode: {}ms | Regularize: {}ms | Composite: {}ms",
            t.total_ms,
            t.image_decode_ms,
            t.preprocessing_ms,
            t.inference_ms,
            t.mask_decode_ms,
            t.regularize_ms,
            t.composite_ms,
        );
        if let Some(encode_ms) = t.image_encode_ms {
            summary.push_str(&format!(" | Encode: {}ms", encode_ms));
        }
        summary
    }
}

/// Statistics about a regularized mask
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskStatistics {
    pub total_pixels: usize,
    pub foreground_pixels: usize,
    pub background_pixels: usize,
    pub foreground_ratio: f32,
    pub background_ratio: f32,
}

/// Detailed timing breakdown for cutout processing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProcessingTimings {
    /// Model loading time (first call only)
    pub model_load_ms: u64,

    /// Image loading and decoding from file
    pub image_decode_ms: u64,

    /// Preprocessing (channel reversal, mean subtraction, batch axis)
    pub preprocessing_ms: u64,

    /// Segmentation inference
    pub inference_ms: u64,

    /// Class-map to color-mask decoding
    pub mask_decode_ms: u64,

    /// Padded morphological closing
    pub regularize_ms: u64,

    /// Multiplicative compositing
    pub composite_ms: u64,

    /// Final image encoding (if saving to file)
    pub image_encode_ms: Option<u64>,

    /// Total end-to-end processing time
    pub total_ms: u64,
}

impl ProcessingTimings {
    /// Time not attributed to any measured stage
    #[must_use]
    pub fn other_overhead_ms(&self) -> u64 {
        let measured = self.model_load_ms
            + self.image_decode_ms
            + self.preprocessing_ms
            + self.inference_ms
            + self.mask_decode_ms
            + self.regularize_ms
            + self.composite_ms
            + self.image_encode_ms.unwrap_or(0);

        self.total_ms.saturating_sub(measured)
    }
}

/// Metadata about the processing operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingMetadata {
    /// Detailed timing breakdown
    pub timings: ProcessingTimings,

    /// Backend used for inference
    pub backend_name: String,

    /// Structuring element size used by the regularizer
    pub kernel_size: (usize, usize),
}

impl ProcessingMetadata {
    /// Create new processing metadata
    #[must_use]
    pub fn new(backend_name: String, kernel_size: (usize, usize)) -> Self {
        Self {
            timings: ProcessingTimings::default(),
            backend_name,
            kernel_size,
        }
    }
}
