//! Image preprocessing for segmentation inference
//!
//! Converts raw RGB pixels into the normalized tensor layout the model
//! expects: channels reversed to BGR, per-channel mean subtracted, and a
//! leading batch axis of size 1. Spatial resolution is left untouched; the
//! model runs at the image's native size.

use crate::{
    error::{CutoutError, Result},
    palette::MEAN_BGR,
    types::{ModelInput, RawImage},
};
use ndarray::Array4;

/// Shared image preprocessing utilities
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// Preprocess raw pixels into a model input tensor.
    ///
    /// Output sample `(0, y, x, c)` equals `raw[(y, x, 2 - c)] - MEAN_BGR[c]`.
    ///
    /// # Errors
    /// Returns a `Shape` error if the input does not have exactly 3 channels
    /// or has a zero spatial dimension.
    pub fn preprocess(image: &RawImage) -> Result<ModelInput> {
        let (height, width, channels) = image.dim();
        if channels != 3 {
            return Err(CutoutError::shape(format!(
                "expected 3 channels, got {}",
                channels
            )));
        }
        if height == 0 || width == 0 {
            return Err(CutoutError::shape(format!(
                "image must be at least 1x1, got {}x{}",
                height, width
            )));
        }

        let mut tensor = Array4::<f32>::zeros((1, height, width, 3));
        #[allow(clippy::indexing_slicing)]
        // Safe: tensor dimensions pre-allocated to match the input
        for y in 0..height {
            for x in 0..width {
                for c in 0..3 {
                    tensor[[0, y, x, c]] = f32::from(image[[y, x, 2 - c]]) - MEAN_BGR[c];
                }
            }
        }

        Ok(tensor)
    }
}
