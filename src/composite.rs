//! Multiplicative compositing of a color mask against the source image

use crate::{
    error::{CutoutError, Result},
    types::{ColorMask, OutputImage, RawImage},
};

/// Multiplies a regularized mask with the source pixels, channel by channel
#[derive(Debug, Default, Clone, Copy)]
pub struct Compositor;

impl Compositor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Element-wise product of mask and source.
    ///
    /// Background pixels (mask 0) go to black; a mask value of 1 passes the
    /// source pixel through unchanged. No clamping or rounding happens here,
    /// that is left to the final image encoding.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` when mask and source dimensions differ.
    pub fn composite(&self, mask: &ColorMask, source: &RawImage) -> Result<OutputImage> {
        if mask.dim() != source.dim() {
            return Err(CutoutError::ShapeMismatch {
                mask: mask.dim(),
                source_shape: source.dim(),
            });
        }

        let source_f = source.mapv(f32::from);
        Ok(mask * &source_f)
    }
}
