//! Mask regularization via padded morphological closing
//!
//! Closing the mask directly would treat the true image border as a mask
//! boundary and distort valid near-edge foreground. The mask is therefore
//! embedded in a zero (background) canvas twice its size before closing, so
//! the element's neighborhood can never reach across a real image edge, and
//! cropped back afterwards.

use crate::{
    error::{CutoutError, Result},
    morphology::{self, StructuringElement},
    types::ColorMask,
};
use ndarray::{s, Array3};

/// Default structuring element size for portrait masks.
pub const DEFAULT_KERNEL_SIZE: (usize, usize) = (50, 50);

/// Smooths a color mask with an elliptical closing inside a padded canvas
#[derive(Debug, Clone)]
pub struct MaskRegularizer {
    element: StructuringElement,
}

impl MaskRegularizer {
    /// Create a regularizer with the given elliptical element size.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when either dimension is zero.
    pub fn new(kernel_size: (usize, usize)) -> Result<Self> {
        let element = StructuringElement::ellipse(kernel_size.0, kernel_size.1)?;
        Ok(Self { element })
    }

    /// The structuring element size in use (height, width).
    #[must_use]
    pub fn kernel_size(&self) -> (usize, usize) {
        self.element.size()
    }

    /// Close the mask inside a zero-padded canvas and crop back.
    ///
    /// The mask is written at offset (h/2, w/2) into a (2h, 2w) canvas; for
    /// odd dimensions the floor division leaves the placement one pixel
    /// asymmetric, reproducing the original pipeline exactly. Output shape
    /// always equals the input shape.
    ///
    /// # Errors
    /// Returns `SizeMismatch` when the element does not fit inside the
    /// padded canvas, and a `Shape` error for empty masks.
    pub fn regularize(&self, mask: &ColorMask) -> Result<ColorMask> {
        let (height, width, channels) = mask.dim();
        if height == 0 || width == 0 {
            return Err(CutoutError::shape("mask must be at least 1x1"));
        }

        let canvas_dims = (2 * height, 2 * width);
        let (kernel_h, kernel_w) = self.element.size();
        if kernel_h >= canvas_dims.0 || kernel_w >= canvas_dims.1 {
            return Err(CutoutError::SizeMismatch {
                kernel: (kernel_h, kernel_w),
                canvas: canvas_dims,
            });
        }

        let (top, left) = (height / 2, width / 2);
        let mut canvas = Array3::<f32>::zeros((canvas_dims.0, canvas_dims.1, channels));
        canvas
            .slice_mut(s![top..top + height, left..left + width, ..])
            .assign(mask);

        let closed = morphology::close(&canvas, &self.element);

        Ok(closed
            .slice(s![top..top + height, left..left + width, ..])
            .to_owned())
    }
}

impl Default for MaskRegularizer {
    fn default() -> Self {
        // The default element always constructs.
        Self::new(DEFAULT_KERNEL_SIZE).expect("default kernel size is valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    #[test]
    fn test_output_shape_matches_input() {
        let regularizer = MaskRegularizer::new((5, 5)).unwrap();
        for (h, w) in [(4, 4), (5, 7), (9, 3)] {
            let mask = Array3::<f32>::zeros((h, w, 3));
            let out = regularizer.regularize(&mask).unwrap();
            assert_eq!(out.dim(), (h, w, 3));
        }
    }

    #[test]
    fn test_all_background_stays_background() {
        let regularizer = MaskRegularizer::new((3, 3)).unwrap();
        let mask = Array3::<f32>::zeros((4, 4, 3));
        let out = regularizer.regularize(&mask).unwrap();
        assert!(out.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_uniform_foreground_is_preserved() {
        // The zero border keeps the closing from eroding true-edge pixels.
        let regularizer = MaskRegularizer::new((3, 3)).unwrap();
        let mask = Array3::<f32>::from_elem((4, 4, 3), 1.0);
        let out = regularizer.regularize(&mask).unwrap();
        assert!(out.iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_closing_fills_interior_hole() {
        let regularizer = MaskRegularizer::new((3, 3)).unwrap();
        let mut mask = Array3::<f32>::from_elem((6, 6, 3), 1.0);
        for c in 0..3 {
            mask[[3, 3, c]] = 0.0;
        }
        let out = regularizer.regularize(&mask).unwrap();
        assert_eq!(out[[3, 3, 0]], 1.0);
    }

    #[test]
    fn test_oversized_element_rejected() {
        let regularizer = MaskRegularizer::new((8, 8)).unwrap();
        let mask = Array3::<f32>::zeros((4, 4, 3));
        let err = regularizer.regularize(&mask).unwrap_err();
        assert!(matches!(err, CutoutError::SizeMismatch { .. }));
    }

    #[test]
    fn test_odd_dimension_offsets_are_floored() {
        // For a 5x5 mask the sub-rectangle starts at (2, 2) in a 10x10
        // canvas; a foreground pixel at (0, 0) must survive the round trip.
        let regularizer = MaskRegularizer::new((1, 1)).unwrap();
        let mut mask = Array3::<f32>::zeros((5, 5, 3));
        for c in 0..3 {
            mask[[0, 0, c]] = 9.0;
        }
        let out = regularizer.regularize(&mask).unwrap();
        assert_eq!(out[[0, 0, 0]], 9.0);
        assert_eq!(out.dim(), (5, 5, 3));
    }

    #[test]
    fn test_even_element_idempotent_through_regularizer() {
        // The default element size is even, so its anchor is off center.
        let regularizer = MaskRegularizer::new((6, 6)).unwrap();
        let mut mask = Array3::<f32>::zeros((10, 10, 3));
        for y in 2..8 {
            for x in 2..8 {
                for c in 0..3 {
                    mask[[y, x, c]] = 1.0;
                }
            }
        }
        for c in 0..3 {
            mask[[4, 5, c]] = 0.0;
        }

        let once = regularizer.regularize(&mask).unwrap();
        let twice = regularizer.regularize(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_morphological_step_idempotent_through_regularizer() {
        let regularizer = MaskRegularizer::new((3, 3)).unwrap();
        let mut mask = Array3::<f32>::zeros((8, 8, 3));
        for y in 2..6 {
            for x in 2..6 {
                for c in 0..3 {
                    mask[[y, x, c]] = 1.0;
                }
            }
        }
        for c in 0..3 {
            mask[[4, 4, c]] = 0.0;
        }

        let once = regularizer.regularize(&mask).unwrap();
        let twice = regularizer.regularize(&once).unwrap();
        assert_eq!(once, twice);
    }
}
