//! Class-map to color-mask decoding

use crate::{
    error::{CutoutError, Result},
    palette::Palette,
    types::{ClassMap, ColorMask},
};
use ndarray::Array3;

/// Decodes per-pixel class indices into a color mask via palette lookup
pub struct LabelDecoder;

impl LabelDecoder {
    /// Decode a class map into a color mask.
    ///
    /// Output pixel `(y, x)` is exactly `palette[class_map[(y, x)]]`, no
    /// interpolation. An out-of-range class id is a fatal palette/model
    /// mismatch; it would silently corrupt compositing if let through.
    ///
    /// # Errors
    /// Returns `PaletteIndex` if any class id is outside the palette range.
    pub fn decode(class_map: &ClassMap, palette: &Palette) -> Result<ColorMask> {
        let (height, width) = class_map.dim();
        let mut mask = Array3::<f32>::zeros((height, width, 3));

        #[allow(clippy::indexing_slicing)]
        // Safe: mask dimensions pre-allocated to match the class map
        for ((y, x), &class_id) in class_map.indexed_iter() {
            let color = palette
                .color(class_id)
                .ok_or_else(|| CutoutError::PaletteIndex {
                    index: class_id,
                    palette_len: palette.len(),
                })?;
            for c in 0..3 {
                mask[[y, x, c]] = f32::from(color[c]);
            }
        }

        Ok(mask)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    #[test]
    fn test_decode_exact_palette_lookup() {
        let palette = Palette::portrait();
        let mut class_map = Array2::<usize>::zeros((2, 2));
        class_map[[0, 1]] = 1;
        class_map[[1, 0]] = 5;

        let mask = LabelDecoder::decode(&class_map, &palette).unwrap();
        assert_eq!(mask.dim(), (2, 2, 3));

        // Background pixel
        for c in 0..3 {
            assert_eq!(mask[[0, 0, c]], 0.0);
        }
        // Person class: identity color
        for c in 0..3 {
            assert_eq!(mask[[0, 1, c]], 1.0);
        }
        // Visualization color, exact
        assert_eq!(mask[[1, 0, 0]], 187.0);
        assert_eq!(mask[[1, 0, 1]], 119.0);
        assert_eq!(mask[[1, 0, 2]], 132.0);
    }

    #[test]
    fn test_decode_rejects_out_of_range_index() {
        let palette = Palette::portrait();
        let mut class_map = Array2::<usize>::zeros((2, 2));
        class_map[[1, 1]] = 24;

        let err = LabelDecoder::decode(&class_map, &palette).unwrap_err();
        assert!(matches!(
            err,
            CutoutError::PaletteIndex {
                index: 24,
                palette_len: 24
            }
        ));
    }

    #[test]
    fn test_decode_all_background() {
        let palette = Palette::portrait();
        let class_map = Array2::<usize>::zeros((4, 4));

        let mask = LabelDecoder::decode(&class_map, &palette).unwrap();
        assert!(mask.iter().all(|&v| v == 0.0));
    }
}
