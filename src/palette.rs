//! Fixed palette and normalization constants for portrait segmentation
//!
//! The mean values and color table come from the training setup of the
//! segmentation model: means are subtracted in BGR order after channel
//! reversal, and the color table maps class ids to representative RGB
//! colors used for mask decoding (not for training).

use crate::error::{CutoutError, Result};

/// Number of classes the default portrait model predicts (background, person).
pub const DEFAULT_NUM_CLASSES: usize = 2;

/// Per-channel means subtracted during preprocessing, in BGR order
/// (matching the reversed channel layout of the model input).
#[allow(clippy::excessive_precision)]
pub const MEAN_BGR: [f32; 3] = [104.006_987_93, 116.668_767_62, 122.678_914_34];

/// Fixed color table indexed by class id 0..24.
///
/// Entry 0 is background (black, masks everything out); entries 1-4 are the
/// person classes with a multiplicative identity color so compositing passes
/// source pixels through; the remaining entries are visualization colors for
/// finer-grained label sets.
pub const PORTRAIT_COLOR_SET: [[u8; 3]; 24] = [
    [0, 0, 0],
    [1, 1, 1],
    [1, 1, 1],
    [1, 1, 1],
    [1, 1, 1],
    [187, 119, 132],
    [142, 6, 59],
    [74, 111, 227],
    [133, 149, 225],
    [181, 187, 227],
    [230, 175, 185],
    [224, 123, 145],
    [211, 63, 106],
    [17, 198, 56],
    [141, 213, 147],
    [198, 222, 199],
    [234, 211, 198],
    [240, 185, 141],
    [239, 151, 8],
    [15, 207, 192],
    [156, 222, 214],
    [213, 234, 231],
    [243, 225, 235],
    [246, 196, 225],
];

/// Ordered class-id to RGB lookup table.
///
/// Process-wide immutable data; passed explicitly into the decoder so the
/// pipeline stays a composition of pure functions.
#[derive(Debug, Clone)]
pub struct Palette {
    colors: Vec<[u8; 3]>,
}

impl Palette {
    /// The fixed 24-entry portrait palette.
    #[must_use]
    pub fn portrait() -> Self {
        Self {
            colors: PORTRAIT_COLOR_SET.to_vec(),
        }
    }

    /// Create a palette from a custom color table.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the table is empty.
    pub fn new(colors: Vec<[u8; 3]>) -> Result<Self> {
        if colors.is_empty() {
            return Err(CutoutError::invalid_config("palette must not be empty"));
        }
        Ok(Self { colors })
    }

    /// Number of entries in the palette.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Whether the palette has no entries (never true for constructed palettes).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Look up the RGB color for a class id, `None` if out of range.
    #[must_use]
    pub fn color(&self, class_id: usize) -> Option<[u8; 3]> {
        self.colors.get(class_id).copied()
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::portrait()
    }
}
