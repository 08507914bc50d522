//! Segmentation backend implementations

pub mod test_utils;
#[cfg(feature = "tract")]
pub mod tract;

pub use test_utils::MockSegmentationBackend;
#[cfg(feature = "tract")]
pub use tract::TractBackend;
