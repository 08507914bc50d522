//! Segmentation backend abstraction
//!
//! The pipeline never talks to a model runtime directly. Backends implement
//! [`SegmentationBackend`] and return a dense class map; swapping runtimes
//! (or substituting a mock in tests) does not touch pipeline code.

use crate::{
    config::CutoutConfig,
    error::Result,
    types::{ClassMap, ModelInput},
};
use instant::Duration;

/// A segmentation oracle turning a preprocessed tensor into per-pixel labels
pub trait SegmentationBackend: Send + Sync {
    /// Load the model and prepare the backend for inference.
    ///
    /// Returns the model load time when the backend actually loaded
    /// something, `None` when initialization was a no-op (already
    /// initialized, or a mock).
    ///
    /// # Errors
    /// Returns `ModelUnavailable` when the configured model cannot be
    /// found or loaded.
    fn initialize(&mut self, config: &CutoutConfig) -> Result<Option<Duration>>;

    /// Run segmentation on a preprocessed NHWC tensor.
    ///
    /// The returned class map must match the spatial dimensions of the
    /// input tensor; the processor validates this.
    ///
    /// # Errors
    /// Returns `Inference` on runtime failures and `ModelUnavailable` when
    /// called before [`SegmentationBackend::initialize`].
    fn infer(&mut self, input: &ModelInput) -> Result<ClassMap>;

    /// Number of classes the loaded model distinguishes.
    fn num_classes(&self) -> usize;

    /// Whether `initialize` has completed successfully.
    fn is_initialized(&self) -> bool;
}
