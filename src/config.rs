//! Pipeline configuration

use crate::{
    error::{CutoutError, Result},
    palette::DEFAULT_NUM_CLASSES,
    regularize::DEFAULT_KERNEL_SIZE,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the portrait cutout pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CutoutConfig {
    /// Path to the ONNX segmentation model.
    pub model_path: PathBuf,

    /// Number of classes the segmentation model emits.
    pub num_classes: usize,

    /// Structuring element size for mask regularization (height, width).
    pub kernel_size: (usize, usize),

    /// Enable debug output during processing.
    pub debug: bool,
}

impl Default for CutoutConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("model/portrait.onnx"),
            num_classes: DEFAULT_NUM_CLASSES,
            kernel_size: DEFAULT_KERNEL_SIZE,
            debug: false,
        }
    }
}

impl CutoutConfig {
    /// Create a builder for fluent configuration.
    #[must_use]
    pub fn builder() -> CutoutConfigBuilder {
        CutoutConfigBuilder::new()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when a field is out of range.
    pub fn validate(&self) -> Result<()> {
        if self.num_classes == 0 {
            return Err(CutoutError::invalid_config(
                "num_classes must be at least 1",
            ));
        }
        if self.kernel_size.0 == 0 || self.kernel_size.1 == 0 {
            return Err(CutoutError::invalid_config(format!(
                "kernel size {}x{} must have non-zero dimensions",
                self.kernel_size.0, self.kernel_size.1
            )));
        }
        Ok(())
    }
}

/// Builder for [`CutoutConfig`]
#[derive(Debug, Clone, Default)]
pub struct CutoutConfigBuilder {
    config: CutoutConfig,
}

impl CutoutConfigBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: CutoutConfig::default(),
        }
    }

    /// Set the segmentation model path.
    #[must_use]
    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.model_path = path.into();
        self
    }

    /// Set the number of model classes.
    #[must_use]
    pub fn num_classes(mut self, num_classes: usize) -> Self {
        self.config.num_classes = num_classes;
        self
    }

    /// Set the regularization element size.
    #[must_use]
    pub fn kernel_size(mut self, height: usize, width: usize) -> Self {
        self.config.kernel_size = (height, width);
        self
    }

    /// Enable or disable debug output.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Validate and build the configuration.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when a field is out of range.
    pub fn build(self) -> Result<CutoutConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
