//! Tract backend for portrait segmentation models
//!
//! Runs ONNX segmentation models through Tract, a pure Rust inference
//! library with no external runtime dependencies. The raw logit tensor is
//! reduced to a dense class map here via an argmax over the class axis, so
//! the rest of the pipeline never sees model-specific tensor layouts.

use crate::config::CutoutConfig;
use crate::error::{CutoutError, Result};
use crate::inference::SegmentationBackend;
use crate::types::{ClassMap, ModelInput};
use log;
use ndarray::{Array2, ArrayView4};
use tract_onnx::prelude::*;

/// Type alias for the complex Tract model type to reduce complexity warnings
type TractModel = RunnableModel<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

// Use instant crate for cross-platform time compatibility
use instant::{Duration, Instant};

/// Pure Rust segmentation backend based on Tract
#[derive(Debug, Default)]
pub struct TractBackend {
    model: Option<TractModel>,
    num_classes: usize,
    initialized: bool,
}

impl TractBackend {
    /// Create a new uninitialized Tract backend
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn load_model(&mut self, config: &CutoutConfig) -> Result<Duration> {
        let model_load_start = Instant::now();

        if !config.model_path.exists() {
            return Err(CutoutError::model_unavailable(format!(
                "segmentation model not found at {}",
                config.model_path.display()
            )));
        }

        log::info!(
            "Loading segmentation model from {}",
            config.model_path.display()
        );

        let model = onnx()
            .model_for_path(&config.model_path)
            .map_err(|e| {
                CutoutError::model_unavailable(format!("failed to load ONNX model: {e}"))
            })?
            .into_optimized()
            .map_err(|e| {
                CutoutError::model_unavailable(format!("failed to optimize model: {e}"))
            })?
            .into_runnable()
            .map_err(|e| {
                CutoutError::model_unavailable(format!("failed to create runnable model: {e}"))
            })?;

        self.model = Some(model);
        self.num_classes = config.num_classes;
        self.initialized = true;

        let model_load_time = model_load_start.elapsed();
        log::info!(
            "Tract backend initialized in {:.2}ms",
            model_load_time.as_millis()
        );

        Ok(model_load_time)
    }

    /// Reduce a 4D logit tensor to per-pixel class labels.
    ///
    /// Accepts both NHWC (1, h, w, classes) and NCHW (1, classes, h, w)
    /// layouts; the class axis is identified by matching `num_classes`
    /// against the trailing axis first.
    fn argmax_classes(output: ArrayView4<'_, f32>, num_classes: usize) -> Result<ClassMap> {
        let shape = output.shape();
        if shape[0] != 1 {
            return Err(CutoutError::inference(format!(
                "expected batch size 1, got {}",
                shape[0]
            )));
        }

        let channels_last = shape[3] == num_classes;
        let (height, width) = if channels_last {
            (shape[1], shape[2])
        } else if shape[1] == num_classes {
            (shape[2], shape[3])
        } else {
            return Err(CutoutError::inference(format!(
                "no axis of output shape {shape:?} matches {num_classes} classes"
            )));
        };

        let mut class_map = Array2::<usize>::zeros((height, width));
        for y in 0..height {
            for x in 0..width {
                let mut best_class = 0;
                let mut best_score = f32::NEG_INFINITY;
                for class in 0..num_classes {
                    let score = if channels_last {
                        output[[0, y, x, class]]
                    } else {
                        output[[0, class, y, x]]
                    };
                    if score > best_score {
                        best_score = score;
                        best_class = class;
                    }
                }
                class_map[[y, x]] = best_class;
            }
        }

        Ok(class_map)
    }
}

impl SegmentationBackend for TractBackend {
    fn initialize(&mut self, config: &CutoutConfig) -> Result<Option<Duration>> {
        if self.initialized {
            return Ok(None);
        }

        let model_load_time = self.load_model(config)?;
        Ok(Some(model_load_time))
    }

    fn infer(&mut self, input: &ModelInput) -> Result<ClassMap> {
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| CutoutError::model_unavailable("Tract model not initialized"))?;

        log::debug!("Running Tract inference on tensor {:?}", input.shape());

        let inference_start = Instant::now();

        let input_tensor = Tensor::from(input.clone());
        let outputs = model
            .run(tvec![input_tensor.into()])
            .map_err(|e| CutoutError::inference(format!("Tract inference failed: {e}")))?;

        let output_tensor = outputs
            .into_iter()
            .next()
            .ok_or_else(|| CutoutError::inference("no output tensor found"))?
            .into_arc_tensor();

        let output_data = output_tensor
            .to_array_view::<f32>()
            .map_err(|e| CutoutError::inference(format!("failed to convert output tensor: {e}")))?;

        if output_data.ndim() != 4 {
            return Err(CutoutError::inference(format!(
                "expected 4D output tensor, got {}D",
                output_data.ndim()
            )));
        }
        let output_view = output_data
            .into_dimensionality::<ndarray::Ix4>()
            .map_err(|e| CutoutError::inference(format!("unexpected output layout: {e}")))?;

        let class_map = Self::argmax_classes(output_view, self.num_classes)?;

        log::debug!(
            "Inference completed in {:.2}ms",
            inference_start.elapsed().as_millis()
        );

        Ok(class_map)
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

#[cfg(all(test, feature = "tract"))]
mod tests {
    use super::*;
    use ndarray::Array4;

    #[test]
    fn test_backend_starts_uninitialized() {
        let backend = TractBackend::new();
        assert!(!backend.is_initialized());
        assert_eq!(backend.num_classes(), 0);
    }

    #[test]
    fn test_missing_model_reported_as_unavailable() {
        let mut backend = TractBackend::new();
        let config = CutoutConfig::builder()
            .model_path("/nonexistent/portrait.onnx")
            .build()
            .unwrap();
        let err = backend.initialize(&config).unwrap_err();
        assert!(matches!(err, CutoutError::ModelUnavailable(_)));
        assert!(!backend.is_initialized());
    }

    #[test]
    fn test_infer_before_initialize_fails() {
        let mut backend = TractBackend::new();
        let input = Array4::<f32>::zeros((1, 4, 4, 3));
        let err = backend.infer(&input).unwrap_err();
        assert!(matches!(err, CutoutError::ModelUnavailable(_)));
    }

    #[test]
    fn test_argmax_channels_last() {
        let mut output = Array4::<f32>::zeros((1, 2, 2, 2));
        output[[0, 0, 0, 1]] = 5.0;
        output[[0, 1, 1, 1]] = 3.0;
        let map = TractBackend::argmax_classes(output.view(), 2).unwrap();
        assert_eq!(map[[0, 0]], 1);
        assert_eq!(map[[0, 1]], 0);
        assert_eq!(map[[1, 1]], 1);
    }

    #[test]
    fn test_argmax_channels_first() {
        // (1, classes, h, w) with a distinct spatial size so the layout
        // cannot be confused with channels-last.
        let mut output = Array4::<f32>::zeros((1, 2, 3, 4));
        output[[0, 1, 2, 3]] = 1.0;
        let map = TractBackend::argmax_classes(output.view(), 2).unwrap();
        assert_eq!(map.dim(), (3, 4));
        assert_eq!(map[[2, 3]], 1);
        assert_eq!(map[[0, 0]], 0);
    }

    #[test]
    fn test_argmax_rejects_unmatched_class_axis() {
        let output = Array4::<f32>::zeros((1, 5, 4, 4));
        let err = TractBackend::argmax_classes(output.view(), 2).unwrap_err();
        assert!(matches!(err, CutoutError::Inference(_)));
    }
}
