//! Mock segmentation backend for testing
//!
//! Provides a deterministic [`SegmentationBackend`] so pipeline behavior can
//! be tested without a model file. The mock records every call it receives
//! and can be configured to fail at initialization or inference.

use crate::config::CutoutConfig;
use crate::error::{CutoutError, Result};
use crate::inference::SegmentationBackend;
use crate::palette::DEFAULT_NUM_CLASSES;
use crate::types::{ClassMap, ModelInput};
use instant::Duration;
use ndarray::Array2;
use std::sync::{Arc, Mutex};

/// What the mock returns for each inference call
#[derive(Debug, Clone)]
pub enum MockSegmentation {
    /// Every pixel gets the same class label.
    Uniform(usize),
    /// A centered disk of class 1 on a class 0 background, radius is a
    /// quarter of the smaller image dimension.
    CenterDisk,
    /// A fixed class map returned verbatim regardless of input size.
    Fixed(ClassMap),
}

/// Configurable in-memory segmentation backend
#[derive(Debug)]
pub struct MockSegmentationBackend {
    segmentation: MockSegmentation,
    num_classes: usize,
    initialized: bool,
    fail_initialization: bool,
    fail_inference: bool,
    call_history: Arc<Mutex<Vec<String>>>,
}

impl MockSegmentationBackend {
    /// Create a mock returning the given segmentation pattern.
    #[must_use]
    pub fn new(segmentation: MockSegmentation) -> Self {
        Self {
            segmentation,
            num_classes: DEFAULT_NUM_CLASSES,
            initialized: false,
            fail_initialization: false,
            fail_inference: false,
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock labeling every pixel as background.
    #[must_use]
    pub fn all_background() -> Self {
        Self::new(MockSegmentation::Uniform(0))
    }

    /// Create a mock labeling every pixel as foreground.
    #[must_use]
    pub fn all_foreground() -> Self {
        Self::new(MockSegmentation::Uniform(1))
    }

    /// Create a mock whose `initialize` fails with `ModelUnavailable`.
    #[must_use]
    pub fn new_failing_initialization() -> Self {
        let mut backend = Self::all_background();
        backend.fail_initialization = true;
        backend
    }

    /// Create a mock whose `infer` fails with an `Inference` error.
    #[must_use]
    pub fn new_failing_inference() -> Self {
        let mut backend = Self::all_background();
        backend.fail_inference = true;
        backend
    }

    /// Override the reported number of classes. Useful for producing
    /// labels outside the palette range.
    #[must_use]
    pub fn with_num_classes(mut self, num_classes: usize) -> Self {
        self.num_classes = num_classes;
        self
    }

    /// All calls received so far, in order.
    #[must_use]
    pub fn call_history(&self) -> Vec<String> {
        self.call_history
            .lock()
            .map(|history| history.clone())
            .unwrap_or_default()
    }

    fn record_call(&self, call: &str) {
        if let Ok(mut history) = self.call_history.lock() {
            history.push(call.to_string());
        }
    }

    #[allow(clippy::cast_precision_loss)] // Image dimensions stay far below f64 precision
    fn render(&self, height: usize, width: usize) -> ClassMap {
        match &self.segmentation {
            MockSegmentation::Uniform(class) => Array2::from_elem((height, width), *class),
            MockSegmentation::CenterDisk => {
                let mut map = Array2::zeros((height, width));
                let (cy, cx) = (height as f64 / 2.0, width as f64 / 2.0);
                let radius = (height.min(width) as f64) / 4.0;
                for y in 0..height {
                    for x in 0..width {
                        let dy = y as f64 + 0.5 - cy;
                        let dx = x as f64 + 0.5 - cx;
                        if dy * dy + dx * dx <= radius * radius {
                            map[[y, x]] = 1;
                        }
                    }
                }
                map
            },
            MockSegmentation::Fixed(map) => map.clone(),
        }
    }
}

impl SegmentationBackend for MockSegmentationBackend {
    fn initialize(&mut self, config: &CutoutConfig) -> Result<Option<Duration>> {
        self.record_call(&format!(
            "initialize(model_path={})",
            config.model_path.display()
        ));

        if self.fail_initialization {
            return Err(CutoutError::model_unavailable(
                "mock backend configured to fail initialization",
            ));
        }

        self.initialized = true;
        Ok(None)
    }

    fn infer(&mut self, input: &ModelInput) -> Result<ClassMap> {
        let shape = input.shape();
        self.record_call(&format!("infer(shape={shape:?})"));

        if !self.initialized {
            return Err(CutoutError::model_unavailable(
                "mock backend not initialized",
            ));
        }
        if self.fail_inference {
            return Err(CutoutError::inference(
                "mock backend configured to fail inference",
            ));
        }

        Ok(self.render(shape[1], shape[2]))
    }

    fn num_classes(&self) -> usize {
        self.num_classes
    }

    fn is_initialized(&self) -> bool {
        self.initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array4;

    fn initialized(mut backend: MockSegmentationBackend) -> MockSegmentationBackend {
        backend.initialize(&CutoutConfig::default()).unwrap();
        backend
    }

    #[test]
    fn test_uniform_segmentation() {
        let mut backend = initialized(MockSegmentationBackend::all_foreground());
        let input = Array4::<f32>::zeros((1, 3, 5, 3));
        let map = backend.infer(&input).unwrap();
        assert_eq!(map.dim(), (3, 5));
        assert!(map.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_center_disk_has_both_classes() {
        let mut backend = initialized(MockSegmentationBackend::new(MockSegmentation::CenterDisk));
        let input = Array4::<f32>::zeros((1, 16, 16, 3));
        let map = backend.infer(&input).unwrap();
        assert_eq!(map[[8, 8]], 1);
        assert_eq!(map[[0, 0]], 0);
    }

    #[test]
    fn test_fixed_map_returned_verbatim() {
        let mut fixed = Array2::<usize>::zeros((2, 2));
        fixed[[1, 0]] = 1;
        let mut backend = initialized(MockSegmentationBackend::new(MockSegmentation::Fixed(
            fixed.clone(),
        )));
        let input = Array4::<f32>::zeros((1, 2, 2, 3));
        assert_eq!(backend.infer(&input).unwrap(), fixed);
    }

    #[test]
    fn test_failing_initialization() {
        let mut backend = MockSegmentationBackend::new_failing_initialization();
        let err = backend.initialize(&CutoutConfig::default()).unwrap_err();
        assert!(matches!(err, CutoutError::ModelUnavailable(_)));
        assert!(!backend.is_initialized());
    }

    #[test]
    fn test_failing_inference() {
        let mut backend = initialized(MockSegmentationBackend::new_failing_inference());
        let input = Array4::<f32>::zeros((1, 2, 2, 3));
        let err = backend.infer(&input).unwrap_err();
        assert!(matches!(err, CutoutError::Inference(_)));
    }

    #[test]
    fn test_infer_before_initialize_fails() {
        let mut backend = MockSegmentationBackend::all_background();
        let input = Array4::<f32>::zeros((1, 2, 2, 3));
        assert!(backend.infer(&input).is_err());
    }

    #[test]
    fn test_call_history_records_operations() {
        let mut backend = initialized(MockSegmentationBackend::all_background());
        let input = Array4::<f32>::zeros((1, 2, 2, 3));
        backend.infer(&input).unwrap();

        let history = backend.call_history();
        assert_eq!(history.len(), 2);
        assert!(history[0].starts_with("initialize("));
        assert!(history[1].starts_with("infer("));
    }
}
