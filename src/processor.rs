//! Portrait cutout processor orchestrating the full pipeline
//!
//! Wires the stages together: preprocess, segment, decode labels to colors,
//! regularize the mask, composite against the source. Each stage is timed
//! and wrapped in a tracing span; a failure at any stage aborts the run and
//! produces no partial output.

use crate::{
    composite::Compositor,
    config::CutoutConfig,
    decode::LabelDecoder,
    error::{CutoutError, Result},
    inference::SegmentationBackend,
    palette::Palette,
    preprocess::ImagePreprocessor,
    regularize::MaskRegularizer,
    types::{raw_from_image, CutoutResult, ProcessingMetadata, ProcessingTimings, RawImage},
};
use image::DynamicImage;
use instant::Instant;
use std::path::Path;
use tracing::{debug as trace_debug, info as trace_info, instrument, span, Level};

/// End-to-end portrait cutout pipeline
pub struct PortraitProcessor {
    config: CutoutConfig,
    palette: Palette,
    regularizer: MaskRegularizer,
    backend: Box<dyn SegmentationBackend>,
    backend_name: String,
    initialized: bool,
}

impl PortraitProcessor {
    /// Create a processor around the given backend.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when the configuration fails validation.
    pub fn new(config: CutoutConfig, backend: Box<dyn SegmentationBackend>) -> Result<Self> {
        Self::with_backend_name(config, backend, "tract")
    }

    /// Create a processor with an explicit backend name for metadata.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when the configuration fails validation.
    pub fn with_backend_name(
        config: CutoutConfig,
        backend: Box<dyn SegmentationBackend>,
        backend_name: impl Into<String>,
    ) -> Result<Self> {
        config.validate()?;
        let regularizer = MaskRegularizer::new(config.kernel_size)?;
        Ok(Self {
            config,
            palette: Palette::portrait(),
            regularizer,
            backend,
            backend_name: backend_name.into(),
            initialized: false,
        })
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &CutoutConfig {
        &self.config
    }

    /// Load the segmentation model now rather than on first use.
    ///
    /// # Errors
    /// Returns `ModelUnavailable` when the model cannot be loaded. Nothing
    /// is processed in that case.
    pub fn initialize(&mut self) -> Result<Option<instant::Duration>> {
        if self.initialized {
            return Ok(None);
        }
        let load_time = self.backend.initialize(&self.config)?;
        self.initialized = true;
        if let Some(elapsed) = load_time {
            trace_info!(
                backend = %self.backend_name,
                load_ms = %elapsed.as_millis(),
                "Segmentation model loaded"
            );
        }
        Ok(load_time)
    }

    /// Process an image file and return the cutout result.
    ///
    /// # Errors
    /// Propagates decode, inference and pipeline errors; the result carries
    /// the input path for batch reporting.
    pub fn process_file(&mut self, path: &Path) -> Result<CutoutResult> {
        let decode_start = Instant::now();
        let image = crate::services::ImageIOService::load_image(path)?;
        let decode_ms = u64::try_from(decode_start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let mut result = self.process_image(&image)?;
        result.metadata.timings.image_decode_ms = decode_ms;
        result.metadata.timings.total_ms += decode_ms;
        result.input_path = Some(path.display().to_string());
        Ok(result)
    }

    /// Process an already-decoded image.
    ///
    /// # Errors
    /// Returns `ModelUnavailable` when the model cannot be loaded, `Shape`
    /// when the oracle output does not match the input dimensions, and
    /// stage-specific errors otherwise.
    #[instrument(
        skip(self, image),
        fields(
            backend = %self.backend_name,
            dimensions = %format!("{}x{}", image.width(), image.height())
        )
    )]
    pub fn process_image(&mut self, image: &DynamicImage) -> Result<CutoutResult> {
        let mut timings = ProcessingTimings::default();
        let total_start = Instant::now();

        if !self.initialized {
            let load_start = Instant::now();
            self.initialize()?;
            timings.model_load_ms = elapsed_ms(load_start);
        }

        let original_dimensions = (image.width(), image.height());
        trace_info!(backend = %self.backend_name, "Starting portrait cutout");

        let raw = raw_from_image(image);
        self.run_pipeline(&raw, original_dimensions, timings, total_start)
    }

    fn run_pipeline(
        &mut self,
        raw: &RawImage,
        original_dimensions: (u32, u32),
        mut timings: ProcessingTimings,
        total_start: Instant,
    ) -> Result<CutoutResult> {
        let (height, width, _) = raw.dim();

        let input_tensor = {
            let _span = span!(
                Level::DEBUG,
                "preprocessing",
                height = %height,
                width = %width
            )
            .entered();
            let stage_start = Instant::now();
            let tensor = ImagePreprocessor::preprocess(raw)?;
            timings.preprocessing_ms = elapsed_ms(stage_start);
            tensor
        };

        let class_map = {
            let _span = span!(Level::INFO, "inference", backend = %self.backend_name).entered();
            let stage_start = Instant::now();
            let map = self.backend.infer(&input_tensor)?;
            timings.inference_ms = elapsed_ms(stage_start);
            map
        };

        if class_map.dim() != (height, width) {
            return Err(CutoutError::shape(format!(
                "oracle returned {:?} labels for a {height}x{width} image",
                class_map.dim()
            )));
        }

        let color_mask = {
            let _span = span!(Level::DEBUG, "label_decoding").entered();
            let stage_start = Instant::now();
            let mask = LabelDecoder::decode(&class_map, &self.palette)?;
            timings.mask_decode_ms = elapsed_ms(stage_start);
            mask
        };

        let regularized = {
            let _span = span!(
                Level::DEBUG,
                "regularization",
                kernel = ?self.config.kernel_size
            )
            .entered();
            let stage_start = Instant::now();
            let mask = self.regularizer.regularize(&color_mask)?;
            timings.regularize_ms = elapsed_ms(stage_start);
            mask
        };

        let output = {
            let _span = span!(Level::DEBUG, "compositing").entered();
            let stage_start = Instant::now();
            let output = Compositor::new().composite(&regularized, raw)?;
            timings.composite_ms = elapsed_ms(stage_start);
            output
        };

        timings.total_ms = elapsed_ms(total_start);
        trace_debug!(total_ms = %timings.total_ms, "Cutout pipeline completed");

        let mut metadata = ProcessingMetadata::new(self.backend_name.clone(), self.config.kernel_size);
        metadata.timings = timings;

        Ok(CutoutResult::new(
            output,
            regularized,
            original_dimensions,
            metadata,
        ))
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::test_utils::{MockSegmentation, MockSegmentationBackend};
    use image::RgbImage;
    use ndarray::Array2;

    fn white_image(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([255, 255, 255])))
    }

    fn small_config() -> CutoutConfig {
        CutoutConfig::builder().kernel_size(3, 3).build().unwrap()
    }

    #[test]
    fn test_all_background_yields_black_output() {
        let backend = Box::new(MockSegmentationBackend::all_background());
        let mut processor = PortraitProcessor::with_backend_name(small_config(), backend, "mock")
            .unwrap();
        let result = processor.process_image(&white_image(8, 8)).unwrap();
        assert!(result.output.iter().all(|&v| v == 0.0));
        assert_eq!(result.original_dimensions, (8, 8));
    }

    #[test]
    fn test_all_foreground_passes_source_through() {
        // Class 1 decodes to [1, 1, 1], so the product equals the source.
        let backend = Box::new(MockSegmentationBackend::all_foreground());
        let mut processor = PortraitProcessor::with_backend_name(small_config(), backend, "mock")
            .unwrap();
        let result = processor.process_image(&white_image(8, 8)).unwrap();
        assert!(result.output.iter().all(|&v| v == 255.0));
    }

    #[test]
    fn test_output_shape_matches_input() {
        let backend = Box::new(MockSegmentationBackend::all_foreground());
        let mut processor = PortraitProcessor::with_backend_name(small_config(), backend, "mock")
            .unwrap();
        let result = processor.process_image(&white_image(7, 5)).unwrap();
        assert_eq!(result.output.dim(), (5, 7, 3));
        assert_eq!(result.mask.dim(), (5, 7, 3));
    }

    #[test]
    fn test_failed_initialization_aborts_processing() {
        let backend = Box::new(MockSegmentationBackend::new_failing_initialization());
        let mut processor = PortraitProcessor::with_backend_name(small_config(), backend, "mock")
            .unwrap();
        let err = processor.process_image(&white_image(4, 4)).unwrap_err();
        assert!(matches!(err, CutoutError::ModelUnavailable(_)));
    }

    #[test]
    fn test_out_of_palette_label_is_rejected() {
        let fixed = Array2::<usize>::from_elem((4, 4), 24);
        let backend = Box::new(MockSegmentationBackend::new(MockSegmentation::Fixed(fixed)));
        let mut processor = PortraitProcessor::with_backend_name(small_config(), backend, "mock")
            .unwrap();
        let err = processor.process_image(&white_image(4, 4)).unwrap_err();
        assert!(matches!(err, CutoutError::PaletteIndex { .. }));
    }

    #[test]
    fn test_mismatched_oracle_dimensions_rejected() {
        let fixed = Array2::<usize>::zeros((2, 2));
        let backend = Box::new(MockSegmentationBackend::new(MockSegmentation::Fixed(fixed)));
        let mut processor = PortraitProcessor::with_backend_name(small_config(), backend, "mock")
            .unwrap();
        let err = processor.process_image(&white_image(4, 4)).unwrap_err();
        assert!(matches!(err, CutoutError::Shape(_)));
    }

    #[test]
    fn test_timings_are_recorded() {
        let backend = Box::new(MockSegmentationBackend::all_foreground());
        let mut processor = PortraitProcessor::with_backend_name(small_config(), backend, "mock")
            .unwrap();
        let result = processor.process_image(&white_image(8, 8)).unwrap();
        let timings = result.timings();
        assert!(timings.total_ms >= timings.inference_ms);
        assert_eq!(result.metadata.backend_name, "mock");
        assert_eq!(result.metadata.kernel_size, (3, 3));
    }
}
