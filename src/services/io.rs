//! Image file input/output
//!
//! Separates file I/O from the pipeline stages so the processor can be
//! tested on in-memory images alone.

use crate::error::{CutoutError, Result};
use image::DynamicImage;
use std::path::Path;

/// Extensions the batch driver picks up from a source directory.
#[cfg(feature = "webp-support")]
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff", "webp"];

/// Extensions the batch driver picks up from a source directory.
#[cfg(not(feature = "webp-support"))]
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tif", "tiff"];

/// Service for image file loading and saving
pub struct ImageIOService;

impl ImageIOService {
    /// Load an image from a file path.
    ///
    /// Tries extension-based format detection first and falls back to
    /// content-based detection for files with wrong or missing extensions.
    ///
    /// # Errors
    /// Returns an I/O error when the file is missing or unreadable and a
    /// processing error when neither detection strategy can decode it.
    pub fn load_image<P: AsRef<Path>>(path: P) -> Result<DynamicImage> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(CutoutError::file_io_error(
                "read image file",
                path_ref,
                std::io::Error::new(std::io::ErrorKind::NotFound, "file does not exist"),
            ));
        }

        match image::open(path_ref) {
            Ok(img) => Ok(img),
            Err(e) => {
                log::debug!(
                    "Extension-based loading failed for {}: {}. Attempting content-based detection.",
                    path_ref.display(),
                    e
                );

                let data = std::fs::read(path_ref).map_err(|io_err| {
                    CutoutError::file_io_error("read image data", path_ref, io_err)
                })?;

                image::load_from_memory(&data).map_err(|content_err| {
                    CutoutError::processing_stage_error(
                        "image loading",
                        &format!(
                            "failed with both extension-based ({e}) and content-based detection ({content_err})"
                        ),
                        Some(&format!(
                            "path: {}, size: {} bytes",
                            path_ref.display(),
                            data.len()
                        )),
                    )
                })
            },
        }
    }

    /// Save an image, creating parent directories as needed.
    ///
    /// The encoder is chosen from the output path's extension.
    ///
    /// # Errors
    /// Returns `UnsupportedFormat` when the extension is not one of
    /// [`SUPPORTED_EXTENSIONS`], an I/O error when the directory cannot be
    /// created and an image error when encoding fails.
    pub fn save_image<P: AsRef<Path>>(image: &DynamicImage, path: P) -> Result<()> {
        let path_ref = path.as_ref();

        if !Self::is_supported(path_ref) {
            let extension = path_ref
                .extension()
                .and_then(|ext| ext.to_str())
                .unwrap_or("none");
            return Err(CutoutError::unsupported_format(format!(
                "cannot encode '{extension}' (supported: {})",
                SUPPORTED_EXTENSIONS.join(", ")
            )));
        }

        if let Some(parent) = path_ref.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    CutoutError::file_io_error("create output directory", parent, e)
                })?;
            }
        }

        image.save(path_ref)?;
        Ok(())
    }

    /// Whether a path has an extension the batch driver processes.
    #[must_use]
    pub fn is_supported<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                let lowered = ext.to_ascii_lowercase();
                SUPPORTED_EXTENSIONS.contains(&lowered.as_str())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(ImageIOService::is_supported("portrait.jpg"));
        assert!(ImageIOService::is_supported("portrait.JPEG"));
        assert!(ImageIOService::is_supported("dir/portrait.png"));
        assert!(!ImageIOService::is_supported("notes.txt"));
        assert!(!ImageIOService::is_supported("no_extension"));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = ImageIOService::load_image("/nonexistent/portrait.png").unwrap_err();
        assert!(matches!(err, CutoutError::Io(_)));
    }

    #[test]
    fn test_save_rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let image = DynamicImage::new_rgb8(2, 2);
        let err =
            ImageIOService::save_image(&image, dir.path().join("out.bmp")).unwrap_err();
        assert!(matches!(err, CutoutError::UnsupportedFormat(_)));
        assert!(!dir.path().join("out.bmp").exists());
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.png");
        let image = DynamicImage::new_rgb8(2, 2);
        ImageIOService::save_image(&image, &path).unwrap();
        assert!(path.exists());
    }
}
