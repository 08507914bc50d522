//! Portrait cutout CLI tool
//!
//! Batch driver over a source directory: every supported image is run
//! through the pipeline and written under the destination directory with
//! the same file name.

use crate::{
    backends::TractBackend,
    config::CutoutConfig,
    processor::PortraitProcessor,
    services::ImageIOService,
    tracing_config::{TracingConfig, TracingFormat},
};
use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Portrait cutout CLI tool
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "portrait-cutout")]
pub struct Cli {
    /// Source directory containing portrait images
    #[arg(value_name = "SRC_DIR")]
    pub src_dir: PathBuf,

    /// Destination directory for cutout images
    #[arg(value_name = "DST_DIR")]
    pub dst_dir: PathBuf,

    /// Path to the ONNX segmentation model
    #[arg(short, long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Structuring element size for mask regularization (square)
    #[arg(short, long, default_value_t = 50)]
    pub kernel_size: usize,

    /// Descend into subdirectories of SRC_DIR
    #[arg(short, long)]
    pub recursive: bool,

    /// Continue with remaining files when one fails
    #[arg(long)]
    pub keep_going: bool,

    /// Print per-stage timings as JSON after each file
    #[arg(long)]
    pub timings: bool,

    /// Enable verbose logging (-v: DEBUG, -vv: TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

pub fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose).context("Failed to initialize tracing")?;

    if !cli.src_dir.is_dir() {
        anyhow::bail!(
            "Source path is not a directory: {}",
            cli.src_dir.display()
        );
    }

    let mut builder = CutoutConfig::builder().kernel_size(cli.kernel_size, cli.kernel_size);
    if let Some(ref model) = cli.model {
        builder = builder.model_path(model.clone());
    }
    let config = builder.build().context("Invalid configuration")?;

    info!("Starting portrait cutout");
    info!("Source: {}", cli.src_dir.display());
    info!("Destination: {}", cli.dst_dir.display());
    info!("Model: {}", config.model_path.display());

    let mut processor =
        PortraitProcessor::new(config, Box::new(TractBackend::new()))
            .context("Failed to create processor")?;

    // Fail fast on a missing model before touching any files.
    processor
        .initialize()
        .context("Segmentation model unavailable")?;

    let files = find_image_files(&cli.src_dir, cli.recursive)?;
    if files.is_empty() {
        warn!(
            "No supported image files found in {}",
            cli.src_dir.display()
        );
        return Ok(());
    }

    info!("Found {} image file(s) to process", files.len());

    std::fs::create_dir_all(&cli.dst_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            cli.dst_dir.display()
        )
    })?;

    let progress = if files.len() > 1 {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
                )
                .unwrap()
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let start_time = Instant::now();
    let mut processed_count = 0usize;
    let mut failed_count = 0usize;

    for input_file in &files {
        if let Some(ref pb) = progress {
            pb.set_message(format!("Processing {}", input_file.display()));
        }

        match process_one(&mut processor, input_file, &cli.dst_dir, cli.timings) {
            Ok(()) => processed_count += 1,
            Err(e) => {
                failed_count += 1;
                if cli.keep_going {
                    warn!("Skipping {}: {e:#}", input_file.display());
                } else {
                    if let Some(pb) = progress {
                        pb.abandon();
                    }
                    return Err(e.context(format!("Failed on {}", input_file.display())));
                }
            },
        }

        if let Some(ref pb) = progress {
            pb.inc(1);
        }
    }

    if let Some(pb) = progress {
        pb.finish_with_message("done");
    }

    info!(
        "Processed {} image(s) ({} failed) in {:.2}s",
        processed_count,
        failed_count,
        start_time.elapsed().as_secs_f64()
    );

    Ok(())
}

fn process_one(
    processor: &mut PortraitProcessor,
    input_file: &Path,
    dst_dir: &Path,
    print_timings: bool,
) -> Result<()> {
    let mut result = processor.process_file(input_file)?;

    let file_name = input_file
        .file_name()
        .context("Input file has no file name")?;
    let output_path = dst_dir.join(file_name);
    result
        .save_timed(&output_path)
        .with_context(|| format!("Failed to save {}", output_path.display()))?;

    if print_timings {
        let json = serde_json::to_string_pretty(&result.metadata)
            .context("Failed to serialize timings")?;
        println!("{json}");
    }

    Ok(())
}

/// Initialize tracing based on verbosity level
fn init_tracing(verbose_count: u8) -> Result<()> {
    TracingConfig::new()
        .with_verbosity(verbose_count)
        .with_format(TracingFormat::Console)
        .init()
        .context("Failed to initialize tracing subscriber")
}

/// Collect supported image files from a directory, sorted for a stable
/// processing order.
fn find_image_files(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if recursive {
        for entry in walkdir::WalkDir::new(dir) {
            let entry = entry?;
            if entry.file_type().is_file() && ImageIOService::is_supported(entry.path()) {
                files.push(entry.path().to_path_buf());
            }
        }
    } else {
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() && ImageIOService::is_supported(entry.path()) {
                files.push(entry.path());
            }
        }
    }

    files.sort();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_minimal_invocation() {
        let cli = Cli::try_parse_from(["portrait-cutout", "in", "out"]).unwrap();
        assert_eq!(cli.src_dir, PathBuf::from("in"));
        assert_eq!(cli.dst_dir, PathBuf::from("out"));
        assert_eq!(cli.kernel_size, 50);
        assert!(!cli.recursive);
        assert!(!cli.keep_going);
        assert!(cli.model.is_none());
    }

    #[test]
    fn test_cli_parses_options() {
        let cli = Cli::try_parse_from([
            "portrait-cutout",
            "in",
            "out",
            "--model",
            "m.onnx",
            "--kernel-size",
            "25",
            "--recursive",
            "--keep-going",
            "--timings",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.model, Some(PathBuf::from("m.onnx")));
        assert_eq!(cli.kernel_size, 25);
        assert!(cli.recursive);
        assert!(cli.keep_going);
        assert!(cli.timings);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_requires_both_directories() {
        assert!(Cli::try_parse_from(["portrait-cutout", "in"]).is_err());
    }

    #[test]
    fn test_find_image_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.png", "a.jpg", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        let files = find_image_files(dir.path(), false).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.png"]);
    }

    #[test]
    fn test_find_image_files_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("sub");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(dir.path().join("top.png"), b"x").unwrap();
        std::fs::write(sub.join("nested.jpg"), b"x").unwrap();

        let flat = find_image_files(dir.path(), false).unwrap();
        assert_eq!(flat.len(), 1);

        let deep = find_image_files(dir.path(), true).unwrap();
        assert_eq!(deep.len(), 2);
    }
}
