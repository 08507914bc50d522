//! Portrait Cutout CLI Tool
//!
//! Command-line interface for cutting portrait subjects out of images using
//! the portrait-cutout library with the pure Rust Tract backend.

#[cfg(feature = "cli")]
use portrait_cutout::cli;

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    cli::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    panic!("CLI feature not enabled. Please rebuild with --features cli");
}
