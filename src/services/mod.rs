//! File I/O services

pub mod io;

pub use io::ImageIOService;
