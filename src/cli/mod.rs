//! Command-line interface

mod main;

pub use main::{main, Cli};
