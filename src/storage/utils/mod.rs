// Utilities for storage module
pub mod error;
pub mod output;
pub mod size;

pub use output::{OutputFormat, Render, render};
