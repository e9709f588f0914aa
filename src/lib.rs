//! asciicam library crate.
//!
//! Camera frames are sampled into a luminance grid, mapped to glyphs and
//! shown as text; the current text can be streamed to a receipt printer.

pub mod app;
pub mod ascii;
pub mod camera;
pub mod config;
pub mod display;
pub mod printer;
pub mod renderer;
pub mod scheduler;
