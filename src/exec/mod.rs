// src/exec/mod.rs

//! Process execution layer.
//!
//! Runs the user command through the platform shell, synchronously on the
//! watch loop's thread; while a command runs, further events queue up in the
//! kernel.

pub mod command;

pub use command::{clear_console, interpolate, run_command};
