//! File handler module for Printdown
//!
//! Handles all file system operations including:
//! - Reading files with encoding detection and writing them atomically
//! - File stats used to detect external modification
//! - Watching open documents and reconciling external changes

pub mod io;
pub mod watcher;

pub use io::*;
pub use watcher::*;
