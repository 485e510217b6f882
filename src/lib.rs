//! Printdown - a Markdown viewer with math and diagram rendering and
//! layout-faithful PDF export
//!
//! Markdown is transformed to HTML, embedded math and diagrams are rendered
//! by pluggable engines, presentation (theme, font scale, page geometry) is
//! applied to the resulting view, and the settled view is printed to PDF.

pub mod app;
pub mod config;
pub mod dialogs;
pub mod dom;
pub mod error;
pub mod export;
pub mod file_handler;
pub mod markdown;
pub mod menu;
pub mod message;
pub mod pagination;
pub mod presentation;
pub mod render;
pub mod state;
pub mod utils;
