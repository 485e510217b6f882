//! Render module for Printdown
//!
//! Everything between transformed HTML and a settled view:
//! - Engines and the adapters that drive them
//! - The completion gate awaited before pagination and export
//! - Render cycle tokens for superseding stale renders
//! - The view document and the pipeline tying it together

pub mod adapter;
pub mod cycles;
pub mod diagram_adapter;
pub mod embeds;
pub mod engine;
pub mod gate;
pub mod math_adapter;
pub mod pipeline;
pub mod view;

pub use adapter::{AdapterReport, RenderContext, RendererAdapter};
pub use cycles::{RenderCycles, RenderToken};
pub use diagram_adapter::DiagramAdapter;
pub use embeds::ImageWidths;
pub use engine::{DiagramEngine, Engines, MathEngine, ProcessEngine};
pub use gate::{GateReport, RenderingGate};
pub use math_adapter::MathAdapter;
pub use pipeline::{RenderOptions, RenderPipeline, RenderRequest, RenderedView};
pub use view::ViewDom;
