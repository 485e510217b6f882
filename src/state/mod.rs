//! State management module for Printdown
//!
//! This module contains all application state types organized by concern:
//! - `app_state`: Documents and the root `ApplicationState`
//! - `tab_state`: Tab bar management
//! - `session_state`: Persistent session record

mod app_state;
mod session_state;
mod tab_state;

pub use app_state::*;
pub use session_state::*;
pub use tab_state::*;
