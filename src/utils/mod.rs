//! Utility functions shared by the index, lint and CLI layers.
//!
//! ## Modules
//!
//! - [`app_data`] - Configuration file lookup (project file or XDG config dir)
//! - [`bootstrap`] - Tracing subscriber setup
//! - [`entities`] - HTML character reference decoding
//! - [`progress`] - Progress bar that compiles away without the `progress` feature

pub mod app_data;
pub mod bootstrap;
pub mod entities;
pub mod progress;

pub use app_data::*;
pub use entities::*;
