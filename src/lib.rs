//! ocrdrop
//!
//! Drop an image on the terminal, preview it, upload it to a text-extraction
//! endpoint with live progress, then copy the returned text.

pub mod app;
pub mod clipboard;
pub mod config;
pub mod drop;
pub mod error;
pub mod preview;
pub mod theme;
pub mod transfer;
pub mod ui;
pub mod widget;

pub use config::AppConfig;
pub use error::{ClipboardError, UploadError, ValidationError};
pub use widget::UploadWidget;
