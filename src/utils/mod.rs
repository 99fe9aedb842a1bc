//! Utility functions for text formatting and display.

pub mod format;

pub use format::{format_optional, format_time_remaining, strip_html, truncate_string};
