//! Utility functions for display formatting.

pub mod format;

pub use format::{format_date, format_number, format_optional, format_time, truncate_string};
