//! Terminal UI module using ratatui.
//!
//! - `render`: Main frame rendering, layout and overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color scheme and text styling
//! - `tabs`: Per-tab content rendering (profile, biomarkers, etc.)

pub mod input;
pub mod render;
pub mod styles;
pub mod tabs;
