//! UI module - visibility toggle panel and canvas previews

mod canvas_strip;
mod toggle_panel;

pub use canvas_strip::*;
pub use toggle_panel::*;
