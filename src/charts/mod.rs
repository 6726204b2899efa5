//! Charts module - static chart rendering

mod renderer;
mod style;

pub use renderer::{ChartRenderer, RenderError};
pub use style::ChartStyle;
