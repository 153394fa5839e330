//! Shared plotting style for the appendicitis cohort figures.
//!
//! A colour-blind friendly palette, hatch, marker and line-style cycles, and a
//! sans-serif font setup.
//!
//! ```rust,ignore
//! use plot_style::{PlotStyle, configure, current};
//!
//! configure(12.0);
//! let style = current();
//! let params = style.rc_params();
//! ```

pub mod palette;
pub mod style;

pub use palette::{CB_COLOR_CYCLE, HATCHINGS, LineStyle, MARKERS, STYLES};
pub use style::{BASE_STYLE, DEFAULT_FONT_SIZE, PlotStyle, configure, current};
