//! Plot style value and the process-wide style.
//!
//! Plotting code should take a [`PlotStyle`] argument. The global copy exists
//! for call sites that cannot, and is set once with [`configure`] before any
//! figure is drawn.

use crate::palette::{CB_COLOR_CYCLE, HATCHINGS, LineStyle, MARKERS, STYLES};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::debug;

/// Base stylesheet the rc parameters are layered on.
pub const BASE_STYLE: &str = "seaborn-v0_8-colorblind";

/// Font size used when none is given.
pub const DEFAULT_FONT_SIZE: f64 = 12.0;

static GLOBAL_STYLE: Lazy<RwLock<PlotStyle>> = Lazy::new(|| RwLock::new(PlotStyle::default()));

/// Complete styling of the cohort figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotStyle {
    pub base_style: String,
    pub font_size: f64,
    pub font_family: String,
    /// Preferred fonts of the sans-serif family, in order.
    pub sans_serif: Vec<String>,
    /// Render text through LaTeX.
    pub use_tex: bool,
    pub colors: &'static [&'static str],
    pub hatchings: &'static [&'static str],
    pub markers: &'static [&'static str],
    pub line_styles: &'static [LineStyle],
}

impl Default for PlotStyle {
    fn default() -> Self {
        Self::new(DEFAULT_FONT_SIZE)
    }
}

impl PlotStyle {
    /// Style with the shared palette and the given font size.
    ///
    /// The size is taken as is; the plotting backend decides what it accepts.
    pub fn new(font_size: f64) -> Self {
        Self {
            base_style: BASE_STYLE.to_string(),
            font_size,
            font_family: "sans-serif".to_string(),
            sans_serif: vec!["Arial".to_string()],
            use_tex: false,
            colors: &CB_COLOR_CYCLE,
            hatchings: &HATCHINGS,
            markers: &MARKERS,
            line_styles: &STYLES,
        }
    }

    /// Color of the `index`-th series, wrapping around the cycle.
    pub fn color(&self, index: usize) -> &'static str {
        self.colors[index % self.colors.len()]
    }

    pub fn hatch(&self, index: usize) -> &'static str {
        self.hatchings[index % self.hatchings.len()]
    }

    pub fn marker(&self, index: usize) -> &'static str {
        self.markers[index % self.markers.len()]
    }

    pub fn line_style(&self, index: usize) -> LineStyle {
        self.line_styles[index % self.line_styles.len()]
    }

    /// Flat rc parameter mapping for a matplotlib-like backend.
    ///
    /// ```rust,ignore
    /// let params = PlotStyle::new(14.0).rc_params();
    /// assert_eq!(params["font.size"], 14.0);
    /// ```
    pub fn rc_params(&self) -> Value {
        json!({
            "font.size": self.font_size,
            "font.family": self.font_family,
            "font.sans-serif": self.sans_serif,
            "text.usetex": self.use_tex,
            "axes.prop_cycle": { "color": self.colors },
        })
    }
}

/// Replace the process-wide style with the shared one at `font_size`.
///
/// Calling it again with the same size leaves the same state behind.
pub fn configure(font_size: f64) {
    let style = PlotStyle::new(font_size);
    debug!(
        "Configuring plot style '{}' (font size {}, family {:?})",
        style.base_style, style.font_size, style.sans_serif
    );
    *GLOBAL_STYLE.write() = style;
}

/// Snapshot of the process-wide style.
pub fn current() -> PlotStyle {
    GLOBAL_STYLE.read().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_style() {
        let style = PlotStyle::default();
        assert_eq!(style.base_style, "seaborn-v0_8-colorblind");
        assert_eq!(style.font_size, 12.0);
        assert_eq!(style.font_family, "sans-serif");
        assert_eq!(style.sans_serif, vec!["Arial".to_string()]);
        assert!(!style.use_tex);
    }

    #[test]
    fn test_cycle_accessors_wrap() {
        let style = PlotStyle::default();
        assert_eq!(style.color(0), "#377eb8");
        assert_eq!(style.color(18), "#377eb8");
        assert_eq!(style.hatch(11), "\\");
        assert_eq!(style.marker(7), "D");
        assert_eq!(style.line_style(6), LineStyle::Solid);
    }

    #[test]
    fn test_rc_params() {
        let params = PlotStyle::new(9.5).rc_params();

        assert_eq!(params["font.size"], json!(9.5));
        assert_eq!(params["font.family"], json!("sans-serif"));
        assert_eq!(params["font.sans-serif"], json!(["Arial"]));
        assert_eq!(params["text.usetex"], json!(false));
        assert_eq!(
            params["axes.prop_cycle"]["color"].as_array().map(|c| c.len()),
            Some(18)
        );
    }

    #[test]
    fn test_font_size_unchecked() {
        let style = PlotStyle::new(-3.0);
        assert_eq!(style.font_size, -3.0);
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_value(PlotStyle::default()).unwrap();
        assert_eq!(json["line_styles"][0], json!("solid"));
        assert_eq!(json["markers"].as_array().map(|m| m.len()), Some(21));
    }
}
