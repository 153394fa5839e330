//! Colour, hatch, marker and line-style cycles shared by all figures.

use serde::Serialize;
use std::fmt;

/// Colour-blind friendly colour cycle, nine colours repeated twice.
pub const CB_COLOR_CYCLE: [&str; 18] = [
    "#377eb8", "#ff7f00", "#4daf4a", "#f781bf", "#a65628", "#984ea3", "#999999", "#e41a1c",
    "#dede00", //
    "#377eb8", "#ff7f00", "#4daf4a", "#f781bf", "#a65628", "#984ea3", "#999999", "#e41a1c",
    "#dede00",
];

/// Hatch patterns for filled areas.
pub const HATCHINGS: [&str; 10] = ["/", "\\", "|", "-", "+", "x", "o", "O", ".", "*"];

/// Marker symbols, seven markers repeated three times.
pub const MARKERS: [&str; 21] = [
    "D", "o", "^", "v", "s", "X", "*", //
    "D", "o", "^", "v", "s", "X", "*", //
    "D", "o", "^", "v", "s", "X", "*",
];

/// Line styles: four named styles followed by two custom dash patterns.
pub const STYLES: [LineStyle; 6] = [
    LineStyle::Solid,
    LineStyle::Dotted,
    LineStyle::Dashed,
    LineStyle::DashDot,
    LineStyle::Dash {
        offset: 0,
        pattern: &[3, 1, 1, 1, 1, 1],
    },
    LineStyle::Dash {
        offset: 0,
        pattern: &[3, 1, 1, 1],
    },
];

/// A line style understood by matplotlib-like backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    Solid,
    Dotted,
    Dashed,
    DashDot,
    /// On/off dash sequence in points, starting at `offset`.
    Dash {
        offset: u32,
        pattern: &'static [u32],
    },
}

impl LineStyle {
    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Dash { .. })
    }
}

impl fmt::Display for LineStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Solid => write!(f, "solid"),
            Self::Dotted => write!(f, "dotted"),
            Self::Dashed => write!(f, "dashed"),
            Self::DashDot => write!(f, "dashdot"),
            Self::Dash { offset, pattern } => {
                let segments: Vec<String> = pattern.iter().map(|s| s.to_string()).collect();
                write!(f, "({}, ({}))", offset, segments.join(", "))
            }
        }
    }
}
