//! Rendering environment states.
mod canvas;

pub use canvas::{rotate, Canvas, Rgb, BLACK, WHITE};

use ndarray::Array3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How an environment renders its state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// A text frame, possibly containing ANSI escape sequences.
    Ansi,
    /// An RGB image.
    RgbArray,
}

impl RenderMode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ansi => "ansi",
            Self::RgbArray => "rgb_array",
        }
    }
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown render mode '{0}'")]
pub struct ParseRenderModeError(pub String);

impl FromStr for RenderMode {
    type Err = ParseRenderModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ansi" => Ok(Self::Ansi),
            "rgb_array" => Ok(Self::RgbArray),
            _ => Err(ParseRenderModeError(s.to_string())),
        }
    }
}

/// A rendered frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderFrame {
    Ansi(String),
    /// Pixels with shape `[rows, cols, 3]`.
    Rgb(Array3<u8>),
    /// Nothing was rendered because the environment has no render mode.
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RenderMode::Ansi)]
    #[case(RenderMode::RgbArray)]
    fn parse_display(#[case] mode: RenderMode) {
        assert_eq!(mode.to_string().parse::<RenderMode>(), Ok(mode));
    }

    #[test]
    fn parse_human_fails() {
        assert!("human".parse::<RenderMode>().is_err());
    }

    #[test]
    fn serde_name() {
        assert_eq!(
            serde_json::to_value(RenderMode::RgbArray).unwrap(),
            serde_json::json!("rgb_array")
        );
    }
}
