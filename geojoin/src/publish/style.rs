//! Declarative display style for published layers.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Error parsing an `r,g,b,a` color.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color '{input}': {reason}")]
pub struct ColorParseError {
    pub input: String,
    pub reason: &'static str,
}

/// RGBA color: 8-bit channels plus alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

/// Serialises as `[r, g, b, a]`.
impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.r, self.g, self.b, self.a).serialize(serializer)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    /// Parse `r,g,b,a` (whitespace around parts is ignored).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = |reason| ColorParseError {
            input: s.to_string(),
            reason,
        };
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        let [r, g, b, a] = parts.as_slice() else {
            return Err(err("expected four comma-separated values"));
        };
        let channel = |v: &str| v.parse::<u8>().map_err(|_| err("channels must be 0-255"));
        let alpha: f64 = a.parse().map_err(|_| err("alpha must be a number"))?;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(err("alpha must be between 0 and 1"));
        }
        Ok(Rgba::new(channel(*r)?, channel(*g)?, channel(*b)?, alpha))
    }
}

/// Default fill: translucent blue.
pub const DEFAULT_FILL: Rgba = Rgba::new(0, 120, 255, 0.5);

/// Default outline: translucent black.
pub const DEFAULT_OUTLINE: Rgba = Rgba::new(0, 0, 0, 0.6);

pub const DEFAULT_OUTLINE_WIDTH: f64 = 1.0;

/// Simple-fill symbol applied to every element of a layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayStyle {
    pub fill: Rgba,
    pub outline: Rgba,
    pub outline_width: f64,
}

impl Default for DisplayStyle {
    fn default() -> Self {
        Self {
            fill: DEFAULT_FILL,
            outline: DEFAULT_OUTLINE,
            outline_width: DEFAULT_OUTLINE_WIDTH,
        }
    }
}
