//! Fill and stroke colors.
//!
//! Scene files carry CSS-style color strings (`"#0b0"`, `"rgb(255, 165, 0)"`,
//! `"black"`). They are parsed once at load time into [`Color`].

use serde::Deserialize;
use std::str::FromStr;

/// RGBA color with straight (non-premultiplied) alpha, components in `[0, 1]`.
///
/// Deserializes from a color string; unlike model files, configuration rejects
/// colors it cannot parse.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Creates a color from 8-bit channels.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Returns the color as 8-bit channels, clamping out-of-range components.
    pub fn to_rgba8(self) -> [u8; 4] {
        let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
}

/// A color string that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorError(pub String);

impl std::fmt::Display for ColorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unrecognized color '{}'", self.0)
    }
}

impl std::error::Error for ColorError {}

impl FromStr for Color {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        let err = || ColorError(s.to_string());

        if let Some(hex) = text.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(err);
        }
        if let Some(args) = text
            .strip_prefix("rgba(")
            .or_else(|| text.strip_prefix("rgb("))
            .and_then(|rest| rest.strip_suffix(')'))
        {
            return parse_functional(args).ok_or_else(err);
        }
        named(&text).ok_or_else(err)
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 => Some(Color::from_rgba8(nibble(0)?, nibble(1)?, nibble(2)?, 255)),
        4 => Some(Color::from_rgba8(nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?)),
        6 => Some(Color::from_rgba8(byte(0)?, byte(2)?, byte(4)?, 255)),
        8 => Some(Color::from_rgba8(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
        _ => None,
    }
}

// "r, g, b" or "r, g, b, a" with 0-255 channels and 0-1 alpha.
fn parse_functional(args: &str) -> Option<Color> {
    let parts: Vec<f32> = args
        .split(',')
        .map(|p| p.trim().parse::<f32>().ok().filter(|v| v.is_finite()))
        .collect::<Option<_>>()?;
    let channel = |v: f32| v.clamp(0.0, 255.0) / 255.0;
    match parts.as_slice() {
        [r, g, b] => Some(Color::rgb(channel(*r), channel(*g), channel(*b))),
        [r, g, b, a] => Some(Color::rgba(
            channel(*r),
            channel(*g),
            channel(*b),
            a.clamp(0.0, 1.0),
        )),
        _ => None,
    }
}

fn named(name: &str) -> Option<Color> {
    let rgb8 = |r, g, b| Color::from_rgba8(r, g, b, 255);
    Some(match name {
        "black" => Color::BLACK,
        "white" => Color::WHITE,
        "transparent" => Color::TRANSPARENT,
        "red" => rgb8(255, 0, 0),
        "green" => rgb8(0, 128, 0),
        "lime" => rgb8(0, 255, 0),
        "blue" => rgb8(0, 0, 255),
        "yellow" => rgb8(255, 255, 0),
        "orange" => rgb8(255, 165, 0),
        "cyan" | "aqua" => rgb8(0, 255, 255),
        "magenta" | "fuchsia" => rgb8(255, 0, 255),
        "gray" | "grey" => rgb8(128, 128, 128),
        "silver" => rgb8(192, 192, 192),
        "gold" => rgb8(255, 215, 0),
        _ => return None,
    })
}

impl TryFrom<String> for Color {
    type Error = ColorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Parses an optional color string, logging and discarding anything unparseable.
pub(crate) fn parse_lenient(value: Option<&str>, context: &str) -> Option<Color> {
    let text = value?;
    match text.parse::<Color>() {
        Ok(color) => Some(color),
        Err(e) => {
            log::warn!("{}: {}; treating as unset", context, e);
            None
        }
    }
}
