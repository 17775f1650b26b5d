#![forbid(unsafe_code)]

//! CSS color strings as reported by `getComputedStyle` and `data-bg-color`.
//!
//! Only two syntaxes are understood: functional `rgb(...)` / `rgba(...)` and
//! six-digit hex `#RRGGBB`. Anything else (named colors, `transparent`,
//! `hsl(...)`, short hex) is "unparsed" and callers skip the dependent work.
//!
//! # Invariants
//!
//! 1. Parsing never retains alpha; [`is_transparent_background`] is the only
//!    place the fourth component is consulted.
//! 2. Channel values are rounded and clamped to `0..=255`.
//! 3. [`is_light`] uses a strict `> 155` comparison on the
//!    `0.299 / 0.587 / 0.114` luma weighting.

use std::fmt;

/// Brightness above which a color is classified as light.
pub const LIGHT_BRIGHTNESS_THRESHOLD: u32 = 155;

/// An opaque RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB triple.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channel-wise `255 - c`.
    #[must_use]
    pub const fn inverted(self) -> Self {
        Self {
            r: 255 - self.r,
            g: 255 - self.g,
            b: 255 - self.b,
        }
    }

    /// Perceived brightness scaled by 1000 (`299·r + 587·g + 114·b`).
    ///
    /// Integer arithmetic keeps the 155 boundary exact.
    #[must_use]
    pub const fn brightness_milli(self) -> u32 {
        self.r as u32 * 299 + self.g as u32 * 587 + self.b as u32 * 114
    }

    /// Perceived brightness in `0.0..=255.0`.
    #[must_use]
    pub fn brightness(self) -> f64 {
        f64::from(self.brightness_milli()) / 1000.0
    }

    /// Whether the perceived brightness is strictly above
    /// [`LIGHT_BRIGHTNESS_THRESHOLD`].
    #[must_use]
    pub const fn is_light(self) -> bool {
        self.brightness_milli() > LIGHT_BRIGHTNESS_THRESHOLD * 1000
    }
}

impl fmt::Display for Rgb {
    /// Formats as the `"r, g, b"` triple used by `--comp-rgb`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.r, self.g, self.b)
    }
}

/// Iterator over the unsigned decimal numbers embedded in a string.
///
/// A number is one or more ASCII digits, optionally followed by `.` and one
/// or more digits. Signs and leading dots are not part of a number, so
/// `".5"` yields `5`.
struct NumericTokens<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> NumericTokens<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    fn digits_from(&self, mut at: usize) -> usize {
        while at < self.bytes.len() && self.bytes[at].is_ascii_digit() {
            at += 1;
        }
        at
    }
}

impl Iterator for NumericTokens<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        while self.pos < self.bytes.len() && !self.bytes[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        if self.pos >= self.bytes.len() {
            return None;
        }
        let start = self.pos;
        let mut end = self.digits_from(start);
        if end + 1 < self.bytes.len()
            && self.bytes[end] == b'.'
            && self.bytes[end + 1].is_ascii_digit()
        {
            end = self.digits_from(end + 1);
        }
        self.pos = end;
        // The slice is ASCII digits with at most one interior dot.
        std::str::from_utf8(&self.bytes[start..end])
            .ok()
            .and_then(|s| s.parse().ok())
    }
}

fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

fn hex_pair(pair: &str) -> Option<u8> {
    u8::from_str_radix(pair, 16).ok()
}

/// Parse a CSS color into an [`Rgb`].
///
/// `rgb(...)` / `rgba(...)` take the first three numeric tokens; `#RRGGBB`
/// takes exactly six hex digits. Every other input yields `None`.
#[must_use]
pub fn parse_color(input: &str) -> Option<Rgb> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if input.starts_with("rgb") {
        let mut tokens = NumericTokens::new(input);
        let r = tokens.next()?;
        let g = tokens.next()?;
        let b = tokens.next()?;
        return Some(Rgb::new(channel(r), channel(g), channel(b)));
    }

    if let Some(hex) = input.strip_prefix('#') {
        let hex = hex.trim();
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        return Some(Rgb::new(
            hex_pair(&hex[0..2])?,
            hex_pair(&hex[2..4])?,
            hex_pair(&hex[4..6])?,
        ));
    }

    None
}

/// Whether a computed background lets the page background show through.
///
/// True for missing or empty input, the literal `transparent`, and any
/// `rgba(...)` whose fourth numeric token is exactly zero. Every other
/// string, including opaque colors identical to the page, is opaque.
#[must_use]
pub fn is_transparent_background(input: Option<&str>) -> bool {
    let Some(input) = input.map(str::trim) else {
        return true;
    };
    if input.is_empty() || input == "transparent" {
        return true;
    }
    if input.starts_with("rgba") {
        let alpha = NumericTokens::new(input).nth(3).unwrap_or(1.0);
        return alpha == 0.0;
    }
    false
}

/// Complement of a CSS color; `None` when the input does not parse.
#[must_use]
pub fn complementary(input: &str) -> Option<Rgb> {
    parse_color(input).map(Rgb::inverted)
}

/// Whether a CSS color is light. Unparsed input counts as dark.
#[must_use]
pub fn is_light(input: &str) -> bool {
    parse_color(input).is_some_and(Rgb::is_light)
}
