#![forbid(unsafe_code)]

//! Color vocabulary for scrollsync.
//!
//! # Role in scrollsync
//! `scrollsync-style` turns the CSS color strings the browser reports into
//! values the theme layer can reason about. Everything here is pure: no DOM,
//! no time, no allocation beyond the CSS strings it emits.
//!
//! # This crate provides
//! - [`Rgb`] and the color helpers [`parse_color`], [`complementary`],
//!   [`is_light`], and [`is_transparent_background`].
//! - [`ComplementTint`], the `--comp-*` custom properties derived from a
//!   page background.

/// CSS color parsing and classification.
pub mod color;
/// Complement tint custom properties.
pub mod tint;

pub use color::{
    LIGHT_BRIGHTNESS_THRESHOLD, Rgb, complementary, is_light, is_transparent_background,
    parse_color,
};
pub use tint::{COMP_A, COMP_A_STRONG, COMP_RGB, ComplementTint};
