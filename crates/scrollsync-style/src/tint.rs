#![forbid(unsafe_code)]

//! Complement tint custom properties.
//!
//! Styling reads three variables from the document root to draw overlays
//! that contrast with the current page background:
//!
//! | Property | Value |
//! |----------|-------|
//! | `--comp-rgb` | complement as `"r, g, b"` |
//! | `--comp-a` | `0.18` on light backgrounds, `0.26` on dark |
//! | `--comp-a-strong` | `0.26` on light backgrounds, `0.34` on dark |

use crate::color::{Rgb, parse_color};

/// Custom property carrying the complement triple.
pub const COMP_RGB: &str = "--comp-rgb";
/// Custom property carrying the base tint opacity.
pub const COMP_A: &str = "--comp-a";
/// Custom property carrying the strong tint opacity.
pub const COMP_A_STRONG: &str = "--comp-a-strong";

const LIGHT_ALPHA: (&str, &str) = ("0.18", "0.26");
const DARK_ALPHA: (&str, &str) = ("0.26", "0.34");

/// Tint derived from one page background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComplementTint {
    /// Complement of the background.
    pub rgb: Rgb,
    /// Whether the background itself is light.
    pub light: bool,
}

impl ComplementTint {
    /// Derive the tint for a CSS background, `None` if it does not parse.
    #[must_use]
    pub fn from_background(background: &str) -> Option<Self> {
        let base = parse_color(background)?;
        Some(Self {
            rgb: base.inverted(),
            light: base.is_light(),
        })
    }

    /// Base opacity tier.
    #[must_use]
    pub const fn alpha(&self) -> &'static str {
        if self.light { LIGHT_ALPHA.0 } else { DARK_ALPHA.0 }
    }

    /// Strong opacity tier.
    #[must_use]
    pub const fn alpha_strong(&self) -> &'static str {
        if self.light { LIGHT_ALPHA.1 } else { DARK_ALPHA.1 }
    }

    /// The three custom properties in write order.
    #[must_use]
    pub fn css_vars(&self) -> [(&'static str, String); 3] {
        [
            (COMP_RGB, self.rgb.to_string()),
            (COMP_A, self.alpha().to_owned()),
            (COMP_A_STRONG, self.alpha_strong().to_owned()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dark_background_uses_dark_tiers() {
        let tint = ComplementTint::from_background("rgb(0, 0, 0)").unwrap();
        assert!(!tint.light);
        assert_eq!(
            tint.css_vars(),
            [
                (COMP_RGB, "255, 255, 255".to_owned()),
                (COMP_A, "0.26".to_owned()),
                (COMP_A_STRONG, "0.34".to_owned()),
            ]
        );
    }

    #[test]
    fn light_background_uses_light_tiers() {
        let tint = ComplementTint::from_background("#f5f0e8").unwrap();
        assert!(tint.light);
        assert_eq!(tint.alpha(), "0.18");
        assert_eq!(tint.alpha_strong(), "0.26");
        assert_eq!(tint.rgb, Rgb::new(10, 15, 23));
    }

    #[test]
    fn unparsed_background_has_no_tint() {
        assert_eq!(ComplementTint::from_background("transparent"), None);
    }
}
