#![forbid(unsafe_code)]

//! Tunable parameters for every scroll-driven component.
//!
//! [`SyncConfig::default()`] reproduces the stock site behavior. With the
//! `policy-config` feature the same struct loads from TOML or JSON:
//!
//! ```toml
//! [theme]
//! section_trigger = 0.25
//! scrolled_threshold = 80.0
//!
//! [indicator]
//! duration_ms = 460
//! ```
//!
//! Missing keys keep their defaults.

use std::time::Duration;

#[cfg(feature = "policy-config")]
use serde::{Deserialize, Serialize};

use scrollsync_core::Insets;

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct SyncConfig {
    pub theme: ThemeConfig,
    pub indicator: IndicatorConfig,
    pub horizontal: HorizontalConfig,
    pub reveal: RevealConfig,
    pub cursor: CursorConfig,
}

/// Page theme and nav bar.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct ThemeConfig {
    /// Trigger line for the active section, as a fraction of viewport height.
    pub section_trigger: f64,
    /// Trigger line for the active nav link.
    pub link_trigger: f64,
    /// `scrollY` beyond which the nav bar is "scrolled".
    pub scrolled_threshold: f64,
    /// Hero background translation per scrolled pixel.
    pub parallax_factor: f64,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            section_trigger: 0.25,
            link_trigger: 0.28,
            scrolled_threshold: 80.0,
            parallax_factor: 0.5,
        }
    }
}

/// Floating nav indicator.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct IndicatorConfig {
    /// Indicator width relative to its link.
    pub width_ratio: f64,
    /// Elastic transition length.
    pub duration_ms: u64,
    /// Where the overshoot keyframe sits.
    pub overshoot_offset: f64,
    /// Stretch at zero travel distance.
    pub overshoot_base: f64,
    /// Extra stretch per pixel travelled.
    pub overshoot_slope: f64,
    /// Stretch ceiling.
    pub overshoot_max: f64,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            width_ratio: 0.6,
            duration_ms: 460,
            overshoot_offset: 0.52,
            overshoot_base: 8.0,
            overshoot_slope: 0.14,
            overshoot_max: 26.0,
        }
    }
}

impl IndicatorConfig {
    #[must_use]
    pub const fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    /// Trailing-edge stretch for a move of `distance` pixels.
    #[must_use]
    pub fn overshoot(&self, distance: f64) -> f64 {
        (self.overshoot_base + self.overshoot_slope * distance.abs()).min(self.overshoot_max)
    }
}

/// Pinned horizontal-scroll section.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct HorizontalConfig {
    /// `(max-width: N px)` selects touch mode at startup.
    pub mobile_max_width: f64,
    /// Left bound of the panel visibility window, in client px.
    pub visible_min: f64,
    /// How far past the right viewport edge the window extends.
    pub visible_extra: f64,
}

impl Default for HorizontalConfig {
    fn default() -> Self {
        Self {
            mobile_max_width: 768.0,
            visible_min: -100.0,
            visible_extra: 200.0,
        }
    }
}

/// Intersection-based reveal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct RevealConfig {
    /// Visible fraction that latches an element.
    pub threshold: f64,
    /// Bottom root margin in px (negative shrinks the viewport).
    pub bottom_margin: f64,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            bottom_margin: -100.0,
        }
    }
}

impl RevealConfig {
    /// Observer root margin.
    #[must_use]
    pub const fn root_margin(&self) -> Insets {
        Insets::new(0.0, 0.0, self.bottom_margin, 0.0)
    }
}

/// Custom cursor.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct CursorConfig {
    /// Fraction of the remaining distance the ring covers per frame.
    pub follow: f64,
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self { follow: 0.15 }
    }
}

/// Loader errors.
#[cfg(feature = "policy-config")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

fn check_fraction(errors: &mut Vec<String>, name: &str, value: f64) {
    if !(0.0..=1.0).contains(&value) {
        errors.push(format!("{name} must be in [0, 1], got {value}"));
    }
}

impl SyncConfig {
    /// Load from a TOML string.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a JSON string.
    #[cfg(feature = "policy-config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Range checks. An empty list means the config is usable.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        check_fraction(&mut errors, "theme.section_trigger", self.theme.section_trigger);
        check_fraction(&mut errors, "theme.link_trigger", self.theme.link_trigger);
        if self.theme.scrolled_threshold < 0.0 {
            errors.push("theme.scrolled_threshold must be >= 0".to_owned());
        }
        if !(0.0..=1.0).contains(&self.indicator.width_ratio) || self.indicator.width_ratio == 0.0 {
            errors.push(format!(
                "indicator.width_ratio must be in (0, 1], got {}",
                self.indicator.width_ratio
            ));
        }
        if self.indicator.duration_ms == 0 {
            errors.push("indicator.duration_ms must be > 0".to_owned());
        }
        let offset = self.indicator.overshoot_offset;
        if !(offset > 0.0 && offset < 1.0) {
            errors.push(format!(
                "indicator.overshoot_offset must be in (0, 1), got {offset}"
            ));
        }
        if self.indicator.overshoot_max < self.indicator.overshoot_base {
            errors.push("indicator.overshoot_max must be >= overshoot_base".to_owned());
        }
        if self.horizontal.mobile_max_width < 0.0 {
            errors.push("horizontal.mobile_max_width must be >= 0".to_owned());
        }
        check_fraction(&mut errors, "reveal.threshold", self.reveal.threshold);
        if !(self.cursor.follow > 0.0 && self.cursor.follow <= 1.0) {
            errors.push(format!(
                "cursor.follow must be in (0, 1], got {}",
                self.cursor.follow
            ));
        }
        errors
    }
}
