#![forbid(unsafe_code)]

//! Selection policy for "which node is current".
//!
//! Both the active-section rule and the active-link rule pick the **last**
//! item in document order that satisfies a predicate. Because candidates are
//! scanned top to bottom and each match replaces the previous one, the
//! lowest qualifying node wins: the most recently entered section, not the
//! one closest to the viewport center.

/// The item with the greatest index for which `predicate` holds, with that
/// index.
pub fn last_qualifying<T, I, P>(items: I, mut predicate: P) -> Option<(usize, T)>
where
    I: IntoIterator<Item = T>,
    P: FnMut(&T) -> bool,
{
    items
        .into_iter()
        .enumerate()
        .filter(|(_, item)| predicate(item))
        .last()
}

/// A horizontal line at a fixed fraction of the viewport height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerLine {
    fraction: f64,
}

impl TriggerLine {
    /// A line at `fraction` of the viewport height, clamped to `0.0..=1.0`.
    #[must_use]
    pub fn new(fraction: f64) -> Self {
        Self {
            fraction: fraction.clamp(0.0, 1.0),
        }
    }

    #[must_use]
    pub const fn fraction(&self) -> f64 {
        self.fraction
    }

    /// The line's client y for a viewport height.
    #[must_use]
    pub fn y(&self, viewport_height: f64) -> f64 {
        viewport_height * self.fraction
    }

    /// Whether a top edge has scrolled at or above the line.
    #[must_use]
    pub fn is_crossed_by(&self, top: f64, viewport_height: f64) -> bool {
        top <= self.y(viewport_height)
    }
}
