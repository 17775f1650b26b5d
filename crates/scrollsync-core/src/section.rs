#![forbid(unsafe_code)]

//! Active-section detection and background resolution.
//!
//! # Invariants
//!
//! 1. At most one section is active per update.
//! 2. The active section is the last candidate (sections and footers in
//!    document order) whose top edge is at or above the trigger line.
//! 3. Scrolling further down never selects an earlier candidate.
//!
//! Background precedence for a node: `data-bg-color`, then its own computed
//! background when not transparent, then the page base background.

use scrollsync_style::is_transparent_background;

use crate::dom::{DomRead, NodeId, Selector};
use crate::selection::{TriggerLine, last_qualifying};

/// Attribute that forces the page background while a node is active.
pub const DATA_BG_COLOR: &str = "data-bg-color";

/// Elements eligible to become the active section.
pub const SECTION_CANDIDATES: Selector<'static> =
    Selector::Any(&[Selector::Tag("section"), Selector::Tag("footer")]);

/// Default trigger line: 25% from the top of the viewport.
pub const SECTION_TRIGGER_FRACTION: f64 = 0.25;

/// Finds the active section and its effective background.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionLocator {
    trigger: TriggerLine,
}

impl Default for SectionLocator {
    fn default() -> Self {
        Self::new(SECTION_TRIGGER_FRACTION)
    }
}

impl SectionLocator {
    #[must_use]
    pub fn new(trigger_fraction: f64) -> Self {
        Self {
            trigger: TriggerLine::new(trigger_fraction),
        }
    }

    #[must_use]
    pub const fn trigger(&self) -> TriggerLine {
        self.trigger
    }

    /// Sections and footers in document order.
    pub fn candidates(dom: &impl DomRead) -> Vec<NodeId> {
        dom.query(&SECTION_CANDIDATES)
    }

    /// Index of the active candidate given each candidate's client top.
    #[must_use]
    pub fn active_index(&self, tops: &[f64], viewport_height: f64) -> Option<usize> {
        last_qualifying(tops, |top| self.trigger.is_crossed_by(**top, viewport_height))
            .map(|(index, _)| index)
    }

    /// The active candidate, or `None` if no top has reached the line.
    pub fn active_section(
        &self,
        dom: &impl DomRead,
        candidates: &[NodeId],
        viewport_height: f64,
    ) -> Option<NodeId> {
        last_qualifying(candidates.iter().copied(), |&node| {
            dom.rect(node)
                .is_some_and(|rect| self.trigger.is_crossed_by(rect.top(), viewport_height))
        })
        .map(|(_, node)| node)
    }

    /// Effective background of `node`, or of the page when `None`.
    pub fn effective_background(dom: &impl DomRead, node: Option<NodeId>) -> String {
        let Some(node) = node else {
            return dom.body_background();
        };
        if let Some(forced) = dom.attribute(node, DATA_BG_COLOR).filter(|c| !c.is_empty()) {
            return forced;
        }
        dom.computed_background(node)
            .filter(|c| !is_transparent_background(Some(c.as_str())))
            .unwrap_or_else(|| dom.body_background())
    }
}
