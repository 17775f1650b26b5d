#![forbid(unsafe_code)]

//! One-way reveal on first sight.
//!
//! Candidates gain [`VISIBLE_CLASS`] the first time the visibility observer
//! reports them at or above the threshold and keep it forever after.

use std::collections::HashSet;

use scrollsync_core::dom::IntersectionEntry;
use scrollsync_core::{DomRead, Insets, NodeId, Selector, WriteBatch};

use crate::config::RevealConfig;

/// Elements gated behind the reveal.
pub const REVEAL_TARGETS: Selector<'static> = Selector::Any(&[
    Selector::Class("section-header"),
    Selector::Class("grid-item"),
    Selector::Class("feature-card"),
    Selector::Class("stat-item"),
    Selector::Class("full-image-section"),
]);
/// Class that makes a reveal target visible.
pub const VISIBLE_CLASS: &str = "visible";

/// Latches reveal targets into the visible state.
#[derive(Debug, Clone)]
pub struct RevealLatch {
    targets: Vec<NodeId>,
    revealed: HashSet<NodeId>,
    threshold: f64,
    root_margin: Insets,
}

impl RevealLatch {
    /// Collect the targets. `None` when the page has none.
    pub fn mount(dom: &impl DomRead, cfg: &RevealConfig) -> Option<Self> {
        let targets = dom.query(&REVEAL_TARGETS);
        if targets.is_empty() {
            return None;
        }
        let revealed = targets
            .iter()
            .copied()
            .filter(|&node| dom.has_class(node, VISIBLE_CLASS))
            .collect();
        Some(Self {
            targets,
            revealed,
            threshold: cfg.threshold,
            root_margin: cfg.root_margin(),
        })
    }

    /// Nodes the host should observe.
    pub fn targets(&self) -> &[NodeId] {
        &self.targets
    }

    /// Observer root margin.
    pub const fn root_margin(&self) -> Insets {
        self.root_margin
    }

    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_revealed(&self, node: NodeId) -> bool {
        self.revealed.contains(&node)
    }

    /// Targets not yet latched.
    pub fn pending(&self) -> usize {
        self.targets.len() - self.revealed.len()
    }

    /// Feed observer entries. Returns how many targets latched.
    pub fn observe(&mut self, entries: &[IntersectionEntry], batch: &mut WriteBatch) -> usize {
        let mut latched = 0;
        for entry in entries {
            if !entry.is_intersecting || entry.ratio < self.threshold {
                continue;
            }
            if !self.targets.contains(&entry.node) || !self.revealed.insert(entry.node) {
                continue;
            }
            batch.add_class(entry.node, VISIBLE_CLASS);
            latched += 1;
        }
        latched
    }
}

/// Mark every reveal target visible at once.
pub fn reveal_all(dom: &impl DomRead) -> WriteBatch {
    let mut batch = WriteBatch::new();
    for node in dom.query(&REVEAL_TARGETS) {
        batch.add_class(node, VISIBLE_CLASS);
    }
    batch
}
