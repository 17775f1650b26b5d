#![forbid(unsafe_code)]

//! JSON transport between the browser host and [`WebHost`](crate::WebHost).
//!
//! The host serializes the document once at boot as a [`PageSnapshot`],
//! then sends [`LayoutUpdate`]s before frames and host events as tagged
//! objects (`{"type": "window_scroll"}`, `{"type": "link_click", "node": 4}`).
//! Committed mutations travel back as an array of
//! `{"op": "set_style", "node": 4, "property": "width", "value": "60px"}`.
//!
//! Element ids in a snapshot are implicit: `<html>` is `0`, `<body>` is `1`,
//! and `elements[i]` becomes node `i + 2`. A parent must be listed before
//! its children.

use std::collections::BTreeMap;

use scrollsync_core::dom::ScrollMetrics;
use scrollsync_core::page::{ElementSpec, Page};
use scrollsync_core::{DomError, NodeId, Rect, Viewport, WriteBatch};
use scrollsync_runtime::HostEvent;
use serde::{Deserialize, Serialize};

/// Errors from decoding host JSON or applying it to a page.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Malformed JSON or an unexpected shape.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    /// The payload referenced an element the page does not have.
    #[error(transparent)]
    Dom(#[from] DomError),
    /// The host could not commit its first paint.
    #[error(transparent)]
    Host(#[from] crate::WebHostError),
}

/// The whole document as measured by the host at boot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub viewport: Viewport,
    /// Computed `background-color` of `<body>`.
    #[serde(default)]
    pub body_background: Option<String>,
    /// Every element below `<body>` in document order.
    #[serde(default)]
    pub elements: Vec<ElementSnapshot>,
}

/// One element of a [`PageSnapshot`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementSnapshot {
    /// Parent node; `None` places the element directly under `<body>`.
    pub parent: Option<NodeId>,
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    /// Client rect at snapshot time.
    pub rect: Rect,
    /// Computed `background-color`.
    pub background: Option<String>,
    pub scroll: ScrollMetrics,
    /// `position: fixed`. Descendants of a fixed element are pinned too.
    pub fixed: bool,
}

impl PageSnapshot {
    /// Parse a snapshot.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the mirror document.
    pub fn into_page(self) -> Result<Page, SnapshotError> {
        let mut page = Page::new(self.viewport);
        if let Some(background) = &self.body_background {
            page.set_body_background(background);
        }
        for element in self.elements {
            let parent = element.parent;
            let spec = element.into_spec();
            match parent {
                Some(parent) => page.append(parent, spec)?,
                None => page.append_to_body(spec),
            };
        }
        Ok(page)
    }
}

impl ElementSnapshot {
    fn into_spec(self) -> ElementSpec {
        let mut spec = ElementSpec::new(&self.tag)
            .rect(self.rect)
            .scroll(self.scroll);
        if let Some(id) = &self.id {
            spec = spec.id(id);
        }
        for class in &self.classes {
            spec = spec.class(class);
        }
        for (name, value) in &self.attributes {
            spec = spec.attr(name, value);
        }
        if let Some(background) = &self.background {
            spec = spec.background(background);
        }
        if self.fixed {
            spec = spec.fixed();
        }
        spec
    }
}

/// New client rect for one element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RectUpdate {
    pub node: NodeId,
    pub rect: Rect,
}

/// New scroll metrics for one element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollUpdate {
    pub node: NodeId,
    pub metrics: ScrollMetrics,
}

/// Layout re-measured by the host since the last frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutUpdate {
    pub viewport: Option<Viewport>,
    pub rects: Vec<RectUpdate>,
    pub scroll: Vec<ScrollUpdate>,
}

impl LayoutUpdate {
    /// Parse a layout update. An empty string is an empty update.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.viewport.is_none() && self.rects.is_empty() && self.scroll.is_empty()
    }

    /// Apply to `page`. Nothing is applied if any node is unknown.
    pub fn apply(&self, page: &mut Page) -> Result<(), DomError> {
        let nodes = self
            .rects
            .iter()
            .map(|r| r.node)
            .chain(self.scroll.iter().map(|s| s.node));
        for node in nodes {
            page.element(node)?;
        }
        if let Some(viewport) = self.viewport {
            page.set_viewport(viewport);
        }
        for update in &self.rects {
            page.set_rect(update.node, update.rect)?;
        }
        for update in &self.scroll {
            page.set_scroll_metrics(update.node, update.metrics)?;
        }
        Ok(())
    }
}

/// Decode one host event.
pub fn parse_host_event(json: &str) -> Result<HostEvent, SnapshotError> {
    Ok(serde_json::from_str(json)?)
}

/// Encode a batch for the host to replay.
pub fn encode_batch(batch: &WriteBatch) -> Result<String, SnapshotError> {
    Ok(serde_json::to_string(batch)?)
}
