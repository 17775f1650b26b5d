#![forbid(unsafe_code)]

//! The document seam: node ids, selectors, reads, and batched writes.
//!
//! Updates are split into a read phase and a write phase. Read code takes a
//! `&impl DomRead` and returns plain values; write code only appends to a
//! [`WriteBatch`]. The host commits the batch once per cycle through
//! [`DomWrite::commit`], so layout reads are never interleaved with style
//! writes.

use std::borrow::Cow;

use crate::geometry::{Rect, Viewport};

/// Opaque element handle; ids are assigned in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeId(u32);

impl NodeId {
    /// Wrap a raw document-order index.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Raw document-order index.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Index into a document-order element list.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors surfaced by a document host.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// A mutation or query referenced an element the host does not know.
    #[error("unknown node {0}")]
    UnknownNode(NodeId),
}

/// Element selectors; the subset of CSS selector syntax the runtime uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector<'a> {
    /// `section`
    Tag(&'a str),
    /// `.hs-panel`
    Class(&'a str),
    /// `#about`
    Id(&'a str),
    /// `[data-overlay-open]`
    Attr(&'a str),
    /// `img.grid-item-image`
    TagClass(&'a str, &'a str),
    /// `.nav-links a`: a tag anywhere below an element with a class.
    ClassDescendantTag(&'a str, &'a str),
    /// Comma list: matches if any alternative matches.
    Any(&'a [Selector<'a>]),
}

/// What a host element exposes for selector matching.
pub trait Matchable {
    /// Lowercase tag name.
    fn tag(&self) -> &str;
    /// Element id, if any.
    fn element_id(&self) -> Option<&str>;
    /// Class membership.
    fn has_class(&self, class: &str) -> bool;
    /// Attribute presence.
    fn has_attribute(&self, name: &str) -> bool;
}

impl Selector<'_> {
    /// Whether `element` matches. `ancestors` yields the element's ancestors,
    /// nearest first, for descendant combinators.
    pub fn matches<'e, M: Matchable + 'e>(
        &self,
        element: &M,
        mut ancestors: impl Iterator<Item = &'e M>,
    ) -> bool {
        match *self {
            Self::Tag(tag) => element.tag() == tag,
            Self::Class(class) => element.has_class(class),
            Self::Id(id) => element.element_id() == Some(id),
            Self::Attr(name) => element.has_attribute(name),
            Self::TagClass(tag, class) => element.tag() == tag && element.has_class(class),
            Self::ClassDescendantTag(class, tag) => {
                element.tag() == tag && ancestors.any(|a| a.has_class(class))
            }
            Self::Any(alternatives) => {
                let ancestors: Vec<&M> = ancestors.collect();
                alternatives
                    .iter()
                    .any(|alt| alt.matches(element, ancestors.iter().copied()))
            }
        }
    }
}

/// Scroll and offset metrics of one element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ScrollMetrics {
    /// `offsetTop`, in document coordinates.
    pub offset_top: f64,
    /// `offsetHeight`.
    pub offset_height: f64,
    /// `scrollWidth`.
    pub scroll_width: f64,
    /// `scrollLeft`.
    pub scroll_left: f64,
    /// `clientWidth`.
    pub client_width: f64,
}

/// One visibility-observer record.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntersectionEntry {
    pub node: NodeId,
    /// Visible fraction of the element's area.
    pub ratio: f64,
    pub is_intersecting: bool,
}

/// Read side of the document. Implementations must not mutate layout.
pub trait DomRead {
    /// Current viewport snapshot.
    fn viewport(&self) -> Viewport;

    /// The `<html>` element (custom properties live here).
    fn root(&self) -> NodeId;

    /// The `<body>` element.
    fn body(&self) -> NodeId;

    /// All matching elements in document order.
    fn query(&self, selector: &Selector<'_>) -> Vec<NodeId>;

    /// Matching descendants of `scope` in document order.
    fn query_in(&self, scope: NodeId, selector: &Selector<'_>) -> Vec<NodeId>;

    /// First matching element.
    fn first(&self, selector: &Selector<'_>) -> Option<NodeId> {
        self.query(selector).into_iter().next()
    }

    /// First matching descendant of `scope`.
    fn first_in(&self, scope: NodeId, selector: &Selector<'_>) -> Option<NodeId> {
        self.query_in(scope, selector).into_iter().next()
    }

    /// `node` or its nearest ancestor matching `selector`, like `Element.closest`.
    fn closest(&self, node: NodeId, selector: &Selector<'_>) -> Option<NodeId>;

    /// Client rect, like `getBoundingClientRect`.
    fn rect(&self, node: NodeId) -> Option<Rect>;

    /// Attribute value.
    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    /// Computed `background-color`.
    fn computed_background(&self, node: NodeId) -> Option<String>;

    /// Class membership.
    fn has_class(&self, node: NodeId, class: &str) -> bool;

    /// Offset and scroll metrics.
    fn scroll_metrics(&self, node: NodeId) -> Option<ScrollMetrics>;

    /// Inline style property as last written.
    fn inline_style(&self, node: NodeId, property: &str) -> Option<String>;

    /// The page base background: the body's computed background.
    fn body_background(&self) -> String {
        self.computed_background(self.body())
            .unwrap_or_else(|| DEFAULT_PAGE_BACKGROUND.to_owned())
    }
}

/// Background used when the host reports none for the body.
pub const DEFAULT_PAGE_BACKGROUND: &str = "rgb(255, 255, 255)";

/// One style, attribute, or class change.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "op", rename_all = "snake_case"))]
pub enum DomMutation {
    /// `el.style.setProperty(property, value)`; covers custom properties.
    SetStyle {
        node: NodeId,
        property: Cow<'static, str>,
        value: String,
    },
    /// `el.style.removeProperty(property)`.
    RemoveStyle {
        node: NodeId,
        property: Cow<'static, str>,
    },
    /// `el.setAttribute(name, value)`.
    SetAttribute {
        node: NodeId,
        name: Cow<'static, str>,
        value: String,
    },
    /// `el.classList.add(class)`.
    AddClass {
        node: NodeId,
        class: Cow<'static, str>,
    },
    /// `el.classList.remove(class)`.
    RemoveClass {
        node: NodeId,
        class: Cow<'static, str>,
    },
}

impl DomMutation {
    /// Target element.
    #[must_use]
    pub const fn node(&self) -> NodeId {
        match self {
            Self::SetStyle { node, .. }
            | Self::RemoveStyle { node, .. }
            | Self::SetAttribute { node, .. }
            | Self::AddClass { node, .. }
            | Self::RemoveClass { node, .. } => *node,
        }
    }
}

/// Ordered mutations produced by one write phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct WriteBatch {
    mutations: Vec<DomMutation>,
}

impl WriteBatch {
    /// Empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_style(
        &mut self,
        node: NodeId,
        property: impl Into<Cow<'static, str>>,
        value: impl Into<String>,
    ) {
        self.mutations.push(DomMutation::SetStyle {
            node,
            property: property.into(),
            value: value.into(),
        });
    }

    pub fn remove_style(&mut self, node: NodeId, property: impl Into<Cow<'static, str>>) {
        self.mutations.push(DomMutation::RemoveStyle {
            node,
            property: property.into(),
        });
    }

    pub fn set_attribute(
        &mut self,
        node: NodeId,
        name: impl Into<Cow<'static, str>>,
        value: impl Into<String>,
    ) {
        self.mutations.push(DomMutation::SetAttribute {
            node,
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn add_class(&mut self, node: NodeId, class: impl Into<Cow<'static, str>>) {
        self.mutations.push(DomMutation::AddClass {
            node,
            class: class.into(),
        });
    }

    pub fn remove_class(&mut self, node: NodeId, class: impl Into<Cow<'static, str>>) {
        self.mutations.push(DomMutation::RemoveClass {
            node,
            class: class.into(),
        });
    }

    /// Append every mutation of `other`, preserving order.
    pub fn append(&mut self, other: WriteBatch) {
        self.mutations.extend(other.mutations);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DomMutation> {
        self.mutations.iter()
    }

    /// Last value written for a style property on `node`, if any.
    #[must_use]
    pub fn style_value(&self, node: NodeId, property: &str) -> Option<&str> {
        self.mutations.iter().rev().find_map(|m| match m {
            DomMutation::SetStyle {
                node: n,
                property: p,
                value,
            } if *n == node && p == property => Some(value.as_str()),
            _ => None,
        })
    }
}

impl IntoIterator for WriteBatch {
    type Item = DomMutation;
    type IntoIter = std::vec::IntoIter<DomMutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.mutations.into_iter()
    }
}

impl<'a> IntoIterator for &'a WriteBatch {
    type Item = &'a DomMutation;
    type IntoIter = std::slice::Iter<'a, DomMutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.mutations.iter()
    }
}

/// Write side of the document.
pub trait DomWrite {
    /// Apply a batch. Returns the number of mutations applied.
    ///
    /// Hosts validate the whole batch before applying any of it.
    fn commit(&mut self, batch: WriteBatch) -> Result<usize, DomError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct El {
        tag: &'static str,
        classes: &'static [&'static str],
    }

    impl Matchable for El {
        fn tag(&self) -> &str {
            self.tag
        }
        fn element_id(&self) -> Option<&str> {
            None
        }
        fn has_class(&self, class: &str) -> bool {
            self.classes.contains(&class)
        }
        fn has_attribute(&self, _name: &str) -> bool {
            false
        }
    }

    #[test]
    fn descendant_selector_walks_ancestors() {
        let list = El {
            tag: "ul",
            classes: &["nav-links"],
        };
        let link = El {
            tag: "a",
            classes: &[],
        };
        let sel = Selector::ClassDescendantTag("nav-links", "a");
        assert!(sel.matches(&link, [&list].into_iter()));
        assert!(!sel.matches(&link, std::iter::empty()));
    }

    #[test]
    fn any_matches_alternatives() {
        let footer = El {
            tag: "footer",
            classes: &[],
        };
        let sel = Selector::Any(&[Selector::Tag("section"), Selector::Tag("footer")]);
        assert!(sel.matches(&footer, std::iter::empty()));
    }

    #[test]
    fn batch_reports_last_style_write() {
        let node = NodeId::new(3);
        let mut batch = WriteBatch::new();
        batch.set_style(node, "width", "10px");
        batch.set_style(node, "width", "20px");
        batch.add_class(node, "active");
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.style_value(node, "width"), Some("20px"));
        assert_eq!(batch.style_value(NodeId::new(4), "width"), None);
    }
}
