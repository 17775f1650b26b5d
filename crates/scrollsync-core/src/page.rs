#![forbid(unsafe_code)]

//! In-memory document implementing [`DomRead`] and [`DomWrite`].
//!
//! [`Page`] holds a flat, document-ordered list of elements with their
//! client rects, computed backgrounds, and inline styles. Hosts feed it
//! layout (from a browser snapshot or by hand in tests) and read back the
//! styles, attributes, and classes that committed batches produced.
//!
//! Elements must be appended in document order: a parent before its
//! children, siblings left to right.

use std::collections::BTreeMap;

use crate::dom::{
    DomError, DomMutation, DomRead, DomWrite, IntersectionEntry, Matchable, NodeId,
    ScrollMetrics, Selector, WriteBatch,
};
use crate::geometry::{Insets, Rect, Viewport};

/// Builder for one element.
#[derive(Debug, Clone, Default)]
pub struct ElementSpec {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    rect: Rect,
    background: Option<String>,
    scroll: ScrollMetrics,
    fixed: bool,
}

impl ElementSpec {
    /// Start an element with a tag name.
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn id(mut self, id: &str) -> Self {
        self.id = Some(id.to_owned());
        self
    }

    #[must_use]
    pub fn class(mut self, class: &str) -> Self {
        self.classes.push(class.to_owned());
        self
    }

    #[must_use]
    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_owned(), value.to_owned());
        self
    }

    /// Client rect at the page's current scroll position.
    #[must_use]
    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    /// Computed `background-color`.
    #[must_use]
    pub fn background(mut self, color: &str) -> Self {
        self.background = Some(color.to_owned());
        self
    }

    #[must_use]
    pub fn scroll(mut self, metrics: ScrollMetrics) -> Self {
        self.scroll = metrics;
        self
    }

    /// `position: fixed`; the element (and its subtree) ignores page scroll.
    #[must_use]
    pub fn fixed(mut self) -> Self {
        self.fixed = true;
        self
    }
}

/// One element of a [`Page`].
#[derive(Debug, Clone)]
pub struct Element {
    tag: String,
    id: Option<String>,
    classes: Vec<String>,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    parent: Option<NodeId>,
    rect: Rect,
    background: Option<String>,
    scroll: ScrollMetrics,
    fixed: bool,
}

impl Element {
    fn from_spec(spec: ElementSpec, parent: Option<NodeId>) -> Self {
        Self {
            tag: spec.tag,
            id: spec.id,
            classes: spec.classes,
            attributes: spec.attributes,
            styles: BTreeMap::new(),
            parent,
            rect: spec.rect,
            background: spec.background,
            scroll: spec.scroll,
            fixed: spec.fixed,
        }
    }

    /// Classes in insertion order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Inline styles written so far.
    pub fn styles(&self) -> &BTreeMap<String, String> {
        &self.styles
    }
}

impl Matchable for Element {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn element_id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}

const ROOT: NodeId = NodeId::new(0);
const BODY: NodeId = NodeId::new(1);

/// In-memory document.
#[derive(Debug, Clone)]
pub struct Page {
    viewport: Viewport,
    elements: Vec<Element>,
    commits: u64,
}

impl Page {
    /// A page with `<html>` and `<body>` and nothing else.
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        let frame = viewport.client_rect();
        let root = Element::from_spec(ElementSpec::new("html").rect(frame), None);
        let body = Element::from_spec(ElementSpec::new("body").rect(frame), Some(ROOT));
        Self {
            viewport,
            elements: vec![root, body],
            commits: 0,
        }
    }

    /// Set the computed background of `<body>`.
    pub fn set_body_background(&mut self, color: &str) {
        self.elements[BODY.index()].background = Some(color.to_owned());
    }

    /// Append an element under `parent`. Returns its id.
    pub fn append(&mut self, parent: NodeId, spec: ElementSpec) -> Result<NodeId, DomError> {
        self.element(parent)?;
        Ok(self.push(Element::from_spec(spec, Some(parent))))
    }

    /// Append an element directly under `<body>`.
    pub fn append_to_body(&mut self, spec: ElementSpec) -> NodeId {
        self.push(Element::from_spec(spec, Some(BODY)))
    }

    fn push(&mut self, element: Element) -> NodeId {
        let id = NodeId::new(self.elements.len() as u32);
        self.elements.push(element);
        id
    }

    /// Element by id.
    pub fn element(&self, node: NodeId) -> Result<&Element, DomError> {
        self.elements
            .get(node.index())
            .ok_or(DomError::UnknownNode(node))
    }

    fn element_mut(&mut self, node: NodeId) -> Result<&mut Element, DomError> {
        self.elements
            .get_mut(node.index())
            .ok_or(DomError::UnknownNode(node))
    }

    /// Number of elements including `<html>` and `<body>`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.len() <= 2
    }

    /// Batches committed so far.
    #[must_use]
    pub const fn commits(&self) -> u64 {
        self.commits
    }

    fn ancestors(&self, node: NodeId) -> impl Iterator<Item = &Element> + '_ {
        self.ancestor_ids(node)
            .filter_map(|id| self.elements.get(id.index()))
    }

    fn ancestor_ids(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut next = self.elements.get(node.index()).and_then(|e| e.parent);
        std::iter::from_fn(move || {
            let id = next?;
            next = self.elements.get(id.index())?.parent;
            Some(id)
        })
    }

    fn is_descendant_of(&self, node: NodeId, scope: NodeId) -> bool {
        self.ancestor_ids(node).any(|id| id == scope)
    }

    fn is_pinned(&self, node: NodeId) -> bool {
        self.elements.get(node.index()).is_some_and(|e| e.fixed)
            || self.ancestors(node).any(|e| e.fixed)
    }

    fn matching<'a>(&'a self, selector: &Selector<'a>) -> impl Iterator<Item = NodeId> + 'a {
        let selector = *selector;
        self.elements
            .iter()
            .enumerate()
            .filter(move |(i, el)| {
                selector.matches(*el, self.ancestors(NodeId::new(*i as u32)))
            })
            .map(|(i, _)| NodeId::new(i as u32))
    }

    // --- layout control -------------------------------------------------

    /// Replace the viewport size, keeping scroll offsets.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    /// Replace the viewport snapshot without moving any rect. Hosts that
    /// re-measure layout themselves use this instead of [`Page::scroll_to`].
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Scroll the window to `y`, moving every non-fixed client rect.
    pub fn scroll_to(&mut self, y: f64) {
        let delta = y - self.viewport.scroll_y;
        self.viewport.scroll_y = y;
        for i in 2..self.elements.len() {
            if !self.is_pinned(NodeId::new(i as u32)) {
                let el = &mut self.elements[i];
                el.rect = el.rect.translated(0.0, -delta);
            }
        }
    }

    /// Overwrite an element's client rect.
    pub fn set_rect(&mut self, node: NodeId, rect: Rect) -> Result<(), DomError> {
        self.element_mut(node)?.rect = rect;
        Ok(())
    }

    /// Overwrite an element's scroll metrics.
    pub fn set_scroll_metrics(
        &mut self,
        node: NodeId,
        metrics: ScrollMetrics,
    ) -> Result<(), DomError> {
        self.element_mut(node)?.scroll = metrics;
        Ok(())
    }

    /// Scroll a container horizontally, moving its descendants' rects.
    pub fn set_scroll_left(&mut self, node: NodeId, left: f64) -> Result<(), DomError> {
        let el = self.element_mut(node)?;
        let delta = left - el.scroll.scroll_left;
        el.scroll.scroll_left = left;
        for i in 0..self.elements.len() {
            let id = NodeId::new(i as u32);
            if self.is_descendant_of(id, node) {
                let child = &mut self.elements[i];
                child.rect = child.rect.translated(-delta, 0.0);
            }
        }
        Ok(())
    }

    // --- inspection -----------------------------------------------------

    /// Inline style value.
    #[must_use]
    pub fn style(&self, node: NodeId, property: &str) -> Option<&str> {
        self.elements
            .get(node.index())
            .and_then(|e| e.styles.get(property))
            .map(String::as_str)
    }

    /// Attribute value.
    #[must_use]
    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.elements
            .get(node.index())
            .and_then(|e| e.attributes.get(name))
            .map(String::as_str)
    }

    /// Visibility-observer entries for `nodes` against the viewport grown or
    /// shrunk by `root_margin`.
    #[must_use]
    pub fn intersections(&self, nodes: &[NodeId], root_margin: Insets) -> Vec<IntersectionEntry> {
        let root = self.viewport.client_rect().expanded(root_margin);
        nodes
            .iter()
            .filter_map(|&node| {
                let rect = self.elements.get(node.index())?.rect;
                let overlap = rect.intersection(&root);
                let ratio = match overlap {
                    Some(o) if !rect.is_empty() => o.area() / rect.area(),
                    _ => 0.0,
                };
                Some(IntersectionEntry {
                    node,
                    ratio,
                    is_intersecting: overlap.is_some(),
                })
            })
            .collect()
    }
}

impl DomRead for Page {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn root(&self) -> NodeId {
        ROOT
    }

    fn body(&self) -> NodeId {
        BODY
    }

    fn query(&self, selector: &Selector<'_>) -> Vec<NodeId> {
        self.matching(selector).collect()
    }

    fn query_in(&self, scope: NodeId, selector: &Selector<'_>) -> Vec<NodeId> {
        self.matching(selector)
            .filter(|&id| self.is_descendant_of(id, scope))
            .collect()
    }

    fn closest(&self, node: NodeId, selector: &Selector<'_>) -> Option<NodeId> {
        std::iter::once(node)
            .chain(self.ancestor_ids(node))
            .find(|&id| {
                self.elements
                    .get(id.index())
                    .is_some_and(|el| selector.matches(el, self.ancestors(id)))
            })
    }

    fn rect(&self, node: NodeId) -> Option<Rect> {
        self.elements.get(node.index()).map(|e| e.rect)
    }

    fn attribute(&self, node: NodeId, name: &str) -> Option<String> {
        self.attr(node, name).map(str::to_owned)
    }

    /// An inline `background-color` wins over the declared one, as it
    /// would in a cascade.
    fn computed_background(&self, node: NodeId) -> Option<String> {
        let el = self.elements.get(node.index())?;
        el.styles
            .get("background-color")
            .or(el.background.as_ref())
            .cloned()
    }

    fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.elements
            .get(node.index())
            .is_some_and(|e| Matchable::has_class(e, class))
    }

    fn scroll_metrics(&self, node: NodeId) -> Option<ScrollMetrics> {
        self.elements.get(node.index()).map(|e| e.scroll)
    }

    fn inline_style(&self, node: NodeId, property: &str) -> Option<String> {
        self.style(node, property).map(str::to_owned)
    }
}

impl DomWrite for Page {
    fn commit(&mut self, batch: WriteBatch) -> Result<usize, DomError> {
        if let Some(bad) = batch.iter().find(|m| m.node().index() >= self.elements.len()) {
            return Err(DomError::UnknownNode(bad.node()));
        }
        let mut applied = 0;
        for mutation in batch {
            let el = self.element_mut(mutation.node())?;
            match mutation {
                DomMutation::SetStyle {
                    property, value, ..
                } => {
                    el.styles.insert(property.into_owned(), value);
                }
                DomMutation::RemoveStyle { property, .. } => {
                    el.styles.remove(&*property);
                }
                DomMutation::SetAttribute { name, value, .. } => {
                    el.attributes.insert(name.into_owned(), value);
                }
                DomMutation::AddClass { class, .. } => {
                    if !el.classes.iter().any(|c| *c == class) {
                        el.classes.push(class.into_owned());
                    }
                }
                DomMutation::RemoveClass { class, .. } => {
                    el.classes.retain(|c| *c != class);
                }
            }
            applied += 1;
        }
        self.commits += 1;
        Ok(applied)
    }
}
