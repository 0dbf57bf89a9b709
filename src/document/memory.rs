//! In-memory document

use super::selector::{Matchable, Selector};
use super::{Document, ElementId, ImageState};
use crate::{Error, Result};
use chrono::{DateTime, Local};
use std::collections::{BTreeMap, BTreeSet};

/// Playback state of a `<video>`/`<audio>` element
#[derive(Debug, Clone, PartialEq)]
pub struct MediaState {
    /// Playback position in seconds
    pub position: f64,
    pub playing: bool,
    /// When false, `play` is rejected as by a browser autoplay policy
    pub autoplay_allowed: bool,
    /// Number of accepted `play` calls
    pub play_count: u32,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            position: 0.0,
            playing: false,
            autoplay_allowed: true,
            play_count: 0,
        }
    }
}

/// One element of a [`MemoryDocument`]
#[derive(Debug, Clone, Default)]
pub struct Node {
    tag: String,
    id: Option<String>,
    classes: BTreeSet<String>,
    attributes: BTreeMap<String, String>,
    styles: BTreeMap<String, String>,
    text: Option<String>,
    image: Option<ImageState>,
    media: Option<MediaState>,
    content_width: Option<f64>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
    detached: bool,
}

impl Node {
    pub fn new(tag: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        let image = (tag == "img").then_some(ImageState::Pending);
        let media = matches!(tag.as_str(), "video" | "audio").then(MediaState::default);
        Self {
            tag,
            image,
            media,
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.insert(class.to_string());
        self
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_image(mut self, state: ImageState) -> Self {
        self.image = Some(state);
        self
    }

    pub fn with_content_width(mut self, width: f64) -> Self {
        self.content_width = Some(width);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.styles.get(property).map(String::as_str)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn media(&self) -> Option<&MediaState> {
        self.media.as_ref()
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }
}

impl Matchable for Node {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }
}

/// A document tree held in memory
///
/// Element handles index into an arena; removed elements stay in the arena
/// marked detached, so stale handles fail with [`Error::DetachedElement`].
#[derive(Debug, Clone)]
pub struct MemoryDocument {
    nodes: Vec<Node>,
    viewport_width: u32,
    last_modified: DateTime<Local>,
}

impl MemoryDocument {
    /// Empty document with a `<body>` root
    pub fn new(viewport_width: u32) -> Self {
        Self {
            nodes: vec![Node::new("body")],
            viewport_width,
            last_modified: Local::now(),
        }
    }

    pub fn body(&self) -> ElementId {
        ElementId(0)
    }

    /// Append `node` as the last child of `parent`
    pub fn append(&mut self, parent: ElementId, node: Node) -> Result<ElementId> {
        self.live(parent)?;
        let id = ElementId(self.nodes.len());
        self.nodes.push(Node {
            parent: Some(parent),
            children: Vec::new(),
            detached: false,
            ..node
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Detach an element and its subtree
    pub fn remove(&mut self, element: ElementId) -> Result<()> {
        self.live(element)?;
        if let Some(parent) = self.nodes[element.0].parent {
            self.nodes[parent.0].children.retain(|child| *child != element);
        }
        let mut stack = vec![element];
        while let Some(id) = stack.pop() {
            let node = &mut self.nodes[id.0];
            node.detached = true;
            stack.extend(node.children.iter().copied());
        }
        Ok(())
    }

    pub fn node(&self, element: ElementId) -> Option<&Node> {
        self.nodes.get(element.0)
    }

    pub fn has_class(&self, element: ElementId, class: &str) -> bool {
        self.node(element).is_some_and(|n| n.classes.contains(class))
    }

    pub fn style(&self, element: ElementId, property: &str) -> Option<&str> {
        self.node(element).and_then(|n| n.style(property))
    }

    pub fn set_viewport_width(&mut self, width: u32) {
        self.viewport_width = width;
    }

    pub fn set_last_modified(&mut self, time: DateTime<Local>) {
        self.last_modified = time;
    }

    pub fn set_image_state(&mut self, element: ElementId, state: ImageState) -> Result<()> {
        self.live_mut(element)?.image = Some(state);
        Ok(())
    }

    pub fn set_autoplay_allowed(&mut self, element: ElementId, allowed: bool) -> Result<()> {
        self.media_mut(element)?.autoplay_allowed = allowed;
        Ok(())
    }

    /// Advance a media element's playback position, as if it had played
    pub fn seek_media(&mut self, element: ElementId, position: f64) -> Result<()> {
        self.media_mut(element)?.position = position;
        Ok(())
    }

    fn live(&self, element: ElementId) -> Result<&Node> {
        match self.nodes.get(element.0) {
            Some(node) if !node.detached => Ok(node),
            _ => Err(Error::DetachedElement(element)),
        }
    }

    fn live_mut(&mut self, element: ElementId) -> Result<&mut Node> {
        match self.nodes.get_mut(element.0) {
            Some(node) if !node.detached => Ok(node),
            _ => Err(Error::DetachedElement(element)),
        }
    }

    fn media_mut(&mut self, element: ElementId) -> Result<&mut MediaState> {
        self.live_mut(element)?
            .media
            .as_mut()
            .ok_or_else(|| Error::InvalidInput(format!("element {element} is not media")))
    }

    fn ancestors(&self, element: ElementId) -> impl Iterator<Item = &Node> + '_ {
        std::iter::successors(self.nodes[element.0].parent, move |id| {
            self.nodes[id.0].parent
        })
        .map(move |id| &self.nodes[id.0])
    }

    /// Live elements in document order, root first
    fn document_order(&self) -> Vec<ElementId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.body()];
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        order
    }

    fn matches(&self, selector: &Selector, element: ElementId) -> bool {
        selector.matches(&self.nodes[element.0], self.ancestors(element))
    }
}

impl Document for MemoryDocument {
    fn viewport_width(&self) -> u32 {
        self.viewport_width
    }

    fn last_modified(&self) -> DateTime<Local> {
        self.last_modified
    }

    fn query(&self, selector: &str) -> Result<Option<ElementId>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .document_order()
            .into_iter()
            .find(|id| self.matches(&selector, *id)))
    }

    fn query_all(&self, selector: &str) -> Result<Vec<ElementId>> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .document_order()
            .into_iter()
            .filter(|id| self.matches(&selector, *id))
            .collect())
    }

    fn closest(&self, element: ElementId, selector: &str) -> Result<Option<ElementId>> {
        let selector = Selector::parse(selector)?;
        self.live(element)?;
        let chain = std::iter::successors(Some(element), |id| self.nodes[id.0].parent);
        for id in chain {
            if self.matches(&selector, id) {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    fn content_width(&self, element: ElementId) -> Option<f64> {
        self.live(element).ok().and_then(|n| n.content_width)
    }

    fn set_class(&mut self, element: ElementId, class: &str, on: bool) -> Result<()> {
        let node = self.live_mut(element)?;
        if on {
            node.classes.insert(class.to_string());
        } else {
            node.classes.remove(class);
        }
        Ok(())
    }

    fn toggle_class(&mut self, element: ElementId, class: &str) -> Result<bool> {
        let node = self.live_mut(element)?;
        if node.classes.remove(class) {
            Ok(false)
        } else {
            node.classes.insert(class.to_string());
            Ok(true)
        }
    }

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) -> Result<()> {
        self.live_mut(element)?
            .styles
            .insert(property.to_string(), value.to_string());
        Ok(())
    }

    fn attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.live(element)
            .ok()
            .and_then(|n| n.attributes.get(name).cloned())
    }

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) -> Result<()> {
        self.live_mut(element)?
            .attributes
            .insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn remove_attribute(&mut self, element: ElementId, name: &str) -> Result<()> {
        self.live_mut(element)?.attributes.remove(name);
        Ok(())
    }

    fn append_paragraph(&mut self, parent: ElementId, text: &str) -> Result<ElementId> {
        let paragraph = Node {
            text: Some(text.to_string()),
            ..Node::new("p")
        };
        self.append(parent, paragraph)
    }

    fn image_state(&self, element: ElementId) -> ImageState {
        match self.live(element) {
            Ok(node) => node.image.unwrap_or(ImageState::Failed),
            Err(_) => ImageState::Failed,
        }
    }

    fn rewind_media(&mut self, element: ElementId) -> Result<()> {
        self.media_mut(element)?.position = 0.0;
        Ok(())
    }

    fn play_media(&mut self, element: ElementId) -> Result<()> {
        let media = self.media_mut(element)?;
        if !media.autoplay_allowed {
            return Err(Error::PlaybackRejected(
                "play() is not allowed without user interaction".to_string(),
            ));
        }
        media.playing = true;
        media.play_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::NaturalSize;

    fn flyer_page() -> (MemoryDocument, Vec<ElementId>) {
        let mut doc = MemoryDocument::new(1100);
        let body = doc.body();
        let grid = doc
            .append(body, Node::new("section").with_class("flyer-grid"))
            .unwrap();
        let mut images = Vec::new();
        for _ in 0..2 {
            let item = doc
                .append(grid, Node::new("div").with_class("flyer-item"))
                .unwrap();
            images.push(doc.append(item, Node::new("img")).unwrap());
        }
        // an image outside the grid
        doc.append(body, Node::new("img")).unwrap();
        (doc, images)
    }

    #[test]
    fn test_query_all_in_document_order() {
        let (doc, images) = flyer_page();
        let found = doc.query_all(".flyer-grid .flyer-item img").unwrap();
        assert_eq!(found, images);
        assert_eq!(doc.query_all("img").unwrap().len(), 3);
    }

    #[test]
    fn test_closest_is_inclusive() {
        let (doc, images) = flyer_page();
        let item = doc.closest(images[0], ".flyer-item").unwrap().unwrap();
        assert!(doc.has_class(item, "flyer-item"));
        assert_eq!(doc.closest(item, ".flyer-item").unwrap(), Some(item));
        assert_eq!(doc.closest(images[0], ".missing").unwrap(), None);
    }

    #[test]
    fn test_removed_subtree_is_detached() {
        let (mut doc, images) = flyer_page();
        let item = doc.closest(images[1], ".flyer-item").unwrap().unwrap();
        doc.remove(item).unwrap();

        assert_eq!(doc.query_all(".flyer-item img").unwrap(), vec![images[0]]);
        assert!(matches!(
            doc.set_style(images[1], "width", "1px"),
            Err(Error::DetachedElement(_))
        ));
    }

    #[test]
    fn test_toggle_class() {
        let mut doc = MemoryDocument::new(400);
        let body = doc.body();
        let menu = doc.append(body, Node::new("nav").with_id("mobileMenu")).unwrap();
        assert!(doc.toggle_class(menu, "show").unwrap());
        assert!(!doc.toggle_class(menu, "show").unwrap());
        assert!(!doc.has_class(menu, "show"));
    }

    #[test]
    fn test_image_defaults() {
        let (mut doc, images) = flyer_page();
        assert_eq!(doc.image_state(images[0]), ImageState::Pending);
        let size = NaturalSize::new(10, 20);
        doc.set_image_state(images[0], ImageState::Loaded(size)).unwrap();
        assert_eq!(doc.image_state(images[0]).natural_size(), Some(size));
        assert_eq!(doc.image_state(doc.body()), ImageState::Failed);
    }

    #[test]
    fn test_play_rejected_by_policy() {
        let mut doc = MemoryDocument::new(1100);
        let body = doc.body();
        let video = doc.append(body, Node::new("video")).unwrap();
        doc.set_autoplay_allowed(video, false).unwrap();
        assert!(matches!(
            doc.play_media(video),
            Err(Error::PlaybackRejected(_))
        ));
        assert_eq!(doc.node(video).unwrap().media().unwrap().play_count, 0);
    }
}
