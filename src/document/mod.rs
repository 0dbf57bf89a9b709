//! Host document abstraction
//!
//! The engine never owns the page; it resolves elements through a
//! [`Document`] and mutates their classes, inline styles and attributes.
//! [`MemoryDocument`] is a complete in-memory implementation.

mod memory;
pub mod selector;

pub use memory::{MediaState, MemoryDocument, Node};
pub use selector::Selector;

use crate::fit::NaturalSize;
use crate::Result;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque handle to an element of a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub usize);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Load state of an image element
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageState {
    /// Still loading
    #[default]
    Pending,
    /// Loaded with its intrinsic dimensions
    Loaded(NaturalSize),
    /// Load failed; dimensions unknown
    Failed,
}

impl ImageState {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, ImageState::Pending)
    }

    /// Natural dimensions, if loaded with a non-zero size
    pub fn natural_size(&self) -> Option<NaturalSize> {
        match self {
            ImageState::Loaded(size) if size.aspect_ratio().is_some() => Some(*size),
            _ => None,
        }
    }
}

/// Live page the engine reads from and writes to
pub trait Document {
    /// Current window width in CSS pixels
    fn viewport_width(&self) -> u32;

    /// When the page was last modified
    fn last_modified(&self) -> DateTime<Local>;

    /// First element matching `selector`, in document order
    fn query(&self, selector: &str) -> Result<Option<ElementId>>;

    /// Every element matching `selector`, in document order
    fn query_all(&self, selector: &str) -> Result<Vec<ElementId>>;

    /// Nearest inclusive ancestor of `element` matching `selector`
    fn closest(&self, element: ElementId, selector: &str) -> Result<Option<ElementId>>;

    /// Width of the element's content box (excluding padding), if laid out
    fn content_width(&self, element: ElementId) -> Option<f64>;

    /// Add or remove a class
    fn set_class(&mut self, element: ElementId, class: &str, on: bool) -> Result<()>;

    /// Flip a class, returning whether it is now present
    fn toggle_class(&mut self, element: ElementId, class: &str) -> Result<bool>;

    fn set_style(&mut self, element: ElementId, property: &str, value: &str) -> Result<()>;

    fn attribute(&self, element: ElementId, name: &str) -> Option<String>;

    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str) -> Result<()>;

    fn remove_attribute(&mut self, element: ElementId, name: &str) -> Result<()>;

    /// Append a `<p>` with the given text, returning it
    fn append_paragraph(&mut self, parent: ElementId, text: &str) -> Result<ElementId>;

    /// Load state of an `<img>`
    fn image_state(&self, element: ElementId) -> ImageState;

    /// Seek a media element back to its start
    fn rewind_media(&mut self, element: ElementId) -> Result<()>;

    /// Start media playback; the host may refuse (autoplay policy)
    fn play_media(&mut self, element: ElementId) -> Result<()>;

    /// Set several inline style properties at once
    fn set_styles(&mut self, element: ElementId, styles: &[(&str, &str)]) -> Result<()> {
        for (property, value) in styles {
            self.set_style(element, property, value)?;
        }
        Ok(())
    }
}
