//! pageshow - headless engine for a site's presentational behavior
//!
//! The crate provides:
//! - `slideshow`: a timed slide sequence shown each time the header video ends
//! - `fit` and `grid`: uniform, responsive sizing of an image grid
//! - `effects`: menu toggle, footer stamp, mobile header, backgrounds, lazy images
//! - `page`: the signal dispatcher and event loop tying them to a [`Document`]

pub mod config;
pub mod document;
pub mod effects;
pub mod error;
pub mod fit;
pub mod grid;
pub mod image_loader;
pub mod page;
pub mod slideshow;

pub use config::PageConfig;
pub use document::{Document, ElementId, ImageState, MemoryDocument, Node};
pub use error::{Error, Result};
pub use fit::{compute_layout, Band, CellSize, FitMode, FitParams, ImageFit, Layout, NaturalSize};
pub use grid::ImageGrid;
pub use page::{Page, PageContext, Signal};
pub use slideshow::{PlaybackState, SlideshowController};
