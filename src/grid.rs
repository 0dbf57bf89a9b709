//! Uniform image grid
//!
//! Tracks the grid's images until their natural dimensions are known, then
//! lays the grid out with [`compute_layout`] and writes the result into the
//! document. Viewport changes schedule a fresh pass after a quiet period.

use crate::config::{GridConfig, Selectors};
use crate::document::{Document, ElementId, ImageState};
use crate::fit::{compute_layout, Band, Layout};
use crate::{Error, Result};
use tokio::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
struct GridImage {
    element: ElementId,
    cell: Option<ElementId>,
    state: ImageState,
}

/// Layout manager for the image grid
#[derive(Debug)]
pub struct ImageGrid {
    config: GridConfig,
    selectors: Selectors,
    grid: Option<ElementId>,
    images: Vec<GridImage>,
    initialized: bool,
    /// A pass is wanted once every image has resolved
    wants_layout: bool,
    /// Debounced resize pass; a newer resize replaces it
    pending_resize: Option<Instant>,
    /// Pass once the viewport settles after an orientation change
    pending_reorient: Option<Instant>,
    pending_refresh: Option<Instant>,
    layout: Option<Layout>,
}

impl ImageGrid {
    pub fn new(config: GridConfig, selectors: Selectors) -> Self {
        Self {
            config,
            selectors,
            grid: None,
            images: Vec::new(),
            initialized: false,
            wants_layout: false,
            pending_resize: None,
            pending_reorient: None,
            pending_refresh: None,
            layout: None,
        }
    }

    /// Discover the grid's images and lay them out once all have resolved.
    ///
    /// Returns `Error::MissingElement` when the page has no grid images.
    pub fn init<D: Document + ?Sized>(&mut self, doc: &mut D) -> Result<()> {
        if self.initialized {
            return Ok(());
        }
        self.discover(doc)?;
        if self.images.is_empty() {
            return Err(Error::MissingElement("grid images".into()));
        }
        self.initialized = true;
        info!(images = self.images.len(), "Image grid initialized");
        self.request_layout(doc)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Most recently applied layout
    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    /// Number of images still waiting for load or error
    pub fn pending_images(&self) -> usize {
        self.images
            .iter()
            .filter(|image| !image.state.is_resolved())
            .count()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        [self.pending_resize, self.pending_reorient, self.pending_refresh]
            .into_iter()
            .flatten()
            .min()
    }

    /// Drop every pending pass and refresh
    pub fn cancel_timers(&mut self) {
        self.pending_resize = None;
        self.pending_reorient = None;
        self.pending_refresh = None;
    }

    /// Record one image's load outcome; lays out when it was the last one
    pub fn image_resolved<D: Document + ?Sized>(
        &mut self,
        doc: &mut D,
        element: ElementId,
        state: ImageState,
    ) -> Result<()> {
        let Some(image) = self.images.iter_mut().find(|i| i.element == element) else {
            debug!(%element, "Resolved image is not in the grid");
            return Ok(());
        };
        if state == ImageState::Failed {
            debug!(%element, "Grid image failed to load");
        }
        image.state = state;

        if self.wants_layout && self.pending_images() == 0 {
            self.relayout(doc)
        } else {
            Ok(())
        }
    }

    /// Viewport resized: relayout after the debounce period
    pub fn resized(&mut self, now: Instant) {
        if !self.initialized {
            return;
        }
        let at = now + self.config.resize_debounce();
        if self.pending_resize.replace(at).is_some() {
            debug!("Pending resize relayout rescheduled");
        }
    }

    /// Orientation changed: relayout once the viewport has settled.
    ///
    /// Independent of the resize debounce; a resize right after the
    /// orientation change does not cancel this pass.
    pub fn reoriented(&mut self, now: Instant) {
        if self.initialized {
            self.pending_reorient = Some(now + self.config.orientation_settle());
        }
    }

    /// Rediscover images shortly after the window finished loading
    pub fn schedule_refresh(&mut self, now: Instant) {
        if self.initialized {
            self.pending_refresh = Some(now + self.config.refresh_delay());
        }
    }

    /// Run whatever deadline is due at `now`
    pub fn on_timer<D: Document + ?Sized>(&mut self, doc: &mut D, now: Instant) -> Result<()> {
        if self.pending_refresh.is_some_and(|at| at <= now) {
            self.pending_refresh = None;
            self.refresh(doc)?;
        }
        let resize_due = self.pending_resize.is_some_and(|at| at <= now);
        let reorient_due = self.pending_reorient.is_some_and(|at| at <= now);
        if resize_due {
            self.pending_resize = None;
        }
        if reorient_due {
            self.pending_reorient = None;
        }
        if resize_due || reorient_due {
            self.request_layout(doc)?;
        }
        Ok(())
    }

    /// Re-read the grid's images, keeping cached states of known ones
    pub fn refresh<D: Document + ?Sized>(&mut self, doc: &mut D) -> Result<()> {
        self.discover(doc)?;
        debug!(images = self.images.len(), "Image grid refreshed");
        self.request_layout(doc)
    }

    fn discover<D: Document + ?Sized>(&mut self, doc: &mut D) -> Result<()> {
        self.grid = doc.query(&self.selectors.grid)?;
        let elements = doc.query_all(&self.selectors.grid_images)?;

        let mut images = Vec::with_capacity(elements.len());
        for element in elements {
            let cached = self
                .images
                .iter()
                .find(|i| i.element == element)
                .map(|i| i.state)
                .filter(ImageState::is_resolved);
            images.push(GridImage {
                element,
                cell: doc.closest(element, &self.selectors.grid_item)?,
                state: cached.unwrap_or_else(|| doc.image_state(element)),
            });
        }
        self.images = images;
        Ok(())
    }

    fn request_layout<D: Document + ?Sized>(&mut self, doc: &mut D) -> Result<()> {
        self.wants_layout = true;
        if self.pending_images() > 0 {
            debug!(
                pending = self.pending_images(),
                "Grid layout waiting for images"
            );
            return Ok(());
        }
        self.relayout(doc)
    }

    /// Full layout pass from the cached natural dimensions
    fn relayout<D: Document + ?Sized>(&mut self, doc: &mut D) -> Result<()> {
        self.wants_layout = false;

        let sizes: Vec<_> = self.images.iter().map(|i| i.state.natural_size()).collect();
        let viewport = doc.viewport_width();
        let available = self.grid.and_then(|grid| doc.content_width(grid));
        let layout = compute_layout(&sizes, viewport, available, &self.config.fit)?;

        self.apply(doc, &layout);
        debug!(
            band = ?layout.band,
            width = layout.cell.width,
            height = layout.cell.height,
            "Grid laid out"
        );
        self.layout = Some(layout);
        Ok(())
    }

    fn apply<D: Document + ?Sized>(&self, doc: &mut D, layout: &Layout) {
        let cell_width = px(layout.cell.width);
        let cell_height = px(layout.cell.height);
        let object_fit = self.config.fit.mode.object_fit();

        for (image, fit) in self.images.iter().zip(&layout.fits) {
            let Some(cell) = image.cell else {
                continue;
            };
            let result = doc.set_styles(
                cell,
                &[
                    ("width", cell_width.as_str()),
                    ("height", cell_height.as_str()),
                    ("overflow", "hidden"),
                    ("position", "relative"),
                    ("display", "flex"),
                    ("align-items", "center"),
                    ("justify-content", "center"),
                ],
            );
            if let Err(e) = result {
                warn!(element = %cell, "Grid cell not sized: {}", e);
                continue;
            }

            let Some(fit) = fit else {
                continue;
            };
            let (width, height) = (px(fit.width), px(fit.height));
            let result = doc.set_styles(
                image.element,
                &[
                    ("width", width.as_str()),
                    ("height", height.as_str()),
                    ("object-fit", object_fit),
                    ("object-position", "center"),
                    ("max-width", "none"),
                    ("max-height", "none"),
                    ("position", "absolute"),
                    ("top", "50%"),
                    ("left", "50%"),
                    ("transform", "translate(-50%, -50%)"),
                ],
            );
            if let Err(e) = result {
                warn!(element = %image.element, "Grid image not fitted: {}", e);
            }
        }

        if let Some(grid) = self.grid {
            if let Err(e) = self.apply_template(doc, grid, layout) {
                warn!("Grid template not applied: {}", e);
            }
        }
    }

    fn apply_template<D: Document + ?Sized>(
        &self,
        doc: &mut D,
        grid: ElementId,
        layout: &Layout,
    ) -> Result<()> {
        match layout.band {
            Band::Mobile => doc.set_styles(
                grid,
                &[("grid-template-columns", "1fr"), ("justify-items", "center")],
            )?,
            Band::Tablet | Band::Desktop => {
                let columns = format!("repeat({}, {})", layout.columns, px(layout.cell.width));
                doc.set_styles(
                    grid,
                    &[
                        ("grid-template-columns", columns.as_str()),
                        ("justify-content", "center"),
                    ],
                )?
            }
        }
        doc.set_style(grid, "gap", &format!("{}px", self.config.gap_px))
    }
}

/// CSS pixel length, trimmed to two decimals
fn px(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    format!("{rounded}px")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_px_formatting() {
        assert_eq!(px(500.0), "500px");
        assert_eq!(px(427.2982), "427.3px");
        assert_eq!(px(-20.004), "-20px");
    }
}
