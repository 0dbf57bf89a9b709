//! Page lifecycle and event dispatch
//!
//! A [`Page`] owns the document, the resolved element handles and both state
//! machines. Host events arrive as [`Signal`]s; timers are deadlines owned by
//! the state machines and fired by [`Page::advance_to`]. [`Page::run`] drives
//! both from a tokio channel on the current task.

use crate::config::PageConfig;
use crate::document::{Document, ElementId, ImageState};
use crate::effects;
use crate::grid::ImageGrid;
use crate::slideshow::SlideshowController;
use crate::{Error, Result};
use std::collections::BTreeSet;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

/// Host events the page reacts to
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    /// Document structure is ready
    DocumentReady,
    /// Window and all its resources finished loading
    WindowLoaded,
    /// Window resized; the new width is read from the document
    Resized,
    /// Device orientation changed
    Reoriented,
    /// Header video reached its end
    VideoEnded,
    /// An image finished loading or failed to
    ImageResolved { element: ElementId, state: ImageState },
    /// The menu button was pressed
    MenuToggled,
    /// An observed element scrolled into view
    Intersecting { element: ElementId },
    /// Page is going away; ends [`Page::run`]
    Unload,
}

/// Element handles resolved once when the document is ready
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageContext {
    /// `None` when the slide selector could not be evaluated
    pub slides: Option<Vec<ElementId>>,
    pub video: Option<ElementId>,
    pub menu: Option<ElementId>,
    pub footer: Option<ElementId>,
    pub header: Option<ElementId>,
}

impl PageContext {
    pub fn resolve<D: Document + ?Sized>(doc: &D, config: &PageConfig) -> Self {
        let selectors = &config.selectors;
        let one = |selector: &str| match doc.query(selector) {
            Ok(found) => found,
            Err(e) => {
                warn!(selector, "Element lookup failed: {}", e);
                None
            }
        };
        let slides = match doc.query_all(&selectors.slides) {
            Ok(slides) => Some(slides),
            Err(e) => {
                warn!(selector = %selectors.slides, "Slide lookup failed: {}", e);
                None
            }
        };

        Self {
            slides,
            video: one(&selectors.video),
            menu: one(&selectors.menu),
            footer: one(&selectors.footer),
            header: one(&selectors.header),
        }
    }
}

/// Log a handler's failure under `context` without propagating it
fn contain<T>(context: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) if e.is_degradation() => {
            warn!(context, "{}", e);
            None
        }
        Err(e) => {
            error!(context, "Error in {}: {}", context, e);
            None
        }
    }
}

/// One loaded page
#[derive(Debug)]
pub struct Page<D> {
    doc: D,
    config: PageConfig,
    context: Option<PageContext>,
    slideshow: Option<SlideshowController>,
    grid: ImageGrid,
    lazy_images: BTreeSet<ElementId>,
    header_due: Option<Instant>,
    unloaded: bool,
}

impl<D: Document> Page<D> {
    pub fn new(doc: D, config: PageConfig) -> Self {
        let grid = ImageGrid::new(config.grid.clone(), config.selectors.clone());
        Self {
            doc,
            config,
            context: None,
            slideshow: None,
            grid,
            lazy_images: BTreeSet::new(),
            header_due: None,
            unloaded: false,
        }
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn context(&self) -> Option<&PageContext> {
        self.context.as_ref()
    }

    /// `None` until the document is ready, and forever if it lacks slides or video
    pub fn slideshow(&self) -> Option<&SlideshowController> {
        self.slideshow.as_ref()
    }

    pub fn grid(&self) -> &ImageGrid {
        &self.grid
    }

    /// Images still waiting to scroll into view
    pub fn lazy_images(&self) -> &BTreeSet<ElementId> {
        &self.lazy_images
    }

    /// Whether the page has seen `Unload`; it then ignores every signal
    pub fn is_unloaded(&self) -> bool {
        self.unloaded
    }

    pub fn into_document(self) -> D {
        self.doc
    }

    /// Earliest pending timer
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.slideshow.as_ref().and_then(|s| s.next_deadline()),
            self.grid.next_deadline(),
            self.header_due,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Handle one host event
    pub fn dispatch(&mut self, signal: Signal, now: Instant) {
        if self.unloaded {
            debug!(?signal, "Page unloaded, signal ignored");
            return;
        }
        debug!(?signal, "Dispatching");
        match signal {
            Signal::DocumentReady => self.on_ready(),
            Signal::WindowLoaded => {
                self.adjust_header();
                self.grid.schedule_refresh(now);
            }
            Signal::Resized => {
                self.header_due = Some(now + self.config.header.resize_debounce());
                self.grid.resized(now);
            }
            Signal::Reoriented => self.grid.reoriented(now),
            Signal::VideoEnded => match self.slideshow.as_mut() {
                Some(slideshow) => slideshow.start(&mut self.doc, now),
                None => debug!("Video ended with no slideshow attached"),
            },
            Signal::ImageResolved { element, state } => {
                let result = self.grid.image_resolved(&mut self.doc, element, state);
                contain("image resolution", result);
            }
            Signal::MenuToggled => {
                let menu = self.context.as_ref().and_then(|c| c.menu);
                contain("toggleMenu", effects::toggle_menu(&mut self.doc, menu));
            }
            Signal::Intersecting { element } => {
                if self.lazy_images.contains(&element) {
                    let result = effects::reveal_lazy_image(&mut self.doc, element);
                    if contain("lazy image", result) == Some(true) {
                        self.lazy_images.remove(&element);
                    }
                }
            }
            Signal::Unload => self.unload(),
        }
    }

    /// Fire every timer due at or before `now`, in deadline order
    pub fn advance_to(&mut self, now: Instant) {
        if self.unloaded {
            return;
        }
        while let Some(deadline) = self.next_deadline().filter(|d| *d <= now) {
            if let Some(slideshow) = self.slideshow.as_mut() {
                slideshow.on_timer(&mut self.doc, deadline);
            }
            if self.header_due.is_some_and(|due| due <= deadline) {
                self.header_due = None;
                self.adjust_header();
            }
            let result = self.grid.on_timer(&mut self.doc, deadline);
            contain("grid relayout", result);
        }
    }

    /// Run the page until `Unload` or until every sender is gone
    pub async fn run(mut self, mut signals: UnboundedReceiver<Signal>) -> Self {
        loop {
            let deadline = self.next_deadline();
            tokio::select! {
                signal = signals.recv() => match signal {
                    Some(Signal::Unload) | None => {
                        self.dispatch(Signal::Unload, Instant::now());
                        break;
                    }
                    Some(signal) => {
                        let now = Instant::now();
                        self.advance_to(now);
                        self.dispatch(signal, now);
                    }
                },
                _ = wait_for(deadline) => self.advance_to(Instant::now()),
            }
        }
        self
    }

    fn on_ready(&mut self) {
        if self.context.is_some() {
            debug!("Document already initialized");
            return;
        }
        let context = PageContext::resolve(&self.doc, &self.config);

        self.slideshow = contain(
            "slideshow",
            SlideshowController::attach(
                &mut self.doc,
                context.slides.as_deref(),
                context.video,
                self.config.slideshow,
            ),
        );

        contain(
            "last updated timestamp",
            effects::stamp_last_updated(&mut self.doc, context.footer, &self.config.footer),
        );

        for (selector, e) in effects::apply_backgrounds(&mut self.doc, &self.config.backgrounds) {
            contain::<()>(&format!("background {selector}"), Err(e));
        }

        let lazy = self.doc.query_all(&self.config.selectors.lazy_images);
        if let Some(images) = contain("lazy images", lazy) {
            self.lazy_images = images.into_iter().collect();
        }

        if context.header.is_none() {
            warn!(context = "mobile header", "Header element not found");
        }
        self.context = Some(context);
        self.adjust_header();
        contain("image grid", self.grid.init(&mut self.doc));
        info!("Page initialized");
    }

    fn unload(&mut self) {
        info!("Page unloading");
        self.unloaded = true;
        self.context = None;
        self.slideshow = None;
        self.header_due = None;
        self.lazy_images.clear();
        self.grid.cancel_timers();
    }

    fn adjust_header(&mut self) {
        let header = self.context.as_ref().and_then(|c| c.header);
        let result = effects::adjust_mobile_header(&mut self.doc, header, &self.config.header);
        match result {
            Err(Error::MissingElement(_)) => debug!("No header to adjust"),
            result => {
                contain("mobile header", result);
            }
        }
    }
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
