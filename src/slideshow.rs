//! Header slideshow shown between video plays
//!
//! When the header video ends, each slide is revealed in turn for a fixed
//! dwell time. After the last slide a short pause follows, then every slide
//! is hidden and the video restarts from the beginning.

use crate::config::SlideshowTiming;
use crate::document::{Document, ElementId};
use crate::{Error, Result};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Class marking the visible slide
pub const ACTIVE_CLASS: &str = "active";

/// Playback state of the slideshow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Waiting for the video to end
    Idle,
    /// Showing the slide at `cursor` until `next_tick`
    Playing { cursor: usize, next_tick: Instant },
    /// All slides shown; the video restarts at `resume_at`
    Exhausted { resume_at: Instant },
}

/// Drives the slide sequence from video-ended signals and timer deadlines
#[derive(Debug)]
pub struct SlideshowController {
    slides: Vec<ElementId>,
    video: ElementId,
    timing: SlideshowTiming,
    state: PlaybackState,
}

impl SlideshowController {
    /// Arm the slideshow, hiding every slide.
    ///
    /// Both the slide sequence and the video must have resolved; otherwise
    /// the slideshow cannot run and `Error::MissingElement` is returned.
    pub fn attach<D: Document + ?Sized>(
        doc: &mut D,
        slides: Option<&[ElementId]>,
        video: Option<ElementId>,
        timing: SlideshowTiming,
    ) -> Result<Self> {
        let slides = slides.ok_or_else(|| Error::MissingElement("slide sequence".into()))?;
        let video = video.ok_or_else(|| Error::MissingElement("header video".into()))?;

        let controller = Self {
            slides: slides.to_vec(),
            video,
            timing,
            state: PlaybackState::Idle,
        };
        controller.hide_all(doc);

        info!(slides = controller.slides.len(), "Slideshow armed");
        Ok(controller)
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Index of the slide currently shown
    pub fn active_index(&self) -> Option<usize> {
        match self.state {
            PlaybackState::Playing { cursor, .. } if cursor < self.slides.len() => Some(cursor),
            _ => None,
        }
    }

    /// When the controller next needs [`on_timer`](Self::on_timer)
    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            PlaybackState::Idle => None,
            PlaybackState::Playing { next_tick, .. } => Some(next_tick),
            PlaybackState::Exhausted { resume_at } => Some(resume_at),
        }
    }

    /// Start a cycle. Ignored unless idle, so a cycle never overlaps another.
    pub fn start<D: Document + ?Sized>(&mut self, doc: &mut D, now: Instant) {
        if self.state != PlaybackState::Idle {
            debug!(state = ?self.state, "Slideshow already running, start ignored");
            return;
        }

        if self.slides.is_empty() {
            debug!("No slides to show");
            self.state = PlaybackState::Exhausted {
                resume_at: now + self.timing.resume_delay(),
            };
            return;
        }

        self.show(doc, 0, true);
        self.state = PlaybackState::Playing {
            cursor: 0,
            next_tick: now + self.timing.dwell(),
        };
        debug!("Slideshow started");
    }

    /// Fire the pending deadline if it is due at `now`
    pub fn on_timer<D: Document + ?Sized>(&mut self, doc: &mut D, now: Instant) {
        match self.state {
            PlaybackState::Playing { cursor, next_tick } if next_tick <= now => {
                self.show(doc, cursor, false);
                let cursor = cursor + 1;
                if cursor < self.slides.len() {
                    self.show(doc, cursor, true);
                    self.state = PlaybackState::Playing {
                        cursor,
                        next_tick: next_tick + self.timing.dwell(),
                    };
                } else {
                    debug!("Slide sequence exhausted");
                    self.state = PlaybackState::Exhausted {
                        resume_at: next_tick + self.timing.resume_delay(),
                    };
                }
            }
            PlaybackState::Exhausted { resume_at } if resume_at <= now => {
                self.hide_all(doc);
                self.state = PlaybackState::Idle;
                self.resume_video(doc);
            }
            _ => {}
        }
    }

    fn resume_video<D: Document + ?Sized>(&self, doc: &mut D) {
        let result = doc
            .rewind_media(self.video)
            .and_then(|_| doc.play_media(self.video));
        match result {
            Ok(()) => debug!("Video restarted"),
            Err(e) => warn!("Video autoplay prevented: {}", e),
        }
    }

    fn hide_all<D: Document + ?Sized>(&self, doc: &mut D) {
        for index in 0..self.slides.len() {
            self.show(doc, index, false);
        }
    }

    /// Set one slide's visibility; a slide that left the document is skipped
    fn show<D: Document + ?Sized>(&self, doc: &mut D, index: usize, visible: bool) {
        let Some(&slide) = self.slides.get(index) else {
            return;
        };
        let opacity = if visible { "1" } else { "0" };
        let result = doc
            .set_class(slide, ACTIVE_CLASS, visible)
            .and_then(|_| doc.set_style(slide, "opacity", opacity));
        if let Err(e) = result {
            debug!(index, "Slide skipped: {}", e);
        }
    }
}
