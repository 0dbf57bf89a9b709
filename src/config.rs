//! Page configuration
//!
//! Every field has a default matching the production site, so an empty JSON
//! object is a valid configuration.

use crate::fit::FitParams;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Complete configuration for one page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub selectors: Selectors,
    pub slideshow: SlideshowTiming,
    pub grid: GridConfig,
    pub header: HeaderConfig,
    pub footer: FooterConfig,
    pub backgrounds: Vec<BackgroundRule>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            selectors: Selectors::default(),
            slideshow: SlideshowTiming::default(),
            grid: GridConfig::default(),
            header: HeaderConfig::default(),
            footer: FooterConfig::default(),
            backgrounds: BackgroundRule::site_defaults(),
        }
    }
}

impl PageConfig {
    /// Parse a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Serialize as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values that would make the timers or geometry meaningless
    pub fn validate(&self) -> Result<()> {
        if self.slideshow.dwell_ms == 0 {
            return Err(Error::Config("slideshow.dwell_ms must be positive".into()));
        }
        let fit = &self.grid.fit;
        if fit.mobile_max_width >= fit.tablet_max_width {
            return Err(Error::Config(format!(
                "grid.fit.mobile_max_width ({}) must be below tablet_max_width ({})",
                fit.mobile_max_width, fit.tablet_max_width
            )));
        }
        if fit.overflow_clamp > fit.overflow_trigger {
            return Err(Error::Config(
                "grid.fit.overflow_clamp must not exceed overflow_trigger".into(),
            ));
        }
        if fit.overflow_clamp < 1.0 {
            return Err(Error::Config("grid.fit.overflow_clamp must be at least 1.0".into()));
        }
        Ok(())
    }
}

/// Selectors used to resolve the page's elements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub slides: String,
    pub video: String,
    pub menu: String,
    pub footer: String,
    pub header: String,
    pub grid: String,
    pub grid_item: String,
    pub grid_images: String,
    pub lazy_images: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            slides: ".slide".into(),
            video: ".header-video".into(),
            menu: "#mobileMenu".into(),
            footer: ".site-footer".into(),
            header: "header".into(),
            grid: ".flyer-grid".into(),
            grid_item: ".flyer-item".into(),
            grid_images: ".flyer-grid .flyer-item img".into(),
            lazy_images: "img[data-src]".into(),
        }
    }
}

/// Slideshow timers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlideshowTiming {
    /// How long each slide stays visible
    pub dwell_ms: u64,
    /// Pause between the last slide and the video restart
    pub resume_delay_ms: u64,
}

impl SlideshowTiming {
    pub fn dwell(&self) -> Duration {
        Duration::from_millis(self.dwell_ms)
    }

    pub fn resume_delay(&self) -> Duration {
        Duration::from_millis(self.resume_delay_ms)
    }
}

impl Default for SlideshowTiming {
    fn default() -> Self {
        Self {
            dwell_ms: 4000,
            resume_delay_ms: 1000,
        }
    }
}

/// Image grid behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Quiet period after the last resize before relayout
    pub resize_debounce_ms: u64,
    /// Delay after an orientation change before relayout
    pub orientation_settle_ms: u64,
    /// Delay after window load before images are rediscovered
    pub refresh_delay_ms: u64,
    /// Gap between grid cells in pixels
    pub gap_px: u32,
    pub fit: FitParams,
}

impl GridConfig {
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }

    pub fn orientation_settle(&self) -> Duration {
        Duration::from_millis(self.orientation_settle_ms)
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            resize_debounce_ms: 250,
            orientation_settle_ms: 500,
            refresh_delay_ms: 100,
            gap_px: 30,
            fit: FitParams::default(),
        }
    }
}

/// Mobile header override
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaderConfig {
    /// Viewports at or below this width get the tall header
    pub max_width: u32,
    pub height: String,
    pub resize_debounce_ms: u64,
}

impl HeaderConfig {
    pub fn resize_debounce(&self) -> Duration {
        Duration::from_millis(self.resize_debounce_ms)
    }
}

impl Default for HeaderConfig {
    fn default() -> Self {
        Self {
            max_width: 600,
            height: "970px".into(),
            resize_debounce_ms: 250,
        }
    }
}

/// Footer "Last updated" stamp formats (chrono strftime syntax)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterConfig {
    pub date_format: String,
    pub time_format: String,
}

impl Default for FooterConfig {
    fn default() -> Self {
        Self {
            date_format: "%B %-d, %Y".into(),
            time_format: "%-I:%M %p".into(),
        }
    }
}

/// A section that receives a cover-fit background image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundRule {
    pub selector: String,
    pub image: String,
}

impl BackgroundRule {
    pub fn new(selector: &str, image: &str) -> Self {
        Self {
            selector: selector.to_string(),
            image: image.to_string(),
        }
    }

    /// Built-in rules for the site's two photo sections
    pub fn site_defaults() -> Vec<Self> {
        vec![
            Self::new(".lead-pastor-section", "Images/image2.jpg"),
            Self::new(".greatness-section", "Images/image7.jpg"),
        ]
    }
}
