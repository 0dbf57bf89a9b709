//! Uniform grid-cell sizing and per-image fitting
//!
//! Every image in the grid is shown in a cell of the same size. The cell's
//! shape follows the average aspect ratio of the set; each image is then
//! scaled to fill the cell, with the overflow past the cell edges bounded so
//! that extreme panoramas or portraits are not cropped to a sliver.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Intrinsic pixel dimensions of an image asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaturalSize {
    pub width: u32,
    pub height: u32,
}

impl NaturalSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height, `None` when either side is zero
    pub fn aspect_ratio(&self) -> Option<f64> {
        if self.width == 0 || self.height == 0 {
            None
        } else {
            Some(self.width as f64 / self.height as f64)
        }
    }
}

/// Responsive viewport band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Band {
    Mobile,
    Tablet,
    Desktop,
}

impl Band {
    pub fn for_viewport(viewport_width: u32, params: &FitParams) -> Self {
        if viewport_width <= params.mobile_max_width {
            Band::Mobile
        } else if viewport_width <= params.tablet_max_width {
            Band::Tablet
        } else {
            Band::Desktop
        }
    }

    pub fn columns(&self) -> u8 {
        match self {
            Band::Mobile => 1,
            Band::Tablet | Band::Desktop => 2,
        }
    }
}

/// How an image fills its cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Fill the cell, cropping the excess (bounded by the overflow clamp)
    #[default]
    Cover,
    /// Show the whole image, leaving empty space in the cell
    Contain,
}

impl FitMode {
    /// Value for the CSS `object-fit` property
    pub fn object_fit(&self) -> &'static str {
        match self {
            FitMode::Cover => "cover",
            FitMode::Contain => "contain",
        }
    }
}

/// Geometry parameters for the grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitParams {
    /// Largest viewport width of the single-column band
    pub mobile_max_width: u32,
    /// Largest viewport width of the tablet band
    pub tablet_max_width: u32,
    pub mobile_cap: f64,
    pub tablet_cap: f64,
    pub desktop_cap: f64,
    /// Horizontal margin subtracted from the available width on mobile
    pub mobile_margin: f64,
    /// Margin subtracted before splitting the width into two columns
    pub two_column_margin: f64,
    pub min_cell_height: f64,
    /// Overflow ratio past which an image is scaled back
    pub overflow_trigger: f64,
    /// Overflow ratio an image is scaled back to
    pub overflow_clamp: f64,
    /// Cell width when the grid cannot report its own width
    pub fallback_width: f64,
    pub mode: FitMode,
}

impl Default for FitParams {
    fn default() -> Self {
        Self {
            mobile_max_width: 768,
            tablet_max_width: 1024,
            mobile_cap: 500.0,
            tablet_cap: 450.0,
            desktop_cap: 500.0,
            mobile_margin: 20.0,
            two_column_margin: 30.0,
            min_cell_height: 280.0,
            overflow_trigger: 1.2,
            overflow_clamp: 1.1,
            fallback_width: 400.0,
            mode: FitMode::Cover,
        }
    }
}

/// Uniform cell dimensions in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    pub width: f64,
    pub height: f64,
}

impl CellSize {
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }
}

/// Display geometry of one image inside its cell
///
/// `left` and `top` are the offsets of the image's top-left corner from the
/// cell's; they are negative when the image overflows that side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageFit {
    pub width: f64,
    pub height: f64,
    pub left: f64,
    pub top: f64,
}

impl ImageFit {
    fn centered(width: f64, height: f64, cell: CellSize) -> Self {
        Self {
            width,
            height,
            left: (cell.width - width) / 2.0,
            top: (cell.height - height) / 2.0,
        }
    }
}

/// Result of one layout pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub band: Band,
    pub columns: u8,
    /// Average aspect ratio of the images with known dimensions
    pub aspect_ratio: f64,
    pub cell: CellSize,
    /// One entry per input image, `None` for images without known dimensions
    pub fits: Vec<Option<ImageFit>>,
}

/// Mean aspect ratio over the images whose dimensions are known
pub fn average_aspect_ratio(sizes: &[Option<NaturalSize>]) -> Option<f64> {
    let ratios: Vec<f64> = sizes
        .iter()
        .flatten()
        .filter_map(NaturalSize::aspect_ratio)
        .collect();

    if ratios.is_empty() {
        None
    } else {
        Some(ratios.iter().sum::<f64>() / ratios.len() as f64)
    }
}

/// Cell width for a viewport band, given the grid's usable width
pub fn cell_width(band: Band, available_width: f64, params: &FitParams) -> f64 {
    match band {
        Band::Mobile => (available_width - params.mobile_margin).min(params.mobile_cap),
        Band::Tablet => ((available_width - params.two_column_margin) / 2.0).min(params.tablet_cap),
        Band::Desktop => {
            ((available_width - params.two_column_margin) / 2.0).min(params.desktop_cap)
        }
    }
}

/// Fit one image into a cell
pub fn fit_image(size: NaturalSize, cell: CellSize, params: &FitParams) -> Option<ImageFit> {
    let image_ratio = size.aspect_ratio()?;
    let cell_ratio = cell.aspect_ratio();

    if (image_ratio - cell_ratio).abs() <= f64::EPSILON * cell_ratio {
        return Some(ImageFit::centered(cell.width, cell.height, cell));
    }

    let (width, height) = match params.mode {
        FitMode::Cover => cover(image_ratio, cell, params),
        FitMode::Contain => {
            let scale =
                (cell.width / size.width as f64).min(cell.height / size.height as f64);
            (size.width as f64 * scale, size.height as f64 * scale)
        }
    };

    Some(ImageFit::centered(width, height, cell))
}

fn cover(image_ratio: f64, cell: CellSize, params: &FitParams) -> (f64, f64) {
    if image_ratio > cell.aspect_ratio() {
        // Wider than the cell: match heights, bound the horizontal crop
        let width = cell.height * image_ratio;
        if width > cell.width * params.overflow_trigger {
            let width = cell.width * params.overflow_clamp;
            (width, width / image_ratio)
        } else {
            (width, cell.height)
        }
    } else {
        let height = cell.width / image_ratio;
        if height > cell.height * params.overflow_trigger {
            let height = cell.height * params.overflow_clamp;
            (height * image_ratio, height)
        } else {
            (cell.width, height)
        }
    }
}

/// Compute the uniform cell and every image's fit
///
/// `available_width` is the grid's content width; `None` falls back to the
/// configured fixed cell width.
pub fn compute_layout(
    sizes: &[Option<NaturalSize>],
    viewport_width: u32,
    available_width: Option<f64>,
    params: &FitParams,
) -> Result<Layout> {
    let aspect_ratio = average_aspect_ratio(sizes).ok_or(Error::NoImageDimensions)?;

    let band = Band::for_viewport(viewport_width, params);
    let width = match available_width {
        Some(available) => cell_width(band, available, params),
        None => params.fallback_width,
    };
    if width <= 0.0 || !width.is_finite() {
        return Err(Error::InvalidInput(format!(
            "grid too narrow for a cell (width {width})"
        )));
    }

    let cell = CellSize {
        width,
        height: (width / aspect_ratio).max(params.min_cell_height),
    };

    let fits = sizes
        .iter()
        .map(|size| size.and_then(|size| fit_image(size, cell, params)))
        .collect();

    Ok(Layout {
        band,
        columns: band.columns(),
        aspect_ratio,
        cell,
        fits,
    })
}
