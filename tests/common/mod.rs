//! Common test utilities

#![allow(dead_code)]

use image::{ImageBuffer, Rgba, RgbaImage};
use pageshow::{ElementId, ImageState, MemoryDocument, NaturalSize, Node};
use std::path::Path;

/// Generate a test image with a solid color and a subtle gradient
pub fn generate_test_image(width: u32, height: u32, base_color: [u8; 4]) -> RgbaImage {
    let mut img = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let r = base_color[0].saturating_add((x % 50) as u8);
        let g = base_color[1].saturating_add((y % 50) as u8);
        *pixel = Rgba([r, g, base_color[2], base_color[3]]);
    }

    img
}

/// Save a test image as JPEG
pub fn save_jpeg<P: AsRef<Path>>(img: &RgbaImage, path: P, quality: u8) -> std::io::Result<()> {
    let rgb_img: image::RgbImage = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();

    let file = std::fs::File::create(path)?;
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, quality);
    encoder
        .encode_image(&rgb_img)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    Ok(())
}

/// Save a test image as PNG
pub fn save_png<P: AsRef<Path>>(img: &RgbaImage, path: P) -> std::io::Result<()> {
    img.save(path)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))
}

/// Handles into a page built by [`site_page`]
pub struct Site {
    pub doc: MemoryDocument,
    pub video: ElementId,
    pub slides: Vec<ElementId>,
    pub header: ElementId,
    pub menu: ElementId,
    pub footer: ElementId,
    pub grid: ElementId,
    pub cells: Vec<ElementId>,
    pub images: Vec<ElementId>,
}

/// Build a page shaped like the production site.
///
/// `images` gives each grid image's initial state; the grid reports
/// `viewport` as its content width.
pub fn site_page(viewport: u32, slide_count: usize, images: &[ImageState]) -> Site {
    let mut doc = MemoryDocument::new(viewport);
    let body = doc.body();

    let header = doc.append(body, Node::new("header")).unwrap();
    let video = doc
        .append(header, Node::new("video").with_class("header-video"))
        .unwrap();
    let slides = (0..slide_count)
        .map(|_| doc.append(header, Node::new("div").with_class("slide")).unwrap())
        .collect();
    let menu = doc
        .append(header, Node::new("nav").with_id("mobileMenu"))
        .unwrap();

    doc.append(body, Node::new("section").with_class("lead-pastor-section"))
        .unwrap();
    let grid = doc
        .append(
            body,
            Node::new("section")
                .with_class("flyer-grid")
                .with_content_width(viewport as f64),
        )
        .unwrap();

    let mut cells = Vec::new();
    let mut image_ids = Vec::new();
    for state in images {
        let cell = doc
            .append(grid, Node::new("div").with_class("flyer-item"))
            .unwrap();
        let img = doc
            .append(cell, Node::new("img").with_image(*state))
            .unwrap();
        cells.push(cell);
        image_ids.push(img);
    }

    let footer = doc
        .append(body, Node::new("footer").with_class("site-footer"))
        .unwrap();

    Site {
        doc,
        video,
        slides,
        header,
        menu,
        footer,
        grid,
        cells,
        images: image_ids,
    }
}

pub fn loaded(width: u32, height: u32) -> ImageState {
    ImageState::Loaded(NaturalSize::new(width, height))
}

/// Parse a `123.45px` style value
pub fn px(value: Option<&str>) -> f64 {
    value
        .and_then(|v| v.strip_suffix("px"))
        .and_then(|v| v.parse().ok())
        .unwrap_or(f64::NAN)
}

/// Indices of the slides currently marked active
pub fn active_slides(doc: &MemoryDocument, slides: &[ElementId]) -> Vec<usize> {
    slides
        .iter()
        .enumerate()
        .filter(|(_, slide)| doc.has_class(**slide, "active"))
        .map(|(i, _)| i)
        .collect()
}
