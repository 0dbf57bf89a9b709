//! Integration tests for the uniform image grid

mod common;

use common::*;
use pageshow::{
    compute_layout, Band, Document, FitParams, ImageState, NaturalSize, Page, PageConfig, Signal,
};
use std::time::Duration;
use tokio::time::Instant;

fn ms(millis: u64) -> Duration {
    Duration::from_millis(millis)
}

fn close(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}

/// Test the two-flyer desktop layout
#[test]
fn test_desktop_two_flyers() {
    let sizes = [
        Some(NaturalSize::new(1600, 900)),
        Some(NaturalSize::new(900, 1600)),
    ];
    let layout = compute_layout(&sizes, 1100, Some(1100.0), &FitParams::default()).unwrap();

    assert_eq!(layout.band, Band::Desktop);
    assert_eq!(layout.columns, 2);
    assert!(close(layout.aspect_ratio, 1.17, 0.005));
    assert_eq!(layout.cell.width, 500.0);
    assert!(close(layout.cell.height, 427.3, 0.1));

    // the landscape flyer overflows past the trigger and is clamped to 110%
    let wide = layout.fits[0].unwrap();
    assert!(close(wide.width, 550.0, 1e-9));
    assert!(close(wide.left, -25.0, 1e-9));

    // the portrait flyer is clamped on height
    let tall = layout.fits[1].unwrap();
    assert!(close(tall.height, layout.cell.height * 1.1, 1e-9));
}

/// Test that repeated passes over the same inputs agree exactly
#[test]
fn test_layout_is_idempotent() {
    let sizes = [
        Some(NaturalSize::new(1200, 800)),
        None,
        Some(NaturalSize::new(640, 960)),
        Some(NaturalSize::new(1024, 1024)),
    ];
    let params = FitParams::default();
    for viewport in [375, 768, 900, 1440] {
        let first = compute_layout(&sizes, viewport, Some(viewport as f64), &params).unwrap();
        let second = compute_layout(&sizes, viewport, Some(viewport as f64), &params).unwrap();
        assert_eq!(first, second);
    }
}

/// Test that no image is ever shown wider than 110% of its cell
#[test]
fn test_panorama_capped() {
    let sizes = [Some(NaturalSize::new(3000, 1000)), Some(NaturalSize::new(1000, 3000))];
    let layout = compute_layout(&sizes, 1280, Some(1280.0), &FitParams::default()).unwrap();

    // average ratio (3 + 1/3) / 2 keeps the cell near square
    for fit in layout.fits.iter().flatten() {
        assert!(fit.width <= layout.cell.width * 1.1 + 1e-9);
        assert!(fit.height <= layout.cell.height * 1.1 + 1e-9);
    }
}

/// Test the band boundaries end to end
#[test]
fn test_band_boundaries() {
    let sizes = [Some(NaturalSize::new(800, 600))];
    let params = FitParams::default();
    let band = |viewport: u32| {
        compute_layout(&sizes, viewport, Some(1000.0), &params)
            .unwrap()
            .band
    };

    assert_eq!(band(768), Band::Mobile);
    assert_eq!(band(769), Band::Tablet);
    assert_eq!(band(1024), Band::Tablet);
    assert_eq!(band(1025), Band::Desktop);
}

/// Test that the page applies the layout once every image resolves
#[test]
fn test_grid_waits_for_all_images() {
    let site = site_page(
        1100,
        0,
        &[ImageState::Pending, ImageState::Pending, ImageState::Pending],
    );
    let mut page = Page::new(site.doc.clone(), PageConfig::default());
    let t0 = Instant::now();
    page.dispatch(Signal::DocumentReady, t0);
    assert_eq!(page.grid().pending_images(), 3);

    page.dispatch(
        Signal::ImageResolved {
            element: site.images[0],
            state: loaded(1600, 900),
        },
        t0,
    );
    page.dispatch(
        Signal::ImageResolved {
            element: site.images[2],
            state: ImageState::Failed,
        },
        t0,
    );
    assert!(page.grid().layout().is_none());
    assert_eq!(page.document().style(site.cells[0], "width"), None);

    page.dispatch(
        Signal::ImageResolved {
            element: site.images[1],
            state: loaded(900, 1600),
        },
        t0,
    );

    let layout = page.grid().layout().unwrap();
    assert_eq!(layout.fits.len(), 3);
    assert!(layout.fits[2].is_none());

    let doc = page.document();
    for cell in &site.cells {
        assert_eq!(doc.style(*cell, "width"), Some("500px"));
        assert!(close(px(doc.style(*cell, "height")), 427.3, 0.01));
        assert_eq!(doc.style(*cell, "overflow"), Some("hidden"));
    }
    assert_eq!(doc.style(site.images[0], "width"), Some("550px"));
    assert_eq!(
        doc.style(site.images[0], "transform"),
        Some("translate(-50%, -50%)")
    );
    assert_eq!(doc.style(site.images[0], "object-fit"), Some("cover"));
    assert_eq!(doc.style(site.images[2], "width"), None);
    assert_eq!(
        doc.style(site.grid, "grid-template-columns"),
        Some("repeat(2, 500px)")
    );
    assert_eq!(doc.style(site.grid, "gap"), Some("30px"));
}

/// Test that only failed images leave the grid unsized
#[test]
fn test_all_images_failed() {
    let site = site_page(1100, 0, &[ImageState::Failed, ImageState::Failed]);
    let mut page = Page::new(site.doc.clone(), PageConfig::default());
    page.dispatch(Signal::DocumentReady, Instant::now());

    assert!(page.grid().is_initialized());
    assert!(page.grid().layout().is_none());
    assert_eq!(page.document().style(site.cells[0], "width"), None);
}

/// Test the resize debounce: the latest trigger wins
#[test]
fn test_resize_debounce() {
    let site = site_page(1100, 0, &[loaded(1600, 900), loaded(900, 1600)]);
    let mut page = Page::new(site.doc.clone(), PageConfig::default());
    let t0 = Instant::now();
    page.dispatch(Signal::DocumentReady, t0);
    assert_eq!(page.grid().layout().unwrap().band, Band::Desktop);

    page.document_mut().set_viewport_width(700);
    page.dispatch(Signal::Resized, t0 + ms(1000));
    page.dispatch(Signal::Resized, t0 + ms(1200));

    page.advance_to(t0 + ms(1300));
    assert_eq!(page.grid().layout().unwrap().band, Band::Desktop);

    page.advance_to(t0 + ms(1449));
    assert_eq!(page.grid().layout().unwrap().band, Band::Desktop);

    page.advance_to(t0 + ms(1450));
    let layout = page.grid().layout().unwrap();
    assert_eq!(layout.band, Band::Mobile);
    // the grid element still reports 1100px of content width
    assert_eq!(layout.cell.width, 500.0);
    assert_eq!(
        page.document().style(site.grid, "grid-template-columns"),
        Some("1fr")
    );
    assert_eq!(
        page.document().style(site.grid, "justify-items"),
        Some("center")
    );
    assert_eq!(page.next_deadline(), None);
}

/// Test the orientation settle delay
#[test]
fn test_orientation_change() {
    let site = site_page(1100, 0, &[loaded(800, 600)]);
    let mut page = Page::new(site.doc.clone(), PageConfig::default());
    let t0 = Instant::now();
    page.dispatch(Signal::DocumentReady, t0);

    page.document_mut().set_viewport_width(900);
    page.dispatch(Signal::Reoriented, t0);

    page.advance_to(t0 + ms(499));
    assert_eq!(page.grid().layout().unwrap().band, Band::Desktop);
    page.advance_to(t0 + ms(500));
    let layout = page.grid().layout().unwrap();
    assert_eq!(layout.band, Band::Tablet);
    assert_eq!(layout.cell.width, 450.0);
}

/// Test that a resize right after an orientation change keeps the settle pass
#[test]
fn test_resize_after_orientation_change() {
    let site = site_page(1100, 0, &[loaded(800, 600)]);
    let mut page = Page::new(site.doc.clone(), PageConfig::default());
    let t0 = Instant::now();
    page.dispatch(Signal::DocumentReady, t0);

    page.dispatch(Signal::Reoriented, t0);
    page.dispatch(Signal::Resized, t0 + ms(10));

    // the resize pass runs first and still reads the old viewport
    page.advance_to(t0 + ms(260));
    assert_eq!(page.grid().layout().unwrap().band, Band::Desktop);

    page.document_mut().set_viewport_width(500);
    page.advance_to(t0 + ms(499));
    assert_eq!(page.grid().layout().unwrap().band, Band::Desktop);

    page.advance_to(t0 + ms(500));
    assert_eq!(page.grid().layout().unwrap().band, Band::Mobile);
    assert_eq!(page.next_deadline(), None);
}

/// Test that window load rediscovers images added after ready
#[test]
fn test_refresh_after_window_load() {
    let mut site = site_page(1100, 0, &[loaded(1000, 1000)]);
    let grid = site.grid;
    let cell = site
        .doc
        .append(grid, pageshow::Node::new("div").with_class("flyer-item"))
        .unwrap();
    let late = site
        .doc
        .append(cell, pageshow::Node::new("img"))
        .unwrap();

    let mut page = Page::new(site.doc.clone(), PageConfig::default());
    let t0 = Instant::now();
    page.dispatch(Signal::DocumentReady, t0);
    assert_eq!(page.grid().image_count(), 2);
    assert!(page.grid().layout().is_none());

    // the host swaps the pending image for a loaded one
    page.document_mut().remove(cell).unwrap();
    page.dispatch(Signal::WindowLoaded, t0 + ms(50));
    page.advance_to(t0 + ms(150));

    assert_eq!(page.grid().image_count(), 1);
    assert!(page.grid().layout().is_some());
    assert!(page.document().query_all("img").unwrap().len() == 1);
    assert_eq!(page.document().image_state(late), ImageState::Failed);
}
