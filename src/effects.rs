//! Stateless page effects
//!
//! Each function performs one self-contained document mutation. A missing
//! target element is reported as `Error::MissingElement` so the caller can log
//! it and carry on with the other effects.

use crate::config::{BackgroundRule, FooterConfig, HeaderConfig};
use crate::document::{Document, ElementId};
use crate::{Error, Result};
use chrono::{DateTime, Local};
use tracing::debug;

/// Class that reveals the mobile menu
pub const MENU_OPEN_CLASS: &str = "show";

/// Attribute holding a lazy image's deferred source
pub const LAZY_SOURCE_ATTR: &str = "data-src";

/// Open or close the mobile menu, returning whether it is now open
pub fn toggle_menu<D: Document + ?Sized>(doc: &mut D, menu: Option<ElementId>) -> Result<bool> {
    let menu = menu.ok_or_else(|| Error::MissingElement("mobile menu".into()))?;
    doc.toggle_class(menu, MENU_OPEN_CLASS)
}

/// Footer text for a modification time
pub fn last_updated_text(modified: DateTime<Local>, config: &FooterConfig) -> String {
    format!(
        "Last updated: {}, {}",
        modified.format(&config.date_format),
        modified.format(&config.time_format)
    )
}

/// Append the "Last updated" paragraph to the footer
pub fn stamp_last_updated<D: Document + ?Sized>(
    doc: &mut D,
    footer: Option<ElementId>,
    config: &FooterConfig,
) -> Result<ElementId> {
    let footer = footer.ok_or_else(|| {
        Error::MissingElement("footer for last updated timestamp".into())
    })?;

    let text = last_updated_text(doc.last_modified(), config);
    let paragraph = doc.append_paragraph(footer, &text)?;
    doc.set_styles(
        paragraph,
        &[
            ("font-size", "0.8rem"),
            ("color", "#fff"),
            ("margin-top", "5px"),
        ],
    )?;
    Ok(paragraph)
}

/// Give narrow viewports the tall, cover-fit header.
///
/// Returns whether the override was applied.
pub fn adjust_mobile_header<D: Document + ?Sized>(
    doc: &mut D,
    header: Option<ElementId>,
    config: &HeaderConfig,
) -> Result<bool> {
    let header = header.ok_or_else(|| Error::MissingElement("header".into()))?;
    if doc.viewport_width() > config.max_width {
        return Ok(false);
    }
    doc.set_styles(
        header,
        &[("height", config.height.as_str()), ("background-size", "cover")],
    )?;
    Ok(true)
}

/// Apply one background rule
pub fn apply_background<D: Document + ?Sized>(doc: &mut D, rule: &BackgroundRule) -> Result<()> {
    let section = doc
        .query(&rule.selector)?
        .ok_or_else(|| Error::MissingElement(rule.selector.clone()))?;

    let image = format!("url('{}')", rule.image);
    doc.set_styles(
        section,
        &[
            ("background-image", image.as_str()),
            ("background-size", "cover"),
            ("background-position", "center"),
            ("background-repeat", "no-repeat"),
        ],
    )
}

/// Apply every background rule, collecting the failures
pub fn apply_backgrounds<D: Document + ?Sized>(
    doc: &mut D,
    rules: &[BackgroundRule],
) -> Vec<(String, Error)> {
    rules
        .iter()
        .filter_map(|rule| {
            apply_background(doc, rule)
                .err()
                .map(|e| (rule.selector.clone(), e))
        })
        .collect()
}

/// Swap a lazy image's deferred source in.
///
/// Returns whether a source was promoted; images without one are left alone.
pub fn reveal_lazy_image<D: Document + ?Sized>(doc: &mut D, image: ElementId) -> Result<bool> {
    let Some(source) = doc.attribute(image, LAZY_SOURCE_ATTR) else {
        return Ok(false);
    };
    doc.set_attribute(image, "src", &source)?;
    doc.remove_attribute(image, LAZY_SOURCE_ATTR)?;
    debug!(%image, %source, "Lazy image revealed");
    Ok(true)
}
