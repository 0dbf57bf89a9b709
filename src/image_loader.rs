//! Image probing utilities
//!
//! Reads only image headers: the grid needs natural dimensions, never pixels.

use crate::document::{ElementId, ImageState};
use crate::fit::NaturalSize;
use crate::page::Signal;
use crate::{Error, Result};
use image::ImageReader;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinSet;
use tracing::{debug, warn};

/// Read an image file's natural dimensions
pub fn probe<P: AsRef<Path>>(path: P) -> Result<NaturalSize> {
    let path = path.as_ref();

    let (width, height) = ImageReader::open(path)
        .map_err(Error::Io)?
        .with_guessed_format()?
        .into_dimensions()?;

    if width == 0 || height == 0 {
        return Err(Error::InvalidInput(format!(
            "{} has an empty dimension ({}x{})",
            path.display(),
            width,
            height
        )));
    }

    Ok(NaturalSize::new(width, height))
}

/// Load outcome for one file; failures resolve as [`ImageState::Failed`]
pub fn resolve<P: AsRef<Path>>(path: P) -> ImageState {
    let path = path.as_ref();
    match probe(path) {
        Ok(size) => {
            debug!(path = %path.display(), width = size.width, height = size.height, "Image probed");
            ImageState::Loaded(size)
        }
        Err(e) => {
            warn!(path = %path.display(), "Image failed to load: {}", e);
            ImageState::Failed
        }
    }
}

/// Probe every file on the blocking pool; the result keeps the input order
pub async fn resolve_all(paths: Vec<PathBuf>) -> Vec<ImageState> {
    let handles: Vec<_> = paths
        .into_iter()
        .map(|path| tokio::task::spawn_blocking(move || resolve(path)))
        .collect();

    let mut states = Vec::with_capacity(handles.len());
    for handle in handles {
        states.push(handle.await.unwrap_or(ImageState::Failed));
    }
    states
}

/// Probe each element's source file and report it as a
/// [`Signal::ImageResolved`] as soon as it completes.
///
/// Returns the number of signals delivered.
pub async fn feed(sources: Vec<(ElementId, PathBuf)>, signals: UnboundedSender<Signal>) -> usize {
    let mut probes = JoinSet::new();
    for (element, path) in sources {
        probes.spawn_blocking(move || (element, resolve(path)));
    }

    let mut delivered = 0;
    while let Some(joined) = probes.join_next().await {
        let Ok((element, state)) = joined else {
            warn!("Image probe task panicked");
            continue;
        };
        if signals.send(Signal::ImageResolved { element, state }).is_err() {
            debug!("Page closed before every image resolved");
            break;
        }
        delivered += 1;
    }
    delivered
}
