use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pageshow::{
    compute_layout, image_loader, FitMode, FitParams, ImageState, Layout, NaturalSize, PageConfig,
};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect the responsive image grid layout", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the grid layout for a set of image files
    Layout {
        /// Viewport width in pixels
        #[arg(long)]
        viewport: u32,

        /// Grid content width; defaults to the viewport width
        #[arg(long)]
        available: Option<f64>,

        /// JSON configuration file
        #[arg(long, env = "PAGESHOW_CONFIG")]
        config: Option<PathBuf>,

        /// Letterbox images instead of cropping them
        #[arg(long)]
        contain: bool,

        /// Image files, in grid order
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Print the default configuration
    DefaultConfig,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    match Args::parse().command {
        Command::Layout {
            viewport,
            available,
            config,
            contain,
            images,
        } => {
            let config = layout_config(config.as_deref(), contain)?;
            let layout = layout_images(images, viewport, available, &config.grid.fit).await?;
            println!("{}", serde_json::to_string_pretty(&layout)?);
        }
        Command::DefaultConfig => {
            println!("{}", PageConfig::default().to_json()?);
        }
    }

    Ok(())
}

/// Configuration for `layout`: the file if given, with `--contain` applied on top
fn layout_config(path: Option<&Path>, contain: bool) -> Result<PageConfig> {
    let mut config = match path {
        Some(path) => PageConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => PageConfig::default(),
    };
    if contain {
        config.grid.fit.mode = FitMode::Contain;
    }
    Ok(config)
}

/// Probe the image files and lay them out; `available` defaults to the viewport
async fn layout_images(
    images: Vec<PathBuf>,
    viewport: u32,
    available: Option<f64>,
    params: &FitParams,
) -> Result<Layout> {
    let states = image_loader::resolve_all(images).await;
    let sizes: Vec<Option<NaturalSize>> = states.iter().map(ImageState::natural_size).collect();
    let available = available.unwrap_or(viewport as f64);

    compute_layout(&sizes, viewport, Some(available), params).context("No layout for these images")
}
