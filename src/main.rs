use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gridslice::{archive_name, export, DirectorySink, OutputFormat, SliceConfig, Slicer, SourceImage};
use tracing::*;
use tracing_subscriber::EnvFilter;

/// Cut an image into a grid of slices and pack them into a ZIP archive.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Image to slice
    input: PathBuf,

    /// Number of grid rows
    #[arg(short, long, default_value_t = 2)]
    rows: u32,

    /// Number of grid columns
    #[arg(short, long, default_value_t = 2)]
    cols: u32,

    /// Pixels trimmed from the left and right of every slice
    #[arg(long, default_value_t = 0)]
    trim_x: u32,

    /// Pixels trimmed from the top and bottom of every slice
    #[arg(long, default_value_t = 0)]
    trim_y: u32,

    /// Output image format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Png)]
    format: OutputFormat,

    /// Directory the archive is written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Archive file name [default: sliced_<input file name>.zip]
    #[arg(short, long)]
    name: Option<String>,

    /// Encode slices one after another instead of in parallel
    #[arg(long)]
    sequential: bool,
}

impl Cli {
    fn config(&self) -> SliceConfig {
        SliceConfig::new(self.rows, self.cols)
            .with_trim(self.trim_x, self.trim_y)
            .with_format(self.format)
            .with_parallel(!self.sequential)
    }

    fn archive_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => archive_name(self.input.file_name().and_then(|name| name.to_str())),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config();

    let source = SourceImage::open(&cli.input)
        .with_context(|| format!("Failed to load {}", cli.input.display()))?;
    let (width, height) = source.dimensions();
    info!(
        "Slicing {}x{} image into {} rows and {} columns",
        width, height, config.rows, config.cols
    );

    let slices = Slicer::new().slice(&source, &config);
    if slices.is_empty() {
        warn!(
            "No slices produced; check the grid size and trim settings (trim {}x{})",
            config.trim_x, config.trim_y
        );
    } else {
        let (slice_width, slice_height) = config.preview_size(width, height);
        info!(
            "Produced {} slices of about {}x{} pixels",
            slices.len(),
            slice_width,
            slice_height
        );
    }

    let name = cli.archive_name();
    let mut sink = DirectorySink::new(&cli.output);
    export(&slices, &name, &mut sink)
        .with_context(|| format!("Failed to write {} to {}", name, cli.output.display()))?;

    Ok(())
}
