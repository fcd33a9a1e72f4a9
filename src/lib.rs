//! This crate cuts an image into a regular grid of slices, optionally trims a
//! fixed margin from every slice, encodes the slices as PNG or JPEG and packs
//! them into a ZIP archive.
//! It uses the `image` crate for decoding, cropping and encoding, `rayon` to
//! encode cells concurrently and `zip` for the archive.
//!
//! # Example
//! ```
//! use gridslice::{archive, slice, SliceConfig, SourceImage, DEFAULT_ARCHIVE_NAME};
//! use image::{DynamicImage, RgbaImage};
//!
//! let image = DynamicImage::ImageRgba8(RgbaImage::new(400, 200));
//! let source = SourceImage::from_image(image).unwrap();
//!
//! let slices = slice(&source, &SliceConfig::new(2, 2));
//! let names: Vec<&str> = slices.iter().map(|s| s.file_name.as_str()).collect();
//! assert_eq!(
//!     names,
//!     ["slice_0_0.png", "slice_0_1.png", "slice_1_0.png", "slice_1_1.png"]
//! );
//! assert!(slices.iter().all(|s| (s.width, s.height) == (200, 100)));
//!
//! let zip = archive(&slices, DEFAULT_ARCHIVE_NAME).unwrap();
//! assert_eq!(zip.name, "sprites.zip");
//! ```

/// Packing slices into a ZIP archive and handing it to a sink.
pub mod archive;
/// Slice artifacts and their file naming scheme.
pub mod artifact;
/// The [`SliceEncoder`] seam and the default `image`-backed encoder.
pub mod encode;
/// Uniform grid partition, crop regions and slicing configuration.
pub mod grid;
/// Last-request-wins coordination of overlapping slicing requests.
pub mod session;
/// Cropping and encoding of every grid cell.
pub mod slicer;
/// The decoded input image.
pub mod source;

use thiserror::Error;

// Determined through benchmarking typical use cases
const DEFAULT_SMALLVEC_SIZE: usize = 32;
const DEFAULT_ROWS: u32 = 2;
const DEFAULT_COLS: u32 = 2;

/// JPEG quality used for every JPEG slice.
pub const JPEG_QUALITY: u8 = 90;
/// Folder inside the archive that holds every slice.
pub const SLICES_FOLDER: &str = "slices";
/// Archive name used when the source file name is unknown.
pub const DEFAULT_ARCHIVE_NAME: &str = "sprites.zip";

#[derive(Error, Debug)]
pub enum SliceError {
    #[error("Failed to decode source image: {0}")]
    Decode(String),

    #[error("Invalid image dimensions: width={width}, height={height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Failed to encode {file_name}: {reason}")]
    Encode { file_name: String, reason: String },

    #[error("Failed to write archive: {0}")]
    ArchiveWrite(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SliceError>;

pub use archive::{archive, archive_name, export, write_archive, Archive, ArchiveSink, DirectorySink};
pub use artifact::{parse_file_name, SliceArtifact};
pub use encode::{CodecEncoder, SliceEncoder};
pub use grid::{
    Cell, Column, CropRegion, Grid, LineTrait, OutputFormat, Row, SliceConfig, SmallVecLine, Span,
};
pub use session::{SliceBatch, SliceOutcome, SliceRequest, SliceSession};
pub use slicer::{plan, slice, slice_bytes, PlannedCell, Slicer};
pub use source::SourceImage;
