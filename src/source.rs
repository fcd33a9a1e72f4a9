use std::path::Path;

use image::{DynamicImage, GenericImageView, ImageError};
use tracing::*;

use crate::{Result, SliceError};

/// A decoded image to be sliced.
///
/// The image is only ever read, so one `SourceImage` can be shared by every
/// encode task of a request.
#[derive(Debug, Clone)]
pub struct SourceImage {
    image: DynamicImage,
}

impl SourceImage {
    /// Wraps an already decoded image.
    ///
    /// # Errors
    /// Returns [`SliceError::InvalidDimensions`] when either dimension is zero.
    ///
    /// # Example
    /// ```
    /// use gridslice::SourceImage;
    /// use image::{DynamicImage, RgbImage};
    ///
    /// let source = SourceImage::from_image(DynamicImage::ImageRgb8(RgbImage::new(64, 32))).unwrap();
    /// assert_eq!(source.dimensions(), (64, 32));
    ///
    /// assert!(SourceImage::from_image(DynamicImage::ImageRgb8(RgbImage::new(0, 32))).is_err());
    /// ```
    pub fn from_image(image: DynamicImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            error!(
                "Invalid image dimensions: width={}, height={}",
                width, height
            );
            return Err(SliceError::InvalidDimensions { width, height });
        }
        Ok(Self { image })
    }

    /// Decodes an image from encoded bytes, guessing the format from its content.
    ///
    /// # Errors
    /// Returns [`SliceError::Decode`] when the bytes are not a supported image.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        trace!("Decoding {} bytes", bytes.len());
        let image = image::load_from_memory(bytes).map_err(decode_error)?;
        Self::from_image(image)
    }

    /// Opens and decodes an image file.
    ///
    /// # Errors
    /// Returns [`SliceError::Io`] when the file cannot be read and
    /// [`SliceError::Decode`] when its content is not a supported image.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Opening source image {}", path.display());
        let image = image::ImageReader::open(path)?
            .with_guessed_format()?
            .decode()
            .map_err(decode_error)?;
        Self::from_image(image)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn as_image(&self) -> &DynamicImage {
        &self.image
    }
}

impl TryFrom<DynamicImage> for SourceImage {
    type Error = SliceError;

    fn try_from(image: DynamicImage) -> Result<Self> {
        Self::from_image(image)
    }
}

fn decode_error(e: ImageError) -> SliceError {
    match e {
        ImageError::IoError(e) => SliceError::Io(e),
        other => SliceError::Decode(other.to_string()),
    }
}
