use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageError};

use crate::{OutputFormat, Result, SliceError, JPEG_QUALITY};

/// Turns one cropped region into encoded bytes.
///
/// Implementations are shared by all encode tasks of a request, so they must
/// be `Send + Sync`. A returned error only drops the affected slice.
pub trait SliceEncoder: Send + Sync {
    fn encode(&self, region: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>>;
}

/// Default encoder backed by the `image` crate codecs.
///
/// # Example
/// ```
/// use gridslice::{CodecEncoder, OutputFormat, SliceEncoder};
/// use image::{DynamicImage, RgbaImage};
///
/// let region = DynamicImage::ImageRgba8(RgbaImage::new(4, 4));
/// let png = CodecEncoder::default().encode(&region, OutputFormat::Png).unwrap();
/// assert_eq!(&png[1..4], b"PNG");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CodecEncoder {
    pub jpeg_quality: u8,
}

impl CodecEncoder {
    pub fn new(jpeg_quality: u8) -> Self {
        Self {
            jpeg_quality: jpeg_quality.clamp(1, 100),
        }
    }

    fn encode_png(&self, region: &DynamicImage) -> std::result::Result<Vec<u8>, ImageError> {
        let rgba = region.to_rgba8();
        let mut buffer = Vec::new();
        PngEncoder::new(Cursor::new(&mut buffer)).write_image(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            ExtendedColorType::Rgba8,
        )?;
        Ok(buffer)
    }

    /// Encode to JPEG; the alpha channel is dropped since JPEG has none.
    fn encode_jpeg(&self, region: &DynamicImage) -> std::result::Result<Vec<u8>, ImageError> {
        let rgb = region.to_rgb8();
        let mut buffer = Vec::new();
        JpegEncoder::new_with_quality(&mut buffer, self.jpeg_quality).write_image(
            rgb.as_raw(),
            rgb.width(),
            rgb.height(),
            ExtendedColorType::Rgb8,
        )?;
        Ok(buffer)
    }
}

impl Default for CodecEncoder {
    fn default() -> Self {
        CodecEncoder::new(JPEG_QUALITY)
    }
}

impl SliceEncoder for CodecEncoder {
    fn encode(&self, region: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>> {
        let encoded = match format {
            OutputFormat::Png => self.encode_png(region),
            OutputFormat::Jpeg => self.encode_jpeg(region),
        };
        encoded.map_err(|e| SliceError::Encode {
            file_name: format!("{}x{} {} region", region.width(), region.height(), format),
            reason: e.to_string(),
        })
    }
}
