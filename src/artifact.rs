use crate::OutputFormat;

/// One encoded slice.
///
/// Artifacts are created once per valid cell and never mutated. A new
/// slicing request produces a whole new set that replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SliceArtifact {
    /// Row-major position in the full grid, `row * cols + col`.
    pub id: usize,
    pub row: u32,
    pub col: u32,
    pub file_name: String,
    /// Pixel size of the encoded region.
    pub width: u32,
    pub height: u32,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub bytes: Vec<u8>,
}

impl SliceArtifact {
    /// Builds the file name of the slice at `(row, col)`.
    ///
    /// # Example
    /// ```
    /// use gridslice::{OutputFormat, SliceArtifact};
    ///
    /// assert_eq!(SliceArtifact::file_name_for(0, 3, OutputFormat::Png), "slice_0_3.png");
    /// assert_eq!(SliceArtifact::file_name_for(12, 1, OutputFormat::Jpeg), "slice_12_1.jpg");
    /// ```
    pub fn file_name_for(row: u32, col: u32, format: OutputFormat) -> String {
        format!("slice_{}_{}.{}", row, col, format.extension())
    }

    /// Size of the encoded data in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Recovers the grid coordinates and format encoded in a slice file name.
///
/// Returns `None` for names that were not produced by
/// [`SliceArtifact::file_name_for`]. A leading folder such as `slices/` is
/// ignored.
///
/// # Example
/// ```
/// use gridslice::{parse_file_name, OutputFormat};
///
/// assert_eq!(parse_file_name("slice_2_7.jpg"), Some((2, 7, OutputFormat::Jpeg)));
/// assert_eq!(parse_file_name("slices/slice_0_0.png"), Some((0, 0, OutputFormat::Png)));
/// assert_eq!(parse_file_name("slice_2.png"), None);
/// ```
pub fn parse_file_name(name: &str) -> Option<(u32, u32, OutputFormat)> {
    let name = name.rsplit('/').next()?;
    let (stem, extension) = name.rsplit_once('.')?;
    let format = OutputFormat::from_extension(extension)?;
    let (row, col) = stem.strip_prefix("slice_")?.split_once('_')?;
    Some((parse_index(row)?, parse_index(col)?, format))
}

// Only plain decimal digits, as written by `file_name_for`.
fn parse_index(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if digits.len() > 1 && digits.starts_with('0') {
        return None;
    }
    digits.parse().ok()
}
