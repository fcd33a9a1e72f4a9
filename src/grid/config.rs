use super::*;

/// Encoding used for every slice of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, clap::ValueEnum)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum OutputFormat {
    #[default]
    #[value(name = "png")]
    Png,
    #[value(name = "jpg")]
    #[cfg_attr(feature = "serde", serde(rename = "jpg", alias = "jpeg"))]
    Jpeg,
}

impl OutputFormat {
    /// File extension used in slice file names, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    /// Inverse of [`OutputFormat::extension`]; `jpeg` is accepted as well.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "png" => Some(OutputFormat::Png),
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            _ => None,
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

/// Configuration for one slicing request.
///
/// # Example
/// ```
/// use gridslice::{OutputFormat, SliceConfig};
///
/// let config = SliceConfig::default();
/// assert_eq!((config.rows, config.cols), (2, 2));
/// assert_eq!((config.trim_x, config.trim_y), (0, 0));
/// assert_eq!(config.format, OutputFormat::Png);
/// assert_eq!(config.enable_parallel, true);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SliceConfig {
    /// Number of grid rows (default: 2)
    pub rows: u32,
    /// Number of grid columns (default: 2)
    pub cols: u32,
    /// Pixels removed from the left and from the right of every cell (default: 0)
    pub trim_x: u32,
    /// Pixels removed from the top and from the bottom of every cell (default: 0)
    pub trim_y: u32,
    /// Output encoding (default: PNG)
    pub format: OutputFormat,
    /// Encode cells on the rayon thread pool (default: true)
    pub enable_parallel: bool,
}

impl SliceConfig {
    /// Creates an untrimmed PNG configuration for a `rows` x `cols` grid.
    ///
    /// # Example
    /// ```
    /// use gridslice::{OutputFormat, SliceConfig};
    ///
    /// let config = SliceConfig::new(4, 8)
    ///     .with_trim(2, 1)
    ///     .with_format(OutputFormat::Jpeg);
    /// assert_eq!(config.cols, 8);
    /// assert_eq!(config.trim_y, 1);
    /// assert_eq!(config.format, OutputFormat::Jpeg);
    /// ```
    pub fn new(rows: u32, cols: u32) -> Self {
        Self {
            rows,
            cols,
            trim_x: 0,
            trim_y: 0,
            format: OutputFormat::Png,
            enable_parallel: true,
        }
    }

    pub fn with_trim(mut self, trim_x: u32, trim_y: u32) -> Self {
        self.trim_x = trim_x;
        self.trim_y = trim_y;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_parallel(mut self, enable_parallel: bool) -> Self {
        self.enable_parallel = enable_parallel;
        self
    }

    /// A grid with no rows or no columns produces no slices.
    pub fn has_cells(&self) -> bool {
        self.rows >= 1 && self.cols >= 1
    }

    /// Whole-pixel size of a trimmed slice, as shown next to a preview.
    ///
    /// Uses floored cell dimensions and never goes below zero. Actual slices
    /// may be one pixel larger where the grid does not divide the image evenly.
    ///
    /// # Example
    /// ```
    /// use gridslice::SliceConfig;
    ///
    /// let config = SliceConfig::new(3, 3).with_trim(10, 0);
    /// assert_eq!(config.preview_size(100, 90), (13, 30));
    /// assert_eq!(config.with_trim(20, 0).preview_size(100, 90), (0, 30));
    /// ```
    pub fn preview_size(&self, width: u32, height: u32) -> (u32, u32) {
        if !self.has_cells() {
            return (0, 0);
        }
        let piece_width = width / self.cols;
        let piece_height = height / self.rows;
        (
            piece_width.saturating_sub(self.trim_x.saturating_mul(2)),
            piece_height.saturating_sub(self.trim_y.saturating_mul(2)),
        )
    }
}

impl Default for SliceConfig {
    fn default() -> Self {
        SliceConfig::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}
