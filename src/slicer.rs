use rayon::prelude::*;
use tracing::*;

use crate::{
    CodecEncoder, CropRegion, Grid, OutputFormat, Result, SliceArtifact, SliceConfig,
    SliceEncoder, SourceImage,
};

/// A valid grid cell together with the region it will be cropped from.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PlannedCell {
    pub id: usize,
    pub row: u32,
    pub col: u32,
    pub region: CropRegion,
}

/// Computes the crop region of every cell of a `width` x `height` image that
/// survives trimming and covers at least one whole pixel, in row-major order.
///
/// Rows and columns are filtered separately before they are combined, so the
/// work is bounded by the image size rather than by `rows * cols`. Ids are
/// assigned from the full-grid position, so they stay stable when cells are
/// dropped.
///
/// # Example
/// ```
/// use gridslice::{plan, SliceConfig};
///
/// let cells = plan(400, 200, &SliceConfig::new(2, 2));
/// assert_eq!(cells.len(), 4);
/// assert_eq!((cells[3].region.x, cells[3].region.y), (200.0, 100.0));
///
/// assert!(plan(400, 200, &SliceConfig::new(2, 2).with_trim(120, 0)).is_empty());
/// assert!(plan(400, 200, &SliceConfig::new(0, 2)).is_empty());
/// ```
pub fn plan(width: u32, height: u32, config: &SliceConfig) -> Vec<PlannedCell> {
    let Some(grid) = Grid::visible(width, height, config) else {
        return Vec::new();
    };
    grid.cells()
        .map(|cell| PlannedCell {
            id: cell.id(config.cols),
            row: cell.row.index,
            col: cell.column.index,
            region: cell.crop_region(config.trim_x, config.trim_y),
        })
        .collect()
}

/// Slices `image` with the default encoder.
///
/// Never fails: an empty grid, fully trimmed cells and cells that fail to
/// encode all just contribute no artifacts.
pub fn slice(image: &SourceImage, config: &SliceConfig) -> Vec<SliceArtifact> {
    Slicer::new().slice(image, config)
}

/// Decodes `bytes` and slices the result with the default encoder.
///
/// # Errors
/// Returns [`crate::SliceError::Decode`] (or `InvalidDimensions`) when the bytes
/// cannot be decoded, so that a broken input is never mistaken for a grid
/// that produced no slices. An empty grid is checked first and yields an empty
/// result without decoding.
pub fn slice_bytes(bytes: &[u8], config: &SliceConfig) -> Result<Vec<SliceArtifact>> {
    if !config.has_cells() {
        debug!("Skipping decode for empty grid {:?}", config);
        return Ok(Vec::new());
    }
    let image = SourceImage::decode(bytes)?;
    Ok(slice(&image, config))
}

/// Crops every valid grid cell and encodes it with `E`.
///
/// # Example
/// ```
/// use gridslice::{OutputFormat, SliceConfig, Slicer, SourceImage};
/// use image::{DynamicImage, RgbImage};
///
/// let source = SourceImage::from_image(DynamicImage::ImageRgb8(RgbImage::new(90, 60))).unwrap();
/// let config = SliceConfig::new(2, 3).with_format(OutputFormat::Jpeg);
///
/// let slices = Slicer::new().slice(&source, &config);
/// assert_eq!(slices.len(), 6);
/// assert_eq!(slices[5].file_name, "slice_1_2.jpg");
/// ```
#[derive(Debug, Clone, Default)]
pub struct Slicer<E = CodecEncoder> {
    encoder: E,
}

impl Slicer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: SliceEncoder> Slicer<E> {
    pub fn with_encoder(encoder: E) -> Self {
        Self { encoder }
    }

    /// Slices `image` and returns the artifacts ordered by id.
    ///
    /// Blocks until every cell has been encoded.
    pub fn slice(&self, image: &SourceImage, config: &SliceConfig) -> Vec<SliceArtifact> {
        self.slice_while(image, config, || true)
            .unwrap_or_default()
    }

    /// Like [`Slicer::slice`], but stops starting new cells once `keep_going`
    /// returns `false`, and then returns `None` instead of a partial result.
    pub fn slice_while<F>(
        &self,
        image: &SourceImage,
        config: &SliceConfig,
        keep_going: F,
    ) -> Option<Vec<SliceArtifact>>
    where
        F: Fn() -> bool + Sync,
    {
        trace!("Slicing image with config: {:?}", config);
        let (width, height) = image.dimensions();
        let cells = plan(width, height, config);
        debug!(
            "Encoding {} of {} cells from {}x{} image",
            cells.len(),
            config.rows as usize * config.cols as usize,
            width,
            height
        );

        let encode = |cell: &PlannedCell| {
            if !keep_going() {
                return None;
            }
            self.slice_cell(image, cell, config.format)
        };
        let mut artifacts: Vec<SliceArtifact> = if config.enable_parallel {
            cells.par_iter().filter_map(encode).collect()
        } else {
            cells.iter().filter_map(encode).collect()
        };

        if !keep_going() {
            debug!("Slicing abandoned after {} artifacts", artifacts.len());
            return None;
        }

        // Completion order is unspecified; restore row-major order.
        artifacts.sort_by_key(|artifact| artifact.id);
        Some(artifacts)
    }

    fn slice_cell(
        &self,
        image: &SourceImage,
        cell: &PlannedCell,
        format: OutputFormat,
    ) -> Option<SliceArtifact> {
        let file_name = SliceArtifact::file_name_for(cell.row, cell.col, format);
        let Some(rect) = cell.region.pixel_rect(image.width(), image.height()) else {
            debug!("Dropping {}: region {:?} covers no pixels", file_name, cell.region);
            return None;
        };

        let region = image.as_image().crop_imm(
            rect.left() as u32,
            rect.top() as u32,
            rect.width(),
            rect.height(),
        );
        match self.encoder.encode(&region, format) {
            Ok(bytes) if bytes.is_empty() => {
                warn!("Dropping {}: encoder produced no data", file_name);
                None
            }
            Ok(bytes) => Some(SliceArtifact {
                id: cell.id,
                row: cell.row,
                col: cell.col,
                file_name,
                width: region.width(),
                height: region.height(),
                bytes,
            }),
            Err(e) => {
                warn!("Dropping {}: {}", file_name, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SliceError;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Paints every cell of a `rows` x `cols` grid with its id in the red channel.
    fn labelled_image(width: u32, height: u32, rows: u32, cols: u32) -> SourceImage {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            let row = y * rows / height;
            let col = x * cols / width;
            Rgba([(row * cols + col) as u8, 0, 0, 255])
        });
        SourceImage::from_image(DynamicImage::ImageRgba8(image)).unwrap()
    }

    fn random_image(width: u32, height: u32) -> SourceImage {
        let image = RgbaImage::from_fn(width, height, |_, _| {
            Rgba([rand::random::<u8>(), rand::random::<u8>(), rand::random::<u8>(), 255])
        });
        SourceImage::from_image(DynamicImage::ImageRgba8(image)).unwrap()
    }

    fn names(artifacts: &[SliceArtifact]) -> Vec<&str> {
        artifacts.iter().map(|a| a.file_name.as_str()).collect()
    }

    /// Fails every region whose top-left pixel carries the given label.
    struct FailingEncoder {
        label: u8,
    }

    impl SliceEncoder for FailingEncoder {
        fn encode(&self, region: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>> {
            if region.to_rgba8().get_pixel(0, 0)[0] == self.label {
                return Err(SliceError::Encode {
                    file_name: "test".into(),
                    reason: "refused".into(),
                });
            }
            CodecEncoder::default().encode(region, format)
        }
    }

    /// Makes earlier cells finish last.
    struct SlowFirstEncoder;

    impl SliceEncoder for SlowFirstEncoder {
        fn encode(&self, region: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>> {
            let label = region.to_rgba8().get_pixel(0, 0)[0] as u64;
            std::thread::sleep(Duration::from_millis(16u64.saturating_sub(label) * 2));
            CodecEncoder::default().encode(region, format)
        }
    }

    struct EmptyEncoder;

    impl SliceEncoder for EmptyEncoder {
        fn encode(&self, _region: &DynamicImage, _format: OutputFormat) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_two_by_two_example() {
        let source = labelled_image(400, 200, 2, 2);
        let artifacts = slice(&source, &SliceConfig::new(2, 2));

        assert_eq!(
            names(&artifacts),
            vec!["slice_0_0.png", "slice_0_1.png", "slice_1_0.png", "slice_1_1.png"]
        );
        for artifact in &artifacts {
            assert_eq!((artifact.width, artifact.height), (200, 100));
            assert!(!artifact.is_empty());
            let decoded = image::load_from_memory(&artifact.bytes).unwrap().to_rgba8();
            assert_eq!(decoded.dimensions(), (200, 100));
            assert_eq!(decoded.get_pixel(0, 0)[0] as usize, artifact.id);
        }
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_two_by_two_snapshot() {
        let source = labelled_image(400, 200, 2, 2);
        let artifacts = slice(&source, &SliceConfig::new(2, 2).with_trim(10, 5));

        insta::assert_yaml_snapshot!(artifacts, @r###"
        - id: 0
          row: 0
          col: 0
          file_name: slice_0_0.png
          width: 180
          height: 90
        - id: 1
          row: 0
          col: 1
          file_name: slice_0_1.png
          width: 180
          height: 90
        - id: 2
          row: 1
          col: 0
          file_name: slice_1_0.png
          width: 180
          height: 90
        - id: 3
          row: 1
          col: 1
          file_name: slice_1_1.png
          width: 180
          height: 90
        "###);
    }

    #[test]
    fn test_over_trimmed_cells_are_dropped() {
        let source = labelled_image(400, 200, 2, 2);
        let artifacts = slice(&source, &SliceConfig::new(2, 2).with_trim(120, 0));
        assert!(artifacts.is_empty());

        let artifacts = slice(&source, &SliceConfig::new(2, 2).with_trim(0, 50));
        assert!(artifacts.is_empty());
    }

    #[test]
    fn test_empty_grid_yields_nothing() {
        let source = labelled_image(40, 20, 1, 1);
        assert!(slice(&source, &SliceConfig::new(0, 3)).is_empty());
        assert!(slice(&source, &SliceConfig::new(3, 0)).is_empty());
    }

    #[test]
    fn test_trim_crops_from_both_sides() {
        let source = labelled_image(100, 100, 1, 1);
        let artifacts = slice(&source, &SliceConfig::new(1, 1).with_trim(10, 20));
        assert_eq!(artifacts.len(), 1);
        assert_eq!((artifacts[0].width, artifacts[0].height), (80, 60));
    }

    #[test]
    fn test_jpeg_names_and_bytes() {
        let source = random_image(64, 64);
        let config = SliceConfig::new(2, 2).with_format(OutputFormat::Jpeg);
        let artifacts = slice(&source, &config);
        assert_eq!(
            names(&artifacts),
            vec!["slice_0_0.jpg", "slice_0_1.jpg", "slice_1_0.jpg", "slice_1_1.jpg"]
        );
        for artifact in &artifacts {
            assert_eq!(image::guess_format(&artifact.bytes).unwrap(), ImageFormat::Jpeg);
        }
    }

    #[test]
    fn test_sub_pixel_cells_are_dropped() {
        // 0.6 px wide columns: some of them contain no whole pixel
        let source = random_image(3, 1);
        let artifacts = slice(&source, &SliceConfig::new(1, 5));
        assert_eq!(
            names(&artifacts),
            vec!["slice_0_1.png", "slice_0_3.png", "slice_0_4.png"]
        );
        assert_eq!(artifacts.iter().map(|a| a.width).sum::<u32>(), 3);
    }

    #[test]
    fn test_encode_failure_is_isolated() {
        let source = labelled_image(40, 40, 2, 2);
        let slicer = Slicer::with_encoder(FailingEncoder { label: 1 });
        let artifacts = slicer.slice(&source, &SliceConfig::new(2, 2));

        assert_eq!(
            names(&artifacts),
            vec!["slice_0_0.png", "slice_1_0.png", "slice_1_1.png"]
        );
        assert_eq!(
            artifacts.iter().map(|a| a.id).collect::<Vec<_>>(),
            vec![0, 2, 3]
        );
    }

    #[test]
    fn test_empty_encoder_output_is_dropped() {
        let source = labelled_image(40, 40, 2, 2);
        let artifacts = Slicer::with_encoder(EmptyEncoder).slice(&source, &SliceConfig::new(2, 2));
        assert!(artifacts.is_empty());
    }

    #[test]
    fn test_order_ignores_completion_order() {
        let source = labelled_image(64, 64, 4, 4);
        let slicer = Slicer::with_encoder(SlowFirstEncoder);
        let config = SliceConfig::new(4, 4);

        let first = slicer.slice(&source, &config);
        let ids: Vec<usize> = first.iter().map(|a| a.id).collect();
        assert_eq!(ids, (0..16).collect::<Vec<_>>());

        let second = slicer.slice(&source, &config);
        assert_eq!(first, second);

        let sequential = slicer.slice(&source, &config.clone().with_parallel(false));
        assert_eq!(first, sequential);
    }

    #[test]
    fn test_slice_while_stops_when_cancelled() {
        let source = labelled_image(40, 40, 2, 2);
        let calls = AtomicUsize::new(0);
        let result = Slicer::new().slice_while(&source, &SliceConfig::new(2, 2), || {
            calls.fetch_add(1, Ordering::SeqCst) < 2
        });
        assert!(result.is_none());
    }

    #[test]
    fn test_slice_bytes_reports_decode_failure() {
        let err = slice_bytes(b"not an image", &SliceConfig::new(2, 2)).unwrap_err();
        assert!(matches!(err, SliceError::Decode(_)), "{err:?}");
    }

    #[test]
    fn test_slice_bytes_decodes_png() {
        let mut bytes = Vec::new();
        labelled_image(30, 30, 1, 1)
            .as_image()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let artifacts = slice_bytes(&bytes, &SliceConfig::new(3, 3)).unwrap();
        assert_eq!(artifacts.len(), 9);
        assert!(artifacts.iter().all(|a| (a.width, a.height) == (10, 10)));
    }

    #[test]
    fn test_huge_grid_on_tiny_image_stays_bounded() {
        let config = SliceConfig::new(100_000, 100_000);
        let cells = plan(4, 4, &config);
        assert_eq!(cells.len(), 16);
        assert!(cells
            .iter()
            .all(|c| c.id == c.row as usize * 100_000 + c.col as usize));

        let artifacts = slice(&random_image(4, 4), &config);
        assert_eq!(artifacts.len(), 16);
        assert!(artifacts.iter().all(|a| (a.width, a.height) == (1, 1)));
        let ids: Vec<usize> = artifacts.iter().map(|a| a.id).collect();
        assert_eq!(ids, cells.iter().map(|c| c.id).collect::<Vec<_>>());
    }

    #[test]
    fn test_plan_keeps_full_grid_ids() {
        // 30 px wide cells; trim 14 keeps 2 px, 15 keeps nothing
        let cells = plan(90, 30, &SliceConfig::new(1, 3).with_trim(14, 0));
        assert_eq!(cells.iter().map(|c| c.id).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(cells[2].region.width, 2.0);
        assert!(plan(90, 30, &SliceConfig::new(1, 3).with_trim(15, 0)).is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn test_untrimmed_grid_covers_image(
            width in 1..80u32,
            height in 1..80u32,
            rows in 1..6u32,
            cols in 1..6u32,
        ) {
            prop_assume!(cols <= width && rows <= height);
            let source = random_image(width, height);
            let config = SliceConfig::new(rows, cols);
            let artifacts = slice(&source, &config);

            prop_assert_eq!(artifacts.len(), (rows * cols) as usize);
            for row in artifacts.chunks(cols as usize) {
                prop_assert_eq!(row.iter().map(|a| a.width).sum::<u32>(), width);
            }
            for col in 0..cols as usize {
                let total: u32 = artifacts.iter().skip(col).step_by(cols as usize).map(|a| a.height).sum();
                prop_assert_eq!(total, height);
            }
            for (artifact, cell) in artifacts.iter().zip(plan(width, height, &config)) {
                prop_assert_eq!(artifact.id, cell.id);
                prop_assert_eq!(
                    crate::parse_file_name(&artifact.file_name),
                    Some((cell.row, cell.col, OutputFormat::Png))
                );
            }
        }
    }
}
