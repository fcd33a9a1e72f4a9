use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::*;

use crate::{
    archive, Archive, CodecEncoder, Result, SliceArtifact, SliceConfig, SliceEncoder, Slicer,
    SourceImage,
};

/// Ticket for one slicing request issued through a [`SliceSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SliceRequest {
    generation: u64,
}

impl SliceRequest {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// The artifacts of one completed request.
///
/// A batch is replaced as a whole when a newer request completes. Anything a
/// caller attached to its artifacts (preview handles, temp files) should be
/// released when the batch handed back by [`SliceSession::run`] is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceBatch {
    generation: u64,
    config: SliceConfig,
    artifacts: Vec<SliceArtifact>,
}

impl SliceBatch {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn config(&self) -> &SliceConfig {
        &self.config
    }

    pub fn artifacts(&self) -> &[SliceArtifact] {
        &self.artifacts
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Combined size of all encoded slices.
    pub fn total_bytes(&self) -> usize {
        self.artifacts.iter().map(SliceArtifact::len).sum()
    }

    /// Packs this batch into a ZIP archive named `name`.
    pub fn archive(&self, name: &str) -> Result<Archive> {
        archive(&self.artifacts, name)
    }
}

/// Result of running a request.
#[derive(Debug)]
pub enum SliceOutcome {
    /// The request finished and its batch is now the published one. Holds
    /// the batch it replaced.
    Published { previous: Option<Arc<SliceBatch>> },
    /// A newer request was issued first; this result was thrown away.
    Superseded,
}

impl SliceOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, SliceOutcome::Published { .. })
    }
}

/// Keeps the most recent slicing result of an editor-like caller.
///
/// Requests may overlap, for instance when settings change while an earlier
/// request is still encoding. Only the most recently issued request can
/// publish; older ones stop early and report [`SliceOutcome::Superseded`].
///
/// # Example
/// ```
/// use gridslice::{SliceConfig, SliceSession, SourceImage};
/// use image::{DynamicImage, RgbaImage};
///
/// let source = SourceImage::from_image(DynamicImage::ImageRgba8(RgbaImage::new(40, 40))).unwrap();
/// let session = SliceSession::new();
///
/// let stale = session.begin();
/// let fresh = session.begin();
/// assert!(session.run(fresh, &source, &SliceConfig::new(4, 4)).is_published());
/// assert!(!session.run(stale, &source, &SliceConfig::new(2, 2)).is_published());
///
/// assert_eq!(session.current().unwrap().len(), 16);
/// ```
#[derive(Debug, Default)]
pub struct SliceSession<E = CodecEncoder> {
    slicer: Slicer<E>,
    latest: AtomicU64,
    published: Mutex<Option<Arc<SliceBatch>>>,
}

impl SliceSession {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: SliceEncoder> SliceSession<E> {
    pub fn with_slicer(slicer: Slicer<E>) -> Self {
        Self {
            slicer,
            latest: AtomicU64::new(0),
            published: Mutex::new(None),
        }
    }

    /// Issues a new request, superseding every earlier one.
    pub fn begin(&self) -> SliceRequest {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        trace!("Issued slicing request {}", generation);
        SliceRequest { generation }
    }

    pub fn is_current(&self, request: SliceRequest) -> bool {
        self.latest.load(Ordering::SeqCst) == request.generation
    }

    /// Slices `image` for `request` and publishes the result if `request` is
    /// still the latest one when it finishes.
    pub fn run(
        &self,
        request: SliceRequest,
        image: &SourceImage,
        config: &SliceConfig,
    ) -> SliceOutcome {
        let Some(artifacts) = self
            .slicer
            .slice_while(image, config, || self.is_current(request))
        else {
            debug!("Request {} superseded while slicing", request.generation);
            return SliceOutcome::Superseded;
        };

        let mut published = self.published.lock();
        if !self.is_current(request) {
            debug!("Request {} superseded before publishing", request.generation);
            return SliceOutcome::Superseded;
        }
        let batch = SliceBatch {
            generation: request.generation,
            config: config.clone(),
            artifacts,
        };
        debug!(
            "Publishing request {} with {} slices",
            request.generation,
            batch.len()
        );
        let previous = published.replace(Arc::new(batch));
        SliceOutcome::Published { previous }
    }

    /// Issues a request and runs it right away.
    pub fn submit(&self, image: &SourceImage, config: &SliceConfig) -> SliceOutcome {
        let request = self.begin();
        self.run(request, image, config)
    }

    /// The most recently published batch.
    pub fn current(&self) -> Option<Arc<SliceBatch>> {
        self.published.lock().clone()
    }

    /// Drops the published batch and cancels all outstanding requests.
    pub fn clear(&self) -> Option<Arc<SliceBatch>> {
        self.begin();
        self.published.lock().take()
    }
}
