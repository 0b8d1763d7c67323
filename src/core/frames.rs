//! Frame store: the decoded hero image sequence.
//!
//! Slots are filled once and never replaced.  Loading is driven from the
//! host loop in strictly sequential batches; decoding itself happens off the
//! loop (see `app::frame_runtime`) and results come back through
//! [`FrameStore::complete`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::RgbaImage;
use walkdir::WalkDir;

/// Why a frame could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame {index}: cannot read {path}: {source}")]
    Io {
        index: usize,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("frame {index}: cannot decode {path}: {source}")]
    Decode {
        index: usize,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("frame {index} is outside a sequence of {count}")]
    OutOfRange { index: usize, count: usize },
}

/// Lifecycle of one slot.  `Pending` and `Failed` both read as absent.
#[derive(Debug, Clone, Default)]
pub enum FrameSlot {
    #[default]
    Absent,
    Pending,
    Ready(Arc<RgbaImage>),
    Failed,
}

/// Notifications raised while frames arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
    /// Frame 0 is ready; the consumer should perform its first draw.
    FirstFrameReady,
    /// Every slot is either ready or permanently failed.
    AllSettled,
}

/// Owner of the image sequence.
#[derive(Debug)]
pub struct FrameStore {
    slots: Vec<FrameSlot>,
    /// Next index handed out by [`FrameStore::next_batch`].
    next_to_load: usize,
    settled: usize,
}

impl FrameStore {
    pub fn new(count: usize) -> Self {
        Self {
            slots: vec![FrameSlot::Absent; count],
            next_to_load: 0,
            settled: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Mark `index` pending.  Returns `true` when the caller should start a
    /// fetch+decode, i.e. the slot was absent and has never failed.
    pub fn request(&mut self, index: usize) -> bool {
        match self.slots.get_mut(index) {
            Some(slot @ FrameSlot::Absent) => {
                *slot = FrameSlot::Pending;
                true
            }
            _ => false,
        }
    }

    /// Request the next `batch_size` frames in index order.
    pub fn next_batch(&mut self, batch_size: usize) -> Vec<usize> {
        let end = (self.next_to_load + batch_size.max(1)).min(self.slots.len());
        let batch = (self.next_to_load..end)
            .filter(|&i| self.request(i))
            .collect();
        self.next_to_load = end;
        batch
    }

    /// `true` once every index has been handed out for loading.
    pub fn all_requested(&self) -> bool {
        self.next_to_load >= self.slots.len()
    }

    pub fn is_ready(&self, index: usize) -> bool {
        matches!(self.slots.get(index), Some(FrameSlot::Ready(_)))
    }

    pub fn get(&self, index: usize) -> Option<Arc<RgbaImage>> {
        match self.slots.get(index) {
            Some(FrameSlot::Ready(img)) => Some(Arc::clone(img)),
            _ => None,
        }
    }

    pub fn ready_count(&self) -> usize {
        (0..self.slots.len()).filter(|&i| self.is_ready(i)).count()
    }

    /// Record a decode result.  Ready slots are immutable: a second result
    /// for the same index is ignored.
    pub fn complete(
        &mut self,
        index: usize,
        result: Result<RgbaImage, FrameError>,
    ) -> Vec<FrameEvent> {
        let mut events = Vec::new();
        let Some(slot) = self.slots.get_mut(index) else {
            return events;
        };
        if matches!(slot, FrameSlot::Ready(_) | FrameSlot::Failed) {
            return events;
        }

        match result {
            Ok(img) => {
                *slot = FrameSlot::Ready(Arc::new(img));
                if index == 0 {
                    events.push(FrameEvent::FirstFrameReady);
                }
            }
            Err(err) => {
                tracing::warn!(%err, "frame left absent");
                *slot = FrameSlot::Failed;
            }
        }

        self.settled += 1;
        if self.settled == self.slots.len() {
            tracing::debug!(ready = self.ready_count(), total = self.slots.len(), "frames settled");
            events.push(FrameEvent::AllSettled);
        }
        events
    }
}

// ───────────────────────────────────────── canvas ────────────

/// The hero canvas: remembers what it last drew so redundant draws are
/// skipped and absent frames leave the previous image on screen.
#[derive(Debug, Default)]
pub struct FrameCanvas {
    last_drawn: Option<usize>,
    shown: Option<Arc<RgbaImage>>,
}

impl FrameCanvas {
    /// Draw `index` if it is ready and differs from the last drawn frame.
    /// Returns `true` when the shown image changed.
    pub fn draw(&mut self, index: usize, store: &FrameStore) -> bool {
        if self.last_drawn == Some(index) {
            return false;
        }
        let Some(img) = store.get(index) else {
            return false;
        };
        self.shown = Some(img);
        self.last_drawn = Some(index);
        true
    }

    /// Force the next draw to go through (viewport size changed).
    pub fn invalidate(&mut self) {
        self.last_drawn = None;
    }

    pub fn last_drawn(&self) -> Option<usize> {
        self.last_drawn
    }

    pub fn image(&self) -> Option<&RgbaImage> {
        self.shown.as_deref()
    }
}

// ───────────────────────────────────────── sources ───────────

/// Where frame images come from.
pub trait FrameSource: Send + Sync {
    fn load(&self, index: usize) -> Result<RgbaImage, FrameError>;
}

/// Numbered image files in a directory: `<dir>/<prefix>001.png` is frame 0.
#[derive(Debug, Clone)]
pub struct DirFrameSource {
    dir: PathBuf,
    prefix: String,
    extension: String,
    count: usize,
}

impl DirFrameSource {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>, count: usize) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            extension: "png".into(),
            count,
        }
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("{}{:03}.{}", self.prefix, index + 1, self.extension))
    }
}

impl FrameSource for DirFrameSource {
    fn load(&self, index: usize) -> Result<RgbaImage, FrameError> {
        if index >= self.count {
            return Err(FrameError::OutOfRange {
                index,
                count: self.count,
            });
        }
        let path = self.path_for(index);
        let bytes = std::fs::read(&path).map_err(|source| FrameError::Io {
            index,
            path: path.clone(),
            source,
        })?;
        let img = image::load_from_memory(&bytes)
            .map_err(|source| FrameError::Decode {
                index,
                path,
                source,
            })?;
        Ok(img.to_rgba8())
    }
}

/// Count `<prefix>NNN.*` files directly inside `dir`.
pub fn discover_frame_count(dir: &Path, prefix: &str) -> usize {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_string_lossy();
            name.strip_prefix(prefix)
                .and_then(|rest| rest.split('.').next())
                .is_some_and(|digits| {
                    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
                })
        })
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(v: u8) -> RgbaImage {
        RgbaImage::from_pixel(2, 2, image::Rgba([v, v, v, 255]))
    }

    fn missing(index: usize) -> FrameError {
        FrameError::OutOfRange { index, count: 0 }
    }

    #[test]
    fn batches_are_sequential_and_cover_every_index_once() {
        let mut store = FrameStore::new(12);
        assert_eq!(store.next_batch(5), vec![0, 1, 2, 3, 4]);
        assert_eq!(store.next_batch(5), vec![5, 6, 7, 8, 9]);
        assert!(!store.all_requested());
        assert_eq!(store.next_batch(5), vec![10, 11]);
        assert!(store.all_requested());
        assert!(store.next_batch(5).is_empty());
    }

    #[test]
    fn request_is_idempotent_while_pending() {
        let mut store = FrameStore::new(3);
        assert!(store.request(1));
        assert!(!store.request(1));
        assert!(!store.request(99));
        assert!(!store.is_ready(1));
        assert!(store.get(1).is_none());
    }

    #[test]
    fn first_frame_ready_fires_only_for_index_zero() {
        let mut store = FrameStore::new(3);
        store.next_batch(3);
        assert!(store.complete(1, Ok(pixel(1))).is_empty());
        assert_eq!(store.complete(0, Ok(pixel(0))), vec![FrameEvent::FirstFrameReady]);
        assert!(store.is_ready(0));
    }

    #[test]
    fn failed_frame_stays_absent_and_is_never_requested_again() {
        let mut store = FrameStore::new(2);
        store.next_batch(2);
        store.complete(1, Err(missing(1)));
        assert!(!store.is_ready(1));
        assert!(!store.request(1));
        let events = store.complete(0, Ok(pixel(0)));
        assert_eq!(events, vec![FrameEvent::FirstFrameReady, FrameEvent::AllSettled]);
        assert_eq!(store.ready_count(), 1);
    }

    #[test]
    fn ready_frames_are_immutable() {
        let mut store = FrameStore::new(1);
        store.next_batch(1);
        store.complete(0, Ok(pixel(10)));
        assert!(store.complete(0, Ok(pixel(200))).is_empty());
        assert_eq!(store.get(0).unwrap().get_pixel(0, 0)[0], 10);
    }

    #[test]
    fn canvas_skips_redundant_and_absent_draws() {
        let mut store = FrameStore::new(3);
        store.next_batch(3);
        store.complete(0, Ok(pixel(0)));
        store.complete(2, Ok(pixel(2)));

        let mut canvas = FrameCanvas::default();
        assert!(canvas.draw(0, &store));
        assert!(!canvas.draw(0, &store));
        // Frame 1 never arrived: the previous frame stays on screen.
        assert!(!canvas.draw(1, &store));
        assert_eq!(canvas.last_drawn(), Some(0));
        assert!(canvas.draw(2, &store));

        canvas.invalidate();
        assert!(canvas.draw(2, &store));
    }

    #[test]
    fn dir_source_reads_numbered_files() {
        let dir = tempfile::tempdir().unwrap();
        pixel(77).save(dir.path().join("f-001.png")).unwrap();
        std::fs::write(dir.path().join("f-002.png"), b"not a png").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let source = DirFrameSource::new(dir.path(), "f-", 3);
        assert_eq!(source.load(0).unwrap().get_pixel(1, 1)[0], 77);
        assert!(matches!(source.load(1), Err(FrameError::Decode { .. })));
        assert!(matches!(source.load(2), Err(FrameError::Io { .. })));
        assert!(matches!(source.load(3), Err(FrameError::OutOfRange { .. })));

        assert_eq!(discover_frame_count(dir.path(), "f-"), 2);
    }
}
