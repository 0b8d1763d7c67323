//! Background frame decoding to keep the UI loop responsive.
//!
//! Frames are requested in sequential batches.  Each frame decodes on the
//! blocking pool and reports back over a channel; the next batch only starts
//! once the previous one has settled and the pause has elapsed.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::RgbaImage;
use tokio::sync::mpsc;

use crate::core::frames::{FrameError, FrameEvent, FrameSource, FrameStore};

/// One decode result.
#[derive(Debug)]
pub struct FrameUpdate {
    pub index: usize,
    pub result: Result<RgbaImage, FrameError>,
}

pub fn spawn_frame_load(
    tx: mpsc::UnboundedSender<FrameUpdate>,
    source: Arc<dyn FrameSource>,
    index: usize,
) {
    tokio::task::spawn_blocking(move || {
        let result = source.load(index);
        let _ = tx.send(FrameUpdate { index, result });
    });
}

/// Paces batches of frame loads against a [`FrameStore`].
pub struct FrameLoader {
    source: Arc<dyn FrameSource>,
    tx: mpsc::UnboundedSender<FrameUpdate>,
    batch_size: usize,
    pause: Duration,
    in_flight: usize,
    resume_at: Instant,
}

impl FrameLoader {
    pub fn new(
        source: Arc<dyn FrameSource>,
        tx: mpsc::UnboundedSender<FrameUpdate>,
        batch_size: usize,
        pause: Duration,
        now: Instant,
    ) -> Self {
        Self {
            source,
            tx,
            batch_size: batch_size.max(1),
            pause,
            in_flight: 0,
            resume_at: now,
        }
    }

    /// Start the next batch if the last one settled and the pause is over.
    /// Returns how many loads were started.
    pub fn pump(&mut self, store: &mut FrameStore, now: Instant) -> usize {
        if self.in_flight > 0 || now < self.resume_at || store.all_requested() {
            return 0;
        }
        let batch = store.next_batch(self.batch_size);
        tracing::trace!(first = ?batch.first(), len = batch.len(), "frame batch");
        for &index in &batch {
            spawn_frame_load(self.tx.clone(), Arc::clone(&self.source), index);
        }
        self.in_flight = batch.len();
        batch.len()
    }

    /// Record a finished load.
    pub fn settle(
        &mut self,
        store: &mut FrameStore,
        update: FrameUpdate,
        now: Instant,
    ) -> Vec<FrameEvent> {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            self.resume_at = now + self.pause;
        }
        store.complete(update.index, update.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::frames::DirFrameSource;

    fn write_frames(dir: &std::path::Path, count: usize) {
        for i in 1..=count {
            let img = RgbaImage::from_pixel(4, 4, image::Rgba([i as u8 * 10, 0, 0, 255]));
            img.save(dir.join(format!("ezgif-frame-{i:03}.png"))).unwrap();
        }
    }

    async fn drain(
        loader: &mut FrameLoader,
        store: &mut FrameStore,
        rx: &mut mpsc::UnboundedReceiver<FrameUpdate>,
    ) -> (Vec<FrameEvent>, Vec<usize>) {
        let mut events = Vec::new();
        let mut batches = Vec::new();
        loop {
            let started = loader.pump(store, Instant::now());
            if started > 0 {
                batches.push(started);
            }
            let Some(update) = rx.recv().await else {
                break;
            };
            events.extend(loader.settle(store, update, Instant::now()));
            if events.contains(&FrameEvent::AllSettled) {
                break;
            }
        }
        (events, batches)
    }

    #[tokio::test]
    async fn loads_every_frame_in_batches() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 5);
        let source: Arc<dyn FrameSource> =
            Arc::new(DirFrameSource::new(dir.path(), "ezgif-frame-", 5));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = FrameStore::new(5);
        let mut loader = FrameLoader::new(source, tx, 2, Duration::ZERO, Instant::now());

        let (events, batches) = drain(&mut loader, &mut store, &mut rx).await;

        assert_eq!(batches, vec![2, 2, 1]);
        assert_eq!(store.ready_count(), 5);
        assert!(events.contains(&FrameEvent::FirstFrameReady));
        assert_eq!(store.get(2).unwrap().get_pixel(0, 0)[0], 30);
        assert_eq!(loader.pump(&mut store, Instant::now()), 0);
    }

    #[tokio::test]
    async fn missing_frames_settle_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        write_frames(dir.path(), 2);
        let source: Arc<dyn FrameSource> =
            Arc::new(DirFrameSource::new(dir.path(), "ezgif-frame-", 4));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut store = FrameStore::new(4);
        let mut loader = FrameLoader::new(source, tx, 5, Duration::ZERO, Instant::now());

        let (events, _) = drain(&mut loader, &mut store, &mut rx).await;

        assert_eq!(events.last(), Some(&FrameEvent::AllSettled));
        assert_eq!(store.ready_count(), 2);
        assert!(store.get(3).is_none());
        assert_eq!(loader.pump(&mut store, Instant::now()), 0);
    }

    #[test]
    fn next_batch_waits_for_the_pause() {
        let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let _guard = rt.enter();
        let source: Arc<dyn FrameSource> = Arc::new(DirFrameSource::new("/nonexistent", "f", 4));
        let (tx, _rx) = mpsc::unbounded_channel();
        let mut store = FrameStore::new(4);
        let t0 = Instant::now();
        let mut loader = FrameLoader::new(source, tx, 2, Duration::from_millis(150), t0);

        assert_eq!(loader.pump(&mut store, t0), 2);
        assert_eq!(loader.pump(&mut store, t0), 0);
        for index in 0..2 {
            let result = Err(FrameError::OutOfRange { index, count: 0 });
            loader.settle(&mut store, FrameUpdate { index, result }, t0);
        }
        assert_eq!(loader.pump(&mut store, t0 + Duration::from_millis(100)), 0);
        assert_eq!(loader.pump(&mut store, t0 + Duration::from_millis(150)), 2);
    }
}
