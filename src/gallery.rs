use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use log::info;

/// Command surface of the externally-owned rotating gallery. Commands are
/// fire-and-forget: the widget owns whether it is actually rotating, and the
/// controller never reads that state back.
pub trait Gallery {
    fn start_rotation(&mut self);
    fn stop_rotation(&mut self);
}

/// Gallery stand-in that only logs the commands it receives.
#[derive(Debug, Default)]
pub struct LogGallery;

impl Gallery for LogGallery {
    fn start_rotation(&mut self) {
        info!("gallery: start continuous rotation");
    }

    fn stop_rotation(&mut self) {
        info!("gallery: stop rotation");
    }
}

/// Counts the commands it receives through shared handles, so a test (or the
/// headless summary) can observe them after the controller takes ownership.
#[derive(Debug, Default)]
pub struct RecordingGallery {
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl RecordingGallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared (start, stop) counters that outlive the gallery itself.
    pub fn counters(&self) -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (Arc::clone(&self.starts), Arc::clone(&self.stops))
    }
}

impl Gallery for RecordingGallery {
    fn start_rotation(&mut self) {
        self.starts.fetch_add(1, Ordering::SeqCst);
    }

    fn stop_rotation(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_gallery_counts_commands() {
        let mut gallery = RecordingGallery::new();
        let (starts, stops) = gallery.counters();
        gallery.start_rotation();
        gallery.start_rotation();
        gallery.stop_rotation();
        assert_eq!(starts.load(Ordering::SeqCst), 2);
        assert_eq!(stops.load(Ordering::SeqCst), 1);
    }
}
