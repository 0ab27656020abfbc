use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::warn;

use inbox_common::snapshot::MetricsSnapshot;

/// Process-wide holder of the published metrics snapshot.
///
/// A snapshot is immutable once published; `publish` swaps the whole `Arc`,
/// so readers always observe either the previous complete snapshot or the
/// new one, never a mix. Empty until the first batch run's artifact is
/// loaded.
#[derive(Clone, Default)]
pub struct SnapshotPublisher {
    current: Arc<RwLock<Option<Arc<MetricsSnapshot>>>>,
}

impl SnapshotPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, snapshot: MetricsSnapshot) {
        let mut guard = self
            .current
            .write()
            .expect("metrics snapshot lock poisoned");
        *guard = Some(Arc::new(snapshot));
    }

    pub fn current(&self) -> Option<Arc<MetricsSnapshot>> {
        self.current
            .read()
            .expect("metrics snapshot lock poisoned")
            .clone()
    }

    /// Load and publish the batch job's metrics artifact. A missing or
    /// malformed file is logged and leaves the current snapshot (if any)
    /// serving reads.
    pub fn publish_from_file(&self, path: &Path) -> bool {
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!("metrics artifact {} not loaded: {}", path.display(), err);
                return false;
            }
        };

        match serde_json::from_slice::<MetricsSnapshot>(&raw) {
            Ok(snapshot) => {
                self.publish(snapshot);
                true
            }
            Err(err) => {
                warn!(
                    "metrics artifact {} is not a valid snapshot: {}",
                    path.display(),
                    err
                );
                false
            }
        }
    }
}
