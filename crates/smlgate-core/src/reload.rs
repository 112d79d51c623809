//! Live-reload protocol for the shared execution engine.
//!
//! The modification time of an external marker file is the sole freshness
//! signal: a build step touches `PM/<project>.timestamp` and the next
//! request notices the new mtime and rebuilds the engine from the manifest.
//! No IPC, no restart, no timer; a stale engine is repaired lazily on the
//! request path.
//!
//! Concurrency: the engine lives in an `RwLock`. Ordinary executions hold
//! the read lock, so they run concurrently with each other; a reload takes
//! the write lock and is therefore serialized against everything, including
//! in-flight executions. The stamp is re-checked under the write lock, so
//! N threads observing the same stale timestamp reload exactly once.

use std::fs;
use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard};
use std::time::SystemTime;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::manifest::Manifest;
use crate::paths::ProjectLayout;

/// The engine together with the marker timestamp it was loaded against.
#[derive(Debug)]
pub struct EngineSlot<E> {
    engine: E,
    stamp: Option<SystemTime>,
}

impl<E> EngineSlot<E> {
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Marker timestamp of the last successful reload, if any.
    pub fn stamp(&self) -> Option<SystemTime> {
        self.stamp
    }
}

/// Read guard over the engine slot. Holding one guarantees a fully loaded,
/// self-consistent engine for the duration of an execution.
pub type EngineGuard<'a, E> = RwLockReadGuard<'a, EngineSlot<E>>;

/// Owns the engine lifetime and decides when it must be rebuilt.
pub struct ReloadManager<E> {
    slot: RwLock<EngineSlot<E>>,
    manifest_path: PathBuf,
    marker_path: PathBuf,
}

impl<E: Engine> ReloadManager<E> {
    /// Wrap a fresh engine. Nothing is loaded until the first
    /// [`ensure_fresh`](Self::ensure_fresh) call.
    pub fn new(engine: E, layout: &ProjectLayout) -> Self {
        Self {
            slot: RwLock::new(EngineSlot {
                engine,
                stamp: None,
            }),
            manifest_path: layout.manifest_path(),
            marker_path: layout.marker_path(),
        }
    }

    /// Make sure the engine reflects the current manifest, reloading it if
    /// the marker timestamp changed since the last load.
    ///
    /// On success the returned read guard licenses artifact execution
    /// against an engine at least as fresh as the observed timestamp.
    /// Failure modes: [`Error::MissingMarker`] when the marker cannot be
    /// statted, [`Error::MissingManifest`] when the manifest cannot be
    /// opened — in the latter case the stamp is left stale so the next
    /// request retries the reload from scratch.
    pub fn ensure_fresh(&self) -> Result<EngineGuard<'_, E>> {
        let stamp = self.marker_time()?;

        // Cheap path, taken on the overwhelming majority of requests.
        {
            let slot = self.slot.read().map_err(|_| Error::LockPoisoned)?;
            if slot.stamp == Some(stamp) {
                return Ok(slot);
            }
        }

        {
            let mut slot = self.slot.write().map_err(|_| Error::LockPoisoned)?;
            // Another thread may have finished this reload while we were
            // waiting for the write lock.
            if slot.stamp != Some(stamp) {
                self.reload(&mut slot, stamp)?;
            }
        }

        self.slot.read().map_err(|_| Error::LockPoisoned)
    }

    /// Rebuild the engine from the manifest. Caller holds the write lock.
    fn reload(&self, slot: &mut EngineSlot<E>, stamp: SystemTime) -> Result<()> {
        // Clear before opening the manifest: if the manifest is missing the
        // engine stays empty and the stamp stays stale, so nothing can run
        // against half-forgotten code and the next request retries.
        slot.engine.clear();

        let manifest = Manifest::read(&self.manifest_path)?;
        for module in manifest.modules() {
            slot.engine.load_module(module)?;
        }
        slot.stamp = Some(stamp);

        tracing::info!(
            modules = manifest.len(),
            manifest = %self.manifest_path.display(),
            "(re)loaded execution engine"
        );
        Ok(())
    }

    fn marker_time(&self) -> Result<SystemTime> {
        fs::metadata(&self.marker_path)
            .and_then(|meta| meta.modified())
            .map_err(|_| Error::MissingMarker(self.marker_path.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingEngine;

    use std::fs;
    use std::sync::{Arc, Barrier};
    use std::thread;

    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        layout: ProjectLayout,
    }

    impl Fixture {
        fn new(manifest: Option<&str>, marker: bool) -> Self {
            let dir = TempDir::new().unwrap();
            let layout = ProjectLayout::new(dir.path(), "demo");
            fs::create_dir_all(layout.pm_dir()).unwrap();
            if let Some(contents) = manifest {
                fs::write(layout.manifest_path(), contents).unwrap();
            }
            if marker {
                fs::write(layout.marker_path(), "").unwrap();
            }
            Self { _dir: dir, layout }
        }

        fn touch_marker(&self) {
            // A fresh mtime, far enough from the original to register on
            // coarse filesystem clocks.
            let later = SystemTime::now() + std::time::Duration::from_secs(10);
            let file = fs::File::options()
                .write(true)
                .open(self.layout.marker_path())
                .unwrap();
            file.set_modified(later).unwrap();
        }
    }

    #[test]
    fn missing_marker_is_not_ready() {
        let fx = Fixture::new(Some("a.uo\n"), false);
        let manager = ReloadManager::new(RecordingEngine::new(), &fx.layout);

        let err = manager.ensure_fresh().unwrap_err();
        assert!(matches!(err, Error::MissingMarker(_)));
    }

    #[test]
    fn first_call_loads_manifest_in_order() {
        let fx = Fixture::new(Some("basis.uo\nlib.uo\napp.uo\n"), true);
        let engine = Arc::new(RecordingEngine::new());
        let manager = ReloadManager::new(engine.clone(), &fx.layout);

        let guard = manager.ensure_fresh().unwrap();
        assert!(guard.stamp().is_some());
        assert_eq!(engine.modules(), ["basis.uo", "lib.uo", "app.uo"]);
        assert_eq!(engine.clears(), 1);
    }

    #[test]
    fn unchanged_marker_skips_reload() {
        let fx = Fixture::new(Some("a.uo\n"), true);
        let engine = Arc::new(RecordingEngine::new());
        let manager = ReloadManager::new(engine.clone(), &fx.layout);

        manager.ensure_fresh().unwrap();
        manager.ensure_fresh().unwrap();

        assert_eq!(engine.clears(), 1);
        assert_eq!(engine.loads(), 1);
    }

    #[test]
    fn touched_marker_reloads_new_manifest_only() {
        let fx = Fixture::new(Some("old.uo\n"), true);
        let engine = Arc::new(RecordingEngine::new());
        let manager = ReloadManager::new(engine.clone(), &fx.layout);

        manager.ensure_fresh().unwrap();
        assert_eq!(engine.modules(), ["old.uo"]);

        fs::write(fx.layout.manifest_path(), "new.uo\n").unwrap();
        fx.touch_marker();

        manager.ensure_fresh().unwrap();
        assert_eq!(engine.modules(), ["new.uo"]);
        assert_eq!(engine.clears(), 2);
    }

    #[test]
    fn missing_manifest_leaves_stamp_stale_and_retries() {
        let fx = Fixture::new(None, true);
        let engine = Arc::new(RecordingEngine::new());
        let manager = ReloadManager::new(engine.clone(), &fx.layout);

        let err = manager.ensure_fresh().unwrap_err();
        assert!(matches!(err, Error::MissingManifest(_)));
        // The engine was cleared before the open failed.
        assert_eq!(engine.clears(), 1);

        // Once the manifest appears, the same marker time loads it.
        fs::write(fx.layout.manifest_path(), "a.uo\n").unwrap();
        let guard = manager.ensure_fresh().unwrap();
        assert!(guard.stamp().is_some());
        assert_eq!(engine.modules(), ["a.uo"]);
    }

    #[test]
    fn concurrent_stale_observers_reload_once() {
        let fx = Fixture::new(Some("a.uo\nb.uo\n"), true);
        let engine = Arc::new(RecordingEngine::new());
        let manager = Arc::new(ReloadManager::new(engine.clone(), &fx.layout));

        let threads = 8;
        let barrier = Arc::new(Barrier::new(threads));
        let handles: Vec<_> = (0..threads)
            .map(|_| {
                let manager = manager.clone();
                let barrier = barrier.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let guard = manager.ensure_fresh().unwrap();
                    guard.stamp().unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(engine.clears(), 1);
        assert_eq!(engine.loads(), 2);
        assert_eq!(engine.modules(), ["a.uo", "b.uo"]);
    }
}
