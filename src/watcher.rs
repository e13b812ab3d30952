use crate::converter::SaveConverter;
use crate::error::WatcherError;
use crate::tracker::{BossTracker, PassKind, TrackerUpdate};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{self, Receiver, Sender};
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;

pub type TrackerHandle<C> = Arc<Mutex<BossTracker<C>>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveEvent {
    /// Save was written or replaced
    Changed,
    Removed,
    Error(String),
}

/// Watches a single save file.
///
/// The parent directory is watched so saves written by rename are seen too;
/// events for other files are dropped.
pub struct SaveFileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<notify::Result<Event>>,
    file_name: OsString,
}

impl SaveFileWatcher {
    pub fn new(save_path: &Path) -> Result<Self, WatcherError> {
        let missing_parent = || WatcherError::MissingParent {
            path: save_path.to_path_buf(),
        };
        let file_name = save_path.file_name().ok_or_else(missing_parent)?.to_os_string();
        let dir = match save_path.parent() {
            Some(dir) if dir.as_os_str().is_empty() => Path::new("."),
            Some(dir) => dir,
            None => return Err(missing_parent()),
        };

        let (tx, rx) = mpsc::channel(100);
        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.blocking_send(res);
            },
            Config::default(),
        )
        .map_err(WatcherError::InitWatcher)?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|source| WatcherError::WatchPath {
                path: dir.to_path_buf(),
                source,
            })?;

        Ok(Self {
            _watcher: watcher,
            rx,
            file_name,
        })
    }

    pub async fn next_event(&mut self) -> Option<SaveEvent> {
        while let Some(event_result) = self.rx.recv().await {
            match event_result {
                Ok(event) => {
                    if let Some(save_event) = self.process_event(event) {
                        return Some(save_event);
                    }
                }
                Err(e) => return Some(SaveEvent::Error(format!("Save watcher error: {e}"))),
            }
        }
        None
    }

    fn process_event(&self, event: Event) -> Option<SaveEvent> {
        if !event.paths.iter().any(|p| self.is_target(p)) {
            return None;
        }
        match event.kind {
            EventKind::Create(_) | EventKind::Modify(_) => Some(SaveEvent::Changed),
            EventKind::Remove(_) => Some(SaveEvent::Removed),
            _ => None,
        }
    }

    fn is_target(&self, path: &Path) -> bool {
        path.file_name() == Some(self.file_name.as_os_str())
    }
}

/// A running watch loop. Dropping it also ends the loop, without waiting for it.
pub struct WatchHandle {
    save_path: PathBuf,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl WatchHandle {
    pub fn save_path(&self) -> &Path {
        &self.save_path
    }

    /// Stop after the in-flight pass, if any, completes.
    pub async fn stop(self) {
        let _ = self.shutdown.send(());
        let _ = self.task.await;
    }
}

/// Start watching `save_path`: emit one initial pass, then one pass per change.
///
/// Change events are handled strictly one after another; a pass always runs
/// to completion before the next event or a shutdown is looked at.
pub async fn start_watch<C>(
    tracker: TrackerHandle<C>,
    save_path: PathBuf,
    updates: Sender<TrackerUpdate>,
) -> Result<WatchHandle, WatcherError>
where
    C: SaveConverter + 'static,
{
    let mut watcher = SaveFileWatcher::new(&save_path)?;
    tracing::info!(path = %save_path.display(), "Watching save file");

    {
        let mut t = tracker.lock().await;
        t.begin_watch(save_path.clone());
        emit_pass(&mut t, PassKind::Initial, &updates).await;
    }

    let (shutdown, mut shutdown_rx) = oneshot::channel();
    let loop_tracker = Arc::clone(&tracker);
    let task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                event = watcher.next_event() => {
                    match event {
                        Some(SaveEvent::Changed) => {
                            let mut t = loop_tracker.lock().await;
                            if !emit_pass(&mut t, PassKind::Change, &updates).await {
                                break;
                            }
                        }
                        Some(SaveEvent::Removed) => {
                            tracing::warn!("Watched save file was removed");
                        }
                        Some(SaveEvent::Error(e)) => tracing::warn!("{e}"),
                        None => break,
                    }
                }
            }
        }
        loop_tracker.lock().await.stop();
        tracing::debug!("Save watch loop stopped");
    });

    Ok(WatchHandle {
        save_path,
        shutdown,
        task,
    })
}

/// Re-run reconciliation without kill detection. Returns false if no watch is active.
pub async fn refresh<C: SaveConverter>(
    tracker: &TrackerHandle<C>,
    updates: &Sender<TrackerUpdate>,
) -> bool {
    let mut t = tracker.lock().await;
    if !t.is_watching() {
        return false;
    }
    tracing::info!("Manual refresh triggered");
    emit_pass(&mut t, PassKind::Refresh, updates).await
}

/// Returns false once the update receiver is gone.
async fn emit_pass<C: SaveConverter>(
    tracker: &mut BossTracker<C>,
    kind: PassKind,
    updates: &Sender<TrackerUpdate>,
) -> bool {
    let Some(update) = tracker.run_pass(kind).await else {
        return true;
    };
    let delivered = updates.send(update).await.is_ok();
    tracker.finish_emit();
    delivered
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> Event {
        Event::new(kind).add_path(PathBuf::from(path))
    }

    #[tokio::test]
    async fn filters_events_to_the_save() {
        let dir = tempfile::tempdir().unwrap();
        let save = dir.path().join("EXPEDITION_0.sav");
        let watcher = SaveFileWatcher::new(&save).unwrap();

        let target = save.to_string_lossy().to_string();
        let other = dir.path().join("EXPEDITION_1.sav").to_string_lossy().to_string();

        assert_eq!(
            watcher.process_event(event(EventKind::Modify(ModifyKind::Any), &target)),
            Some(SaveEvent::Changed)
        );
        assert_eq!(
            watcher.process_event(event(EventKind::Create(CreateKind::File), &target)),
            Some(SaveEvent::Changed)
        );
        assert_eq!(
            watcher.process_event(event(EventKind::Remove(RemoveKind::File), &target)),
            Some(SaveEvent::Removed)
        );
        assert_eq!(
            watcher.process_event(event(EventKind::Modify(ModifyKind::Any), &other)),
            None
        );
    }

    #[test]
    fn rejects_paths_without_file_name() {
        assert!(matches!(
            SaveFileWatcher::new(Path::new("/")),
            Err(WatcherError::MissingParent { .. })
        ));
    }
}
