//! The long-lived engine session.
//!
//! `BossTracker` owns every piece of mutable engine state: catalog and index,
//! snapshot cache, the previously emitted list, and the watch state. Only the
//! watch loop and operator commands reach it, through one `Arc<Mutex<_>>`, so
//! passes never overlap.

use crate::boss::{Boss, is_user_authored_id, placeholder_bosses};
use crate::catalog::{Catalog, CatalogEntry, CatalogIndex, ReservedZones, UpsertOutcome};
use crate::converter::SaveConverter;
use crate::diff::newly_killed;
use crate::error::{CatalogError, OverrideError};
use crate::overrides::{ManualOverride, OverrideStore, merge};
use crate::reconcile::reconcile;
use crate::snapshot_cache::{SnapshotCache, modified_at};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WatchState {
    #[default]
    Idle,
    Watching,
    Reconciling,
    Emitting,
    Stopped,
}

/// What triggered a reconciliation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassKind {
    /// First pass after a watch starts
    Initial,
    /// File change notification
    Change,
    /// Operator request; never reports kills
    Refresh,
}

/// One emission to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerUpdate {
    pub kind: PassKind,
    pub bosses: Vec<Boss>,
    /// Only on change passes, and only when non-empty
    pub newly_killed: Option<Vec<Boss>>,
    /// Newly killed bosses still missing catalog info
    pub unknown: Option<Vec<Boss>>,
}

#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub catalog_path: PathBuf,
    pub overrides_dir: PathBuf,
    pub reserved_zones: ReservedZones,
    pub allow_manual_edit_auto_detected: bool,
    pub allow_boss_editing: bool,
}

pub struct BossTracker<C> {
    converter: C,
    settings: TrackerSettings,
    catalog: Catalog,
    index: CatalogIndex,
    cache: SnapshotCache,
    overrides: OverrideStore,
    save_path: Option<PathBuf>,
    previous: Vec<Boss>,
    state: WatchState,
}

impl<C: SaveConverter> BossTracker<C> {
    /// Load the catalog from `settings.catalog_path`, empty if unavailable.
    pub fn new(converter: C, settings: TrackerSettings) -> Self {
        let catalog = Catalog::load_or_empty(&settings.catalog_path);
        Self::with_catalog(converter, settings, catalog)
    }

    pub fn with_catalog(converter: C, settings: TrackerSettings, catalog: Catalog) -> Self {
        let index = CatalogIndex::with_reserved_zones(&catalog, settings.reserved_zones.clone());
        let overrides = OverrideStore::new(&settings.overrides_dir);
        Self {
            converter,
            settings,
            catalog,
            index,
            cache: SnapshotCache::new(),
            overrides,
            save_path: None,
            previous: Vec::new(),
            state: WatchState::Idle,
        }
    }

    /// Point the tracker at a new save, dropping state tied to the old one.
    pub fn begin_watch(&mut self, save_path: PathBuf) {
        if let Some(old) = &self.save_path
            && old != &save_path
        {
            tracing::info!(old = %old.display(), new = %save_path.display(), "Replacing watched save");
        }
        self.save_path = Some(save_path);
        self.previous.clear();
        self.state = WatchState::Watching;
    }

    pub fn stop(&mut self) {
        self.state = WatchState::Stopped;
    }

    /// A watch has begun and not been stopped.
    pub fn is_watching(&self) -> bool {
        !matches!(self.state, WatchState::Idle | WatchState::Stopped)
    }

    /// Cached list for the save, converting and reconciling on a miss.
    ///
    /// Converter failures yield the placeholder list, cached until the file
    /// changes or a refresh pass runs.
    pub async fn snapshot(&mut self, save_path: &Path) -> Vec<Boss> {
        let modified = match modified_at(save_path) {
            Ok(modified) => modified,
            Err(e) => {
                tracing::warn!(path = %save_path.display(), error = %e, "Cannot stat save file, using placeholder list");
                return placeholder_bosses();
            }
        };

        if let Some(cached) = self.cache.get_at(save_path, modified) {
            tracing::debug!(path = %save_path.display(), "Using cached boss list (file unchanged)");
            return cached.to_vec();
        }

        match self.converter.convert(save_path).await {
            Ok(tree) => {
                let bosses = reconcile(&tree, &self.index);
                self.cache.put(save_path, modified, bosses.clone());
                bosses
            }
            Err(e) => {
                tracing::warn!(error = %e, "Save conversion failed, using placeholder list");
                let bosses = placeholder_bosses();
                self.cache.put_fallback(save_path, modified, bosses.clone());
                bosses
            }
        }
    }

    /// Run one reconcile, merge and (for change passes) diff cycle.
    ///
    /// Leaves the tracker in `Emitting`; call [`BossTracker::finish_emit`]
    /// once the update is delivered. Returns `None` when no watch is active,
    /// including after [`BossTracker::stop`].
    pub async fn run_pass(&mut self, kind: PassKind) -> Option<TrackerUpdate> {
        if !self.is_watching() {
            return None;
        }
        let save_path = self.save_path.clone()?;
        self.state = WatchState::Reconciling;
        if kind == PassKind::Refresh && self.cache.holds_fallback() {
            self.cache.invalidate();
        }

        let reconciled = self.snapshot(&save_path).await;
        let overrides = self.overrides.load(&save_path);
        let bosses = merge(reconciled, &overrides);

        let (newly_killed, unknown) = match kind {
            PassKind::Change => {
                let killed = newly_killed(&self.previous, &bosses);
                let unknown: Vec<Boss> = killed.iter().filter(|b| b.needs_info()).cloned().collect();
                (non_empty(killed), non_empty(unknown))
            }
            PassKind::Initial | PassKind::Refresh => (None, None),
        };

        tracing::info!(
            ?kind,
            bosses = bosses.len(),
            newly_killed = newly_killed.as_ref().map_or(0, Vec::len),
            "Reconciliation pass complete"
        );

        self.previous = bosses.clone();
        self.state = WatchState::Emitting;
        Some(TrackerUpdate {
            kind,
            bosses,
            newly_killed,
            unknown,
        })
    }

    pub fn finish_emit(&mut self) {
        if self.state == WatchState::Emitting {
            self.state = WatchState::Watching;
        }
    }

    /// Add or update a catalog entry, then persist it, rebuild the index and drop the cache.
    ///
    /// Callers should follow with a refresh pass.
    pub fn upsert_catalog_entry(&mut self, entry: CatalogEntry) -> Result<UpsertOutcome, CatalogError> {
        if !self.settings.allow_boss_editing
            && !is_user_authored_id(&entry.raw_identifier)
            && self.catalog.contains(&entry.raw_identifier)
        {
            return Err(CatalogError::EditingDisabled {
                raw_identifier: entry.raw_identifier,
            });
        }

        let display_name = entry.display_name.clone();
        let zone = entry.zone.clone();
        let mut updated = self.catalog.clone();
        let outcome = updated.upsert(entry);
        updated.store(&self.settings.catalog_path)?;

        self.catalog = updated;
        self.index =
            CatalogIndex::with_reserved_zones(&self.catalog, self.settings.reserved_zones.clone());
        self.cache.invalidate();

        tracing::info!(name = %display_name, zone = %zone, ?outcome, "Boss added/updated");
        Ok(outcome)
    }

    /// Persist a manual killed state for the watched save.
    pub fn set_manual_state(&mut self, raw_identifier: &str, killed: bool) -> Result<(), OverrideError> {
        let save_path = self.save_path.as_deref().ok_or(OverrideError::NoActiveSave)?;
        if !is_user_authored_id(raw_identifier) && !self.settings.allow_manual_edit_auto_detected {
            return Err(OverrideError::EditingDisabled {
                raw_identifier: raw_identifier.to_string(),
            });
        }

        let manual = ManualOverride::for_identifier(raw_identifier, killed, Some(true));
        self.overrides.set(save_path, raw_identifier, manual)
    }

    /// Delete every manual override for the watched save.
    pub fn clear_manual_states(&mut self) -> Result<bool, OverrideError> {
        let save_path = self.save_path.as_deref().ok_or(OverrideError::NoActiveSave)?;
        self.overrides.clear(save_path)
    }

    pub fn set_manual_edit_allowed(&mut self, allowed: bool) {
        self.settings.allow_manual_edit_auto_detected = allowed;
    }

    pub fn set_boss_editing_allowed(&mut self, allowed: bool) {
        self.settings.allow_boss_editing = allowed;
    }

    /// Most recently emitted list
    pub fn bosses(&self) -> &[Boss] {
        &self.previous
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn save_path(&self) -> Option<&Path> {
        self.save_path.as_deref()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index(&self) -> &CatalogIndex {
        &self.index
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }
}

fn non_empty(bosses: Vec<Boss>) -> Option<Vec<Boss>> {
    (!bosses.is_empty()).then_some(bosses)
}
