pub mod app_state;
pub mod boss;
pub mod catalog;
pub mod commands;
pub mod converter;
pub mod diff;
pub mod error;
pub mod normalize;
pub mod overrides;
pub mod reconcile;
pub mod repl;
pub mod save_data;
pub mod snapshot_cache;
pub mod tracker;
pub mod watcher;

pub use boss::{Boss, ZoneSummary, group_by_zone};
pub use catalog::{Catalog, CatalogEntry, CatalogIndex, ReservedZones};
pub use converter::{SaveConverter, UesaveConverter};
pub use normalize::normalize;
pub use reconcile::reconcile;
pub use tracker::{BossTracker, PassKind, TrackerSettings, TrackerUpdate, WatchState};
