//! Per-save manual corrections to killed / encountered state.
//!
//! One JSON file per save, named after the save's base name, mapping raw (or
//! normalized) identifiers to `{killed, encountered?}`.

use crate::boss::{Boss, is_user_authored_id};
use crate::error::OverrideError;
use crate::normalize::normalize;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// A manual correction for one boss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualOverride {
    /// Correction of a catalog or save sourced boss
    Tracked { killed: bool, encountered: Option<bool> },
    /// Boss created by the user; always encountered
    UserAuthored { killed: bool },
}

impl ManualOverride {
    /// Pick the variant from the identifier's prefix.
    pub fn for_identifier(raw_identifier: &str, killed: bool, encountered: Option<bool>) -> Self {
        if is_user_authored_id(raw_identifier) {
            Self::UserAuthored { killed }
        } else {
            Self::Tracked {
                killed,
                encountered,
            }
        }
    }

    pub fn killed(&self) -> bool {
        match *self {
            Self::Tracked { killed, .. } | Self::UserAuthored { killed } => killed,
        }
    }

    pub fn encountered(&self) -> Option<bool> {
        match *self {
            Self::Tracked { encountered, .. } => encountered,
            Self::UserAuthored { .. } => Some(true),
        }
    }

    fn from_stored(raw_identifier: &str, stored: StoredOverride) -> Self {
        Self::for_identifier(raw_identifier, stored.killed, stored.encountered)
    }

    fn to_stored(self) -> StoredOverride {
        match self {
            Self::Tracked {
                killed,
                encountered,
            } => StoredOverride {
                killed,
                encountered,
            },
            Self::UserAuthored { killed } => StoredOverride {
                killed,
                encountered: None,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredOverride {
    killed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    encountered: Option<bool>,
}

pub type OverrideMap = BTreeMap<String, ManualOverride>;

/// Apply overrides to a reconciled list.
///
/// Lookup is by exact identifier, then by normalized identifier.
pub fn merge(bosses: Vec<Boss>, overrides: &OverrideMap) -> Vec<Boss> {
    if overrides.is_empty() {
        return bosses;
    }

    bosses
        .into_iter()
        .map(|mut boss| {
            let found = boss.raw_identifier.as_deref().and_then(|id| {
                overrides
                    .get(id)
                    .or_else(|| overrides.get(&normalize(id)))
            });
            if let Some(manual) = found {
                boss.killed = manual.killed();
                boss.encountered = manual.encountered().unwrap_or(boss.encountered);
            }
            boss
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct OverrideStore {
    dir: PathBuf,
}

impl OverrideStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<dir>/<save base name without .sav>.json`
    pub fn path_for(&self, save_path: &Path) -> PathBuf {
        let name = save_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = name.strip_suffix(".sav").unwrap_or(&name);
        self.dir.join(format!("{stem}.json"))
    }

    /// Missing file reads as an empty map.
    pub fn try_load(&self, save_path: &Path) -> Result<OverrideMap, OverrideError> {
        let path = self.path_for(save_path);
        if !path.exists() {
            return Ok(OverrideMap::new());
        }

        let contents = fs::read_to_string(&path).map_err(|source| OverrideError::Read {
            path: path.clone(),
            source,
        })?;
        let stored: BTreeMap<String, StoredOverride> = serde_json::from_str(&contents)
            .map_err(|source| OverrideError::Parse {
                path: path.clone(),
                source,
            })?;

        Ok(stored
            .into_iter()
            .map(|(id, s)| {
                let manual = ManualOverride::from_stored(&id, s);
                (id, manual)
            })
            .collect())
    }

    /// Like [`OverrideStore::try_load`], degrading to an empty map on failure.
    pub fn load(&self, save_path: &Path) -> OverrideMap {
        self.try_load(save_path).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not load manual overrides");
            OverrideMap::new()
        })
    }

    pub fn save(&self, save_path: &Path, overrides: &OverrideMap) -> Result<(), OverrideError> {
        fs::create_dir_all(&self.dir).map_err(|source| OverrideError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let stored: BTreeMap<&str, StoredOverride> = overrides
            .iter()
            .map(|(id, manual)| (id.as_str(), manual.to_stored()))
            .collect();
        let json = serde_json::to_string_pretty(&stored).map_err(OverrideError::Serialize)?;

        let path = self.path_for(save_path);
        let write_err = |source| OverrideError::Write {
            path: path.clone(),
            source,
        };
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.persist(&path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    /// Record one override, keeping the others.
    pub fn set(
        &self,
        save_path: &Path,
        raw_identifier: &str,
        manual: ManualOverride,
    ) -> Result<(), OverrideError> {
        let mut overrides = self.try_load(save_path)?;
        overrides.insert(raw_identifier.to_string(), manual);
        self.save(save_path, &overrides)
    }

    /// Delete the save's override file. Returns whether one existed.
    pub fn clear(&self, save_path: &Path) -> Result<bool, OverrideError> {
        let path = self.path_for(save_path);
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "Manual overrides cleared");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(OverrideError::Remove { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boss(id: &str, killed: bool, encountered: bool) -> Boss {
        Boss {
            name: id.to_string(),
            killed,
            encountered,
            raw_identifier: Some(id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn override_sets_killed_and_keeps_encountered() {
        let mut overrides = OverrideMap::new();
        overrides.insert("X".into(), ManualOverride::for_identifier("X", true, None));

        let merged = merge(vec![boss("X", false, true), boss("Y", false, false)], &overrides);
        assert!(merged[0].killed);
        assert!(merged[0].encountered);
        assert!(!merged[1].killed);
    }

    #[test]
    fn override_replaces_both_fields() {
        let mut overrides = OverrideMap::new();
        overrides.insert("X".into(), ManualOverride::for_identifier("X", false, Some(false)));

        let merged = merge(vec![boss("X", true, true)], &overrides);
        assert!(!merged[0].killed);
        assert!(!merged[0].encountered);
    }

    #[test]
    fn user_authored_bosses_are_encountered() {
        let mut overrides = OverrideMap::new();
        let manual = ManualOverride::for_identifier("MANUAL_42", true, Some(false));
        assert_eq!(manual, ManualOverride::UserAuthored { killed: true });
        overrides.insert("MANUAL_42".into(), manual);

        let merged = merge(vec![boss("MANUAL_42", false, false)], &overrides);
        assert!(merged[0].killed);
        assert!(merged[0].encountered);
    }

    #[test]
    fn normalized_key_covers_hash_variants() {
        let mut overrides = OverrideMap::new();
        overrides.insert("E_1".into(), ManualOverride::for_identifier("E_1", true, None));

        let merged = merge(
            vec![boss("E_1_0123456789ABCDEF0123456789ABCDEF", false, true)],
            &overrides,
        );
        assert!(merged[0].killed);
    }

    #[test]
    fn bosses_without_identifier_are_untouched() {
        let mut overrides = OverrideMap::new();
        overrides.insert("".into(), ManualOverride::for_identifier("", true, None));
        let plain = Boss {
            name: "Boss Mime".into(),
            ..Default::default()
        };

        let merged = merge(vec![plain.clone()], &overrides);
        assert_eq!(merged[0], plain);
    }

    #[test]
    fn storage_is_per_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = OverrideStore::new(dir.path().join("manual-states"));

        assert_eq!(
            store.path_for(Path::new("/saves/EXPEDITION_0.sav")),
            dir.path().join("manual-states").join("EXPEDITION_0.json")
        );

        let a = Path::new("/saves/EXPEDITION_0.sav");
        let b = Path::new("/saves/EXPEDITION_1.sav");
        store
            .set(a, "X", ManualOverride::for_identifier("X", true, Some(true)))
            .unwrap();

        assert_eq!(store.load(a).len(), 1);
        assert!(store.load(b).is_empty());
    }

    #[test]
    fn user_authored_entries_store_only_killed() {
        let dir = tempfile::tempdir().unwrap();
        let store = OverrideStore::new(dir.path());
        let save = Path::new("EXPEDITION_0.sav");

        let mut overrides = OverrideMap::new();
        overrides.insert("MANUAL_1".into(), ManualOverride::UserAuthored { killed: true });
        overrides.insert(
            "X".into(),
            ManualOverride::Tracked {
                killed: false,
                encountered: Some(true),
            },
        );
        store.save(save, &overrides).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(store.path_for(save)).unwrap()).unwrap();
        assert_eq!(raw["MANUAL_1"], serde_json::json!({"killed": true}));
        assert_eq!(raw["X"], serde_json::json!({"killed": false, "encountered": true}));

        let loaded = store.load(save);
        assert_eq!(loaded["MANUAL_1"].encountered(), Some(true));
        assert_eq!(loaded, overrides);
    }

    #[test]
    fn save_replaces_file_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let store = OverrideStore::new(dir.path());
        let save = Path::new("EXPEDITION_0.sav");
        fs::write(store.path_for(save), "not json").unwrap();

        store
            .set(save, "X", ManualOverride::for_identifier("X", true, None))
            .unwrap_err();
        let mut overrides = OverrideMap::new();
        overrides.insert("X".into(), ManualOverride::for_identifier("X", true, None));
        store.save(save, &overrides).unwrap();

        assert_eq!(store.try_load(save).unwrap(), overrides);
        // only the override file remains; no temporary files are left behind
        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn malformed_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = OverrideStore::new(dir.path());
        let save = Path::new("EXPEDITION_0.sav");
        fs::write(store.path_for(save), "not json").unwrap();

        assert!(matches!(store.try_load(save), Err(OverrideError::Parse { .. })));
        assert!(store.load(save).is_empty());
    }

    #[test]
    fn clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = OverrideStore::new(dir.path());
        let save = Path::new("EXPEDITION_0.sav");

        assert!(!store.clear(save).unwrap());
        store
            .set(save, "X", ManualOverride::for_identifier("X", true, None))
            .unwrap();
        assert!(store.clear(save).unwrap());
        assert!(store.load(save).is_empty());
    }
}
