//! Reference catalog: zone-ordered boss metadata and its lookup index.
//!
//! On disk the catalog is a JSON object mapping zone name to an ordered array
//! of `{originalName, displayName, category}` records. Key order is display
//! order, so it is preserved through load, upsert and store.

use crate::error::CatalogError;
use crate::normalize::normalize;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::Path;

/// One record as stored under a zone key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogRecord {
    #[serde(rename = "originalName", alias = "rawIdentifier")]
    pub raw_identifier: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogZone {
    pub name: String,
    pub records: Vec<CatalogRecord>,
}

/// A catalog record with its zone attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub raw_identifier: String,
    pub display_name: String,
    pub category: String,
    pub zone: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Added,
    Updated,
    /// Entry existed under another zone and was moved
    Moved,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    zones: Vec<CatalogZone>,
}

impl Catalog {
    pub fn new(zones: Vec<CatalogZone>) -> Self {
        Self { zones }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let raw: Map<String, Value> = serde_json::from_str(json)?;
        let mut zones = Vec::with_capacity(raw.len());
        for (name, records) in raw {
            let records: Vec<CatalogRecord> = serde_json::from_value(records)?;
            zones.push(CatalogZone { name, records });
        }
        Ok(Self { zones })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut raw = Map::with_capacity(self.zones.len());
        for zone in &self.zones {
            raw.insert(zone.name.clone(), serde_json::to_value(&zone.records)?);
        }
        serde_json::to_string_pretty(&raw)
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&contents).map_err(|source| CatalogError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the catalog, degrading to an empty one if it is missing or malformed.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(catalog) => {
                tracing::info!(
                    path = %path.display(),
                    entries = catalog.len(),
                    "Loaded boss catalog"
                );
                catalog
            }
            Err(e) => {
                tracing::warn!(error = %e, "Catalog unavailable, continuing with an empty catalog");
                Self::default()
            }
        }
    }

    /// Write the catalog through a temp file in the same directory, then rename over `path`.
    pub fn store(&self, path: &Path) -> Result<(), CatalogError> {
        let json = self.to_json().map_err(CatalogError::Serialize)?;
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let write_err = |source| CatalogError::Write {
            path: path.to_path_buf(),
            source,
        };

        fs::create_dir_all(dir).map_err(write_err)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(json.as_bytes()).map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    /// Add or update an entry. An entry found under a different zone is moved.
    pub fn upsert(&mut self, entry: CatalogEntry) -> UpsertOutcome {
        let record = CatalogRecord {
            raw_identifier: entry.raw_identifier,
            display_name: entry.display_name,
            category: entry.category,
        };

        if let Some(zone) = self.zones.iter_mut().find(|z| z.name == entry.zone)
            && let Some(existing) = zone
                .records
                .iter_mut()
                .find(|r| r.raw_identifier == record.raw_identifier)
        {
            *existing = record;
            return UpsertOutcome::Updated;
        }

        let mut moved = false;
        for zone in self.zones.iter_mut().filter(|z| z.name != entry.zone) {
            let before = zone.records.len();
            zone.records
                .retain(|r| r.raw_identifier != record.raw_identifier);
            moved |= zone.records.len() != before;
        }

        match self.zones.iter_mut().find(|z| z.name == entry.zone) {
            Some(zone) => zone.records.push(record),
            None => self.zones.push(CatalogZone {
                name: entry.zone,
                records: vec![record],
            }),
        }

        if moved {
            UpsertOutcome::Moved
        } else {
            UpsertOutcome::Added
        }
    }

    pub fn contains(&self, raw_identifier: &str) -> bool {
        self.zones
            .iter()
            .flat_map(|z| z.records.iter())
            .any(|r| r.raw_identifier == raw_identifier)
    }

    pub fn zones(&self) -> &[CatalogZone] {
        &self.zones
    }

    /// Zone-then-insertion order, flattened
    pub fn entries(&self) -> impl Iterator<Item = CatalogEntry> + '_ {
        self.zones.iter().flat_map(|zone| {
            zone.records.iter().map(|r| CatalogEntry {
                raw_identifier: r.raw_identifier.clone(),
                display_name: r.display_name.clone(),
                category: r.category.clone(),
                zone: zone.name.clone(),
            })
        })
    }

    pub fn len(&self) -> usize {
        self.zones.iter().map(|z| z.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Zone names with special meaning to reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservedZones {
    /// Never shown, even when present in the save
    pub hidden: String,
    pub no_zone: String,
    pub undefined: String,
}

impl Default for ReservedZones {
    fn default() -> Self {
        Self {
            hidden: "Hidden".to_string(),
            no_zone: "Sans zone".to_string(),
            undefined: "❓ À définir".to_string(),
        }
    }
}

impl ReservedZones {
    pub fn is_hidden(&self, zone: &str) -> bool {
        zone == self.hidden
    }

    /// Zones whose unmatched entries are not listed as placeholders
    pub fn is_placeholder(&self, zone: &str) -> bool {
        zone == self.hidden || zone == self.no_zone || zone == self.undefined
    }
}

/// Read-only lookup structure over a catalog.
///
/// Rebuilt wholesale whenever the catalog changes. On identifier collisions
/// (exact or normalized) the first entry in catalog order wins.
#[derive(Debug, Clone, Default)]
pub struct CatalogIndex {
    entries: Vec<CatalogEntry>,
    by_exact: HashMap<String, usize>,
    by_normalized: HashMap<String, usize>,
    reserved: ReservedZones,
}

impl CatalogIndex {
    pub fn build(catalog: &Catalog) -> Self {
        Self::with_reserved_zones(catalog, ReservedZones::default())
    }

    pub fn with_reserved_zones(catalog: &Catalog, reserved: ReservedZones) -> Self {
        let entries: Vec<CatalogEntry> = catalog.entries().collect();
        let mut by_exact = HashMap::with_capacity(entries.len());
        let mut by_normalized = HashMap::with_capacity(entries.len());

        for (idx, entry) in entries.iter().enumerate() {
            by_exact.entry(entry.raw_identifier.clone()).or_insert(idx);
            let normalized = normalize(&entry.raw_identifier);
            if let Some(&first) = by_normalized.get(&normalized) {
                let first: &CatalogEntry = &entries[first];
                if first.raw_identifier != entry.raw_identifier {
                    tracing::debug!(
                        kept = %first.raw_identifier,
                        ignored = %entry.raw_identifier,
                        "Normalized catalog identifier collision"
                    );
                }
            } else {
                by_normalized.insert(normalized, idx);
            }
        }

        Self {
            entries,
            by_exact,
            by_normalized,
            reserved,
        }
    }

    pub fn by_exact(&self, raw_identifier: &str) -> Option<&CatalogEntry> {
        self.by_exact.get(raw_identifier).map(|&i| &self.entries[i])
    }

    pub fn by_normalized(&self, normalized: &str) -> Option<&CatalogEntry> {
        self.by_normalized.get(normalized).map(|&i| &self.entries[i])
    }

    pub fn ordered_entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn reserved_zones(&self) -> &ReservedZones {
        &self.reserved
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
