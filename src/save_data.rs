//! Structured save content as produced by the converter tool.
//!
//! Only the three enemy collections are read; everything else in the tree is
//! ignored. Missing collections or malformed entries read as empty.

use serde::Deserialize;

/// Which save collection a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyCollection {
    Battled,
    Encountered,
    TransientBattled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEnemyRecord {
    pub raw_identifier: String,
    pub killed_flag: bool,
    pub encountered_flag: bool,
}

impl RawEnemyRecord {
    fn from_entry(entry: &EnemyEntry, collection: EnemyCollection) -> Self {
        let flag = entry.value.flag;
        let (killed_flag, encountered_flag) = match collection {
            EnemyCollection::Battled | EnemyCollection::TransientBattled => (flag, true),
            EnemyCollection::Encountered => (false, flag),
        };
        Self {
            raw_identifier: entry.key.name.clone(),
            killed_flag,
            encountered_flag,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaveTree {
    #[serde(default)]
    root: SaveRoot,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SaveRoot {
    #[serde(default)]
    properties: SaveProperties,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SaveProperties {
    #[serde(rename = "BattledEnemies_0", default)]
    battled: EnemyMap,
    #[serde(rename = "EncounteredEnemies_0", default)]
    encountered: EnemyMap,
    #[serde(rename = "TransientBattledEnemies_0", default)]
    transient_battled: EnemyMap,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct EnemyMap {
    #[serde(rename = "Map", default)]
    entries: Vec<EnemyEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EnemyEntry {
    key: EnemyKey,
    value: EnemyFlag,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EnemyKey {
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct EnemyFlag {
    #[serde(rename = "Bool")]
    flag: bool,
}

impl SaveTree {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Records of one collection in save order, skipping entries without a name
    pub fn records(&self, collection: EnemyCollection) -> Vec<RawEnemyRecord> {
        let map = match collection {
            EnemyCollection::Battled => &self.root.properties.battled,
            EnemyCollection::Encountered => &self.root.properties.encountered,
            EnemyCollection::TransientBattled => &self.root.properties.transient_battled,
        };
        map.entries
            .iter()
            .filter(|e| !e.key.name.is_empty())
            .map(|e| RawEnemyRecord::from_entry(e, collection))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// Build converter-style JSON from (name, flag) pairs per collection.
    pub fn save_json(
        battled: &[(&str, bool)],
        encountered: &[(&str, bool)],
        transient: &[(&str, bool)],
    ) -> String {
        fn map(items: &[(&str, bool)]) -> serde_json::Value {
            let entries: Vec<_> = items
                .iter()
                .map(|(name, flag)| {
                    serde_json::json!({"key": {"Name": name}, "value": {"Bool": flag}})
                })
                .collect();
            serde_json::json!({ "Map": entries })
        }

        serde_json::json!({
            "header": {"magic": 1396790855},
            "root": {
                "save_game_type": "/Script/Game.SaveGame",
                "properties": {
                    "BattledEnemies_0": map(battled),
                    "EncounteredEnemies_0": map(encountered),
                    "TransientBattledEnemies_0": map(transient),
                }
            }
        })
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::save_json;
    use super::*;

    #[test]
    fn reads_all_collections() {
        let json = save_json(&[("A", true)], &[("B", true)], &[("C", false)]);
        let tree = SaveTree::from_json(&json).unwrap();

        let battled = tree.records(EnemyCollection::Battled);
        assert_eq!(battled.len(), 1);
        assert!(battled[0].killed_flag);

        let encountered = tree.records(EnemyCollection::Encountered);
        assert_eq!(encountered[0].raw_identifier, "B");
        assert!(!encountered[0].killed_flag);
        assert!(encountered[0].encountered_flag);

        let transient = tree.records(EnemyCollection::TransientBattled);
        assert!(!transient[0].killed_flag);
    }

    #[test]
    fn missing_collections_are_empty() {
        let tree = SaveTree::from_json(r#"{"root": {"properties": {}}}"#).unwrap();
        assert!(tree.records(EnemyCollection::Battled).is_empty());

        let tree = SaveTree::from_json("{}").unwrap();
        assert!(tree.records(EnemyCollection::Encountered).is_empty());
    }

    #[test]
    fn tolerates_partial_entries() {
        let json = r#"{"root": {"properties": {"BattledEnemies_0": {"Map": [
            {"key": {"Name": "A"}},
            {"value": {"Bool": true}},
            {"key": {"Name": "B"}, "value": {"Bool": true}}
        ]}}}}"#;
        let tree = SaveTree::from_json(json).unwrap();
        let records = tree.records(EnemyCollection::Battled);

        assert_eq!(records.len(), 2);
        assert!(!records[0].killed_flag);
        assert_eq!(records[1].raw_identifier, "B");
    }
}
