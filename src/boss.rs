use serde::{Deserialize, Serialize};

/// Identifier prefix of bosses authored by the user rather than found in a save.
pub const MANUAL_PREFIX: &str = "MANUAL_";

/// Zone label used when grouping bosses that carry no zone.
pub const UNCATEGORIZED_ZONE: &str = "Uncategorized";

/// A reconciled boss, as emitted to the presentation layer.
///
/// Lists of these are recomputed on every pass and replaced as a whole.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boss {
    pub name: String,
    pub killed: bool,
    /// `false` marks a catalog entry not yet seen in the current save
    pub encountered: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub needs_info: Option<bool>,
}

impl Boss {
    pub fn is_user_authored(&self) -> bool {
        self.raw_identifier
            .as_deref()
            .is_some_and(is_user_authored_id)
    }

    pub fn needs_info(&self) -> bool {
        self.needs_info.unwrap_or(false)
    }

    fn zone_label(&self) -> &str {
        match self.zone.as_deref() {
            Some(zone) if !zone.is_empty() => zone,
            _ => UNCATEGORIZED_ZONE,
        }
    }
}

pub fn is_user_authored_id(raw_identifier: &str) -> bool {
    raw_identifier.starts_with(MANUAL_PREFIX)
}

/// Bosses of one zone with progress counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneSummary {
    pub zone: String,
    pub bosses: Vec<Boss>,
    pub killed: usize,
    pub encountered: usize,
    pub total: usize,
}

/// Group bosses by zone, zones ordered by first appearance in `bosses`.
pub fn group_by_zone(bosses: &[Boss]) -> Vec<ZoneSummary> {
    let mut groups: Vec<ZoneSummary> = Vec::new();

    for boss in bosses {
        let zone = boss.zone_label();
        let idx = match groups.iter().position(|g| g.zone == zone) {
            Some(idx) => idx,
            None => {
                groups.push(ZoneSummary {
                    zone: zone.to_string(),
                    bosses: Vec::new(),
                    killed: 0,
                    encountered: 0,
                    total: 0,
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        group.killed += usize::from(boss.killed);
        group.encountered += usize::from(boss.encountered);
        group.total += 1;
        group.bosses.push(boss.clone());
    }

    groups
}

/// Shown when the converter cannot produce a save snapshot, so the list stays usable.
pub fn placeholder_bosses() -> Vec<Boss> {
    fn boss(name: &str, killed: bool, encountered: bool, category: &str, zone: &str) -> Boss {
        Boss {
            name: name.to_string(),
            killed,
            encountered,
            category: Some(category.to_string()),
            zone: Some(zone.to_string()),
            ..Default::default()
        }
    }

    vec![
        boss("Boss Mime", true, true, "Mime", "Test Zone"),
        boss("Boss Petank", false, true, "Petank", "Test Zone"),
        boss("Alpha Enemy", false, false, "Alpha", "Test Zone 2"),
        boss("Merchant Test", true, true, "Merchant", "Test Zone 2"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boss(name: &str, zone: Option<&str>, killed: bool, encountered: bool) -> Boss {
        Boss {
            name: name.to_string(),
            killed,
            encountered,
            zone: zone.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn groups_in_first_appearance_order() {
        let bosses = vec![
            boss("a", Some("Lumière"), true, true),
            boss("b", Some("Flying Waters"), false, true),
            boss("c", Some("Lumière"), false, false),
        ];

        let groups = group_by_zone(&bosses);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].zone, "Lumière");
        assert_eq!(groups[0].total, 2);
        assert_eq!(groups[0].killed, 1);
        assert_eq!(groups[0].encountered, 1);
        assert_eq!(groups[0].bosses[1].name, "c");
        assert_eq!(groups[1].zone, "Flying Waters");
    }

    #[test]
    fn zoneless_bosses_are_uncategorized() {
        let bosses = vec![boss("a", None, false, true), boss("b", Some(""), false, true)];
        let groups = group_by_zone(&bosses);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].zone, UNCATEGORIZED_ZONE);
        assert_eq!(groups[0].total, 2);
    }

    #[test]
    fn serializes_camel_case_without_empty_fields() {
        let b = Boss {
            name: "Foo".into(),
            killed: true,
            encountered: true,
            raw_identifier: Some("E_1".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&b).unwrap();
        assert_eq!(json["rawIdentifier"], "E_1");
        assert!(json.get("category").is_none());
        assert!(json.get("needsInfo").is_none());
    }

    #[test]
    fn detects_user_authored() {
        let mut b = boss("x", None, false, true);
        assert!(!b.is_user_authored());
        b.raw_identifier = Some("MANUAL_1712345678901".into());
        assert!(b.is_user_authored());
    }
}
