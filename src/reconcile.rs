use crate::boss::Boss;
use crate::catalog::CatalogIndex;
use crate::normalize::normalize;
use crate::save_data::{EnemyCollection, SaveTree};
use hashbrown::{HashMap, HashSet};

/// Match the save's enemy records against the catalog.
///
/// Output follows catalog order, never save order. Save identifiers with no
/// catalog entry are dropped, hidden-zone entries are never emitted, and
/// unmatched entries outside the placeholder zones are listed as not yet
/// encountered.
pub fn reconcile(tree: &SaveTree, index: &CatalogIndex) -> Vec<Boss> {
    let battled = tree.records(EnemyCollection::Battled);
    let encountered = tree.records(EnemyCollection::Encountered);
    let transient = tree.records(EnemyCollection::TransientBattled);

    let killed: HashSet<&str> = battled
        .iter()
        .chain(transient.iter())
        .filter(|r| r.killed_flag)
        .map(|r| r.raw_identifier.as_str())
        .collect();

    // distinct ids in first-appearance order: battled, encountered, transient
    let mut all_save_ids: HashSet<&str> = HashSet::new();
    let mut ordered_ids: Vec<&str> = Vec::new();
    for record in battled.iter().chain(encountered.iter()).chain(transient.iter()) {
        if all_save_ids.insert(record.raw_identifier.as_str()) {
            ordered_ids.push(record.raw_identifier.as_str());
        }
    }

    // last writer wins over the distinct ids
    let mut by_normalized: HashMap<String, &str> = HashMap::with_capacity(ordered_ids.len());
    for id in ordered_ids {
        by_normalized.insert(normalize(id), id);
    }

    let zones = index.reserved_zones();
    let mut bosses = Vec::with_capacity(index.len());

    for entry in index.ordered_entries() {
        let matched = if all_save_ids.contains(entry.raw_identifier.as_str()) {
            Some(entry.raw_identifier.as_str())
        } else {
            let normalized = by_normalized.get(&normalize(&entry.raw_identifier)).copied();
            if let Some(save_id) = normalized {
                tracing::debug!(
                    save = save_id,
                    catalog = %entry.raw_identifier,
                    "Matched by normalized identifier"
                );
            }
            normalized
        };

        if zones.is_hidden(&entry.zone) {
            continue;
        }

        match matched {
            Some(save_id) => bosses.push(Boss {
                name: entry.display_name.clone(),
                killed: killed.contains(save_id),
                encountered: true,
                category: Some(entry.category.clone()),
                zone: Some(entry.zone.clone()),
                raw_identifier: Some(save_id.to_string()),
                needs_info: None,
            }),
            None if zones.is_placeholder(&entry.zone) => {}
            None => bosses.push(Boss {
                name: entry.display_name.clone(),
                killed: false,
                encountered: false,
                category: Some(entry.category.clone()),
                zone: Some(entry.zone.clone()),
                raw_identifier: Some(entry.raw_identifier.clone()),
                needs_info: None,
            }),
        }
    }

    tracing::debug!(
        bosses = bosses.len(),
        save_enemies = all_save_ids.len(),
        killed = killed.len(),
        "Reconciled save against catalog"
    );
    bosses
}
