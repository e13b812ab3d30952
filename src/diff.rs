use crate::boss::Boss;
use hashbrown::HashMap;

/// Bosses that became killed between two successive lists, joined on raw identifier.
///
/// A boss absent from `previous` counts if it is already killed in `current`,
/// since several saves may collapse into one change notification. Bosses
/// without an identifier (the placeholder list) have no join key and are never
/// reported.
pub fn newly_killed(previous: &[Boss], current: &[Boss]) -> Vec<Boss> {
    let was_killed: HashMap<&str, bool> = previous
        .iter()
        .filter_map(|b| Some((b.raw_identifier.as_deref()?, b.killed)))
        .collect();

    current
        .iter()
        .filter(|boss| {
            let Some(id) = boss.raw_identifier.as_deref() else {
                return false;
            };
            boss.killed && !was_killed.get(id).copied().unwrap_or(false)
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boss::placeholder_bosses;

    fn boss(id: &str, killed: bool) -> Boss {
        Boss {
            name: id.to_string(),
            killed,
            encountered: true,
            raw_identifier: Some(id.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn kill_transition_is_reported() {
        let killed = newly_killed(&[boss("A", false)], &[boss("A", true)]);
        assert_eq!(killed, vec![boss("A", true)]);
    }

    #[test]
    fn new_killed_boss_is_reported() {
        let killed = newly_killed(&[], &[boss("B", true)]);
        assert_eq!(killed, vec![boss("B", true)]);
    }

    #[test]
    fn already_killed_is_not_reported() {
        assert!(newly_killed(&[boss("A", true)], &[boss("A", true)]).is_empty());
    }

    #[test]
    fn other_changes_are_ignored() {
        let previous = [boss("A", true), boss("B", false)];
        let current = [boss("A", false), boss("C", false)];
        assert!(newly_killed(&previous, &current).is_empty());
    }

    #[test]
    fn bosses_without_identifier_are_skipped() {
        let previous = [boss("A", false)];
        let current = placeholder_bosses();
        assert!(current.iter().any(|b| b.killed));
        assert!(newly_killed(&previous, &current).is_empty());
    }

    #[test]
    fn keeps_current_order() {
        let previous = [boss("A", false), boss("B", false)];
        let current = [boss("B", true), boss("A", true)];
        let names: Vec<_> = newly_killed(&previous, &current)
            .into_iter()
            .map(|b| b.name)
            .collect();
        assert_eq!(names, ["B", "A"]);
    }
}
