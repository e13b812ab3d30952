/// Lengths of the content-hash segment appended to generated identifiers.
const HASH_SEGMENT_LENGTHS: [usize; 2] = [32, 33];

/// Strip the trailing content-hash segment from a raw identifier.
///
/// `"E_1_4DFD38854045646F8DC570BDF56675B6"` becomes `"E_1"`. Identifiers whose
/// last `_`-delimited segment is not 32 or 33 characters long are returned as-is.
pub fn normalize(id: &str) -> String {
    match id.rsplit_once('_') {
        Some((head, tail)) if HASH_SEGMENT_LENGTHS.contains(&tail.chars().count()) => head.to_string(),
        // single segment: the whole identifier is the "last segment"
        None if HASH_SEGMENT_LENGTHS.contains(&id.chars().count()) => String::new(),
        _ => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH_32: &str = "4DFD38854045646F8DC570BDF56675B6";

    #[test]
    fn strips_32_char_hash() {
        let id = format!("ObjectID_Enemy_C_{HASH_32}");
        assert_eq!(normalize(&id), "ObjectID_Enemy_C");
    }

    #[test]
    fn strips_33_char_hash() {
        let id = format!("E_1_{HASH_32}X");
        assert_eq!(normalize(&id), "E_1");
    }

    #[test]
    fn keeps_other_identifiers() {
        assert_eq!(normalize("E_1_short"), "E_1_short");
        assert_eq!(normalize("MANUAL_1712345678901"), "MANUAL_1712345678901");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("plain"), "plain");
    }

    #[test]
    fn only_last_segment_is_considered() {
        let id = format!("{HASH_32}_tail");
        assert_eq!(normalize(&id), id);
    }

    #[test]
    fn hash_variants_compare_equal() {
        let a = format!("E_1_{HASH_32}");
        let b = "E_1_0123456789ABCDEF0123456789ABCDEF";
        assert_eq!(normalize(&a), normalize(b));
    }

    #[test]
    fn segment_length_counts_characters() {
        let id = format!("E_1_{}", "é".repeat(32));
        assert_eq!(normalize(&id), "E_1");

        // 32 bytes but 16 characters
        let short = format!("E_1_{}", "é".repeat(16));
        assert_eq!(normalize(&short), short);
    }

    #[test]
    fn bare_hash_normalizes_to_empty() {
        assert_eq!(normalize(HASH_32), "");
    }
}
