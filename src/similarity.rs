//! Title similarity scoring for catalog match selection.

use std::collections::HashSet;

const WORD_SET_WEIGHT: f64 = 0.6;
const EDIT_DISTANCE_WEIGHT: f64 = 0.4;

/// Scores how well a candidate title matches a query, in `[0, 1]`.
///
/// Both strings are case-folded and trimmed first. Exact matches score 1.0
/// and substring containment scores 0.9; anything else blends word-set
/// overlap with normalized edit distance. The containment check runs in both
/// directions, so the score is not symmetric by construction and callers
/// must not assume it is.
pub fn score(query: &str, candidate: &str) -> f64 {
    let left = normalize(query);
    let right = normalize(candidate);
    if left == right {
        return 1.0;
    }
    if left.contains(right.as_str()) || right.contains(left.as_str()) {
        return 0.9;
    }
    WORD_SET_WEIGHT * word_set_score(&left, &right)
        + EDIT_DISTANCE_WEIGHT * edit_distance_score(&left, &right)
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Jaccard overlap of whitespace-separated token sets.
fn word_set_score(left: &str, right: &str) -> f64 {
    let left_tokens: HashSet<&str> = left.split_whitespace().collect();
    let right_tokens: HashSet<&str> = right.split_whitespace().collect();
    let union = left_tokens.union(&right_tokens).count();
    if union == 0 {
        return 0.0;
    }
    let overlap = left_tokens.intersection(&right_tokens).count();
    overlap as f64 / union as f64
}

/// Levenshtein distance normalized by the longer input; two empty inputs
/// count as identical rather than dividing by zero.
fn edit_distance_score(left: &str, right: &str) -> f64 {
    let max_len = left.chars().count().max(right.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - strsim::levenshtein(left, right) as f64 / max_len as f64
}

#[cfg(test)]
mod tests {
    use super::{edit_distance_score, score};

    #[test]
    fn test_score_identical_after_normalization() {
        assert_eq!(score("Berserk", "berserk"), 1.0);
        assert_eq!(score("  One Piece  ", "one piece"), 1.0);
    }

    #[test]
    fn test_score_containment_is_near_exact() {
        assert_eq!(score("naruto", "Naruto: Shippuden"), 0.9);
        assert_eq!(score("Naruto: Shippuden", "naruto"), 0.9);
    }

    #[test]
    fn test_score_bounded_for_arbitrary_pairs() {
        let samples = [
            ("", ""),
            ("", "anything"),
            ("solo leveling", "the beginning after the end"),
            ("a", "b"),
            ("spice and wolf", "wolf"),
            ("!!!", "???"),
        ];
        for (left, right) in samples {
            let value = score(left, right);
            assert!(
                (0.0..=1.0).contains(&value),
                "score({left:?}, {right:?}) = {value}"
            );
        }
    }

    #[test]
    fn test_score_empty_pair_is_exact() {
        assert_eq!(score("", ""), 1.0);
        assert_eq!(score("   ", ""), 1.0);
    }

    #[test]
    fn test_edit_distance_regression_kitten_sitting() {
        assert_eq!(strsim::levenshtein("kitten", "sitting"), 3);
        // No shared tokens, so only the edit-distance component contributes.
        let expected = 0.4 * (1.0 - 3.0 / 7.0);
        assert!((score("kitten", "sitting") - expected).abs() < 1e-9);
    }

    #[test]
    fn test_edit_distance_score_empty_inputs() {
        assert_eq!(edit_distance_score("", ""), 1.0);
        assert_eq!(edit_distance_score("", "abc"), 0.0);
    }

    #[test]
    fn test_score_blends_word_overlap_and_edit_distance() {
        // Token sets {attack, on, titan} / {attack, of, titan} overlap 2 of 4;
        // one substitution over 15 characters.
        let expected = 0.6 * (2.0 / 4.0) + 0.4 * (1.0 - 1.0 / 15.0);
        let value = score("attack on titan", "attack of titan");
        assert!((value - expected).abs() < 1e-9);
    }
}
