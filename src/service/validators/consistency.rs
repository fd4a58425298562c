//! Agreement between classification attempts

use std::collections::HashMap;

use crate::model::Classification;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsistencyCheck {
    pub passed: bool,
    /// Size of the largest exact (category, subcategory) group over the total
    pub score: f64,
}

/// Group attempts by exact (category, subcategory) pair and measure the majority share
///
/// Zero or one input is trivially consistent.
pub fn check(classifications: &[Classification], threshold: f64) -> ConsistencyCheck {
    if classifications.len() <= 1 {
        return ConsistencyCheck {
            passed: true,
            score: 1.0,
        };
    }

    let mut groups: HashMap<(&str, &str), usize> = HashMap::new();
    for c in classifications {
        *groups
            .entry((c.category.as_str(), c.subcategory.as_str()))
            .or_default() += 1;
    }

    let largest = groups.values().copied().max().unwrap_or(0);
    let score = largest as f64 / classifications.len() as f64;

    ConsistencyCheck {
        passed: score >= threshold,
        score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::classification;

    #[test]
    fn test_empty_and_single_are_consistent() {
        let expected = ConsistencyCheck {
            passed: true,
            score: 1.0,
        };
        assert_eq!(check(&[], 0.6), expected);
        assert_eq!(
            check(&[classification("Family Law", "Divorce", "a")], 0.6),
            expected
        );
    }

    #[test]
    fn test_identical_pairs_are_consistent() {
        let all = vec![
            classification("Family Law", "Divorce", "a"),
            classification("Family Law", "Divorce", "b"),
            classification("Family Law", "Divorce", "c"),
        ];
        let result = check(&all, 0.6);
        assert!(result.passed);
        assert_eq!(result.score, 1.0);
    }

    #[test]
    fn test_same_category_different_subcategory_is_split() {
        let all = vec![
            classification("Employment Law", "Wrongful Termination", "a"),
            classification("Employment Law", "Workplace Disputes", "b"),
        ];
        let result = check(&all, 0.6);
        assert!(!result.passed);
        assert_eq!(result.score, 0.5);
    }

    #[test]
    fn test_majority_meets_threshold() {
        let all = vec![
            classification("Family Law", "Divorce", "a"),
            classification("Family Law", "Divorce", "b"),
            classification("Family Law", "Divorce", "c"),
            classification("Employment Law", "Wrongful Termination", "d"),
            classification("Criminal Law", "Felonies", "e"),
        ];
        let result = check(&all, 0.6);
        assert!(result.passed);
        assert_eq!(result.score, 0.6);
    }
}
