//! Deterministic confidence scoring
//!
//! Identical inputs always produce identical scores.

const BASE: f64 = 35.0;
const EVIDENCE_WEIGHT: f64 = 55.0;
const QUALITY_WEIGHT: f64 = 10.0;
const FALLBACK_FACTOR: f64 = 0.8;

const CONSENSUS_MIN: u8 = 22;
const CONSENSUS_MAX: u8 = 98;

/// Confidence of a single classification, in [1, 100]
///
/// Monotonic in both the evidentiary score and the narrative quality signal;
/// fallback-pass results are scaled down.
pub fn confidence_score(evidentiary_score: f64, narrative_quality: f64, used_fallback: bool) -> u8 {
    let evidence = unit(evidentiary_score);
    let quality = unit(narrative_quality);

    let mut raw = BASE + EVIDENCE_WEIGHT * evidence + QUALITY_WEIGHT * (quality - 0.5);
    if used_fallback {
        raw *= FALLBACK_FACTOR;
    }

    raw.round().clamp(1.0, 100.0) as u8
}

fn unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// Aggregate confidence across all classification attempts, in [22, 98]
pub fn consensus_confidence(scores: &[u8]) -> u8 {
    if scores.is_empty() {
        return CONSENSUS_MIN;
    }

    let sum: u32 = scores.iter().map(|&s| u32::from(s)).sum();
    let mean = (f64::from(sum) / scores.len() as f64).round();

    (mean as u8).clamp(CONSENSUS_MIN, CONSENSUS_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_deterministic() {
        assert_eq!(confidence_score(0.8, 0.7, false), confidence_score(0.8, 0.7, false));
    }

    #[test]
    fn test_confidence_values() {
        assert_eq!(confidence_score(1.0, 1.0, false), 95);
        assert_eq!(confidence_score(0.0, 0.0, false), 30);
        assert_eq!(confidence_score(0.6, 0.5, false), 68);
        assert_eq!(confidence_score(1.0, 1.0, true), 76);
    }

    #[test]
    fn test_confidence_is_monotonic() {
        let mut previous = 0;
        for step in 0..=20 {
            let score = confidence_score(step as f64 / 20.0, 0.5, false);
            assert!(score >= previous);
            previous = score;
        }

        assert!(confidence_score(0.7, 0.9, false) >= confidence_score(0.7, 0.1, false));
        assert!(confidence_score(0.7, 0.5, true) < confidence_score(0.7, 0.5, false));
    }

    #[test]
    fn test_confidence_clamps_inputs() {
        assert_eq!(confidence_score(5.0, 5.0, false), confidence_score(1.0, 1.0, false));
        assert_eq!(confidence_score(-1.0, f64::NAN, false), 30);
    }

    #[test]
    fn test_consensus_is_clamped_mean() {
        assert_eq!(consensus_confidence(&[80, 60]), 70);
        assert_eq!(consensus_confidence(&[81, 80]), 81);
        assert_eq!(consensus_confidence(&[10, 12]), 22);
        assert_eq!(consensus_confidence(&[100, 100]), 98);
        assert_eq!(consensus_confidence(&[]), 22);
    }
}
