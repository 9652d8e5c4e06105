//! Short-opportunity confidence scoring.
//!
//! Pure additive heuristic: each input nudges a base of 5.0 and may attach
//! a human-readable warning. The final score is clamped to [1, 10] and
//! rounded to one decimal so records and messages stay comparable across
//! cycles.

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct Scorecard {
    pub score: f64,
    pub warnings: Vec<String>,
}

/// Combine RSI, percent-scaled funding, and wall ratio into a confidence
/// score. The RSI and funding branch groups are each mutually exclusive;
/// the wall check is independent. An undefined RSI skips its group
/// entirely. `change_24h_pct` rides along for message context only.
pub fn score(
    cfg: &Config,
    rsi: Option<f64>,
    funding_pct: f64,
    wall_ratio: f64,
    _change_24h_pct: f64,
) -> Scorecard {
    let mut score: f64 = 5.0;
    let mut warnings = Vec::new();

    if let Some(rsi) = rsi {
        if rsi > cfg.rsi_overheat_hard {
            score += 2.0;
            warnings.push("extreme overheating, RSI above 85".to_string());
        } else if rsi > cfg.rsi_overheat_soft {
            score += 1.0;
        }
    }

    if funding_pct < cfg.funding_danger_limit {
        score -= 3.0;
        warnings.push("danger: extremely negative funding, squeeze risk".to_string());
    } else if funding_pct < 0.0 {
        score -= 1.0;
        warnings.push("caution: negative funding".to_string());
    } else if funding_pct > cfg.funding_clean_limit {
        score += 1.5;
        warnings.push("clean: positive funding".to_string());
    }

    if wall_ratio > cfg.wall_strong_limit {
        score += 1.5;
        warnings.push("strong sell-wall resistance".to_string());
    }

    let score = (score.clamp(1.0, 10.0) * 10.0).round() / 10.0;
    Scorecard { score, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> Config {
        Config::from_env()
    }

    #[test]
    fn test_neutral_inputs_score_base() {
        let card = score(&cfg(), Some(50.0), 0.01, 1.0, 0.0);
        assert_eq!(card.score, 5.0);
        assert!(card.warnings.is_empty());
    }

    #[test]
    fn test_everything_hot_clamps_to_10() {
        // 5 + 2 (RSI) + 1.5 (funding) + 1.5 (wall) = 10.0
        let card = score(&cfg(), Some(90.0), 0.03, 4.0, 10.0);
        assert_eq!(card.score, 10.0);
        assert_eq!(card.warnings.len(), 3);
        assert!(card.warnings[0].contains("RSI above 85"));
        assert!(card.warnings[1].contains("positive funding"));
        assert!(card.warnings[2].contains("sell-wall"));
    }

    #[test]
    fn test_extreme_inputs_still_clamp() {
        let card = score(&cfg(), Some(1000.0), -50.0, 0.0, 0.0);
        assert_eq!(card.score, 4.0); // 5 + 2 - 3
        let card = score(&cfg(), None, -50.0, 0.0, 0.0);
        assert_eq!(card.score, 2.0); // 5 - 3
        // Nothing can push below the floor.
        let card = score(&cfg(), None, -1e9, 0.0, 0.0);
        assert_eq!(card.score, 2.0);
    }

    #[test]
    fn test_score_always_in_bounds() {
        let cfg = cfg();
        let rsis = [None, Some(-10.0), Some(0.0), Some(76.0), Some(86.0), Some(1000.0)];
        let fundings = [-1e6, -0.2, -0.01, 0.0, 0.01, 0.03, 1e6];
        let walls = [0.0, 1.0, 3.0, 3.1, 1e6];
        for rsi in rsis {
            for funding in fundings {
                for wall in walls {
                    let card = score(&cfg, rsi, funding, wall, 0.0);
                    assert!(
                        (1.0..=10.0).contains(&card.score),
                        "score out of bounds: {} for rsi={:?} funding={} wall={}",
                        card.score, rsi, funding, wall
                    );
                }
            }
        }
    }

    #[test]
    fn test_soft_rsi_adds_point_without_warning() {
        let card = score(&cfg(), Some(80.0), 0.0, 1.0, 0.0);
        assert_eq!(card.score, 6.0);
        assert!(card.warnings.is_empty());
    }

    #[test]
    fn test_undefined_rsi_skips_group() {
        let with = score(&cfg(), Some(90.0), 0.0, 1.0, 0.0);
        let without = score(&cfg(), None, 0.0, 1.0, 0.0);
        assert_eq!(with.score - without.score, 2.0);
        assert!(without.warnings.is_empty());
    }

    #[test]
    fn test_funding_branches_are_exclusive() {
        let danger = score(&cfg(), None, -0.2, 1.0, 0.0);
        assert_eq!(danger.score, 2.0);
        assert_eq!(danger.warnings.len(), 1);
        assert!(danger.warnings[0].contains("squeeze risk"));

        let mild = score(&cfg(), None, -0.01, 1.0, 0.0);
        assert_eq!(mild.score, 4.0);
        assert!(mild.warnings[0].contains("caution"));

        // Small positive funding below the clean threshold: no adjustment.
        let meh = score(&cfg(), None, 0.01, 1.0, 0.0);
        assert_eq!(meh.score, 5.0);
        assert!(meh.warnings.is_empty());
    }

    #[test]
    fn test_score_rounds_to_one_decimal() {
        let card = score(&cfg(), None, 0.03, 1.0, 0.0);
        assert_eq!(card.score, 6.5);
    }
}
