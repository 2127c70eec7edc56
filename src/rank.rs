use std::fmt;

use crate::catalog::Discipline;

/// Ordinal evaluation rank, worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    B,
    A,
    AA,
    AAA,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rank::B => "B",
            Rank::A => "A",
            Rank::AA => "AA",
            Rank::AAA => "AAA",
        };
        f.write_str(label)
    }
}

/// Display form for a possibly-absent rank; "-" means no data, not B.
pub fn label(rank: Option<Rank>) -> String {
    match rank {
        Some(rank) => rank.to_string(),
        None => "-".to_string(),
    }
}

/// Which threshold table a score is judged against. Disciplines map onto
/// their own scale; the overall total has a fifth one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Care,
    OneColor,
    Gradation,
    Time,
    Overall,
}

impl From<Discipline> for Scale {
    fn from(discipline: Discipline) -> Self {
        match discipline {
            Discipline::Care => Scale::Care,
            Discipline::OneColor => Scale::OneColor,
            Discipline::Gradation => Scale::Gradation,
            Discipline::Time => Scale::Time,
        }
    }
}

/// Inclusive lower bounds for AAA, AA and A, highest first. Anything below
/// the last bound is B.
fn thresholds(scale: Scale) -> [f64; 3] {
    match scale {
        Scale::Care => [349.0, 298.0, 246.0],
        Scale::OneColor => [519.0, 443.0, 367.0],
        Scale::Gradation => [90.0, 80.0, 70.0],
        Scale::Time => [300.0, 225.0, 150.0],
        Scale::Overall => [1123.0, 958.0, 793.0],
    }
}

/// Maps a score onto a rank. Total over all finite inputs: scores below every
/// bound fall through to B, scores past the top bound cap at AAA.
pub fn classify(score: f64, scale: Scale) -> Rank {
    let [aaa, aa, a] = thresholds(scale);
    if score >= aaa {
        Rank::AAA
    } else if score >= aa {
        Rank::AA
    } else if score >= a {
        Rank::A
    } else {
        Rank::B
    }
}

/// Like `classify`, with absent scores mapping to no rank rather than B.
pub fn classify_opt(score: Option<f64>, scale: Scale) -> Option<Rank> {
    score.map(|value| classify(value, scale))
}

/// Total-working-time band for the time discipline. Each band carries the
/// fixed score that feeds the overall total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBand {
    pub rank: Rank,
    pub score: f64,
    pub limit_minutes: Option<f64>,
}

/// Band table from the rank criteria: AAA within 60 minutes, AA within 85,
/// A within 90, B beyond that. Band scores are quarters of the 300 maximum.
pub const TIME_BANDS: [TimeBand; 4] = [
    TimeBand {
        rank: Rank::AAA,
        score: 300.0,
        limit_minutes: Some(60.0),
    },
    TimeBand {
        rank: Rank::AA,
        score: 225.0,
        limit_minutes: Some(85.0),
    },
    TimeBand {
        rank: Rank::A,
        score: 150.0,
        limit_minutes: Some(90.0),
    },
    TimeBand {
        rank: Rank::B,
        score: 75.0,
        limit_minutes: None,
    },
];

/// Classifies a total working time in minutes. Zero or negative durations
/// mean the measurement is missing and produce no band.
pub fn time_band(minutes: f64) -> Option<TimeBand> {
    if !(minutes > 0.0) {
        return None;
    }
    for band in TIME_BANDS {
        match band.limit_minutes {
            Some(limit) if minutes <= limit => return Some(band),
            Some(_) => continue,
            None => return Some(band),
        }
    }
    None
}

/// Parses a duration into fractional minutes. Accepts the unit-suffixed text
/// form ("22 minutes 30 seconds", "7min 5sec") and the clock form fixed as
/// MM:SS ("20:00" -> 20.0). Anything unparseable is 0.
pub fn parse_duration(text: Option<&str>) -> f64 {
    let Some(text) = text else { return 0.0 };
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }

    if let Some((minutes, seconds)) = text.split_once(':') {
        let minutes: f64 = minutes.trim().parse().unwrap_or(0.0);
        let seconds: f64 = seconds.trim().parse().unwrap_or(0.0);
        return (minutes + seconds / 60.0).max(0.0);
    }

    let mut minutes = 0.0;
    let mut seconds = 0.0;
    let mut pending: Option<f64> = None;

    for token in text.split_whitespace() {
        let digits: String = token.chars().take_while(|c| c.is_ascii_digit()).collect();
        let unit = token[digits.len()..].trim_start_matches(['.', ',']);

        if !digits.is_empty() {
            pending = digits.parse().ok();
        }
        if let Some(value) = pending {
            if unit.starts_with("min") {
                minutes = value;
                pending = None;
            } else if unit.starts_with("sec") {
                seconds = value;
                pending = None;
            }
        }
    }

    (minutes + seconds / 60.0).max(0.0)
}

/// Renders fractional minutes in the report's "X minutes YY seconds" form.
pub fn format_duration(minutes: f64) -> String {
    if !(minutes > 0.0) {
        return "0 minutes 00 seconds".to_string();
    }
    let total_seconds = (minutes * 60.0).round() as u64;
    format!(
        "{} minutes {:02} seconds",
        total_seconds / 60,
        total_seconds % 60
    )
}

/// Movement of a value against a comparison point (previous check or the
/// national average).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Improved,
    Declined,
    Unchanged,
    /// Either operand was absent or zero. Zero is ambiguous between a true
    /// zero score and no data, so it never counts as a comparison.
    Indeterminate,
}

fn compare(current: Option<f64>, baseline: Option<f64>, higher_is_better: bool) -> Trend {
    let (current, baseline) = match (current, baseline) {
        (Some(c), Some(b)) if c != 0.0 && b != 0.0 => (c, b),
        _ => return Trend::Indeterminate,
    };
    if current == baseline {
        Trend::Unchanged
    } else if (current > baseline) == higher_is_better {
        Trend::Improved
    } else {
        Trend::Declined
    }
}

/// Score trend; higher scores are better.
pub fn trend(current: Option<f64>, baseline: Option<f64>) -> Trend {
    compare(current, baseline, true)
}

/// Duration trend; shorter times are better.
pub fn time_trend(current_minutes: Option<f64>, baseline_minutes: Option<f64>) -> Trend {
    compare(current_minutes, baseline_minutes, false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn care_boundaries_are_exact() {
        assert_eq!(classify(349.0, Scale::Care), Rank::AAA);
        assert_eq!(classify(348.0, Scale::Care), Rank::AA);
        assert_eq!(classify(298.0, Scale::Care), Rank::AA);
        assert_eq!(classify(297.0, Scale::Care), Rank::A);
        assert_eq!(classify(246.0, Scale::Care), Rank::A);
        assert_eq!(classify(245.0, Scale::Care), Rank::B);
    }

    #[test]
    fn every_scale_has_exact_boundaries() {
        let cases = [
            (Scale::OneColor, [519.0, 443.0, 367.0]),
            (Scale::Gradation, [90.0, 80.0, 70.0]),
            (Scale::Time, [300.0, 225.0, 150.0]),
            (Scale::Overall, [1123.0, 958.0, 793.0]),
        ];
        for (scale, [aaa, aa, a]) in cases {
            assert_eq!(classify(aaa, scale), Rank::AAA);
            assert_eq!(classify(aaa - 1.0, scale), Rank::AA);
            assert_eq!(classify(aa, scale), Rank::AA);
            assert_eq!(classify(aa - 1.0, scale), Rank::A);
            assert_eq!(classify(a, scale), Rank::A);
            assert_eq!(classify(a - 1.0, scale), Rank::B);
        }
    }

    #[test]
    fn classification_is_monotonic() {
        let mut previous = Rank::B;
        for score in 0..=1400 {
            let rank = classify(f64::from(score), Scale::Overall);
            assert!(rank >= previous, "rank fell at score {score}");
            previous = rank;
        }
    }

    #[test]
    fn extremes_fall_through_or_cap() {
        assert_eq!(classify(-50.0, Scale::Care), Rank::B);
        assert_eq!(classify(99_999.0, Scale::Care), Rank::AAA);
    }

    #[test]
    fn absent_score_has_no_rank() {
        assert_eq!(classify_opt(None, Scale::Care), None);
        assert_eq!(label(None), "-");
        assert_eq!(label(Some(Rank::AA)), "AA");
    }

    #[test]
    fn time_bands_follow_criteria_table() {
        assert_eq!(time_band(60.0).unwrap().rank, Rank::AAA);
        assert_eq!(time_band(60.0).unwrap().score, 300.0);
        assert_eq!(time_band(60.0 + 1.0 / 60.0).unwrap().rank, Rank::AA);
        assert_eq!(time_band(85.0).unwrap().score, 225.0);
        assert_eq!(time_band(85.0 + 1.0 / 60.0).unwrap().rank, Rank::A);
        assert_eq!(time_band(90.0).unwrap().score, 150.0);
        assert_eq!(time_band(90.0 + 1.0 / 60.0).unwrap().rank, Rank::B);
        assert_eq!(time_band(90.0 + 1.0 / 60.0).unwrap().score, 75.0);
    }

    #[test]
    fn band_scores_agree_with_score_thresholds() {
        for band in TIME_BANDS {
            assert_eq!(classify(band.score, Scale::Time), band.rank);
        }
    }

    #[test]
    fn missing_duration_has_no_band() {
        assert_eq!(time_band(0.0), None);
        assert_eq!(time_band(-3.0), None);
    }

    #[test]
    fn parses_unit_suffixed_text() {
        assert_eq!(parse_duration(Some("22 minutes 30 seconds")), 22.5);
        assert_eq!(parse_duration(Some("7min 5sec")), 7.0 + 5.0 / 60.0);
        assert_eq!(parse_duration(Some("45 seconds")), 0.75);
        assert!((parse_duration(Some("104 minutes 54 seconds")) - 104.9).abs() < 1e-9);
    }

    #[test]
    fn parses_clock_form_as_minutes_and_seconds() {
        assert_eq!(parse_duration(Some("20:00")), 20.0);
        assert_eq!(parse_duration(Some("22:30")), 22.5);
    }

    #[test]
    fn garbage_durations_are_zero() {
        assert_eq!(parse_duration(None), 0.0);
        assert_eq!(parse_duration(Some("")), 0.0);
        assert_eq!(parse_duration(Some("soon")), 0.0);
        assert_eq!(parse_duration(Some("::")), 0.0);
    }

    #[test]
    fn formats_display_durations() {
        assert_eq!(format_duration(22.5), "22 minutes 30 seconds");
        assert_eq!(format_duration(0.0), "0 minutes 00 seconds");
        assert_eq!(format_duration(104.9), "104 minutes 54 seconds");
    }

    #[test]
    fn trend_tie_break_rules() {
        assert_eq!(trend(Some(10.0), Some(8.0)), Trend::Improved);
        assert_eq!(trend(Some(8.0), Some(10.0)), Trend::Declined);
        assert_eq!(trend(Some(10.0), Some(10.0)), Trend::Unchanged);
        assert_eq!(trend(Some(10.0), None), Trend::Indeterminate);
        assert_eq!(trend(Some(10.0), Some(0.0)), Trend::Indeterminate);
        assert_eq!(trend(Some(0.0), Some(10.0)), Trend::Indeterminate);
    }

    #[test]
    fn time_trend_is_inverted() {
        assert_eq!(time_trend(Some(55.0), Some(70.0)), Trend::Improved);
        assert_eq!(time_trend(Some(70.0), Some(55.0)), Trend::Declined);
        assert_eq!(time_trend(Some(70.0), Some(70.0)), Trend::Unchanged);
        assert_eq!(time_trend(None, Some(70.0)), Trend::Indeterminate);
    }
}
