use std::fmt::Write;

use crate::catalog::{self, Discipline, ItemDef};
use crate::models::{Customer, SkillCheck};
use crate::rank::{self, Scale, Trend};
use crate::score;

// National reference values published with the certification program. No
// national average exists for gradation, so its comparison stays blank.
const NATIONAL_AVG_CARE: f64 = 267.0;
const NATIONAL_AVG_ONE_COLOR: f64 = 350.0;
const NATIONAL_AVG_TIME: f64 = 75.0;
const NATIONAL_AVG_OVERALL: f64 = 692.0;
const NATIONAL_AVG_TOTAL_TIME: &str = "104 minutes 54 seconds";

fn national_average(discipline: Discipline) -> Option<f64> {
    match discipline {
        Discipline::Care => Some(NATIONAL_AVG_CARE),
        Discipline::OneColor => Some(NATIONAL_AVG_ONE_COLOR),
        Discipline::Gradation => None,
        Discipline::Time => Some(NATIONAL_AVG_TIME),
    }
}

/// Per-item national reference: three quarters of the allocation, floored.
fn national_item_average(item: &ItemDef) -> f64 {
    (f64::from(item.allocation) * 0.75).floor()
}

fn fmt_score(score: Option<f64>) -> String {
    match score {
        Some(value) => {
            if value.fract() == 0.0 {
                format!("{value:.0}")
            } else {
                format!("{value:.1}")
            }
        }
        None => "-".to_string(),
    }
}

fn trend_word(trend: Trend) -> &'static str {
    match trend {
        Trend::Improved => "improved",
        Trend::Declined => "declined",
        Trend::Unchanged => "unchanged",
        Trend::Indeterminate => "-",
    }
}

/// Builds the full markdown evaluation report for one customer. `current` is
/// the newest check, `previous` the one before it; either may be absent and
/// every figure degrades to the "-" sentinel rather than failing.
pub fn build_report(
    customer: &Customer,
    current: Option<&SkillCheck>,
    previous: Option<&SkillCheck>,
) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "# Skill Check Report");
    let _ = writeln!(
        out,
        "Customer {} ({})",
        customer.name, customer.customer_number
    );
    match current {
        Some(check) => {
            let _ = write!(out, "Current check recorded {}", check.recorded_at.date_naive());
            if let Some(prev) = previous {
                let _ = write!(out, "; previous check {}", prev.recorded_at.date_naive());
            }
            let _ = writeln!(out, ".");
        }
        None => {
            let _ = writeln!(out, "No skill checks recorded yet.");
            return out;
        }
    }

    write_summary(&mut out, current, previous);

    for discipline in [Discipline::Care, Discipline::OneColor, Discipline::Gradation] {
        write_discipline_detail(&mut out, discipline, current, previous);
    }
    write_time_detail(&mut out, current, previous);
    write_rank_criteria(&mut out);

    out
}

fn write_summary(out: &mut String, current: Option<&SkillCheck>, previous: Option<&SkillCheck>) {
    let _ = writeln!(out);
    let _ = writeln!(out, "## Evaluation Summary");
    let _ = writeln!(
        out,
        "| category | average | avg score | last | last score | this | this score | vs avg | vs last |"
    );
    let _ = writeln!(
        out,
        "|---|---|---|---|---|---|---|---|---|"
    );

    let overall_current = current.map(score::overall_total).filter(|t| *t > 0.0);
    let overall_previous = previous.map(score::overall_total).filter(|t| *t > 0.0);
    summary_row(
        out,
        "comprehensive",
        Scale::Overall,
        catalog::OVERALL_MAX,
        Some(NATIONAL_AVG_OVERALL),
        overall_current,
        overall_previous,
    );

    for discipline in Discipline::ALL {
        summary_row(
            out,
            discipline.label(),
            discipline.into(),
            discipline.max_score(),
            national_average(discipline),
            current.and_then(|c| score::discipline_score(c, discipline)),
            previous.and_then(|c| score::discipline_score(c, discipline)),
        );
    }

    let current_time = current.and_then(|c| c.total_time.as_deref());
    let previous_time = previous.and_then(|c| c.total_time.as_deref());
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Total working time: this {} / last {} / average {}",
        current_time.map_or_else(|| "-".to_string(), |t| {
            rank::format_duration(rank::parse_duration(Some(t)))
        }),
        previous_time.map_or_else(|| "-".to_string(), |t| {
            rank::format_duration(rank::parse_duration(Some(t)))
        }),
        NATIONAL_AVG_TOTAL_TIME
    );
}

fn summary_row(
    out: &mut String,
    label: &str,
    scale: Scale,
    max: f64,
    national: Option<f64>,
    current: Option<f64>,
    previous: Option<f64>,
) {
    let _ = writeln!(
        out,
        "| {} | {} | {} | {} | {} | {} | {} | {} | {} |",
        label,
        rank::label(rank::classify_opt(national, scale)),
        match national {
            Some(value) => format!("{}/{max:.0}", fmt_score(Some(value))),
            None => "-".to_string(),
        },
        rank::label(rank::classify_opt(previous, scale)),
        format!("{}/{max:.0}", fmt_score(previous)),
        rank::label(rank::classify_opt(current, scale)),
        format!("{}/{max:.0}", fmt_score(current)),
        trend_word(rank::trend(current, national)),
        trend_word(rank::trend(current, previous)),
    );
}

fn write_discipline_detail(
    out: &mut String,
    discipline: Discipline,
    current: Option<&SkillCheck>,
    previous: Option<&SkillCheck>,
) {
    let items = discipline.items();
    let current_values = current.map(|c| &c.values);
    let previous_values = previous.map(|c| &c.values);

    let _ = writeln!(out);
    let _ = writeln!(out, "## Breakdown: {}", discipline.label());

    let (start, end) = discipline.category_range();
    for category in start..=end {
        let category_items: Vec<&ItemDef> =
            items.iter().filter(|i| i.category == category).collect();
        if category_items.is_empty() {
            continue;
        }
        let max: u32 = category_items.iter().map(|i| i.allocation).sum();
        let sum = score::category_sum(current_values, items, category);
        let pct = if max > 0 { sum / f64::from(max) * 100.0 } else { 0.0 };
        let _ = writeln!(out, "- category {category}: {sum:.0}/{max} ({pct:.0}%)");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "| item | checkpoint | req | alloc | avg | last | this | % |");
    let _ = writeln!(out, "|---|---|---|---|---|---|---|---|");
    for item in items {
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {:.0} | {:.0} | {:.0} | {:.0} |",
            item.id,
            item.label,
            if item.required { "*" } else { "" },
            item.allocation,
            national_item_average(item),
            score::item_score(previous_values, item),
            score::item_score(current_values, item),
            score::item_percentage(current_values, item),
        );
    }
}

fn write_time_detail(
    out: &mut String,
    current: Option<&SkillCheck>,
    previous: Option<&SkillCheck>,
) {
    let _ = writeln!(out);
    let _ = writeln!(out, "## Breakdown: time");
    let _ = writeln!(out, "| phase | target | last | this | trend |");
    let _ = writeln!(out, "|---|---|---|---|---|");

    for item in Discipline::Time.items() {
        let target = item.target_minutes.unwrap_or(0.0);
        let actual = phase_minutes(current, item);
        let last = phase_minutes(previous, item);
        let _ = writeln!(
            out,
            "| {} | {} | {} | {} | {} |",
            item.label,
            rank::format_duration(target),
            last.map_or_else(|| "-".to_string(), rank::format_duration),
            actual.map_or_else(|| "-".to_string(), rank::format_duration),
            trend_word(rank::time_trend(actual, Some(target))),
        );
    }

    let total_minutes = current
        .and_then(|c| c.total_time.as_deref())
        .map(|t| rank::parse_duration(Some(t)))
        .filter(|m| *m > 0.0);
    let _ = writeln!(out);
    match total_minutes.and_then(rank::time_band) {
        Some(band) => {
            let _ = writeln!(
                out,
                "Total time {} places this check in the {} band ({:.0} points).",
                rank::format_duration(total_minutes.unwrap_or(0.0)),
                band.rank,
                band.score
            );
        }
        None => {
            let _ = writeln!(out, "No total working time was recorded for this check.");
        }
    }
}

fn phase_minutes(check: Option<&SkillCheck>, item: &ItemDef) -> Option<f64> {
    let value = check.and_then(|c| c.values.get(item.key))?;
    let minutes = match value {
        serde_json::Value::String(text) => rank::parse_duration(Some(text)),
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    };
    (minutes > 0.0).then_some(minutes)
}

fn write_rank_criteria(out: &mut String) {
    let _ = writeln!(out);
    let _ = writeln!(out, "## Evaluation Rank Criteria");
    let _ = writeln!(out, "| rank | comprehensive | care | one color | gradation | time |");
    let _ = writeln!(out, "|---|---|---|---|---|---|");
    let _ = writeln!(
        out,
        "| AAA | 1123-1320 | 349-410 | 519-610 | 90-100% | 300 pts, within 60 minutes |"
    );
    let _ = writeln!(
        out,
        "| AA | 958-1122 | 298-348 | 443-518 | 80-89% | 225 pts, within 85 minutes |"
    );
    let _ = writeln!(
        out,
        "| A | 793-957 | 246-297 | 367-442 | 70-79% | 150 pts, within 90 minutes |"
    );
    let _ = writeln!(
        out,
        "| B | -792 | -245 | -366 | -69% | 75 pts, over 90 minutes |"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use uuid::Uuid;

    fn customer() -> Customer {
        Customer {
            id: Uuid::new_v4(),
            customer_number: "C-1041".to_string(),
            name: "Mika Sato".to_string(),
            age: Some(24),
            prefecture: None,
            occupation: None,
            experience: None,
            application_date: None,
            status: "in progress".to_string(),
        }
    }

    fn full_check(total_time: &str) -> SkillCheck {
        let mut values = serde_json::Map::new();
        for item in catalog::all_items() {
            match item.target_minutes {
                Some(target) => {
                    values.insert(
                        item.key.to_string(),
                        json!(format!("{} minutes 00 seconds", target as u32)),
                    );
                }
                None => {
                    values.insert(item.key.to_string(), json!(item.allocation));
                }
            }
        }
        SkillCheck {
            id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            recorded_at: Utc.with_ymd_and_hms(2026, 7, 3, 10, 0, 0).unwrap(),
            values,
            care_score: None,
            color_score: None,
            gradation_score: None,
            time_score: None,
            total_score: None,
            total_time: Some(total_time.to_string()),
            rank: None,
        }
    }

    #[test]
    fn report_without_checks_says_so() {
        let report = build_report(&customer(), None, None);
        assert!(report.contains("No skill checks recorded yet."));
    }

    #[test]
    fn perfect_check_reports_aaa_everywhere() {
        let check = full_check("58 minutes 00 seconds");
        let report = build_report(&customer(), Some(&check), None);
        assert!(report.contains("| comprehensive | "));
        assert!(report.contains("AAA | 1320/1320"));
        assert!(report.contains("AAA | 410/410"));
        assert!(report.contains("AAA | 610/610"));
        assert!(report.contains("AAA | 100/100"));
        assert!(report.contains("AAA | 300/300"));
        assert!(report.contains("in the AAA band (300 points)"));
    }

    #[test]
    fn missing_previous_check_shows_sentinels() {
        let check = full_check("88 minutes 00 seconds");
        let report = build_report(&customer(), Some(&check), None);
        assert!(report.contains("| - | -/410 |"));
        assert!(report.contains("in the A band (150 points)"));
    }

    #[test]
    fn category_breakdown_uses_catalog_maxima() {
        let check = full_check("70 minutes 00 seconds");
        let report = build_report(&customer(), Some(&check), None);
        // category 4 of care is worth 70 points in the canonical table
        assert!(report.contains("- category 4: 70/70 (100%)"));
        assert!(report.contains("- category 27: 40/40 (100%)"));
    }

    #[test]
    fn trend_column_compares_against_previous() {
        let current = full_check("58 minutes 00 seconds");
        let mut previous = full_check("92 minutes 00 seconds");
        for value in previous.values.values_mut() {
            if let Some(n) = value.as_f64() {
                *value = json!((n / 2.0).floor());
            }
        }
        let report = build_report(&customer(), Some(&current), Some(&previous));
        assert!(report.contains("improved"));
    }
}
