use serde_json::Value;

use crate::catalog::{Discipline, GRADATION_RAW_MAX, ItemDef};
use crate::models::SkillCheck;
use crate::rank;

/// Flat item-key mapping of an assessment record.
pub type RawValues = serde_json::Map<String, Value>;

/// Coerces a raw entry to a number. Missing keys, nulls, booleans and
/// unparseable or non-finite values all read as zero so that sparse or
/// partially-imported records still aggregate.
pub fn coerce_value(value: Option<&Value>) -> f64 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    if number.is_finite() { number } else { 0.0 }
}

/// Raw value for one item, clamped into `[0, allocation]`. Values above the
/// allocation count as the allocation; negatives count as zero.
pub fn item_score(values: Option<&RawValues>, item: &ItemDef) -> f64 {
    let raw = coerce_value(values.and_then(|v| v.get(item.key)));
    raw.clamp(0.0, f64::from(item.allocation))
}

/// Percentage of the item's allocation earned, always inside [0, 100].
pub fn item_percentage(values: Option<&RawValues>, item: &ItemDef) -> f64 {
    if item.allocation == 0 {
        return 0.0;
    }
    item_score(values, item) / f64::from(item.allocation) * 100.0
}

/// Sum of clamped scores for items whose category number falls in the
/// inclusive range. Zero when the record is absent or nothing matches.
pub fn category_range_sum(
    values: Option<&RawValues>,
    items: &[ItemDef],
    start: u32,
    end: u32,
) -> f64 {
    items
        .iter()
        .filter(|item| item.category >= start && item.category <= end)
        .map(|item| item_score(values, item))
        .sum()
}

/// Sum of clamped scores for one exact category.
pub fn category_sum(values: Option<&RawValues>, items: &[ItemDef], category: u32) -> f64 {
    category_range_sum(values, items, category, category)
}

/// Discipline total. A stored upstream total wins when present (it may carry
/// manual adjustments summation cannot see); otherwise the full item table is
/// summed. Gradation normalizes its raw sum onto the 0-100 scale, and time
/// derives its score from the total-duration band because its raw entries are
/// duration strings.
pub fn discipline_total(check: &SkillCheck, discipline: Discipline) -> f64 {
    let stored = match discipline {
        Discipline::Care => check.care_score,
        Discipline::OneColor => check.color_score,
        Discipline::Gradation => check.gradation_score,
        Discipline::Time => check.time_score,
    };
    if let Some(total) = stored {
        return total;
    }

    match discipline {
        Discipline::Care | Discipline::OneColor => {
            category_range_sum(Some(&check.values), discipline.items(), 0, u32::MAX)
        }
        Discipline::Gradation => {
            let raw = category_range_sum(Some(&check.values), discipline.items(), 0, u32::MAX);
            raw / GRADATION_RAW_MAX * 100.0
        }
        Discipline::Time => {
            let minutes = rank::parse_duration(check.total_time.as_deref());
            rank::time_band(minutes).map_or(0.0, |band| band.score)
        }
    }
}

/// Discipline total for ranking and trends: zero totals read as no data,
/// matching the "-" sentinel rather than a hard B.
pub fn discipline_score(check: &SkillCheck, discipline: Discipline) -> Option<f64> {
    let total = discipline_total(check, discipline);
    (total > 0.0).then_some(total)
}

/// Overall total across the scored disciplines (care, one color, time).
pub fn overall_total(check: &SkillCheck) -> f64 {
    if let Some(total) = check.total_score {
        return total;
    }
    discipline_total(check, Discipline::Care)
        + discipline_total(check, Discipline::OneColor)
        + discipline_total(check, Discipline::Time)
}

pub fn overall_score(check: &SkillCheck) -> Option<f64> {
    let total = overall_total(check);
    (total > 0.0).then_some(total)
}
