use std::collections::HashSet;
use std::io::Read;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::catalog;
use crate::models::{Customer, SkillCheck};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let customers = vec![
        (
            Uuid::parse_str("7b1d2c64-5a0e-4f7d-9b58-0f6f2f1c9a01")?,
            "C-1041",
            "Mika Sato",
            "in progress",
        ),
        (
            Uuid::parse_str("c2f4a9e8-13b6-47d0-8a2e-6d9e5b24cc02")?,
            "C-1058",
            "Rin Hayashi",
            "new",
        ),
    ];

    for (id, number, name, status) in &customers {
        sqlx::query(
            r#"
            INSERT INTO skillcheck.customers (id, customer_number, name, status)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (customer_number) DO UPDATE
            SET name = EXCLUDED.name, status = EXCLUDED.status
            "#,
        )
        .bind(id)
        .bind(number)
        .bind(name)
        .bind(status)
        .execute(pool)
        .await?;
    }

    let checks = vec![
        (
            "seed-1041-a",
            "C-1041",
            NaiveDate::from_ymd_opt(2026, 5, 12).context("invalid date")?,
            0.6,
            "92 minutes 10 seconds",
        ),
        (
            "seed-1041-b",
            "C-1041",
            NaiveDate::from_ymd_opt(2026, 7, 3).context("invalid date")?,
            0.8,
            "83 minutes 40 seconds",
        ),
        (
            "seed-1058-a",
            "C-1058",
            NaiveDate::from_ymd_opt(2026, 6, 20).context("invalid date")?,
            0.5,
            "97 minutes 00 seconds",
        ),
    ];

    for (source_key, number, date, fraction, total_time) in checks {
        let customer_id: Uuid =
            sqlx::query("SELECT id FROM skillcheck.customers WHERE customer_number = $1")
                .bind(number)
                .fetch_one(pool)
                .await?
                .get("id");

        let recorded_at = date.and_hms_opt(10, 0, 0).context("invalid time")?.and_utc();
        sqlx::query(
            r#"
            INSERT INTO skillcheck.skill_checks
            (id, customer_id, recorded_at, item_values, total_time, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(customer_id)
        .bind(recorded_at)
        .bind(Value::Object(seed_values(fraction)))
        .bind(total_time)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

/// Seed fixture: every score item at a flat fraction of its allocation, every
/// timed phase a little over its target.
fn seed_values(fraction: f64) -> serde_json::Map<String, Value> {
    let mut values = serde_json::Map::new();
    for item in catalog::all_items() {
        match item.target_minutes {
            Some(target) => {
                let minutes = (target / fraction).round() as u32;
                values.insert(
                    item.key.to_string(),
                    json!(format!("{minutes} minutes 00 seconds")),
                );
            }
            None => {
                let score = (f64::from(item.allocation) * fraction).floor();
                values.insert(item.key.to_string(), json!(score));
            }
        }
    }
    values
}

pub async fn fetch_customer(pool: &PgPool, number: &str) -> anyhow::Result<Option<Customer>> {
    let row = sqlx::query(
        r#"
        SELECT id, customer_number, name, age, prefecture, occupation,
               experience, application_date, status
        FROM skillcheck.customers
        WHERE customer_number = $1
        "#,
    )
    .bind(number)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|row| Customer {
        id: row.get("id"),
        customer_number: row.get("customer_number"),
        name: row.get("name"),
        age: row.get("age"),
        prefecture: row.get("prefecture"),
        occupation: row.get("occupation"),
        experience: row.get("experience"),
        application_date: row.get("application_date"),
        status: row.get("status"),
    }))
}

/// All checks for one customer, newest first. The first element is the
/// current check and the second the previous one for trend comparison.
pub async fn fetch_checks(pool: &PgPool, customer_id: Uuid) -> anyhow::Result<Vec<SkillCheck>> {
    let rows = sqlx::query(
        r#"
        SELECT id, customer_id, recorded_at, item_values, care_score, color_score,
               gradation_score, time_score, total_score, total_time, rank
        FROM skillcheck.skill_checks
        WHERE customer_id = $1
        ORDER BY recorded_at DESC
        "#,
    )
    .bind(customer_id)
    .fetch_all(pool)
    .await?;

    let mut checks = Vec::new();
    for row in rows {
        let item_values: Value = row.get("item_values");
        checks.push(SkillCheck {
            id: row.get("id"),
            customer_id: row.get("customer_id"),
            recorded_at: row.get("recorded_at"),
            values: item_values.as_object().cloned().unwrap_or_default(),
            care_score: row.get("care_score"),
            color_score: row.get("color_score"),
            gradation_score: row.get("gradation_score"),
            time_score: row.get("time_score"),
            total_score: row.get("total_score"),
            total_time: row.get("total_time"),
            rank: row.get("rank"),
        });
    }

    Ok(checks)
}

/// One parsed CSV row: customer metadata plus the flat item-key mapping.
#[derive(Debug, Clone)]
pub struct CsvCheckRow {
    pub customer_number: String,
    pub name: String,
    pub age: Option<i32>,
    pub prefecture: Option<String>,
    pub occupation: Option<String>,
    pub experience: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub recorded_at: Option<DateTime<Utc>>,
    pub care_score: Option<f64>,
    pub color_score: Option<f64>,
    pub gradation_score: Option<f64>,
    pub time_score: Option<f64>,
    pub total_score: Option<f64>,
    pub total_time: Option<String>,
    pub rank: Option<String>,
    pub source_key: Option<String>,
    pub values: serde_json::Map<String, Value>,
}

/// Reads the import CSV. Metadata columns are matched by name; any column
/// named like a catalog key lands in the item-value mapping (numbers where
/// they parse, raw strings otherwise, so durations survive intact). Unknown
/// columns are ignored and rows without a customer number are skipped.
/// Returns the parsed rows and the skipped-row count.
pub fn parse_csv(input: impl Read) -> anyhow::Result<(Vec<CsvCheckRow>, usize)> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader
        .headers()
        .context("CSV is missing a header row")?
        .clone();
    let item_keys: HashSet<&'static str> = catalog::all_items().map(|item| item.key).collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = record?;
        let field = |name: &str| field(&headers, &record, name);

        let Some(customer_number) = field("customer_number") else {
            skipped += 1;
            continue;
        };

        let mut values = serde_json::Map::new();
        for (header, raw) in headers.iter().zip(record.iter()) {
            let raw = raw.trim();
            if raw.is_empty() || !item_keys.contains(header) {
                continue;
            }
            match raw.parse::<f64>() {
                Ok(number) => values.insert(header.to_string(), json!(number)),
                Err(_) => values.insert(header.to_string(), json!(raw)),
            };
        }

        rows.push(CsvCheckRow {
            customer_number: customer_number.to_string(),
            name: field("name").unwrap_or(customer_number).to_string(),
            age: field("age").and_then(|v| v.parse().ok()),
            prefecture: field("prefecture").map(str::to_string),
            occupation: field("occupation").map(str::to_string),
            experience: field("experience").map(str::to_string),
            application_date: field("application_date").and_then(parse_date),
            recorded_at: field("recorded_at").and_then(parse_timestamp),
            care_score: field("care_score").and_then(|v| v.parse().ok()),
            color_score: field("color_score").and_then(|v| v.parse().ok()),
            gradation_score: field("gradation_score").and_then(|v| v.parse().ok()),
            time_score: field("time_score").and_then(|v| v.parse().ok()),
            total_score: field("total_score").and_then(|v| v.parse().ok()),
            total_time: field("total_time").map(str::to_string),
            rank: field("rank").map(str::to_string),
            source_key: field("source_key").map(str::to_string),
            values,
        });
    }

    Ok((rows, skipped))
}

/// Trimmed, non-empty value of a named column in one CSV record.
fn field<'a>(
    headers: &csv::StringRecord,
    record: &'a csv::StringRecord,
    name: &str,
) -> Option<&'a str> {
    headers
        .iter()
        .position(|h| h == name)
        .and_then(|i| record.get(i))
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Some(timestamp.with_timezone(&Utc));
    }
    parse_date(value).and_then(|date| Some(date.and_hms_opt(0, 0, 0)?.and_utc()))
}

/// Imports skill checks from a CSV file: upserts each customer by number and
/// appends the check, keyed for idempotent re-import. Returns the number of
/// checks inserted.
pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let (rows, skipped) = parse_csv(file)?;
    if skipped > 0 {
        println!("Skipped {skipped} rows without a customer_number.");
    }

    let mut inserted = 0usize;
    for row in rows {
        let customer_id: Uuid = sqlx::query(
            r#"
            INSERT INTO skillcheck.customers
            (id, customer_number, name, age, prefecture, occupation,
             experience, application_date, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'new')
            ON CONFLICT (customer_number) DO UPDATE
            SET name = EXCLUDED.name,
                age = COALESCE(EXCLUDED.age, skillcheck.customers.age),
                prefecture = COALESCE(EXCLUDED.prefecture, skillcheck.customers.prefecture),
                occupation = COALESCE(EXCLUDED.occupation, skillcheck.customers.occupation),
                experience = COALESCE(EXCLUDED.experience, skillcheck.customers.experience)
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.customer_number)
        .bind(&row.name)
        .bind(row.age)
        .bind(&row.prefecture)
        .bind(&row.occupation)
        .bind(&row.experience)
        .bind(row.application_date)
        .fetch_one(pool)
        .await?
        .get("id");

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));
        let recorded_at = row.recorded_at.unwrap_or_else(Utc::now);

        let result = sqlx::query(
            r#"
            INSERT INTO skillcheck.skill_checks
            (id, customer_id, recorded_at, item_values, care_score, color_score,
             gradation_score, time_score, total_score, total_time, rank, source_key)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(customer_id)
        .bind(recorded_at)
        .bind(Value::Object(row.values))
        .bind(row.care_score)
        .bind(row.color_score)
        .bind(row.gradation_score)
        .bind(row.time_score)
        .bind(row.total_score)
        .bind(&row.total_time)
        .bind(&row.rank)
        .bind(&source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_rows_map_item_columns_by_catalog_key() {
        let csv = "\
customer_number,name,care_4_1,time_33,mystery,total_time,care_score
C-7,Aoi Tanaka,18,21 minutes 30 seconds,999,82:15,\n";
        let (rows, skipped) = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(skipped, 0);
        assert_eq!(rows.len(), 1);

        let row = &rows[0];
        assert_eq!(row.customer_number, "C-7");
        assert_eq!(row.values.get("care_4_1"), Some(&json!(18.0)));
        assert_eq!(
            row.values.get("time_33"),
            Some(&json!("21 minutes 30 seconds"))
        );
        assert!(row.values.get("mystery").is_none());
        assert_eq!(row.total_time.as_deref(), Some("82:15"));
        assert_eq!(row.care_score, None);
    }

    #[test]
    fn rows_without_customer_number_are_skipped() {
        let csv = "\
customer_number,name,care_4_1
,No Number,10
C-8,Yui Mori,12\n";
        let (rows, skipped) = parse_csv(csv.as_bytes()).unwrap();
        assert_eq!(skipped, 1);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].customer_number, "C-8");
    }

    #[test]
    fn metadata_dates_parse_both_forms() {
        let csv = "\
customer_number,application_date,recorded_at
C-9,2026-04-01,2026-07-03T10:00:00Z\n";
        let (rows, _) = parse_csv(csv.as_bytes()).unwrap();
        let row = &rows[0];
        assert_eq!(row.application_date, NaiveDate::from_ymd_opt(2026, 4, 1));
        assert_eq!(
            row.recorded_at,
            Some(
                NaiveDate::from_ymd_opt(2026, 7, 3)
                    .unwrap()
                    .and_hms_opt(10, 0, 0)
                    .unwrap()
                    .and_utc()
            )
        );
    }

    #[test]
    fn seed_values_cover_every_item() {
        let values = seed_values(0.75);
        assert_eq!(values.len(), catalog::all_items().count());
        assert!(values.get("time_33").and_then(Value::as_str).is_some());
        assert!(values.get("care_1_1").and_then(Value::as_f64).is_some());
    }
}
