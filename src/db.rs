use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

use crate::engine::Engine;
use crate::models::{days_before, DailySignal, RawSignal};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn ensure_user(pool: &PgPool, email: &str, display_name: &str) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO mindpulse.users (id, email, display_name)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE
        SET display_name = EXCLUDED.display_name
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(display_name)
    .fetch_one(pool)
    .await?
    .get("id");
    Ok(id)
}

pub async fn fetch_display_name(pool: &PgPool, email: &str) -> anyhow::Result<Option<String>> {
    let row = sqlx::query("SELECT display_name FROM mindpulse.users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
        .with_context(|| format!("failed to look up {email}"))?;
    Ok(row.map(|row| row.get("display_name")))
}

pub async fn fetch_history(pool: &PgPool, email: &str) -> anyhow::Result<Vec<DailySignal>> {
    let rows = sqlx::query(
        r#"
        SELECT s.day, s.mood, s.sleep_hours, s.stress_level, s.workload_hours, s.water_liters
        FROM mindpulse.daily_signals s
        JOIN mindpulse.users u ON u.id = s.user_id
        WHERE u.email = $1
        ORDER BY s.day
        "#,
    )
    .bind(email)
    .fetch_all(pool)
    .await
    .with_context(|| format!("failed to load history for {email}"))?;

    let mut signals = Vec::with_capacity(rows.len());
    for row in rows {
        signals.push(DailySignal {
            date: row.get("day"),
            mood: row.get("mood"),
            sleep_hours: row.get("sleep_hours"),
            stress_level: row.get("stress_level"),
            workload_hours: row.get("workload_hours"),
            water_liters: row.get("water_liters"),
        });
    }

    debug!(email, days = signals.len(), "fetched history");
    Ok(signals)
}

/// Last write wins on (user, day).
pub async fn upsert_signal(pool: &PgPool, user_id: Uuid, signal: &DailySignal) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO mindpulse.daily_signals
        (id, user_id, day, mood, sleep_hours, stress_level, workload_hours, water_liters)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (user_id, day) DO UPDATE
        SET mood = EXCLUDED.mood,
            sleep_hours = EXCLUDED.sleep_hours,
            stress_level = EXCLUDED.stress_level,
            workload_hours = EXCLUDED.workload_hours,
            water_liters = EXCLUDED.water_liters,
            updated_at = now()
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(signal.date)
    .bind(signal.mood)
    .bind(signal.sleep_hours)
    .bind(signal.stress_level)
    .bind(signal.workload_hours)
    .bind(signal.water_liters)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn seed(pool: &PgPool, engine: &mut Engine, today: NaiveDate) -> anyhow::Result<()> {
    let users = vec![
        ("avery.lee@mindpulse.app", "Avery Lee", [8.0, 2.0, 5.0, 7.0, 2.2], 0.0),
        ("jules.moreno@mindpulse.app", "Jules Moreno", [7.0, 4.0, 8.0, 6.0, 1.6], 0.35),
        ("kiara.patel@mindpulse.app", "Kiara Patel", [6.0, 6.0, 10.0, 4.0, 1.0], 0.6),
    ];

    for (email, name, [sleep, stress, workload, mood, water], drift) in users {
        let user_id = ensure_user(pool, email, name).await?;
        engine.load_history(email, fetch_history(pool, email).await?);

        for days_ago in (0..10i64).rev() {
            let date = days_before(today, days_ago);
            let strain = drift * (9 - days_ago) as f64;
            let raw = RawSignal {
                mood: Some(mood - strain * 0.5),
                sleep_hours: Some(sleep - strain * 0.4),
                stress_level: Some(stress + strain * 0.6),
                workload_hours: Some(workload + strain * 0.5),
                water_liters: Some(water - strain * 0.1),
            };
            let result = engine.submit_check_in(email, date, &raw)?;
            upsert_signal(pool, user_id, &result.signal).await?;
        }
    }

    Ok(())
}

/// Imports check-ins from CSV, scoring each row through the engine so
/// clamping and imputation match interactive check-ins.
pub async fn import_csv(
    pool: &PgPool,
    engine: &mut Engine,
    csv_path: &std::path::Path,
) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        email: String,
        display_name: Option<String>,
        day: NaiveDate,
        mood: Option<f64>,
        sleep_hours: Option<f64>,
        stress_level: Option<f64>,
        workload_hours: Option<f64>,
        water_liters: Option<f64>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut rows: Vec<CsvRow> = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        rows.push(result?);
    }
    // Oldest first so imputation sees earlier days of the same file.
    rows.sort_by(|a, b| a.email.cmp(&b.email).then(a.day.cmp(&b.day)));

    let mut imported = 0usize;
    let mut current: Option<(String, Uuid)> = None;

    for row in rows {
        let user_id = match &current {
            Some((email, id)) if *email == row.email => *id,
            _ => {
                let name = row.display_name.as_deref().unwrap_or(&row.email);
                let id = ensure_user(pool, &row.email, name).await?;
                engine.load_history(&row.email, fetch_history(pool, &row.email).await?);
                current = Some((row.email.clone(), id));
                id
            }
        };

        let raw = RawSignal {
            mood: row.mood,
            sleep_hours: row.sleep_hours,
            stress_level: row.stress_level,
            workload_hours: row.workload_hours,
            water_liters: row.water_liters,
        };
        let result = engine
            .submit_check_in(&row.email, row.day, &raw)
            .with_context(|| format!("row for {} on {}", row.email, row.day))?;
        upsert_signal(pool, user_id, &result.signal).await?;
        imported += 1;
    }

    info!(imported, path = %csv_path.display(), "csv import finished");
    Ok(imported)
}
