//! Persistent per-class color counts, stored in a local SQLite file.
//!
//! Rows are keyed by `(class_label, red, green, blue)`. A first observation
//! inserts `similar_count = 1`, every later identical observation increments it.
//! Nothing here ever deletes a row.

use std::path::Path;

use anyhow::{Context, Result};
use inference_common::color::{ColorObservation, Rgb};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use tokio::runtime::Runtime;

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS color_records (
        class_label   TEXT    NOT NULL,
        red           INTEGER NOT NULL CHECK (red BETWEEN 0 AND 255),
        green         INTEGER NOT NULL CHECK (green BETWEEN 0 AND 255),
        blue          INTEGER NOT NULL CHECK (blue BETWEEN 0 AND 255),
        similar_count INTEGER NOT NULL DEFAULT 1 CHECK (similar_count >= 1),
        PRIMARY KEY (class_label, red, green, blue)
    )
"#;

const UPSERT: &str = r#"
    INSERT INTO color_records (class_label, red, green, blue, similar_count)
    VALUES (?1, ?2, ?3, ?4, 1)
    ON CONFLICT (class_label, red, green, blue) DO UPDATE
    SET similar_count = similar_count + 1
    RETURNING similar_count
"#;

/// One persisted row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorRecord {
    pub class_label: String,
    pub color: Rgb,
    pub similar_count: i64,
}

#[derive(Debug, FromRow)]
struct ColorRow {
    class_label: String,
    red: i64,
    green: i64,
    blue: i64,
    similar_count: i64,
}

impl TryFrom<ColorRow> for ColorRecord {
    type Error = anyhow::Error;

    fn try_from(row: ColorRow) -> Result<Self> {
        let channel = |v: i64| u8::try_from(v).with_context(|| format!("color channel {v} out of range"));
        Ok(Self {
            color: Rgb::new(channel(row.red)?, channel(row.green)?, channel(row.blue)?),
            class_label: row.class_label,
            similar_count: row.similar_count,
        })
    }
}

/// Synchronous handle to the color table.
///
/// sqlx is async only, so the handle owns a current-thread runtime and blocks on
/// each statement. Every statement commits on its own.
pub struct ColorDatabase {
    runtime: Runtime,
    pool: SqlitePool,
}

impl ColorDatabase {
    /// Opens the database file, creating it and the table when absent.
    pub fn open(path: &Path) -> Result<Self> {
        log::info!("Opening color database {path:?}");

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to start database runtime")?;

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = runtime
            .block_on(
                SqlitePoolOptions::new()
                    .max_connections(1)
                    .connect_with(options),
            )
            .with_context(|| format!("Failed to open color database {path:?}"))?;

        let db = Self { runtime, pool };
        db.create_schema()?;
        Ok(db)
    }

    fn create_schema(&self) -> Result<()> {
        self.runtime
            .block_on(sqlx::query(CREATE_TABLE).execute(&self.pool))
            .context("Failed to create color_records table")?;
        Ok(())
    }

    /// Upserts one observation in a single statement and returns the row as stored.
    pub fn record(&self, observation: &ColorObservation) -> Result<ColorRecord> {
        let Rgb { r, g, b } = observation.dominant_color;

        let similar_count: i64 = self
            .runtime
            .block_on(
                sqlx::query_scalar(UPSERT)
                    .bind(&observation.class_label)
                    .bind(i64::from(r))
                    .bind(i64::from(g))
                    .bind(i64::from(b))
                    .fetch_one(&self.pool),
            )
            .with_context(|| {
                format!(
                    "Failed to record {} {}",
                    observation.class_label, observation.dominant_color
                )
            })?;
        log::debug!(
            "{} {} -> similar_count {similar_count}",
            observation.class_label,
            observation.dominant_color
        );

        Ok(ColorRecord {
            class_label: observation.class_label.clone(),
            color: observation.dominant_color,
            similar_count,
        })
    }

    /// Current count for one class + color, `None` if never observed.
    pub fn count(&self, class_label: &str, color: Rgb) -> Result<Option<i64>> {
        let count = self
            .runtime
            .block_on(
                sqlx::query_scalar(
                    r#"
                    SELECT similar_count FROM color_records
                    WHERE class_label = ?1 AND red = ?2 AND green = ?3 AND blue = ?4
                    "#,
                )
                .bind(class_label)
                .bind(i64::from(color.r))
                .bind(i64::from(color.g))
                .bind(i64::from(color.b))
                .fetch_optional(&self.pool),
            )
            .context("Failed to fetch color count")?;
        Ok(count)
    }

    /// Every row, ordered by class label then color.
    pub fn records(&self) -> Result<Vec<ColorRecord>> {
        let rows = self
            .runtime
            .block_on(
                sqlx::query_as::<_, ColorRow>(
                    r#"
                    SELECT class_label, red, green, blue, similar_count
                    FROM color_records
                    ORDER BY class_label, red, green, blue
                    "#,
                )
                .fetch_all(&self.pool),
            )
            .context("Failed to fetch color records")?;

        rows.into_iter().map(ColorRecord::try_from).collect()
    }
}

impl Drop for ColorDatabase {
    fn drop(&mut self) {
        self.runtime.block_on(self.pool.close());
    }
}
