//! SQLite staging table between the compute and render phases.
//!
//! The table has no key; rows are implicitly identified by
//! (date, age, areaName). Content is disposable and rebuilt on every run.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use rusqlite::{Connection, params};
use std::path::Path;
use tracing::{debug, info};

use crate::records::{AgeBand, GrowthRow};

pub struct StagingStore {
    conn: Connection,
    table: String,
}

impl StagingStore {
    /// Opens (or creates) the database file at `path`, creating its parent directory.
    pub fn open(path: impl AsRef<Path>, table: &str) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create '{}'", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open staging db '{}'", path.display()))?;
        Self::with_connection(conn, table)
    }

    pub fn open_in_memory(table: &str) -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?, table)
    }

    fn with_connection(conn: Connection, table: &str) -> Result<Self> {
        validate_table_name(table)?;
        Ok(Self {
            conn,
            table: table.to_string(),
        })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Drops and recreates the staging table.
    pub fn create(&self) -> Result<()> {
        self.conn.execute_batch(&format!(
            r#"
            DROP TABLE IF EXISTS {table};
            CREATE TABLE {table} (
              date          TEXT,
              age           TEXT,
              areaName      TEXT,
              cases         INTEGER,
              cases_ma_7day REAL
            );
            "#,
            table = self.table
        ))?;
        debug!(table = %self.table, "Staging table created");
        Ok(())
    }

    /// Appends `rows` in a single transaction and returns the number written.
    pub fn insert(&mut self, rows: &[GrowthRow]) -> Result<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {} (date, age, areaName, cases, cases_ma_7day) VALUES (?1, ?2, ?3, ?4, ?5)",
                self.table
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.date,
                    row.age_band.label(),
                    row.region,
                    row.cases,
                    row.growth_rate,
                ])?;
            }
        }
        tx.commit()?;

        info!(table = %self.table, rows = rows.len(), "Rows staged");
        Ok(rows.len())
    }

    /// Reads back every staged row, in no particular order.
    pub fn select_all(&self) -> Result<Vec<GrowthRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT date, age, areaName, cases, cases_ma_7day FROM {}",
            self.table
        ))?;

        let raw = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, NaiveDate>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i64>(3)?,
                    row.get::<_, Option<f64>>(4)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let rows = raw
            .into_iter()
            .map(|(date, age, region, cases, growth_rate)| {
                let age_band: AgeBand = age.parse()?;
                Ok(GrowthRow {
                    date,
                    age_band,
                    region,
                    cases,
                    growth_rate,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(table = %self.table, rows = rows.len(), "Staged rows loaded");
        Ok(rows)
    }
}

/// Table names are interpolated into SQL, so only plain identifiers are allowed.
fn validate_table_name(table: &str) -> Result<()> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if !valid {
        bail!("invalid staging table name '{table}'");
    }
    Ok(())
}
