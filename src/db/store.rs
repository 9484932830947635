// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! SQLite activity store with typed operations.
//!
//! Writes only happen inside a [`StoreTransaction`], so a sync pass becomes
//! durable as one unit when it commits, and leaves no trace when it does not.

use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::schema;
use crate::error::{AppError, Result};
use crate::models::ActivityRecord;
use crate::time_utils::{format_utc_rfc3339, parse_utc_rfc3339};

const SELECT_COLUMNS: &str = "SELECT id, name, type, start_date, start_date_local, distance,
        moving_time, elapsed_time, total_elevation_gain, average_speed, summary_polyline
     FROM activities";

/// Local activity database.
pub struct ActivityStore {
    conn: Connection,
}

impl ActivityStore {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    AppError::Database(format!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        tracing::info!(path = %path.display(), "Opening activity database");
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Begin a write transaction. Dropping it without `commit` rolls back.
    pub fn transaction(&mut self) -> Result<StoreTransaction<'_>> {
        Ok(StoreTransaction {
            tx: self.conn.transaction()?,
        })
    }

    /// Most recent `start_date` among stored activities.
    pub fn max_start_date(&self) -> Result<Option<DateTime<Utc>>> {
        let max: Option<String> =
            self.conn
                .query_row("SELECT MAX(start_date) FROM activities", [], |row| {
                    row.get(0)
                })?;

        max.map(|value| {
            parse_utc_rfc3339(&value).map_err(|e| {
                AppError::Database(format!("Invalid stored start_date {:?}: {}", value, e))
            })
        })
        .transpose()
    }

    /// All activities, ascending by local start time.
    pub fn ordered_by_local_date(&self) -> Result<Vec<ActivityRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY start_date_local, id"))?;

        let records = stmt
            .query_map([], read_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }

    /// Get an activity by ID.
    pub fn get(&self, id: i64) -> Result<Option<ActivityRecord>> {
        let record = self
            .conn
            .query_row(&format!("{SELECT_COLUMNS} WHERE id = ?1"), [id], read_record)
            .optional()?;
        Ok(record)
    }

    /// Number of stored activities.
    pub fn count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM activities", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

/// Pending writes of one sync pass.
pub struct StoreTransaction<'a> {
    tx: rusqlite::Transaction<'a>,
}

impl StoreTransaction<'_> {
    /// Insert the record, or overwrite every field of the stored one.
    ///
    /// Returns `true` when the ID was not stored before.
    pub fn upsert(&self, record: &ActivityRecord) -> Result<bool> {
        let exists: bool = self.tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM activities WHERE id = ?1)",
            [record.id],
            |row| row.get(0),
        )?;

        self.tx.execute(
            "INSERT INTO activities (id, name, type, start_date, start_date_local, distance,
                 moving_time, elapsed_time, total_elevation_gain, average_speed, summary_polyline)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                type = excluded.type,
                start_date = excluded.start_date,
                start_date_local = excluded.start_date_local,
                distance = excluded.distance,
                moving_time = excluded.moving_time,
                elapsed_time = excluded.elapsed_time,
                total_elevation_gain = excluded.total_elevation_gain,
                average_speed = excluded.average_speed,
                summary_polyline = excluded.summary_polyline",
            params![
                record.id,
                record.name,
                record.activity_type,
                format_utc_rfc3339(record.start_date),
                record.start_date_local,
                record.distance,
                record.moving_time,
                record.elapsed_time,
                record.total_elevation_gain,
                record.average_speed,
                record.summary_polyline,
            ],
        )?;

        Ok(!exists)
    }

    /// Make every upsert of this transaction durable.
    pub fn commit(self) -> Result<()> {
        self.tx.commit()?;
        Ok(())
    }

    /// Discard every upsert of this transaction.
    pub fn rollback(self) -> Result<()> {
        self.tx.rollback()?;
        Ok(())
    }
}

fn read_record(row: &Row<'_>) -> rusqlite::Result<ActivityRecord> {
    let start_date: String = row.get(3)?;
    let start_date = parse_utc_rfc3339(&start_date).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ActivityRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        activity_type: row.get(2)?,
        start_date,
        start_date_local: row.get(4)?,
        distance: row.get(5)?,
        moving_time: row.get(6)?,
        elapsed_time: row.get(7)?,
        total_elevation_gain: row.get(8)?,
        average_speed: row.get(9)?,
        summary_polyline: row.get(10)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(id: i64, local: &str) -> ActivityRecord {
        ActivityRecord {
            id,
            name: format!("Activity {}", id),
            activity_type: "Run".to_string(),
            start_date: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
                + chrono::Duration::days(id),
            start_date_local: local.to_string(),
            distance: 5000.0,
            moving_time: 1500,
            elapsed_time: 1600,
            total_elevation_gain: 10.0,
            average_speed: 5000.0 / 1500.0,
            summary_polyline: None,
        }
    }

    #[test]
    fn test_open_in_memory_is_empty() {
        let store = ActivityStore::open_in_memory().unwrap();
        assert_eq!(store.count().unwrap(), 0);
        assert!(store.max_start_date().unwrap().is_none());
        assert!(store.ordered_by_local_date().unwrap().is_empty());
    }

    #[test]
    fn test_upsert_overwrites_all_fields() {
        let mut store = ActivityStore::open_in_memory().unwrap();

        let tx = store.transaction().unwrap();
        assert!(tx.upsert(&record(1, "2024-01-02 07:00:00")).unwrap());
        tx.commit().unwrap();

        let mut changed = record(1, "2024-01-02 08:30:00");
        changed.name = "Renamed".to_string();
        changed.activity_type = "Ride".to_string();
        changed.summary_polyline = Some("abc".to_string());

        let tx = store.transaction().unwrap();
        assert!(!tx.upsert(&changed).unwrap());
        tx.commit().unwrap();

        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.get(1).unwrap(), Some(changed));
    }

    #[test]
    fn test_ordered_by_local_date() {
        let mut store = ActivityStore::open_in_memory().unwrap();
        let tx = store.transaction().unwrap();
        tx.upsert(&record(1, "2024-01-03 07:00:00")).unwrap();
        tx.upsert(&record(2, "2024-01-01 18:00:00")).unwrap();
        tx.upsert(&record(3, "2024-01-02 06:00:00")).unwrap();
        tx.commit().unwrap();

        let ids: Vec<i64> = store
            .ordered_by_local_date()
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_max_start_date() {
        let mut store = ActivityStore::open_in_memory().unwrap();
        let tx = store.transaction().unwrap();
        tx.upsert(&record(5, "2024-01-06 07:00:00")).unwrap();
        tx.upsert(&record(2, "2024-01-03 07:00:00")).unwrap();
        tx.commit().unwrap();

        assert_eq!(
            store.max_start_date().unwrap(),
            Some(Utc.with_ymd_and_hms(2024, 1, 6, 12, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_dropped_transaction_rolls_back() {
        let mut store = ActivityStore::open_in_memory().unwrap();
        {
            let tx = store.transaction().unwrap();
            tx.upsert(&record(1, "2024-01-02 07:00:00")).unwrap();
        }
        assert_eq!(store.count().unwrap(), 0);
    }
}
