// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Database schema and migrations.

use rusqlite::{Connection, OptionalExtension};

use crate::db::tables;
use crate::error::Result;

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the database schema, migrating older versions.
pub fn initialize(conn: &Connection) -> Result<()> {
    let version = schema_version(conn)?;

    if version == 0 {
        create_schema_v1(conn)?;
        set_schema_version(conn, SCHEMA_VERSION)?;
    } else if version < SCHEMA_VERSION {
        migrate(conn, version)?;
    } else if version > SCHEMA_VERSION {
        tracing::warn!(
            found = version,
            supported = SCHEMA_VERSION,
            "Database was written by a newer version"
        );
    }

    Ok(())
}

fn schema_version(conn: &Connection) -> Result<i32> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [tables::SCHEMA_VERSION],
        |row| row.get(0),
    )?;

    if !exists {
        return Ok(0);
    }

    let version = conn
        .query_row("SELECT version FROM schema_version WHERE id = 1", [], |row| {
            row.get(0)
        })
        .optional()?;

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO schema_version (id, version) VALUES (1, ?1)",
        [version],
    )?;
    Ok(())
}

fn create_schema_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS activities (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            type TEXT NOT NULL,
            start_date TEXT NOT NULL,
            start_date_local TEXT NOT NULL,
            distance REAL NOT NULL,
            moving_time INTEGER NOT NULL,
            elapsed_time INTEGER NOT NULL,
            total_elevation_gain REAL NOT NULL,
            average_speed REAL NOT NULL,
            summary_polyline TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_activities_start_date
            ON activities(start_date);
        CREATE INDEX IF NOT EXISTS idx_activities_start_date_local
            ON activities(start_date_local);
        "#,
    )?;

    tracing::debug!(version = SCHEMA_VERSION, "Created database schema");
    Ok(())
}

fn migrate(conn: &Connection, from: i32) -> Result<()> {
    tracing::info!(from, to = SCHEMA_VERSION, "Migrating database schema");
    // Version 1 is the first released schema; later versions add steps here.
    set_schema_version(conn, SCHEMA_VERSION)
}
