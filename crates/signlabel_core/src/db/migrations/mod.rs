//! Versioned layouts of the `labels` table.
//!
//! Version 1 creates `labels` with its image and user indexes; the coverage
//! snapshot reads that table in `id` order. Later layouts append here with
//! the next version number.
//!
//! # Invariants
//! - Versions ascend without gaps, starting at 1.
//! - A layout and its `user_version` bump commit in the same transaction.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// `(user_version, DDL)` per label layout.
const LABEL_LAYOUTS: &[(u32, &str)] = &[(1, include_str!("0001_labels.sql"))];

/// Newest label layout this build can create and read.
pub fn latest_version() -> u32 {
    LABEL_LAYOUTS.last().map_or(0, |(version, _)| *version)
}

/// Brings `conn` to [`latest_version`], refusing files from newer builds.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();
    if found > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: latest,
        });
    }

    let pending: Vec<_> = LABEL_LAYOUTS
        .iter()
        .filter(|(version, _)| *version > found)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, ddl) in pending {
        tx.execute_batch(ddl)?;
        tx.pragma_update(None, "user_version", version)?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={latest}");
    Ok(())
}
