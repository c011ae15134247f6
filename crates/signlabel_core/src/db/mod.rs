//! Durable home of the append-only `labels` table.
//!
//! Every accepted submission becomes one row of `labels`
//! (`id`, `"user"`, `image`, `label`, `timestamp`); rows are only ever
//! inserted. Opening a database brings its schema up to the newest label
//! layout this build ships, or refuses a file written by a newer build.
//!
//! # Invariants
//! - The label layout version lives in `PRAGMA user_version`.
//! - The label store only sees connections whose migrations committed.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Failure to open or migrate a label database.
#[derive(Debug)]
pub enum DbError {
    /// SQLite refused a statement: unreadable file, locked past the busy
    /// timeout, or a failed `labels` DDL statement.
    Sqlite(rusqlite::Error),
    /// The file carries a label layout newer than this build can read.
    /// Nothing is migrated or rewritten in that case.
    UnsupportedSchemaVersion {
        /// `user_version` found in the file.
        db_version: u32,
        /// Newest layout bundled in [`migrations`].
        latest_supported: u32,
    },
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "label database error: {err}"),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "labels schema v{db_version} was written by a newer build (this build reads up to v{latest_supported})"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            return Some(err);
        }
        None
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
