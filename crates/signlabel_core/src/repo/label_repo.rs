//! Label store contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide append and snapshot APIs over the `labels` table.
//! - Keep label/timestamp text encodings inside the persistence boundary.
//!
//! # Invariants
//! - `label` column holds a JSON array of category keys; a plain string is
//!   read back as a one-element set.
//! - Snapshots are returned in insertion (`id`) order.
//! - Read paths reject malformed rows instead of masking them: one bad row
//!   fails the whole snapshot with `InvalidData` naming the row id. Skipping
//!   it would undercount coverage and re-present completed images.

use crate::db::DbError;
use crate::model::label::{LabelEvent, LabelId, LabelValidationError, StoredLabel};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Page size used when streaming a full snapshot.
pub const SNAPSHOT_PAGE_SIZE: u32 = 1000;

const LABEL_SELECT_SQL: &str = "SELECT
    id,
    \"user\",
    image,
    label,
    timestamp
FROM labels";

pub type RepoResult<T> = Result<T, RepoError>;

/// Error for label persistence and snapshot operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(LabelValidationError),
    Db(DbError),
    InvalidData(String),
    /// Store backend could not be reached (worker stopped, remote down).
    Unavailable(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted label data: {message}"),
            Self::Unavailable(message) => write!(f, "label store unavailable: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::InvalidData(_) | Self::Unavailable(_) => None,
        }
    }
}

impl From<LabelValidationError> for RepoError {
    fn from(value: LabelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Append-only label store.
///
/// Implementations may be backed by an embedded table or a hosted store;
/// callers only rely on append plus ordered snapshot reads.
pub trait LabelStore {
    /// Appends one event and returns its assigned id.
    fn insert(&self, event: &LabelEvent) -> RepoResult<LabelId>;
    /// Total number of stored events.
    fn count(&self) -> RepoResult<u64>;
    /// Reads one page of events in id order.
    fn select_page(&self, offset: u64, limit: u32) -> RepoResult<Vec<StoredLabel>>;

    /// Reads every event in id order, page by page.
    fn select_all(&self) -> RepoResult<Vec<StoredLabel>> {
        let mut rows = Vec::new();
        loop {
            let page = self.select_page(rows.len() as u64, SNAPSHOT_PAGE_SIZE)?;
            let page_len = page.len();
            rows.extend(page);
            if page_len < SNAPSHOT_PAGE_SIZE as usize {
                return Ok(rows);
            }
        }
    }
}

/// SQLite-backed label store owning its connection.
pub struct SqliteLabelStore {
    conn: Connection,
}

impl SqliteLabelStore {
    /// Wraps a migrated connection, verifying the `labels` table exists.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'labels'
            );",
            [],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(RepoError::InvalidData(
                "labels table is missing; open the database with open_db".to_string(),
            ));
        }
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl LabelStore for SqliteLabelStore {
    fn insert(&self, event: &LabelEvent) -> RepoResult<LabelId> {
        event.validate()?;

        self.conn.execute(
            "INSERT INTO labels (\"user\", image, label, timestamp)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                event.user.as_str(),
                event.image.as_str(),
                encode_categories(&event.categories)?,
                event.timestamp_text(),
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn count(&self) -> RepoResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM labels;", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn select_page(&self, offset: u64, limit: u32) -> RepoResult<Vec<StoredLabel>> {
        let offset = i64::try_from(offset)
            .map_err(|_| RepoError::InvalidData(format!("page offset {offset} out of range")))?;
        let mut stmt = self.conn.prepare(&format!(
            "{LABEL_SELECT_SQL}
             ORDER BY id ASC
             LIMIT ?1 OFFSET ?2;"
        ))?;

        let mut rows = stmt.query(params![i64::from(limit), offset])?;
        let mut labels = Vec::new();
        while let Some(row) = rows.next()? {
            labels.push(parse_label_row(row)?);
        }
        Ok(labels)
    }
}

fn parse_label_row(row: &Row<'_>) -> RepoResult<StoredLabel> {
    let id: LabelId = row.get("id")?;
    let label_text: String = row.get("label")?;
    let timestamp_text: String = row.get("timestamp")?;

    let decoded = decode_categories(&label_text)
        .and_then(|categories| Ok((categories, parse_timestamp(&timestamp_text)?)));
    let (categories, timestamp) = match decoded {
        Ok(parts) => parts,
        Err(RepoError::InvalidData(message)) => {
            return Err(RepoError::InvalidData(format!("labels row id {id}: {message}")))
        }
        Err(err) => return Err(err),
    };

    let event = LabelEvent {
        user: row.get("user")?,
        image: row.get("image")?,
        categories,
        timestamp,
    };
    event.validate()?;

    Ok(StoredLabel { id, event })
}

/// Encodes a category set as a JSON array.
pub fn encode_categories(categories: &BTreeSet<String>) -> RepoResult<String> {
    serde_json::to_string(categories)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode categories: {err}")))
}

/// Decodes the `label` column.
///
/// Accepts a JSON array of keys, or a bare key written by single-label
/// deployments. An empty string is an empty set.
pub fn decode_categories(value: &str) -> RepoResult<BTreeSet<String>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(BTreeSet::new());
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str::<BTreeSet<String>>(trimmed).map_err(|err| {
            RepoError::InvalidData(format!("invalid label value `{value}` in labels.label: {err}"))
        });
    }
    Ok(BTreeSet::from([trimmed.to_string()]))
}

/// Parses RFC 3339 text; naive ISO-8601 text is taken as UTC.
pub fn parse_timestamp(value: &str) -> RepoResult<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid timestamp `{value}` in labels.timestamp"
            ))
        })
}
