//! SQLite storage bootstrap for the material catalog.
//!
//! # Responsibility
//! - Open and configure SQLite connections for catalog and project storage.
//! - Apply schema migrations in deterministic order.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - Repositories must not touch catalog tables before migrations succeed.
//! - Rendered errors stay short; statement text is never echoed in full.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;

pub use open::{open_db, open_db_in_memory};

pub type DbResult<T> = Result<T, DbError>;

/// Longest SQLite message rendered by `DbError`'s `Display`.
const MAX_RENDERED_MESSAGE_CHARS: usize = 160;

/// Storage bootstrap and transport error.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// A registered migration failed; the schema is left at its prior version.
    Migration {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },
    /// Database was written by a newer binary.
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}

impl DbError {
    /// Underlying SQLite error, when there is one.
    pub fn sqlite_error(&self) -> Option<&rusqlite::Error> {
        match self {
            Self::Sqlite(err) | Self::Migration { source: err, .. } => Some(err),
            Self::UnsupportedSchemaVersion { .. } => None,
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "catalog storage error: {}", bounded_message(err)),
            Self::Migration {
                version,
                name,
                source,
            } => write!(
                f,
                "catalog migration {version} ({name}) failed: {}",
                bounded_message(source)
            ),
            Self::UnsupportedSchemaVersion {
                db_version,
                latest_supported,
            } => write!(
                f,
                "catalog schema version {db_version} is newer than supported {latest_supported}"
            ),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.sqlite_error().map(|err| err as &(dyn Error + 'static))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

/// Renders a SQLite error, cut after `MAX_RENDERED_MESSAGE_CHARS`.
///
/// Some SQLite messages embed the offending statement, which for bulk id
/// lookups can run to thousands of placeholders.
fn bounded_message(err: &rusqlite::Error) -> String {
    let message = err.to_string();
    match message.char_indices().nth(MAX_RENDERED_MESSAGE_CHARS) {
        Some((cut, _)) => format!("{}...", &message[..cut]),
        None => message,
    }
}
