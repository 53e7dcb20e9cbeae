//! Database handles and key encoding shared by the stores.

use std::path::Path;

use chrono::{DateTime, Utc};
use redb::backends::InMemoryBackend;
use redb::{Database, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Result};

/// Every table maps a string key to a JSON row.
pub(crate) type JsonTable = TableDefinition<'static, &'static str, &'static str>;

/// Separator between composite key segments. Sorts below every printable
/// character, so a prefix scan never runs into a longer id.
pub(crate) const SEP: char = '\0';
const SEP_END: char = '\u{1}';

/// Open (or create) `file` under `dir` and make sure `tables` exist.
pub(crate) fn open_file(
    dir: &Path,
    file: &str,
    tables: &[JsonTable],
) -> Result<Database> {
    std::fs::create_dir_all(dir)?;
    let db = Database::create(dir.join(file))
        .map_err(|e| Error::Storage(format!("Failed to open {}: {}", file, e)))?;
    create_tables(&db, tables)?;
    Ok(db)
}

/// Create a database that lives only in memory.
pub(crate) fn open_memory(tables: &[JsonTable]) -> Result<Database> {
    let db = Database::builder()
        .create_with_backend(InMemoryBackend::new())
        .map_err(|e| Error::Storage(format!("Failed to create in-memory database: {}", e)))?;
    create_tables(&db, tables)?;
    Ok(db)
}

fn create_tables(db: &Database, tables: &[JsonTable]) -> Result<()> {
    let write_txn = db.begin_write()?;
    for table in tables {
        write_txn.open_table(*table)?;
    }
    write_txn.commit()?;
    Ok(())
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub(crate) fn from_json<T: DeserializeOwned>(json: &str) -> Result<T> {
    Ok(serde_json::from_str(json)?)
}

/// Read and decode one row.
pub(crate) fn get_row<T, R>(table: &R, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<&'static str, &'static str>,
{
    match table.get(key)? {
        Some(value) => Ok(Some(from_json(value.value())?)),
        None => Ok(None),
    }
}

/// Decode every row in a table.
pub(crate) fn all_rows<T, R>(table: &R) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<&'static str, &'static str>,
{
    let mut rows = Vec::new();
    for entry in table.iter()? {
        let (_, value) = entry?;
        rows.push(from_json(value.value())?);
    }
    Ok(rows)
}

/// Reject ids that would break composite keys.
pub(crate) fn check_key_segment(kind: &str, value: &str) -> Result<()> {
    if value.is_empty() || value.contains(SEP) || value.contains(SEP_END) {
        return Err(Error::InvalidInput(format!("invalid {} id: {:?}", kind, value)));
    }
    Ok(())
}

/// Join segments into a composite key.
pub(crate) fn key(segments: &[&str]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i > 0 {
            out.push(SEP);
        }
        out.push_str(segment);
    }
    out
}

/// Half-open bounds covering every key that starts with `segments`.
pub(crate) fn prefix_bounds(segments: &[&str]) -> (String, String) {
    let base = key(segments);
    let mut start = base.clone();
    start.push(SEP);
    let mut end = base;
    end.push(SEP_END);
    (start, end)
}

/// Fixed-width, lexically ordered timestamp segment.
pub(crate) fn time_segment(at: &DateTime<Utc>) -> String {
    let nanos = at.timestamp_nanos_opt().unwrap_or(i64::MAX).max(0);
    format!("{:020}", nanos)
}
