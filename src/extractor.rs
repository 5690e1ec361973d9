//! Raw record extraction from a wireframe project store
//!
//! The store is an SQLite file with six fixed tables. Each table is read in
//! full, in whatever order the engine returns rows, into one row struct per
//! table. JSON columns are left as text; decoding happens in the normalizer.

use crate::error::{ConverterError, Result};
use crate::types::*;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, Row};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct BranchRow {
    pub id: String,
    pub attributes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRow {
    pub id: String,
    pub branch_id: String,
    pub attributes: String,
    pub data: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommentRow {
    pub id: String,
    pub branch_id: String,
    pub resource_id: String,
    pub data: String,
    pub user_id: String,
    pub attributes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub id: String,
    pub attributes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailRow {
    pub id: String,
    pub attributes: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InfoRow {
    pub name: String,
    pub value: String,
}

/// Every row of every table, in extraction order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecordSet {
    pub branches: Vec<BranchRow>,
    pub resources: Vec<ResourceRow>,
    pub comments: Vec<CommentRow>,
    pub users: Vec<UserRow>,
    pub thumbnails: Vec<ThumbnailRow>,
    pub info: Vec<InfoRow>,
}

impl RawRecordSet {
    pub fn row_count(&self) -> usize {
        self.branches.len()
            + self.resources.len()
            + self.comments.len()
            + self.users.len()
            + self.thumbnails.len()
            + self.info.len()
    }
}

/// Read all six tables from the store at `store_path`.
///
/// The connection is opened read-only and released when this function
/// returns, on success and on every error path.
pub fn extract(store_path: impl AsRef<Path>) -> Result<RawRecordSet> {
    let store_path = store_path.as_ref();
    let display = store_path.display().to_string();

    if !store_path.is_file() {
        return Err(ConverterError::store_unavailable(display, "file does not exist"));
    }

    let conn = Connection::open_with_flags(
        store_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .map_err(|e| ConverterError::store_unavailable(&display, e.to_string()))?;

    check_tables(&conn, &display)?;

    let records = RawRecordSet {
        branches: read_table(&conn, TABLE_BRANCHES, "ID, ATTRIBUTES", |row| {
            Ok(BranchRow {
                id: column_text(row, 0)?,
                attributes: column_text(row, 1)?,
            })
        })?,
        resources: read_table(&conn, TABLE_RESOURCES, "ID, BRANCHID, ATTRIBUTES, DATA", |row| {
            Ok(ResourceRow {
                id: column_text(row, 0)?,
                branch_id: column_text(row, 1)?,
                attributes: column_text(row, 2)?,
                data: column_text(row, 3)?,
            })
        })?,
        comments: read_table(
            &conn,
            TABLE_COMMENTS,
            "ID, BRANCHID, RESOURCEID, DATA, USERID, ATTRIBUTES",
            |row| {
                Ok(CommentRow {
                    id: column_text(row, 0)?,
                    branch_id: column_text(row, 1)?,
                    resource_id: column_text(row, 2)?,
                    data: column_text(row, 3)?,
                    user_id: column_text(row, 4)?,
                    attributes: column_text(row, 5)?,
                })
            },
        )?,
        users: read_table(&conn, TABLE_USERS, "ID, ATTRIBUTES", |row| {
            Ok(UserRow {
                id: column_text(row, 0)?,
                attributes: column_text(row, 1)?,
            })
        })?,
        thumbnails: read_table(&conn, TABLE_THUMBNAILS, "ID, ATTRIBUTES", |row| {
            Ok(ThumbnailRow {
                id: column_text(row, 0)?,
                attributes: column_text(row, 1)?,
            })
        })?,
        info: read_table(&conn, TABLE_INFO, "NAME, VALUE", |row| {
            Ok(InfoRow {
                name: column_text(row, 0)?,
                value: column_text(row, 1)?,
            })
        })?,
    };

    log::info!(
        "Extracted {} rows from {} ({} resources)",
        records.row_count(),
        display,
        records.resources.len()
    );
    Ok(records)
}

fn check_tables(conn: &Connection, display: &str) -> Result<()> {
    // The first real read is where SQLite notices a file is not a database.
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table'")
        .map_err(|e| ConverterError::store_unavailable(display, e.to_string()))?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .and_then(|rows| rows.collect::<rusqlite::Result<Vec<String>>>())
        .map_err(|e| ConverterError::store_unavailable(display, e.to_string()))?
        .into_iter()
        .map(|name| name.to_ascii_uppercase())
        .collect::<HashSet<String>>();

    for table in STORE_TABLES {
        if !present.contains(table) {
            return Err(ConverterError::schema_mismatch(
                table,
                format!("table is missing from {}", display),
            ));
        }
    }
    Ok(())
}

fn read_table<T, F>(conn: &Connection, table: &str, columns: &str, map_row: F) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let sql = format!("SELECT {} FROM {}", columns, table);
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| ConverterError::schema_mismatch(table, e.to_string()))?;
    let rows = stmt
        .query_map([], map_row)?
        .collect::<rusqlite::Result<Vec<T>>>()?;
    log::debug!("Read {} rows from {}", rows.len(), table);
    Ok(rows)
}

// NULL reads as empty text; blobs are taken as (lossy) UTF-8.
fn column_text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    })
}
