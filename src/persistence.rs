//! Canonical document persistence: JSON files and the project store
//!
//! Store writes are insert-or-update keyed on each table's primary key, so
//! writing the same document twice leaves the store unchanged. Parent
//! tables are written before the tables that reference them.

use crate::error::{ConverterError, Result};
use crate::types::*;
use rusqlite::{params, Connection, Transaction};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::path::Path;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS BRANCHES (
    ID VARCHAR(255) PRIMARY KEY,
    ATTRIBUTES TEXT
);

CREATE TABLE IF NOT EXISTS USERS (
    ID VARCHAR(255) PRIMARY KEY,
    ATTRIBUTES TEXT
);

CREATE TABLE IF NOT EXISTS RESOURCES (
    ID VARCHAR(255),
    BRANCHID VARCHAR(255),
    ATTRIBUTES TEXT,
    DATA LONGTEXT,
    PRIMARY KEY (ID, BRANCHID),
    FOREIGN KEY (BRANCHID) REFERENCES BRANCHES(ID)
);

CREATE TABLE IF NOT EXISTS THUMBNAILS (
    ID VARCHAR(255) PRIMARY KEY,
    ATTRIBUTES MEDIUMTEXT
);

CREATE TABLE IF NOT EXISTS INFO (
    NAME VARCHAR(255) PRIMARY KEY,
    VALUE TEXT
);

CREATE TABLE IF NOT EXISTS COMMENTS (
    ID VARCHAR(255) PRIMARY KEY,
    BRANCHID VARCHAR(255),
    RESOURCEID VARCHAR(255),
    DATA LONGTEXT,
    USERID VARCHAR(255),
    ATTRIBUTES TEXT,
    FOREIGN KEY (USERID) REFERENCES USERS(ID),
    FOREIGN KEY (RESOURCEID, BRANCHID) REFERENCES RESOURCES(ID, BRANCHID)
);
"#;

/// Create the six store tables if they are not there yet.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Read a canonical document file.
pub fn load_document(path: impl AsRef<Path>) -> Result<CanonicalDocument> {
    let path = path.as_ref();
    let content = fs::read(path)?;
    let document: CanonicalDocument = serde_json::from_slice(&content)
        .map_err(|e| ConverterError::parse(path.display().to_string(), e.to_string()))?;
    log::info!(
        "Loaded {} records from {}",
        document.record_count(),
        path.display()
    );
    Ok(document)
}

/// Write a canonical document file, creating parent directories as needed.
/// Non-ASCII text is written as-is.
pub fn save_document(document: &CanonicalDocument, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(document).map_err(|e| ConverterError::InvalidFormat {
        message: format!("JSON serialization error: {}", e),
    })?;
    fs::write(path, json)?;
    log::info!("Saved {} records to {}", document.record_count(), path.display());
    Ok(())
}

/// Rows written per table by [`store_upsert`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpsertStats {
    pub branches: usize,
    pub users: usize,
    pub thumbnails: usize,
    pub info: usize,
    pub resources: usize,
    pub comments: usize,
    /// Rows whose parent key names no row in the store after the write.
    pub dangling_references: Vec<String>,
}

/// Insert or update every record of `document` in the store at
/// `store_path`, creating the store and its tables when missing. All rows
/// go in one transaction.
pub fn store_upsert(document: &CanonicalDocument, store_path: impl AsRef<Path>) -> Result<UpsertStats> {
    let store_path = store_path.as_ref();
    if let Some(parent) = store_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut conn = Connection::open(store_path).map_err(|e| {
        ConverterError::store_unavailable(store_path.display().to_string(), e.to_string())
    })?;
    ensure_schema(&conn)?;

    let tx = conn.transaction()?;
    let stats = UpsertStats {
        branches: upsert_branches(&tx, &document.branches)?,
        users: upsert_users(&tx, &document.users)?,
        thumbnails: upsert_thumbnails(&tx, &document.thumbnails)?,
        info: upsert_info(&tx, &document.info)?,
        resources: upsert_resources(&tx, &document.resources)?,
        comments: upsert_comments(&tx, &document.comments)?,
        dangling_references: dangling_references(&tx)?,
    };
    tx.commit()?;

    for reference in &stats.dangling_references {
        log::warn!("Dangling reference in {}: {}", store_path.display(), reference);
    }

    log::info!("Upserted into {}: {:?}", store_path.display(), stats);
    Ok(stats)
}

// Foreign keys are declared but not enforced, so orphans are only reported.
fn dangling_references(tx: &Transaction<'_>) -> Result<Vec<String>> {
    const CHECKS: [(&str, &str); 3] = [
        (
            "SELECT r.ID, r.BRANCHID FROM RESOURCES r
             LEFT JOIN BRANCHES b ON b.ID = r.BRANCHID WHERE b.ID IS NULL",
            "resource {} references missing branch {}",
        ),
        (
            "SELECT c.ID, c.RESOURCEID FROM COMMENTS c
             LEFT JOIN RESOURCES r ON r.ID = c.RESOURCEID AND r.BRANCHID = c.BRANCHID
             WHERE r.ID IS NULL",
            "comment {} references missing resource {}",
        ),
        (
            "SELECT c.ID, c.USERID FROM COMMENTS c
             LEFT JOIN USERS u ON u.ID = c.USERID WHERE u.ID IS NULL",
            "comment {} references missing user {}",
        ),
    ];

    let mut found = Vec::new();
    for (sql, template) in CHECKS {
        let mut stmt = tx.prepare(sql)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, Option<String>>(0)?.unwrap_or_default(),
                    row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        for (id, parent) in rows {
            found.push(template.replacen("{}", &id, 1).replacen("{}", &parent, 1));
        }
    }
    Ok(found)
}

fn json_text(value: &impl Serialize) -> Result<String> {
    serde_json::to_string(value).map_err(|e| ConverterError::InvalidFormat {
        message: format!("JSON serialization error: {}", e),
    })
}

fn upsert_branches(tx: &Transaction<'_>, branches: &[Branch]) -> Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO BRANCHES (ID, ATTRIBUTES) VALUES (?1, ?2)
         ON CONFLICT(ID) DO UPDATE SET ATTRIBUTES = excluded.ATTRIBUTES",
    )?;
    for branch in branches {
        stmt.execute(params![branch.id, json_text(&branch.attributes)?])?;
    }
    Ok(branches.len())
}

fn upsert_users(tx: &Transaction<'_>, users: &[User]) -> Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO USERS (ID, ATTRIBUTES) VALUES (?1, ?2)
         ON CONFLICT(ID) DO UPDATE SET ATTRIBUTES = excluded.ATTRIBUTES",
    )?;
    for user in users {
        stmt.execute(params![user.id, json_text(&user.attributes)?])?;
    }
    Ok(users.len())
}

fn upsert_thumbnails(tx: &Transaction<'_>, thumbnails: &[Thumbnail]) -> Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO THUMBNAILS (ID, ATTRIBUTES) VALUES (?1, ?2)
         ON CONFLICT(ID) DO UPDATE SET ATTRIBUTES = excluded.ATTRIBUTES",
    )?;
    for thumbnail in thumbnails {
        stmt.execute(params![thumbnail.id, json_text(&thumbnail.attributes)?])?;
    }
    Ok(thumbnails.len())
}

fn upsert_info(tx: &Transaction<'_>, info: &serde_json::Map<String, Value>) -> Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO INFO (NAME, VALUE) VALUES (?1, ?2)
         ON CONFLICT(NAME) DO UPDATE SET VALUE = excluded.VALUE",
    )?;
    for (name, value) in info {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        stmt.execute(params![name, text])?;
    }
    Ok(info.len())
}

fn upsert_resources(tx: &Transaction<'_>, resources: &[Resource]) -> Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO RESOURCES (ID, BRANCHID, ATTRIBUTES, DATA) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(ID, BRANCHID) DO UPDATE SET
            ATTRIBUTES = excluded.ATTRIBUTES, DATA = excluded.DATA",
    )?;
    for resource in resources {
        stmt.execute(params![
            resource.id,
            resource.branch_id,
            json_text(&resource.attributes)?,
            json_text(&resource.data)?
        ])?;
    }
    Ok(resources.len())
}

fn upsert_comments(tx: &Transaction<'_>, comments: &[Comment]) -> Result<usize> {
    let mut stmt = tx.prepare(
        "INSERT INTO COMMENTS (ID, BRANCHID, RESOURCEID, DATA, USERID, ATTRIBUTES)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(ID) DO UPDATE SET
            BRANCHID = excluded.BRANCHID, RESOURCEID = excluded.RESOURCEID,
            DATA = excluded.DATA, USERID = excluded.USERID, ATTRIBUTES = excluded.ATTRIBUTES",
    )?;
    for comment in comments {
        stmt.execute(params![
            comment.id,
            comment.branch_id,
            comment.resource_id,
            comment.data,
            comment.user_id,
            json_text(&comment.attributes)?
        ])?;
    }
    Ok(comments.len())
}
