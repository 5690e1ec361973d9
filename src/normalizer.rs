//! Normalization of raw store rows into the canonical document
//!
//! Each table has one conversion function from its row struct to its record
//! type. JSON columns are parsed and then walked recursively so that every
//! `name` and `text` string, at any depth, goes through [`EncodingRepair`].
//! A row whose JSON cannot be decoded is reported and skipped; the rest of
//! the document is still produced.

use crate::encoding::EncodingRepair;
use crate::error::RecordDecodeError;
use crate::extractor::*;
use crate::types::*;
use serde_json::{Map, Value};

/// Keys whose string values are always repaired.
const REPAIRED_KEYS: [&str; 2] = ["name", "text"];

/// Output of [`Normalizer::normalize`]: the document plus the rows that were
/// skipped.
#[derive(Debug, Clone, Default)]
pub struct Normalized {
    pub document: CanonicalDocument,
    pub errors: Vec<RecordDecodeError>,
}

pub struct Normalizer {
    repair: EncodingRepair,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self {
            repair: EncodingRepair::new(),
        }
    }

    pub fn normalize(&self, raw: &RawRecordSet) -> Normalized {
        let mut out = Normalized::default();

        out.document.branches = collect(raw.branches.iter().map(|row| self.branch(row)), &mut out.errors);
        out.document.resources = collect(raw.resources.iter().map(|row| self.resource(row)), &mut out.errors);
        out.document.comments = collect(raw.comments.iter().map(|row| self.comment(row)), &mut out.errors);
        out.document.users = collect(raw.users.iter().map(|row| self.user(row)), &mut out.errors);
        out.document.thumbnails =
            collect(raw.thumbnails.iter().map(|row| self.thumbnail(row)), &mut out.errors);

        for row in &raw.info {
            out.document
                .info
                .insert(row.name.clone(), Value::String(self.repair.repair(&row.value)));
        }

        log::info!(
            "Normalized {} records ({} skipped)",
            out.document.record_count(),
            out.errors.len()
        );
        out
    }

    /// Repair every `name`/`text` string inside `value`, recursing through
    /// objects and arrays.
    pub fn repair_tree(&self, value: &mut Value) {
        match value {
            Value::Object(map) => self.repair_map(map),
            Value::Array(items) => {
                for item in items {
                    self.repair_tree(item);
                }
            }
            _ => {}
        }
    }

    fn repair_map(&self, map: &mut Map<String, Value>) {
        for (key, child) in map.iter_mut() {
            if REPAIRED_KEYS.contains(&key.as_str()) {
                if let Value::String(text) = child {
                    *text = self.repair.repair(text);
                    continue;
                }
            }
            self.repair_tree(child);
        }
    }

    fn branch(&self, row: &BranchRow) -> Result<Branch, RecordDecodeError> {
        Ok(Branch {
            id: row.id.clone(),
            attributes: self.attributes(TABLE_BRANCHES, &row.id, &row.attributes)?,
        })
    }

    fn resource(&self, row: &ResourceRow) -> Result<Resource, RecordDecodeError> {
        let attributes = self.attributes(TABLE_RESOURCES, &row.id, &row.attributes)?;
        let data = if row.data.trim().is_empty() {
            Value::Object(Map::new())
        } else {
            let mut data: Value = serde_json::from_str(&row.data).map_err(|e| {
                RecordDecodeError::new(TABLE_RESOURCES, &row.id, format!("DATA: {}", e))
            })?;
            if data.is_string() {
                data = self.repair.repair_value(&data);
            } else {
                self.repair_tree(&mut data);
            }
            data
        };
        Ok(Resource {
            id: row.id.clone(),
            branch_id: row.branch_id.clone(),
            attributes,
            data,
        })
    }

    fn comment(&self, row: &CommentRow) -> Result<Comment, RecordDecodeError> {
        Ok(Comment {
            id: row.id.clone(),
            branch_id: row.branch_id.clone(),
            resource_id: row.resource_id.clone(),
            data: self.repair.repair(&row.data),
            user_id: row.user_id.clone(),
            attributes: self.attributes(TABLE_COMMENTS, &row.id, &row.attributes)?,
        })
    }

    fn user(&self, row: &UserRow) -> Result<User, RecordDecodeError> {
        Ok(User {
            id: row.id.clone(),
            attributes: self.attributes(TABLE_USERS, &row.id, &row.attributes)?,
        })
    }

    fn thumbnail(&self, row: &ThumbnailRow) -> Result<Thumbnail, RecordDecodeError> {
        Ok(Thumbnail {
            id: row.id.clone(),
            attributes: self.attributes(TABLE_THUMBNAILS, &row.id, &row.attributes)?,
        })
    }

    // Parses an ATTRIBUTES column. The result always carries a `name`.
    fn attributes(
        &self,
        table: &str,
        id: &str,
        text: &str,
    ) -> Result<Map<String, Value>, RecordDecodeError> {
        let mut attributes = if text.trim().is_empty() {
            Map::new()
        } else {
            match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    return Err(RecordDecodeError::new(
                        table,
                        id,
                        format!("ATTRIBUTES is not a JSON object: {}", other),
                    ))
                }
                Err(e) => return Err(RecordDecodeError::new(table, id, format!("ATTRIBUTES: {}", e))),
            }
        };
        self.repair_map(&mut attributes);
        attributes
            .entry("name")
            .or_insert_with(|| Value::String(String::new()));
        Ok(attributes)
    }
}

fn collect<T>(
    results: impl Iterator<Item = Result<T, RecordDecodeError>>,
    errors: &mut Vec<RecordDecodeError>,
) -> Vec<T> {
    let mut records = Vec::new();
    for result in results {
        match result {
            Ok(record) => records.push(record),
            Err(e) => {
                log::warn!("Skipping record: {}", e);
                errors.push(e);
            }
        }
    }
    records
}
