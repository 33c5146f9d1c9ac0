//! JSON input parsing
//!
//! Accepts a top-level array of creator objects in either nested form (fields
//! under a `basic_info` object) or flat form (`author_unique_id` at the top
//! level). The shape is detected from the first element, matching how these
//! exports are produced in practice.

use brandlens_common::{Error, Result};
use serde_json::Value;
use std::path::Path;

use crate::models::CreatorRecord;

/// Detected input shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonShape {
    Nested,
    Flat,
}

/// Outcome of a JSON parse
#[derive(Debug)]
pub struct JsonParseOutcome {
    pub records: Vec<CreatorRecord>,
    /// Entries skipped for a missing/blank creator handle
    pub skipped: usize,
    pub shape: Option<JsonShape>,
}

fn detect_shape(items: &[Value]) -> Option<JsonShape> {
    let first = items.first()?;
    if first.get("basic_info").map(Value::is_object).unwrap_or(false) {
        return Some(JsonShape::Nested);
    }
    if first.get("author_unique_id").is_some() {
        return Some(JsonShape::Flat);
    }
    None
}

fn str_field(value: &Value, key: &str) -> String {
    match value.get(key) {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn u64_field(value: &Value, key: &str) -> u64 {
    match value.get(key) {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn extract_record(item: &Value, shape: JsonShape) -> Option<CreatorRecord> {
    let (identity_scope, basic_info) = match shape {
        JsonShape::Nested => {
            let basic_info = item.get("basic_info")?;
            (basic_info, basic_info)
        }
        JsonShape::Flat => (item, item),
    };

    let author_unique_id = str_field(identity_scope, "author_unique_id");
    if author_unique_id.is_empty() || author_unique_id == "None" {
        return None;
    }

    let signature = match shape {
        // Nested exports carry the bio under the outer description field.
        JsonShape::Nested => {
            let description = str_field(item, "description");
            if description.is_empty() {
                str_field(item, "signature")
            } else {
                description
            }
        }
        JsonShape::Flat => str_field(item, "signature"),
    };

    let author_avatar = {
        let avatar = str_field(basic_info, "author_avatar");
        if avatar.is_empty() {
            str_field(basic_info, "thumbnail_url")
        } else {
            avatar
        }
    };

    Some(CreatorRecord {
        video_id: str_field(item, "video_id"),
        author_unique_id,
        author_nickname: str_field(basic_info, "author_nickname"),
        signature,
        title: str_field(item, "title"),
        create_time: str_field(basic_info, "create_time"),
        author_avatar,
        author_followers_count: u64_field(basic_info, "author_followers"),
        author_followings_count: u64_field(basic_info, "author_followings"),
        video_count: u64_field(basic_info, "videoCount"),
        video_diggcount: u64_field(basic_info, "video_diggcount"),
        video_playcount: u64_field(basic_info, "video_playcount"),
        video_sharecount: u64_field(basic_info, "video_sharecount"),
        video_commentcount: u64_field(basic_info, "video_commentcount"),
    })
}

/// Read creator records from a JSON file
///
/// `max_records` truncates accepted records deterministically from the head.
pub fn parse_creator_json(path: &Path, max_records: Option<usize>) -> Result<JsonParseOutcome> {
    if !path.exists() {
        return Err(Error::NotFound(format!(
            "Input file not found: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&content)
        .map_err(|e| Error::InvalidInput(format!("JSON parse failed ({}): {}", path.display(), e)))?;

    let items = document.as_array().ok_or_else(|| {
        Error::InvalidInput(format!(
            "Expected a top-level JSON array in {}",
            path.display()
        ))
    })?;

    let shape = detect_shape(items);
    if shape.is_none() && !items.is_empty() {
        tracing::warn!(path = %path.display(), "Unrecognized JSON record shape, no records extracted");
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;

    if let Some(shape) = shape {
        for item in items {
            if let Some(cap) = max_records {
                if records.len() >= cap {
                    break;
                }
            }
            match extract_record(item, shape) {
                Some(record) => records.push(record),
                None => {
                    tracing::warn!("Skipping entry with missing creator handle");
                    skipped += 1;
                }
            }
        }
    } else {
        skipped = items.len();
    }

    tracing::info!(
        path = %path.display(),
        shape = ?shape,
        accepted = records.len(),
        skipped,
        "JSON input parsed"
    );

    Ok(JsonParseOutcome {
        records,
        skipped,
        shape,
    })
}
