//! Directory listing — queries and cloud object metadata.
//!
//! The cloud sends object metadata as loosely-typed JSON: numbers may
//! arrive as strings, optional fields come and go, and unknown object
//! types must be skipped rather than rejected. Parsing here is lenient
//! on shape but strict on the fields the client actually relies on.

use cumulus_core::PartDescriptor;
use serde_json::Value;

/// Parameters for one `list_objects` page.
///
/// `watermark` is the opaque pagination cursor: start at zero, pass the
/// updated value back for each subsequent page until
/// [`Listing::more`] is false.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub path: String,
    /// Max objects per page. 0 = server default.
    pub max_items: u32,
    pub watermark: u64,
    pub recurse: bool,
    pub include_parts: bool,
    pub include_child_counts: bool,
    pub group_by_dir: bool,
    /// Server-side name filter. Empty = no filter.
    pub filter_name: String,
    pub sort_field: String,
    pub sort_direction: String,
}

impl ListQuery {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            max_items: 0,
            watermark: 0,
            recurse: false,
            include_parts: false,
            include_child_counts: false,
            group_by_dir: true,
            filter_name: String::new(),
            sort_field: String::new(),
            sort_direction: String::new(),
        }
    }
}

/// One page of listing results.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    /// The listed object itself. Populated on the first page only.
    pub root: Option<CloudObject>,
    pub children: Vec<CloudObject>,
    /// Whether another page is available.
    pub more: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    File,
    Dir,
    Share,
    Company,
}

/// Metadata for one remote object.
#[derive(Debug, Clone)]
pub struct CloudObject {
    pub id: u64,
    pub path: String,
    pub kind: ObjectKind,
    pub size: u64,
    pub created_time: u64,
    pub modified_time: u64,
    pub removed_time: u64,
    pub child_count: u32,
    /// Part list of the latest revision; present when the query set
    /// `include_parts`.
    pub parts: Vec<PartDescriptor>,
    /// Raw file attributes, passed through untyped.
    pub attributes: Option<Value>,
}

impl CloudObject {
    /// Parse one object out of a listing reply. Returns `None` for
    /// entries the client does not model (unknown types, missing path).
    pub fn from_value(value: &Value) -> Option<CloudObject> {
        let path = value.get("path")?.as_str()?.to_string();

        let kind = value
            .get("type")
            .or_else(|| value.get("object_type"))
            .and_then(Value::as_str)?;
        let kind = match kind {
            "file" => ObjectKind::File,
            "dir" => ObjectKind::Dir,
            "share" => ObjectKind::Share,
            "company" => ObjectKind::Company,
            _ => return None,
        };

        let mut object = CloudObject {
            id: get_u64(value, "object_id").unwrap_or(0),
            path,
            kind,
            size: 0,
            created_time: get_u64(value, "created_time").unwrap_or(0),
            modified_time: get_u64(value, "modified_time").unwrap_or(0),
            removed_time: get_u64(value, "removed_time").unwrap_or(0),
            child_count: get_u64(value, "children_count").unwrap_or(0) as u32,
            parts: Vec::new(),
            attributes: value
                .get("attributes")
                .filter(|a| a.is_object())
                .cloned(),
        };

        if object.kind == ObjectKind::File {
            object.size = get_u64(value, "size").unwrap_or(0);
            object.parts = latest_revision_parts(value);
        }

        Some(object)
    }
}

/// Parts of the first (latest) revision, if any.
fn latest_revision_parts(value: &Value) -> Vec<PartDescriptor> {
    let Some(revision) = value
        .get("revisions")
        .and_then(Value::as_array)
        .and_then(|revisions| revisions.first())
    else {
        return Vec::new();
    };

    let Some(parts) = revision.get("parts").and_then(Value::as_array) else {
        return Vec::new();
    };

    parts
        .iter()
        .filter_map(|part| {
            Some(PartDescriptor {
                fingerprint: part.get("fingerprint")?.as_str()?.to_string(),
                size: get_u64(part, "size")? as u32,
                offset: get_u64(part, "offset")?,
                payload: None,
            })
        })
        .collect()
}

/// Read a u64 field that the server may send as a number or a string.
pub(crate) fn get_u64(value: &Value, key: &str) -> Option<u64> {
    match value.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
