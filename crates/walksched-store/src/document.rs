//! Document model shared by every store backend

use serde_json::{Map, Value};

/// A stored document: a flat-or-nested JSON object
pub type Document = Map<String, Value>;

/// Collection names
pub mod collections {
    pub const WALKS: &str = "walks";
    pub const USERS: &str = "users";
    /// Secondary record linked from a walk's `request_id`
    pub const WALK_REQUESTS: &str = "walk_requests";
}

/// A single field mutation
#[derive(Debug, Clone, PartialEq)]
pub enum FieldOp {
    /// Set the field to a value
    Set(Value),
    /// Remove the field entirely; its absence is the signal, not a sentinel value
    Delete,
}

/// Update of one existing document inside a batch
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentWrite {
    pub collection: String,
    pub id: String,
    pub fields: Vec<(String, FieldOp)>,
}

impl DocumentWrite {
    pub fn update(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
            fields: Vec::new(),
        }
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((field.into(), FieldOp::Set(value.into())));
        self
    }

    pub fn delete(mut self, field: impl Into<String>) -> Self {
        self.fields.push((field.into(), FieldOp::Delete));
        self
    }

    /// Apply the field operations to a document in place
    pub fn apply_to(&self, doc: &mut Document) {
        for (field, op) in &self.fields {
            match op {
                FieldOp::Set(value) => {
                    doc.insert(field.clone(), value.clone());
                }
                FieldOp::Delete => {
                    doc.remove(field);
                }
            }
        }
    }
}
