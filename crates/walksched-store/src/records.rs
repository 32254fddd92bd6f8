//! Typed views of the walk and user documents
//!
//! The store itself is schemaless; these types pin down the handful of fields
//! the scheduler reads and writes. Unknown fields in a document are ignored on
//! read and left untouched by writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use walksched_api::WalkStatus;
use walksched_util::{UserId, WalkId};

use crate::{Document, StoreError, StoreResult, collections};

/// Field names used in walk and user documents
pub mod fields {
    pub const STATUS: &str = "status";
    pub const INITIATOR_ID: &str = "initiator_id";
    pub const COUNTERPARTY_ID: &str = "counterparty_id";
    pub const ACTIVATION_APPLIED: &str = "activation_applied";
    pub const ACTIVATED_AT: &str = "activated_at";
    pub const EXPIRED_AT: &str = "expired_at";
    pub const REQUEST_ID: &str = "request_id";

    pub const PUSH_TOKEN: &str = "push_token";
    pub const ACTIVE_WALK_ID: &str = "active_walk_id";
}

/// A walk document
#[derive(Debug, Clone, PartialEq)]
pub struct WalkRecord {
    pub id: WalkId,
    pub status: WalkStatus,
    pub initiator_id: Option<UserId>,
    pub counterparty_id: Option<UserId>,
    pub activation_applied: bool,
    pub activated_at: Option<DateTime<Utc>>,
    pub expired_at: Option<DateTime<Utc>>,
    /// ID of the linked record in `walk_requests`, if any
    pub request_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredWalk {
    status: WalkStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    initiator_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    counterparty_id: Option<UserId>,
    #[serde(default)]
    activation_applied: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    activated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expired_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
}

impl WalkRecord {
    pub fn new(
        id: impl Into<WalkId>,
        status: WalkStatus,
        initiator_id: impl Into<UserId>,
        counterparty_id: impl Into<UserId>,
    ) -> Self {
        Self {
            id: id.into(),
            status,
            initiator_id: Some(initiator_id.into()),
            counterparty_id: Some(counterparty_id.into()),
            activation_applied: false,
            activated_at: None,
            expired_at: None,
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn from_document(id: &WalkId, doc: &Document) -> StoreResult<Self> {
        let stored: StoredWalk =
            serde_json::from_value(Value::Object(doc.clone())).map_err(|e| StoreError::Malformed {
                collection: collections::WALKS,
                id: id.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            id: id.clone(),
            status: stored.status,
            initiator_id: stored.initiator_id,
            counterparty_id: stored.counterparty_id,
            activation_applied: stored.activation_applied,
            activated_at: stored.activated_at,
            expired_at: stored.expired_at,
            request_id: stored.request_id,
        })
    }

    pub fn to_document(&self) -> StoreResult<Document> {
        let stored = StoredWalk {
            status: self.status,
            initiator_id: self.initiator_id.clone(),
            counterparty_id: self.counterparty_id.clone(),
            activation_applied: self.activation_applied,
            activated_at: self.activated_at,
            expired_at: self.expired_at,
            request_id: self.request_id.clone(),
        };
        into_document(serde_json::to_value(stored)?)
    }
}

/// A user (walk party) document
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: UserId,
    pub push_token: Option<String>,
    /// Absent when the user is not currently in a walk
    pub active_walk_id: Option<WalkId>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    push_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_walk_id: Option<WalkId>,
}

impl UserRecord {
    pub fn new(id: impl Into<UserId>) -> Self {
        Self {
            id: id.into(),
            push_token: None,
            active_walk_id: None,
        }
    }

    pub fn with_push_token(mut self, token: impl Into<String>) -> Self {
        self.push_token = Some(token.into());
        self
    }

    /// Push token, treating an empty string as no token
    pub fn token(&self) -> Option<&str> {
        self.push_token.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn from_document(id: &UserId, doc: &Document) -> StoreResult<Self> {
        let stored: StoredUser =
            serde_json::from_value(Value::Object(doc.clone())).map_err(|e| StoreError::Malformed {
                collection: collections::USERS,
                id: id.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            id: id.clone(),
            push_token: stored.push_token,
            active_walk_id: stored.active_walk_id,
        })
    }

    pub fn to_document(&self) -> StoreResult<Document> {
        let stored = StoredUser {
            push_token: self.push_token.clone(),
            active_walk_id: self.active_walk_id.clone(),
        };
        into_document(serde_json::to_value(stored)?)
    }
}

fn into_document(value: Value) -> StoreResult<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn walk_document_round_trip() {
        let walk = WalkRecord::new("W1", WalkStatus::Accepted, "alice", "bob").with_request_id("R1");
        let doc = walk.to_document().unwrap();

        assert_eq!(doc.get(fields::STATUS), Some(&json!("accepted")));
        assert_eq!(doc.get(fields::ACTIVATION_APPLIED), Some(&json!(false)));
        assert!(!doc.contains_key(fields::ACTIVATED_AT));

        let parsed = WalkRecord::from_document(&WalkId::new("W1"), &doc).unwrap();
        assert_eq!(parsed, walk);
    }

    #[test]
    fn walk_missing_marker_defaults_to_not_applied() {
        let doc = json!({"status": "accepted", "extra": 42})
            .as_object()
            .cloned()
            .unwrap();

        let walk = WalkRecord::from_document(&WalkId::new("W1"), &doc).unwrap();
        assert!(!walk.activation_applied);
        assert!(walk.initiator_id.is_none());
    }

    #[test]
    fn walk_with_unknown_status_is_malformed() {
        let doc = json!({"status": "paused"}).as_object().cloned().unwrap();

        let err = WalkRecord::from_document(&WalkId::new("W1"), &doc).unwrap_err();
        assert!(matches!(err, StoreError::Malformed { collection: "walks", .. }));
    }

    #[test]
    fn user_empty_token_is_no_token() {
        let user = UserRecord::new("alice").with_push_token("  ");
        assert_eq!(user.token(), None);

        let user = UserRecord::new("alice").with_push_token("tok-1");
        assert_eq!(user.token(), Some("tok-1"));
    }

    #[test]
    fn user_absent_active_walk() {
        let doc = json!({"push_token": "tok"}).as_object().cloned().unwrap();
        let user = UserRecord::from_document(&UserId::new("alice"), &doc).unwrap();
        assert_eq!(user.active_walk_id, None);
        assert!(!user.to_document().unwrap().contains_key(fields::ACTIVE_WALK_ID));
    }
}
