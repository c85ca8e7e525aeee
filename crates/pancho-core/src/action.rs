//! Client-side projection of an action owned by the action service.
//!
//! An `Action` is created server-side by a plan or propose request. The
//! client only ever holds the last response it received for a given
//! `action_id`; fields the client does not model are kept in `extra` so a
//! cached action compares equal to the response it came from.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::canonical;
use crate::error::Result;
use crate::ttl::{self, Ttl};
use crate::types::ActionStatus;

// ---------------------------------------------------------------------------
// AuditEntry
// ---------------------------------------------------------------------------

/// One record of the append-only audit trail. Display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// ---------------------------------------------------------------------------
// ActionPayload
// ---------------------------------------------------------------------------

/// The exact content a consent signer must sign for a social-post action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionPayload {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub payload_type: Option<String>,
    pub kind: u32,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relays: Option<Vec<String>>,
    pub created_at: i64,
    pub pubkey: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ActionPayload {
    /// Recompute the service-side fingerprint of this payload.
    pub fn fingerprint(&self) -> Result<String> {
        canonical::action_hash(self)
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ActionRepr", into = "ActionRepr")]
pub struct Action {
    pub action_id: String,
    pub status: ActionStatus,
    pub tool_name: Option<String>,
    pub preview: Option<String>,
    /// After this instant the action may no longer be executed.
    pub expires_at: Option<i64>,
    /// After this instant an unapproved action may no longer be approved.
    pub approval_expires_at: Option<i64>,
    pub audit: Vec<AuditEntry>,
    pub action_hash: Option<String>,
    pub action_payload: Option<ActionPayload>,
    pub extra: Map<String, Value>,
    wire: Wire,
}

/// How the service spelled what the typed fields normalize: the exact
/// status text, keys sent as explicit `null`, and whether `audit` was sent.
#[derive(Debug, Clone, Default, PartialEq)]
struct Wire {
    status: Option<String>,
    nulls: Vec<&'static str>,
    audit: bool,
}

impl Action {
    pub fn new(action_id: impl Into<String>, status: ActionStatus) -> Self {
        Self {
            action_id: action_id.into(),
            status,
            tool_name: None,
            preview: None,
            expires_at: None,
            approval_expires_at: None,
            audit: Vec::new(),
            action_hash: None,
            action_payload: None,
            extra: Map::new(),
            wire: Wire::default(),
        }
    }

    /// The status as the service spelled it, unless it has since been
    /// replaced with a different one.
    pub fn status_text(&self) -> &str {
        match &self.wire.status {
            Some(raw) if ActionStatus::parse(raw) == self.status => raw.as_str(),
            _ => self.status.as_str(),
        }
    }

    pub fn action_ttl(&self, now: i64) -> Ttl {
        Ttl::of(self.expires_at, now)
    }

    pub fn approval_ttl(&self, now: i64) -> Ttl {
        Ttl::of(self.approval_expires_at, now)
    }

    /// Whether presenting an "approve" affordance makes sense right now.
    pub fn can_offer_approval(&self, now: i64) -> bool {
        self.status == ActionStatus::Proposed
            && !ttl::is_past(self.expires_at, now)
            && !ttl::is_past(self.approval_expires_at, now)
    }

    /// Whether presenting an "execute" affordance makes sense right now.
    pub fn can_offer_execute(&self, now: i64) -> bool {
        self.status == ActionStatus::Approved
            && !ttl::is_past(self.expires_at, now)
            && !ttl::is_past(self.approval_expires_at, now)
    }

    /// Human-readable label: the tool name, falling back to the payload type.
    pub fn label(&self) -> &str {
        self.tool_name
            .as_deref()
            .or_else(|| {
                self.action_payload
                    .as_ref()
                    .and_then(|p| p.payload_type.as_deref())
            })
            .unwrap_or("-")
    }
}

// ---------------------------------------------------------------------------
// Wire representation
// ---------------------------------------------------------------------------

#[derive(Serialize, Deserialize)]
struct ActionRepr {
    action_id: String,
    status: String,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    tool_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    preview: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    expires_at: Option<Option<i64>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    approval_expires_at: Option<Option<i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    audit: Option<Vec<AuditEntry>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    action_hash: Option<Option<String>>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    action_payload: Option<Option<ActionPayload>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Distinguishes a key sent as `null` (`Some(None)`) from a missing one.
fn present<'de, D, T>(d: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(d).map(Some)
}

fn take<T>(field: Option<Option<T>>, name: &'static str, nulls: &mut Vec<&'static str>) -> Option<T> {
    if matches!(field, Some(None)) {
        nulls.push(name);
    }
    field.flatten()
}

fn put<T>(value: Option<T>, name: &str, nulls: &[&'static str]) -> Option<Option<T>> {
    match value {
        Some(v) => Some(Some(v)),
        None if nulls.iter().any(|n| *n == name) => Some(None),
        None => None,
    }
}

impl From<ActionRepr> for Action {
    fn from(repr: ActionRepr) -> Self {
        let mut nulls = Vec::new();
        let audit_sent = repr.audit.is_some();
        Self {
            action_id: repr.action_id,
            status: ActionStatus::parse(&repr.status),
            tool_name: take(repr.tool_name, "tool_name", &mut nulls),
            preview: take(repr.preview, "preview", &mut nulls),
            expires_at: take(repr.expires_at, "expires_at", &mut nulls),
            approval_expires_at: take(repr.approval_expires_at, "approval_expires_at", &mut nulls),
            audit: repr.audit.unwrap_or_default(),
            action_hash: take(repr.action_hash, "action_hash", &mut nulls),
            action_payload: take(repr.action_payload, "action_payload", &mut nulls),
            extra: repr.extra,
            wire: Wire {
                status: Some(repr.status),
                nulls,
                audit: audit_sent,
            },
        }
    }
}

impl From<Action> for ActionRepr {
    fn from(action: Action) -> Self {
        let status = action.status_text().to_string();
        let nulls = &action.wire.nulls;
        let audit = if action.wire.audit || !action.audit.is_empty() {
            Some(action.audit)
        } else {
            None
        };
        Self {
            action_id: action.action_id,
            status,
            tool_name: put(action.tool_name, "tool_name", nulls),
            preview: put(action.preview, "preview", nulls),
            expires_at: put(action.expires_at, "expires_at", nulls),
            approval_expires_at: put(action.approval_expires_at, "approval_expires_at", nulls),
            audit,
            action_hash: put(action.action_hash, "action_hash", nulls),
            action_payload: put(action.action_payload, "action_payload", nulls),
            extra: action.extra,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
