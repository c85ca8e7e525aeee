//! Signed-event shapes exchanged with a consent signer.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::action::ActionPayload;
use crate::canonical;
use crate::error::{CoreError, Result};

/// Event kind used for the approval attestation.
pub const APPROVAL_EVENT_KIND: u32 = 27235;

/// An event as handed to a signer, before it carries an id or signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedEvent {
    pub kind: u32,
    pub content: String,
    pub tags: Vec<Vec<String>>,
    pub created_at: i64,
    pub pubkey: String,
}

impl UnsignedEvent {
    /// The content event that re-expresses an action payload verbatim.
    pub fn from_payload(payload: &ActionPayload) -> Self {
        Self {
            kind: payload.kind,
            content: payload.content.clone(),
            tags: payload.tags.clone(),
            created_at: payload.created_at,
            pubkey: payload.pubkey.clone(),
        }
    }

    /// The attestation binding a signature to one specific action instance.
    pub fn approval(
        claim: &ApprovalClaim,
        pubkey: impl Into<String>,
        created_at: i64,
    ) -> Result<Self> {
        Ok(Self {
            kind: APPROVAL_EVENT_KIND,
            content: claim.to_content()?,
            tags: Vec::new(),
            created_at,
            pubkey: pubkey.into(),
        })
    }

    /// Identifier derived from the event's canonical serialization.
    pub fn id(&self) -> Result<String> {
        let serialized = serde_json::to_string(&json!([
            0,
            self.pubkey,
            self.created_at,
            self.kind,
            self.tags,
            self.content
        ]))?;
        Ok(canonical::sha256_hex(serialized.as_bytes()))
    }
}

/// An event returned by a signer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedEvent {
    pub id: String,
    pub pubkey: String,
    pub created_at: i64,
    pub kind: u32,
    pub tags: Vec<Vec<String>>,
    pub content: String,
    pub sig: String,
}

impl SignedEvent {
    /// The unsigned fields this event commits to.
    pub fn unsigned(&self) -> UnsignedEvent {
        UnsignedEvent {
            kind: self.kind,
            content: self.content.clone(),
            tags: self.tags.clone(),
            created_at: self.created_at,
            pubkey: self.pubkey.clone(),
        }
    }

    /// True when this event signs exactly `requested` and its id is the one
    /// derived from those fields.
    pub fn commits_to(&self, requested: &UnsignedEvent) -> Result<bool> {
        let unsigned = self.unsigned();
        Ok(&unsigned == requested && unsigned.id()? == self.id)
    }
}

/// Content of the approval attestation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalClaim {
    pub action_id: String,
    pub action_hash: String,
}

impl ApprovalClaim {
    pub fn new(action_id: impl Into<String>, action_hash: impl Into<String>) -> Self {
        Self {
            action_id: action_id.into(),
            action_hash: action_hash.into(),
        }
    }

    pub fn to_content(&self) -> Result<String> {
        canonical::canonical_json_of(self)
    }
}

/// Parse a `key=value` command-line tag into an event tag.
/// Additional `=` characters stay in the value.
pub fn parse_tag(raw: &str) -> Result<Vec<String>> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok(vec![key.trim().to_string(), value.to_string()])
        }
        _ => Err(CoreError::InvalidTag(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Map;

    fn payload() -> ActionPayload {
        ActionPayload {
            payload_type: Some("nostr.publish".into()),
            kind: 1,
            content: "hello".into(),
            tags: vec![vec!["t".into(), "pancho".into()]],
            relays: Some(vec!["wss://nos.lol".into()]),
            created_at: 1_700_000_000,
            pubkey: "a".repeat(64),
            extra: Map::new(),
        }
    }

    #[test]
    fn content_event_copies_payload_fields() {
        let ev = UnsignedEvent::from_payload(&payload());
        assert_eq!(ev.kind, 1);
        assert_eq!(ev.content, "hello");
        assert_eq!(ev.tags, vec![vec!["t".to_string(), "pancho".to_string()]]);
        assert_eq!(ev.created_at, 1_700_000_000);
        assert_eq!(ev.pubkey, "a".repeat(64));
    }

    #[test]
    fn approval_content_binds_id_and_hash() {
        let claim = ApprovalClaim::new("act-9", "deadbeef");
        let ev = UnsignedEvent::approval(&claim, "b".repeat(64), 5).unwrap();
        assert_eq!(ev.kind, APPROVAL_EVENT_KIND);
        assert_eq!(ev.content, r#"{"action_hash":"deadbeef","action_id":"act-9"}"#);
        let parsed: ApprovalClaim = serde_json::from_str(&ev.content).unwrap();
        assert_eq!(parsed, claim);
    }

    #[test]
    fn id_is_hash_of_serialized_array() {
        let ev = UnsignedEvent {
            kind: 1,
            content: "hi".into(),
            tags: vec![],
            created_at: 1,
            pubkey: "pk".into(),
        };
        let expected = canonical::sha256_hex(br#"[0,"pk",1,1,[],"hi"]"#);
        assert_eq!(ev.id().unwrap(), expected);
    }

    #[test]
    fn parse_tag_splits_on_first_equals() {
        assert_eq!(parse_tag("t=pancho").unwrap(), vec!["t", "pancho"]);
        assert_eq!(parse_tag("r=a=b").unwrap(), vec!["r", "a=b"]);
        assert!(parse_tag("novalue").is_err());
        assert!(parse_tag("=x").is_err());
    }

    #[test]
    fn commits_to_detects_tampering() {
        let requested = UnsignedEvent::from_payload(&payload());
        let signed = SignedEvent {
            id: requested.id().unwrap(),
            pubkey: requested.pubkey.clone(),
            created_at: requested.created_at,
            kind: requested.kind,
            tags: requested.tags.clone(),
            content: requested.content.clone(),
            sig: "00".repeat(64),
        };
        assert!(signed.commits_to(&requested).unwrap());

        let mut altered = signed.clone();
        altered.content = "goodbye".into();
        assert!(!altered.commits_to(&requested).unwrap());

        let mut wrong_id = signed;
        wrong_id.id = "0".repeat(64);
        assert!(!wrong_id.commits_to(&requested).unwrap());
    }
}
