//! Drives the action lifecycle against the service and keeps the local
//! [`ActionStore`] converged to the service's view.
//!
//! Every transition is decided by the service. The controller only refuses
//! requests it can tell are pointless from the cached status (when strict
//! transitions are on), gathers consent, and applies whatever the service
//! returns. A failed call never touches the store.

use std::sync::Arc;
use std::time::Duration;

use pancho_core::event::APPROVAL_EVENT_KIND;
use pancho_core::ttl::now_ts;
use pancho_core::{
    Action, ActionStatus, ActionStore, ApprovalClaim, AuditEntry, ClientConfig, OnMiss,
    SignedEvent, UnsignedEvent, Upsert,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::refresh::RefreshTask;
use crate::signer::{ConsentMode, ConsentSigner};
use crate::transport::{path_segment, Transport};
use crate::{ClientError, Result};

// ─── Options ──────────────────────────────────────────────────────────────

/// Behavioral switches taken from [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub strict_transitions: bool,
    pub verify_action_hash: bool,
    pub on_miss: OnMiss,
    pub refresh_concurrency: usize,
}

impl From<&ClientConfig> for ControllerOptions {
    fn from(config: &ClientConfig) -> Self {
        Self {
            strict_transitions: config.strict_transitions,
            verify_action_hash: config.verify_action_hash,
            on_miss: config.unknown_action_policy,
            refresh_concurrency: config.refresh_concurrency.max(1),
        }
    }
}

/// Result of a plan request.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    pub summary: String,
    pub actions: Vec<Action>,
}

#[derive(Deserialize)]
struct PlanResponse {
    #[serde(default)]
    plan_summary: String,
    #[serde(default)]
    actions: Vec<Action>,
}

#[derive(Deserialize)]
struct AuditResponse {
    #[serde(default)]
    entries: Vec<AuditEntry>,
}

// ─── LifecycleController ──────────────────────────────────────────────────

/// Cheap to clone: clones share one store and one HTTP connection pool.
#[derive(Debug, Clone)]
pub struct LifecycleController {
    transport: Transport,
    store: Arc<ActionStore>,
    consent: ConsentMode,
    options: ControllerOptions,
}

impl LifecycleController {
    pub fn new(config: &ClientConfig, consent: ConsentMode) -> Result<Self> {
        Ok(Self {
            transport: Transport::new(config)?,
            store: Arc::new(ActionStore::new()),
            consent,
            options: ControllerOptions::from(config),
        })
    }

    /// Consent mode derived from the config's `signer` section.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::new(config, ConsentMode::from_config(config))
    }

    pub fn consent(&self) -> &ConsentMode {
        &self.consent
    }

    pub fn store(&self) -> &Arc<ActionStore> {
        &self.store
    }

    pub fn snapshot(&self) -> Vec<Action> {
        self.store.snapshot()
    }

    pub fn get(&self, action_id: &str) -> Option<Action> {
        self.store.get(action_id)
    }

    // -----------------------------------------------------------------------
    // Proposals
    // -----------------------------------------------------------------------

    /// Ask the service for a fresh batch of actions. Replaces everything the
    /// store tracked before.
    pub async fn plan(&self, goal: &str) -> Result<PlanOutcome> {
        let path = "/agent/plan";
        let body = self.transport.post_json(path, &json!({ "goal": goal })).await?;
        let resp: PlanResponse = decode(path, body)?;
        self.store.replace_all(resp.actions.clone());
        info!(count = resp.actions.len(), "plan replaced tracked actions");
        Ok(PlanOutcome {
            summary: resp.plan_summary,
            actions: resp.actions,
        })
    }

    /// Propose one signed-post action. `relays` is only sent when set.
    pub async fn propose_single(
        &self,
        content: &str,
        pubkey: &str,
        tags: Vec<Vec<String>>,
        relays: Option<Vec<String>>,
    ) -> Result<Action> {
        let path = "/actions/propose";
        let mut req = json!({
            "content": content,
            "pubkey": pubkey,
            "tags": tags,
        });
        if let Some(relays) = relays {
            req["relays"] = json!(relays);
        }
        let body = self.transport.post_json(path, &req).await?;
        let action: Action = decode(path, body)?;
        self.store.upsert_by_matching_id(action.clone(), OnMiss::Append);
        info!(action_id = %action.action_id, "action proposed");
        Ok(action)
    }

    // -----------------------------------------------------------------------
    // Approval
    // -----------------------------------------------------------------------

    /// Approve using whichever consent mechanism this controller was built with.
    pub async fn authorize(&self, action_id: &str) -> Result<Action> {
        match &self.consent {
            ConsentMode::Direct => self.approve(action_id).await,
            ConsentMode::ExternalSignature(_) => self.approve_with_consent(action_id).await,
        }
    }

    /// Plain approval: only the identifier is sent.
    pub async fn approve(&self, action_id: &str) -> Result<Action> {
        let cached = self.tracked(action_id)?;
        self.guard(&cached, ActionStatus::Proposed, "approve")?;

        let path = "/actions/approve";
        let body = self
            .transport
            .post_json(path, &json!({ "action_id": action_id }))
            .await?;
        let action = self.reconcile(action_id, path, body).await?;
        info!(action_id, status = %action.status, "approve applied");
        Ok(action)
    }

    /// Cryptographic approval: the signer signs the action's payload and an
    /// attestation binding `{action_id, action_hash}`; both go out in one
    /// request.
    pub async fn approve_with_consent(&self, action_id: &str) -> Result<Action> {
        let cached = self.tracked(action_id)?;
        self.guard(&cached, ActionStatus::Proposed, "approve")?;

        let signer = match &self.consent {
            ConsentMode::ExternalSignature(signer) if signer.is_available() => Arc::clone(signer),
            ConsentMode::ExternalSignature(_) => {
                return Err(ClientError::CapabilityUnavailable(
                    "configured signer is not reachable".into(),
                ))
            }
            ConsentMode::Direct => {
                return Err(ClientError::CapabilityUnavailable(
                    "no signer configured".into(),
                ))
            }
        };

        let payload = cached
            .action_payload
            .as_ref()
            .ok_or_else(|| missing(action_id, "action_payload"))?;
        let action_hash = cached
            .action_hash
            .as_deref()
            .ok_or_else(|| missing(action_id, "action_hash"))?;

        if self.options.verify_action_hash {
            let computed = payload.fingerprint()?;
            if computed != action_hash {
                return Err(ClientError::HashMismatch {
                    action_id: action_id.to_string(),
                    reported: action_hash.to_string(),
                    computed,
                });
            }
        }

        let note = UnsignedEvent::from_payload(payload);
        let note_event = sign_checked(signer.as_ref(), &note).await?;

        let claim = ApprovalClaim::new(action_id, action_hash);
        let attestation = UnsignedEvent::approval(&claim, payload.pubkey.clone(), now_ts())?;
        let approval_event = sign_checked(signer.as_ref(), &attestation).await?;
        debug!(action_id, kind = APPROVAL_EVENT_KIND, "approval attestation signed");

        let path = "/actions/approve";
        let body = self
            .transport
            .post_json(
                path,
                &json!({
                    "action_id": action_id,
                    "approval_event": approval_event,
                    "note_event": note_event,
                }),
            )
            .await?;
        let action = self.reconcile(action_id, path, body).await?;
        info!(action_id, status = %action.status, "signed approval applied");
        Ok(action)
    }

    // -----------------------------------------------------------------------
    // Execution and observation
    // -----------------------------------------------------------------------

    /// Ask the service to execute. The service alone decides whether the
    /// action is still approved and unexpired.
    pub async fn execute(&self, action_id: &str) -> Result<Action> {
        if self.options.strict_transitions {
            let cached = self.tracked(action_id)?;
            self.guard(&cached, ActionStatus::Approved, "execute")?;
        }

        let path = "/actions/execute";
        let body = self
            .transport
            .post_json(path, &json!({ "action_id": action_id }))
            .await?;
        let action = self.reconcile(action_id, path, body).await?;
        info!(action_id, status = %action.status, "execute applied");
        Ok(action)
    }

    /// Fetch the service's current view of one action and apply it.
    pub async fn refresh(&self, action_id: &str) -> Result<Action> {
        self.fetch_and_apply(action_id, self.options.on_miss).await
    }

    /// Like [`refresh`](Self::refresh), but starts tracking the action if the
    /// store does not know it yet.
    pub async fn track(&self, action_id: &str) -> Result<Action> {
        self.fetch_and_apply(action_id, OnMiss::Append).await
    }

    /// Read-only audit trail fetch. Does not touch the store.
    pub async fn audit(&self, action_id: &str) -> Result<Vec<AuditEntry>> {
        let path = format!("/actions/{}/audit", path_segment(action_id)?);
        let body = self.transport.get_json(&path).await?;
        let resp: AuditResponse = decode(&path, body)?;
        Ok(resp.entries)
    }

    /// Spawn the periodic refresh of every tracked action.
    pub fn start_refresh(&self, interval: Duration) -> RefreshTask {
        RefreshTask::spawn(self.clone(), interval, self.options.refresh_concurrency)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn fetch_and_apply(&self, action_id: &str, on_miss: OnMiss) -> Result<Action> {
        let path = format!("/actions/{}", path_segment(action_id)?);
        let body = self.transport.get_json(&path).await?;
        let action: Action = decode(&path, body)?;
        if action.action_id != action_id {
            return Err(ClientError::MismatchedAction {
                requested: action_id.to_string(),
                returned: action.action_id,
            });
        }
        self.apply(action.clone(), on_miss);
        Ok(action)
    }

    fn apply(&self, action: Action, on_miss: OnMiss) {
        let id = action.action_id.clone();
        let status = action.status.clone();
        if self.store.upsert_by_matching_id(action, on_miss) == Upsert::Appended {
            debug!(action_id = %id, %status, "started tracking action");
        }
    }

    /// Apply a transition response. Full actions (bare or under `action`)
    /// are applied directly; partial acknowledgements trigger a refresh.
    async fn reconcile(&self, action_id: &str, path: &str, body: Value) -> Result<Action> {
        let full = if body.get("action_id").is_some() {
            Some(body)
        } else {
            match body {
                Value::Object(mut map) => map
                    .remove("action")
                    .filter(|inner| inner.get("action_id").is_some()),
                _ => None,
            }
        };
        match full {
            Some(value) => {
                let action: Action = decode(path, value)?;
                self.apply(action.clone(), self.options.on_miss);
                Ok(action)
            }
            None => {
                debug!(action_id, path, "partial response, refreshing");
                self.refresh(action_id).await
            }
        }
    }

    fn tracked(&self, action_id: &str) -> Result<Action> {
        self.store
            .get(action_id)
            .ok_or_else(|| ClientError::UnknownAction(action_id.to_string()))
    }

    fn guard(&self, cached: &Action, required: ActionStatus, operation: &str) -> Result<()> {
        if self.options.strict_transitions && cached.status != required {
            return Err(ClientError::InvalidTransition {
                action_id: cached.action_id.clone(),
                status: cached.status.to_string(),
                operation: operation.to_string(),
            });
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(path: &str, body: Value) -> Result<T> {
    serde_json::from_value(body).map_err(|source| ClientError::Decode {
        path: path.to_string(),
        source,
    })
}

fn missing(action_id: &str, field: &str) -> ClientError {
    ClientError::MissingConsentMaterial {
        action_id: action_id.to_string(),
        field: field.to_string(),
    }
}

/// Sign `requested` and make sure the signer signed exactly that.
async fn sign_checked(signer: &dyn ConsentSigner, requested: &UnsignedEvent) -> Result<SignedEvent> {
    let signed = signer.sign_event(requested).await?;
    if !signed.commits_to(requested)? {
        return Err(ClientError::Signer(format!(
            "signer returned event {} that does not match the kind {} request",
            signed.id, requested.kind
        )));
    }
    Ok(signed)
}
