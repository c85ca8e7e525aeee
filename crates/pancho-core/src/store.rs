//! In-memory cache of the actions known to this client session.
//!
//! The store is never the source of truth: it mirrors the last response
//! received per `action_id`. Mutation happens only through
//! [`ActionStore::replace_all`] and [`ActionStore::upsert_by_matching_id`];
//! each takes the write lock for the whole update, so a reader sees either
//! the sequence before or after, never a mix.

use std::sync::{PoisonError, RwLock};

use crate::action::Action;
use crate::types::OnMiss;

/// Result of [`ActionStore::upsert_by_matching_id`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// An entry with the same id was replaced in place.
    Replaced,
    /// No entry matched and the action was added at the end.
    Appended,
    /// No entry matched and the update was discarded.
    Dropped,
}

#[derive(Debug, Default)]
pub struct ActionStore {
    actions: RwLock<Vec<Action>>,
}

impl ActionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole sequence, preserving the order given.
    pub fn replace_all(&self, actions: Vec<Action>) {
        let mut guard = self.actions.write().unwrap_or_else(PoisonError::into_inner);
        *guard = actions;
    }

    /// Replace the entry whose id matches `action.action_id`, keeping its
    /// position. Entries with other ids are left untouched.
    pub fn upsert_by_matching_id(&self, action: Action, on_miss: OnMiss) -> Upsert {
        let mut guard = self.actions.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = guard.iter_mut().find(|a| a.action_id == action.action_id) {
            *slot = action;
            return Upsert::Replaced;
        }
        match on_miss {
            OnMiss::Append => {
                guard.push(action);
                Upsert::Appended
            }
            OnMiss::Drop => {
                tracing::warn!(
                    action_id = %action.action_id,
                    status = %action.status,
                    "dropping update for action not tracked by this session"
                );
                Upsert::Dropped
            }
        }
    }

    /// Owned copy of the current sequence.
    pub fn snapshot(&self) -> Vec<Action> {
        self.actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn get(&self, action_id: &str) -> Option<Action> {
        self.actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|a| a.action_id == action_id)
            .cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        self.actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|a| a.action_id.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every action. Only used when a session is torn down.
    pub fn clear(&self) {
        self.actions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
