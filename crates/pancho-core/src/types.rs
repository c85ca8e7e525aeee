use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// ActionStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of an action as reported by the action service.
///
/// The service owns the vocabulary. Known values are parsed
/// case-insensitively; anything else is kept verbatim in `Other` so the
/// client never has to guess. Statuses are only ever compared for equality.
/// This is the interpreted value; [`crate::Action`] also keeps the spelling
/// the service used and writes that back out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ActionStatus {
    Proposed,
    Approved,
    Executing,
    Executed,
    Expired,
    Rejected,
    Other(String),
}

impl ActionStatus {
    pub fn known() -> &'static [ActionStatus] {
        &[
            ActionStatus::Proposed,
            ActionStatus::Approved,
            ActionStatus::Executing,
            ActionStatus::Executed,
            ActionStatus::Expired,
            ActionStatus::Rejected,
        ]
    }

    pub fn as_str(&self) -> &str {
        match self {
            ActionStatus::Proposed => "proposed",
            ActionStatus::Approved => "approved",
            ActionStatus::Executing => "executing",
            ActionStatus::Executed => "executed",
            ActionStatus::Expired => "expired",
            ActionStatus::Rejected => "rejected",
            ActionStatus::Other(s) => s.as_str(),
        }
    }

    /// True once no further transition can happen on the service side.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ActionStatus::Executed | ActionStatus::Expired | ActionStatus::Rejected
        )
    }

    pub fn parse(s: &str) -> ActionStatus {
        match s.to_ascii_lowercase().as_str() {
            "proposed" => ActionStatus::Proposed,
            "approved" => ActionStatus::Approved,
            "executing" => ActionStatus::Executing,
            "executed" => ActionStatus::Executed,
            "expired" => ActionStatus::Expired,
            "rejected" => ActionStatus::Rejected,
            _ => ActionStatus::Other(s.to_string()),
        }
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ActionStatus {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(crate::error::CoreError::InvalidStatus(s.to_string()));
        }
        Ok(ActionStatus::parse(s))
    }
}

impl Serialize for ActionStatus {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActionStatus {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(ActionStatus::parse(&raw))
    }
}

// ---------------------------------------------------------------------------
// OnMiss
// ---------------------------------------------------------------------------

/// What an upsert does when no cached action carries the incoming id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnMiss {
    /// Leave the store untouched and log a warning.
    #[default]
    Drop,
    /// Add the action at the end of the sequence.
    Append,
}

impl OnMiss {
    pub fn as_str(self) -> &'static str {
        match self {
            OnMiss::Drop => "drop",
            OnMiss::Append => "append",
        }
    }
}

impl fmt::Display for OnMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OnMiss {
    type Err = crate::error::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drop" => Ok(OnMiss::Drop),
            "append" => Ok(OnMiss::Append),
            _ => Err(crate::error::CoreError::InvalidPolicy(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
