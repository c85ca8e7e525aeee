use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// No response was received (connect failure, timeout, DNS, ...).
    #[error("transport error for {method} {url}: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A response arrived but its body is not valid JSON.
    #[error("failed to parse response from {url} (HTTP {status_code}): {source}")]
    Parse {
        url: String,
        status_code: u16,
        #[source]
        source: serde_json::Error,
    },

    /// Valid JSON, but not the shape the operation expects.
    #[error("unexpected response shape from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// The service answered with a non-success status.
    #[error("service error {status_code}: {detail}")]
    Service { status_code: u16, detail: String },

    #[error("consent signer unavailable: {0}")]
    CapabilityUnavailable(String),

    #[error("action not tracked by this session: {0}")]
    UnknownAction(String),

    /// The identifier cannot name a single resource (empty, `.` or `..`).
    #[error("invalid action id: {0:?}")]
    InvalidActionId(String),

    #[error("asked for action {requested}, service returned {returned}")]
    MismatchedAction { requested: String, returned: String },

    #[error("cannot {operation} action {action_id} while it is {status}")]
    InvalidTransition {
        action_id: String,
        status: String,
        operation: String,
    },

    #[error("action {action_id} is missing {field}, required for signed approval")]
    MissingConsentMaterial { action_id: String, field: String },

    #[error("action {action_id} payload hashes to {computed}, service reported {reported}")]
    HashMismatch {
        action_id: String,
        reported: String,
        computed: String,
    },

    #[error("signer error: {0}")]
    Signer(String),

    #[error(transparent)]
    Core(#[from] pancho_core::CoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// The service-provided detail text, when this is a service error.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ClientError::Service { detail, .. } => Some(detail),
            _ => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::Service { status_code, .. } | ClientError::Parse { status_code, .. } => {
                Some(*status_code)
            }
            _ => None,
        }
    }
}
