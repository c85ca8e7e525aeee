pub mod action;
pub mod canonical;
pub mod config;
pub mod error;
pub mod event;
pub mod io;
pub mod store;
pub mod ttl;
pub mod types;

pub use action::{Action, ActionPayload, AuditEntry};
pub use config::{ClientConfig, SignerConfig};
pub use error::{CoreError, Result};
pub use event::{ApprovalClaim, SignedEvent, UnsignedEvent};
pub use store::{ActionStore, Upsert};
pub use types::{ActionStatus, OnMiss};
