//! `pancho-client`: talks to the action service and drives the approval
//! lifecycle of the actions it proposes.
//!
//! ```text
//! LifecycleController ── Transport ──▶ action service (HTTP + JSON)
//!     │        │
//!     │        └── ConsentMode ── ConsentSigner (external key holder)
//!     ▼
//! ActionStore ◀── RefreshTask (periodic re-poll)
//! ```

pub mod controller;
pub mod error;
pub mod refresh;
pub mod signer;
pub mod transport;


pub use controller::{ControllerOptions, LifecycleController, PlanOutcome};
pub use error::ClientError;
pub use refresh::{RefreshEvent, RefreshTask};
pub use signer::{CommandSigner, ConsentMode, ConsentSigner};
pub use transport::Transport;

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, ClientError>;
