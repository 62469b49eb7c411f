//! Provider-independent reconciliation machinery
//!
//! The per-kind resources in the AWS and GCP crates implement
//! [`CloudResource`]; the orchestrators drive them through
//! [`ensure_exists`]/[`ensure_absent`]. Long-running operations returned by
//! some provider mutations are followed with [`follow_operation`].

pub mod operation;
pub mod resource;

pub use operation::{follow_operation, OperationApi, OperationError, OperationPoll, OPERATION_POLL_INTERVAL};
pub use resource::{ensure_absent, ensure_exists, CloudResource, CreateOutcome, DeleteOutcome, Observation};
