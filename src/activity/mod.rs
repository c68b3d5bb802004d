//! Session activity logging and reporting.
//!
//! The dashboard reports what users do (logins, navigation, approvals) to a
//! best-effort JSONL log; `busdash history` reads it back.

pub mod logger;
pub mod reporter;

pub use logger::{ActivityEntry, ActivityKind, ActivityLog};
