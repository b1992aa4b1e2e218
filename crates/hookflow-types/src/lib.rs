//! Shared domain types for hookflow.
//!
//! Workflow definitions, per-dispatch execution records, execution log
//! entries and engine configuration.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod execution;
pub mod log;
pub mod workflow;
