//! Workflow engine logic and port definitions for hookflow.
//!
//! This crate defines the "ports" (runner, hook, log and source traits) that
//! the infrastructure layer implements. It depends only on `hookflow-types`
//! and never on `hookflow-infra` or any database/process crate.

pub mod repository;
pub mod workflow;
