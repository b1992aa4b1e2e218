//! Observability setup for hookflow.

pub mod tracing_setup;
