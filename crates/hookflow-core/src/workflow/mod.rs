//! Event-triggered workflow execution.
//!
//! - `registry` -- workflow table and event index
//! - `condition` -- built-in trigger conditions
//! - `expression` -- predicate language for `custom` conditions
//! - `template` -- command template interpolation
//! - `retry` -- exponential backoff policy
//! - `command` / `hook` -- ports for subprocesses and external hooks
//! - `step_runner` -- one step with retries and timeout
//! - `pipeline` -- sequential and parallel step orchestration
//! - `engine` -- the `WorkflowEngine` facade

pub mod command;
pub mod condition;
pub mod engine;
pub mod expression;
pub mod hook;
pub mod pipeline;
pub mod registry;
pub mod retry;
pub mod step_runner;
pub mod template;

#[cfg(test)]
pub(crate) mod testing;
