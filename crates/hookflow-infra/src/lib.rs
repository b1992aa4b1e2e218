//! Infrastructure layer for hookflow.
//!
//! Contains implementations of the ports defined in `hookflow-core`: the
//! platform shell command runner, the SQLite execution log, the
//! directory-of-JSON workflow source, and the `config.toml` loader.

pub mod config;
pub mod filesystem;
pub mod process;
pub mod sqlite;
