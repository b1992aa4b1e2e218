//! Data directory layout and the directory-of-JSON workflow source.

pub mod workflows;

use std::ffi::OsString;
use std::path::{Path, PathBuf};

const DATA_DIR_ENV: &str = "HOOKFLOW_DATA_DIR";
const DATA_DIR_NAME: &str = ".hookflow";

/// `$HOOKFLOW_DATA_DIR` if set and non-empty, else `~/.hookflow`, else
/// `.hookflow` relative to the working directory.
pub fn resolve_data_dir() -> PathBuf {
    data_dir_from(std::env::var_os(DATA_DIR_ENV), dirs::home_dir())
}

fn data_dir_from(env_override: Option<OsString>, home: Option<PathBuf>) -> PathBuf {
    match (env_override, home) {
        (Some(dir), _) if !dir.is_empty() => PathBuf::from(dir),
        (_, Some(home)) => home.join(DATA_DIR_NAME),
        _ => PathBuf::from(DATA_DIR_NAME),
    }
}

/// Default location of JSON workflow definitions: `{data_dir}/workflows/`.
pub fn workflows_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("workflows")
}
