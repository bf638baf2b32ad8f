//! Configuration file discovery and parsing.
//!
//! | Source                      | Notes                                   |
//! |-----------------------------|-----------------------------------------|
//! | `$UPWATCH_CONFIG`           | Used verbatim when set                  |
//! | `./monitor.yaml`            | First well-known location               |
//! | `~/.monitor.yaml`           | Resolved through `$HOME`                |
//! | `/etc/monitor/config.yaml`  | System-wide fallback                    |

use std::path::{Path, PathBuf};

use crate::config::MonitorConfig;
use crate::error::CoreError;

/// Environment variable that points at an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "UPWATCH_CONFIG";

/// Configuration file name inside the working directory.
const LOCAL_CONFIG: &str = "./monitor.yaml";

/// Configuration file name inside the user's home directory.
const HOME_CONFIG: &str = ".monitor.yaml";

/// System-wide configuration file.
const SYSTEM_CONFIG: &str = "/etc/monitor/config.yaml";

/// Candidate configuration paths in search order.
pub fn candidate_paths(home: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG)];
    if let Some(home) = home {
        paths.push(home.join(HOME_CONFIG));
    }
    paths.push(PathBuf::from(SYSTEM_CONFIG));
    paths
}

/// Locate the configuration file using the process environment.
pub fn discover() -> Result<PathBuf, CoreError> {
    let explicit = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
    let home = std::env::var_os("HOME").map(PathBuf::from);
    discover_from(explicit, &candidate_paths(home.as_deref()))
}

/// Resolve the configuration file from an explicit override or the first
/// existing candidate.
///
/// An explicit path is returned even if it does not exist, so that the read
/// error names the file the operator asked for.
pub fn discover_from(explicit: Option<PathBuf>, candidates: &[PathBuf]) -> Result<PathBuf, CoreError> {
    if let Some(path) = explicit {
        return Ok(path);
    }

    candidates
        .iter()
        .find(|p| p.is_file())
        .cloned()
        .ok_or_else(|| CoreError::ConfigNotFound {
            searched: candidates
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

/// Read, parse and validate a configuration file.
pub fn load(path: &Path) -> Result<MonitorConfig, CoreError> {
    let content = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&content)
}

/// Parse and validate a configuration document.
pub fn parse(content: &str) -> Result<MonitorConfig, CoreError> {
    let config: MonitorConfig = serde_yaml::from_str(content)?;
    config.validate()?;
    Ok(config)
}
