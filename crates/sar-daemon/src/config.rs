//! Layered configuration (spec §6 "Configuration knobs", spec §10.3): an
//! optional YAML file supplies base values, then `SAR_ACTIONS_`-prefixed
//! environment variables override individual fields, in the manner of the
//! teacher's `nebula-config` `FileLoader`/env-override pattern.

use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

/// `maxDepth` default (spec §5).
pub const DEFAULT_MAX_DEPTH: u32 = sar_types::limits::DEFAULT_MAX_DEPTH;
/// `maxSteps` default (spec §5).
pub const DEFAULT_MAX_STEPS: u32 = sar_types::limits::DEFAULT_MAX_STEPS;
/// `stepTimeout` default, milliseconds (spec §5).
pub const DEFAULT_TIMEOUT_MS: u64 = sar_types::limits::DEFAULT_STEP_TIMEOUT_MS;
/// Multiplier applied to `default_timeout_ms` to derive the action-wide
/// timeout, matching the spec defaults' own ratio (30s step / 300s action).
const ACTION_TIMEOUT_MULTIPLIER: u64 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file `{path}`: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file `{path}`: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("environment variable `{name}` has an invalid value `{value}`: {reason}")]
    InvalidEnvValue {
        name: String,
        value: String,
        reason: String,
    },
}

/// Resolved daemon configuration (spec §6's `actions.*` knobs).
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    /// Additional search directories (`actions.paths`).
    pub paths: Vec<PathBuf>,
    /// Named package references (`actions.packages`).
    pub packages: Vec<String>,
    /// `actions.default_timeout`, applied as the per-step timeout; the
    /// action-wide timeout is derived from it (see
    /// [`ACTION_TIMEOUT_MULTIPLIER`]).
    pub default_timeout_ms: u64,
    /// `actions.max_depth`.
    pub max_depth: u32,
    /// `actions.max_steps`.
    pub max_steps: u32,
    /// `actions.debug`.
    pub debug: bool,
    /// `actions.detect_version`.
    pub detect_version: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            packages: Vec::new(),
            default_timeout_ms: DEFAULT_TIMEOUT_MS,
            max_depth: DEFAULT_MAX_DEPTH,
            max_steps: DEFAULT_MAX_STEPS,
            debug: false,
            detect_version: true,
        }
    }
}

impl RegistryConfig {
    /// The per-step and action-wide timeout pair an `Executor` needs,
    /// derived from `default_timeout_ms` (spec §10.3).
    #[must_use]
    pub fn action_timeout_ms(&self) -> u64 {
        self.default_timeout_ms * ACTION_TIMEOUT_MULTIPLIER
    }

    /// Load defaults, overlay an optional YAML file, then overlay
    /// `SAR_ACTIONS_*` environment variables. A missing file is silently
    /// skipped (no config file is a valid, default configuration); a file
    /// that exists but fails to parse is an error.
    pub fn load(file_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = file_path {
            match std::fs::read_to_string(path) {
                Ok(text) => {
                    let file: FileConfig = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
                        path: path.display().to_string(),
                        source,
                    })?;
                    config.apply_file(file);
                }
                Err(source) if source.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => {
                    return Err(ConfigError::Io {
                        path: path.display().to_string(),
                        source,
                    })
                }
            }
        }

        config.apply_env()?;
        Ok(config)
    }

    fn apply_file(&mut self, file: FileConfig) {
        let Some(actions) = file.actions else { return };
        if let Some(paths) = actions.paths {
            self.paths = paths.into_iter().map(PathBuf::from).collect();
        }
        if let Some(packages) = actions.packages {
            self.packages = packages;
        }
        if let Some(ms) = actions.default_timeout {
            self.default_timeout_ms = ms;
        }
        if let Some(depth) = actions.max_depth {
            self.max_depth = depth;
        }
        if let Some(steps) = actions.max_steps {
            self.max_steps = steps;
        }
        if let Some(debug) = actions.debug {
            self.debug = debug;
        }
        if let Some(detect) = actions.detect_version {
            self.detect_version = detect;
        }
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_var("SAR_ACTIONS_PATHS") {
            self.paths = v.split(':').filter(|s| !s.is_empty()).map(PathBuf::from).collect();
        }
        if let Some(v) = env_var("SAR_ACTIONS_PACKAGES") {
            self.packages = v.split(':').filter(|s| !s.is_empty()).map(str::to_string).collect();
        }
        if let Some(v) = env_var("SAR_ACTIONS_DEFAULT_TIMEOUT") {
            self.default_timeout_ms = parse_env("SAR_ACTIONS_DEFAULT_TIMEOUT", &v)?;
        }
        if let Some(v) = env_var("SAR_ACTIONS_MAX_DEPTH") {
            self.max_depth = parse_env("SAR_ACTIONS_MAX_DEPTH", &v)?;
        }
        if let Some(v) = env_var("SAR_ACTIONS_MAX_STEPS") {
            self.max_steps = parse_env("SAR_ACTIONS_MAX_STEPS", &v)?;
        }
        if let Some(v) = env_var("SAR_ACTIONS_DEBUG") {
            self.debug = parse_env("SAR_ACTIONS_DEBUG", &v)?;
        }
        if let Some(v) = env_var("SAR_ACTIONS_DETECT_VERSION") {
            self.detect_version = parse_env("SAR_ACTIONS_DETECT_VERSION", &v)?;
        }
        Ok(())
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidEnvValue {
        name: name.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// The raw `actions:`-nested YAML shape (spec §6).
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    actions: Option<FileActions>,
}

#[derive(Debug, Deserialize, Default)]
struct FileActions {
    paths: Option<Vec<String>>,
    packages: Option<Vec<String>>,
    default_timeout: Option<u64>,
    max_depth: Option<u32>,
    max_steps: Option<u32>,
    debug: Option<bool>,
    detect_version: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    // `std::env::set_var` mutates global process state; serialize every
    // test that touches it so they can't interleave and read each other's
    // half-applied environment.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn defaults_match_spec_budgets() {
        let config = RegistryConfig::default();
        assert_eq!(config.max_depth, 10);
        assert_eq!(config.max_steps, 100);
        assert_eq!(config.default_timeout_ms, 30_000);
        assert_eq!(config.action_timeout_ms(), 300_000);
        assert!(config.detect_version);
        assert!(!config.debug);
    }

    #[test]
    fn missing_config_file_keeps_defaults() {
        let config = RegistryConfig::load(Some(std::path::Path::new("/does/not/exist.yaml"))).unwrap();
        assert_eq!(config, RegistryConfig::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sar.yaml");
        std::fs::write(
            &path,
            r#"
actions:
  max_depth: 4
  max_steps: 25
  debug: true
"#,
        )
        .unwrap();
        let config = RegistryConfig::load(Some(&path)).unwrap();
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.max_steps, 25);
        assert!(config.debug);
        // Untouched fields keep their defaults.
        assert_eq!(config.default_timeout_ms, 30_000);
    }

    #[test]
    #[allow(unsafe_code, reason = "single-threaded env var mutation under ENV_LOCK, scoped to this test")]
    fn env_override_wins_over_file() {
        let _guard = ENV_LOCK.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sar.yaml");
        std::fs::write(&path, "actions:\n  max_depth: 4\n").unwrap();

        unsafe {
            std::env::set_var("SAR_ACTIONS_MAX_DEPTH", "7");
        }
        let config = RegistryConfig::load(Some(&path));
        unsafe {
            std::env::remove_var("SAR_ACTIONS_MAX_DEPTH");
        }
        assert_eq!(config.unwrap().max_depth, 7);
    }

    #[test]
    #[allow(unsafe_code, reason = "single-threaded env var mutation under ENV_LOCK, scoped to this test")]
    fn invalid_env_value_is_reported() {
        let _guard = ENV_LOCK.lock().unwrap();
        unsafe {
            std::env::set_var("SAR_ACTIONS_MAX_DEPTH", "not-a-number");
        }
        let result = RegistryConfig::load(None);
        unsafe {
            std::env::remove_var("SAR_ACTIONS_MAX_DEPTH");
        }
        assert!(matches!(result, Err(ConfigError::InvalidEnvValue { .. })));
    }
}
