use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{HydroError, Result};
use crate::model::DEFAULT_GOAL_ML;
use crate::sync::{SyncOptions, SyncTimeouts};

/// Environment lookup, injectable so overrides can be tested without
/// touching the process environment.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub goal: GoalConfig,
    #[serde(default)]
    pub session: SessionConfig,
}

impl Config {
    /// Global then project config (or an explicit file), then `HYDRO_*`
    /// environment overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let env = |key: &str| std::env::var(key).ok();
        Self::load_with(explicit_path, global_config_path().as_deref(), &env)
    }

    pub fn load_with(
        explicit_path: Option<&Path>,
        global_path: Option<&Path>,
        env: EnvLookup<'_>,
    ) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| env("HYDRO_CONFIG").map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = global_path {
                if let Some(patch) = Self::load_patch(global)? {
                    config.merge_patch(patch);
                }
            }
            let data_dir = env("HYDRO_DATA_DIR")
                .map_or_else(|| config.storage.data_dir.clone(), PathBuf::from);
            if let Some(project) = Self::load_patch(&data_dir.join("config.toml"))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides(env)?;
        config.validate()?;

        Ok(config)
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| HydroError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| HydroError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.storage {
            self.storage.merge(patch);
        }
        if let Some(patch) = patch.remote {
            self.remote.merge(patch);
        }
        if let Some(patch) = patch.sync {
            self.sync.merge(patch);
        }
        if let Some(patch) = patch.goal {
            self.goal.merge(patch);
        }
        if let Some(patch) = patch.session {
            self.session.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self, env: EnvLookup<'_>) -> Result<()> {
        if let Some(value) = env("HYDRO_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(value);
        }

        if let Some(value) = env_bool(env, "HYDRO_REMOTE_ENABLED") {
            self.remote.enabled = value;
        }
        if let Some(value) = env("HYDRO_REMOTE_URL") {
            self.remote.base_url = Some(value);
        }
        if let Some(value) = env("HYDRO_REMOTE_PROJECT") {
            self.remote.project = Some(value);
        }

        if let Some(value) = env_duration(env, "HYDRO_PROBE_TIMEOUT")? {
            self.sync.probe_timeout = value;
        }
        if let Some(value) = env_duration(env, "HYDRO_READ_TIMEOUT")? {
            self.sync.read_timeout = value;
        }
        if let Some(value) = env_duration(env, "HYDRO_WRITE_TIMEOUT")? {
            self.sync.write_timeout = value;
        }

        if let Some(value) = env_u32(env, "HYDRO_DEFAULT_GOAL_ML")? {
            self.goal.default_ml = value;
        }

        if let Some(value) = env("HYDRO_USER_ID") {
            self.session.user_id = Some(value).filter(|v| !v.trim().is_empty());
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("sync.probe_timeout", self.sync.probe_timeout),
            ("sync.read_timeout", self.sync.read_timeout),
            ("sync.write_timeout", self.sync.write_timeout),
        ] {
            if value.is_zero() {
                return Err(HydroError::Config(format!("{name} must be greater than zero")));
            }
        }
        if self.goal.default_ml == 0 {
            return Err(HydroError::Config(
                "goal.default_ml must be greater than zero".to_string(),
            ));
        }
        if self.storage.db_file.trim().is_empty() {
            return Err(HydroError::Config("storage.db_file must not be empty".to_string()));
        }
        if self.remote.enabled
            && self
                .remote
                .base_url
                .as_deref()
                .is_none_or(|url| url.trim().is_empty())
        {
            return Err(HydroError::MissingConfig("remote.base_url".to_string()));
        }
        Ok(())
    }

    /// Path of the local SQLite file.
    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.storage.data_dir.join(&self.storage.db_file)
    }

    #[must_use]
    pub fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            timeouts: self.sync.timeouts(),
            default_goal_ml: self.goal.default_ml,
        }
    }
}

fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("hydrosync").join("config.toml"))
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(|| PathBuf::from(".hydrosync"), |dir| dir.join("hydrosync"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_db_file")]
    pub db_file: String,
}

fn default_db_file() -> String {
    "local.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            db_file: default_db_file(),
        }
    }
}

impl StorageConfig {
    fn merge(&mut self, patch: StoragePatch) {
        if let Some(value) = patch.data_dir {
            self.data_dir = value;
        }
        if let Some(value) = patch.db_file {
            self.db_file = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key.
    #[serde(default)]
    pub api_key_env: String,
    #[serde(default)]
    pub project: Option<String>,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: None,
            api_key_env: "HYDRO_API_KEY".to_string(),
            project: None,
        }
    }
}

impl RemoteConfig {
    fn merge(&mut self, patch: RemotePatch) {
        if let Some(value) = patch.enabled {
            self.enabled = value;
        }
        if let Some(value) = patch.base_url {
            self.base_url = Some(value);
        }
        if let Some(value) = patch.api_key_env {
            self.api_key_env = value;
        }
        if let Some(value) = patch.project {
            self.project = Some(value);
        }
    }

    /// API key from the configured environment variable, if set.
    pub fn api_key(&self, env: EnvLookup<'_>) -> Option<String> {
        env(&self.api_key_env).filter(|key| !key.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(with = "humantime_serde")]
    pub probe_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub write_timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let timeouts = SyncTimeouts::default();
        Self {
            probe_timeout: timeouts.probe,
            read_timeout: timeouts.read,
            write_timeout: timeouts.write,
        }
    }
}

impl SyncConfig {
    fn merge(&mut self, patch: SyncPatch) {
        if let Some(value) = patch.probe_timeout {
            self.probe_timeout = value;
        }
        if let Some(value) = patch.read_timeout {
            self.read_timeout = value;
        }
        if let Some(value) = patch.write_timeout {
            self.write_timeout = value;
        }
    }

    #[must_use]
    pub const fn timeouts(&self) -> SyncTimeouts {
        SyncTimeouts {
            probe: self.probe_timeout,
            read: self.read_timeout,
            write: self.write_timeout,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalConfig {
    #[serde(default)]
    pub default_ml: u32,
}

impl Default for GoalConfig {
    fn default() -> Self {
        Self {
            default_ml: DEFAULT_GOAL_ML,
        }
    }
}

impl GoalConfig {
    fn merge(&mut self, patch: GoalPatch) {
        if let Some(value) = patch.default_ml {
            self.default_ml = value;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Static identity for the CLI; no session when unset.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl SessionConfig {
    fn merge(&mut self, patch: SessionPatch) {
        if let Some(value) = patch.user_id {
            self.user_id = Some(value);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub storage: Option<StoragePatch>,
    pub remote: Option<RemotePatch>,
    pub sync: Option<SyncPatch>,
    pub goal: Option<GoalPatch>,
    pub session: Option<SessionPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct StoragePatch {
    pub data_dir: Option<PathBuf>,
    pub db_file: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RemotePatch {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    pub api_key_env: Option<String>,
    pub project: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SyncPatch {
    #[serde(default, with = "humantime_serde")]
    pub probe_timeout: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub read_timeout: Option<Duration>,
    #[serde(default, with = "humantime_serde")]
    pub write_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct GoalPatch {
    pub default_ml: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SessionPatch {
    pub user_id: Option<String>,
}

fn env_bool(env: EnvLookup<'_>, key: &str) -> Option<bool> {
    env(key).map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

fn env_u32(env: EnvLookup<'_>, key: &str) -> Result<Option<u32>> {
    match env(key) {
        Some(value) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|err| HydroError::Config(format!("invalid {key} value {value}: {err}"))),
        None => Ok(None),
    }
}

fn env_duration(env: EnvLookup<'_>, key: &str) -> Result<Option<Duration>> {
    match env(key) {
        Some(value) => humantime_serde::re::humantime::parse_duration(&value)
            .map(Some)
            .map_err(|err| HydroError::Config(format!("invalid {key} value {value}: {err}"))),
        None => Ok(None),
    }
}
