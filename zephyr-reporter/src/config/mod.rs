// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the reporter.
//!
//! There are two sets of inputs:
//!
//! * [`PluginOptions`], supplied by the host test runner when it configures the plugin.
//! * [`ReporterSettings`], describing where the server is. These are loaded by
//!   [`SettingsLoader`] from built-in defaults, an optional `zephyr.toml`, and `JIRA_*`
//!   environment variables, in increasing order of priority.

mod rate_limit;

pub use rate_limit::*;

use crate::errors::ConfigError;
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Local};
use config::{Config, Environment, File, FileFormat};
use debug_ignore::DebugIgnore;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use zephyr_metadata::ProjectId;

/// A bearer token used to authenticate with the server.
///
/// The token is never printed by `Debug`.
#[derive(Clone, Debug)]
pub struct AuthToken(DebugIgnore<String>);

impl AuthToken {
    /// Creates a new token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(DebugIgnore(token.into()))
    }

    /// Returns the token itself.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

/// Options supplied by the host test runner.
#[derive(Clone, Debug)]
pub struct PluginOptions {
    /// Whether results are reported at all.
    pub enabled: bool,

    /// The name of the test cycle to create.
    pub cycle_name: String,

    /// The token to authenticate with. Required if `enabled` is true.
    pub auth_token: Option<AuthToken>,

    /// The key of an existing cycle to report into, e.g. `PROJ-C12`. If set, no cycle is
    /// created and `cycle_name` is unused.
    pub cycle_key: Option<String>,
}

impl Default for PluginOptions {
    fn default() -> Self {
        Self {
            enabled: false,
            cycle_name: default_cycle_name(Local::now()),
            auth_token: None,
            cycle_key: None,
        }
    }
}

impl PluginOptions {
    /// Options with reporting enabled, authenticating with `auth_token`.
    pub fn enabled(auth_token: AuthToken) -> Self {
        Self {
            enabled: true,
            auth_token: Some(auth_token),
            ..Default::default()
        }
    }

    /// Overrides the name of the test cycle.
    pub fn with_cycle_name(mut self, cycle_name: impl Into<String>) -> Self {
        self.cycle_name = cycle_name.into();
        self
    }

    /// Reports into the existing cycle `cycle_key` instead of creating one.
    pub fn with_cycle_key(mut self, cycle_key: impl Into<String>) -> Self {
        self.cycle_key = Some(cycle_key.into());
        self
    }

    /// Checks that the options are consistent, returning the token to use if reporting is
    /// enabled.
    pub fn validate(&self) -> Result<Option<&AuthToken>, ConfigError> {
        if !self.enabled {
            return Ok(None);
        }
        match &self.auth_token {
            Some(token) if !token.expose().is_empty() => Ok(Some(token)),
            _ => Err(ConfigError::MissingAuthToken),
        }
    }
}

/// Returns the name given to a test cycle started at `started_at`, unless overridden.
pub fn default_cycle_name(started_at: DateTime<Local>) -> String {
    format!("Test Cycle {}", started_at.format("%Y-%m-%d %H-%M-%S"))
}

/// Where the server is, and how to talk to it.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReporterSettings {
    /// The base URL of the Jira instance, without a trailing slash.
    pub base_url: String,

    /// The numeric id of the project to report into.
    pub project_id: ProjectId,

    /// The folder to place the test cycle in. It is created if it doesn't exist.
    pub folder_name: Option<String>,

    /// How rate-limited requests are retried.
    pub rate_limit: RateLimitPolicy,

    /// The time a single request may take.
    pub timeout: Duration,
}

// Unknown keys are tolerated: unrelated JIRA_* variables (such as a token) are common.
#[derive(Deserialize)]
struct ReporterSettingsDeserialize {
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    project_id: Option<ProjectId>,
    #[serde(default)]
    folder_name: Option<String>,
    rate_limit: RateLimitPolicy,
    #[serde(with = "humantime_serde")]
    timeout: Duration,
}

impl ReporterSettingsDeserialize {
    fn into_settings(self) -> Result<ReporterSettings, ConfigError> {
        let base_url = self
            .url
            .map(|url| url.trim_end_matches('/').to_owned())
            .filter(|url| !url.is_empty())
            .ok_or(ConfigError::MissingSetting {
                name: "url",
                env_var: "JIRA_URL",
            })?;
        let project_id = self.project_id.ok_or(ConfigError::MissingSetting {
            name: "project_id",
            env_var: "JIRA_PROJECT_ID",
        })?;

        Ok(ReporterSettings {
            base_url,
            project_id,
            folder_name: self.folder_name.filter(|name| !name.is_empty()),
            rate_limit: self.rate_limit,
            timeout: self.timeout,
        })
    }
}

/// Loads [`ReporterSettings`].
#[derive(Clone, Debug, Default)]
pub struct SettingsLoader {
    config_file: Option<Utf8PathBuf>,
    env: Option<config::Map<String, String>>,
}

impl SettingsLoader {
    /// The config file read from the current directory, if present.
    pub const CONFIG_FILE_NAME: &'static str = "zephyr.toml";

    /// The prefix of environment variables that override config file settings.
    pub const ENV_PREFIX: &'static str = "JIRA";

    /// Contains the default config as a TOML file.
    pub const DEFAULT_CONFIG: &'static str = include_str!("../../default-config.toml");

    /// Creates a loader reading `zephyr.toml` (if present) and the process environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads settings from `path` instead of `zephyr.toml`. The file must exist.
    pub fn with_config_file(mut self, path: impl Into<Utf8PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Reads environment overrides from `vars` instead of the process environment.
    pub fn with_env(mut self, vars: config::Map<String, String>) -> Self {
        self.env = Some(vars);
        self
    }

    /// Loads and validates the settings.
    pub fn load(&self) -> Result<ReporterSettings, ConfigError> {
        let file = match &self.config_file {
            Some(path) => File::new(path.as_str(), FileFormat::Toml).required(true),
            None => File::new(Self::CONFIG_FILE_NAME, FileFormat::Toml).required(false),
        };

        let config = Config::builder()
            .add_source(File::from_str(Self::DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(file)
            .add_source(
                Environment::with_prefix(Self::ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(self.env.clone()),
            )
            .build()
            .map_err(ConfigError::Build)?;

        let raw: ReporterSettingsDeserialize =
            serde_path_to_error::deserialize(config).map_err(ConfigError::Deserialize)?;
        let settings = raw.into_settings()?;

        debug!(
            base_url = %settings.base_url,
            project_id = %settings.project_id,
            folder_name = ?settings.folder_name,
            "loaded reporter settings"
        );
        Ok(settings)
    }

    /// Returns the explicit config file, if one was set.
    pub fn config_file(&self) -> Option<&Utf8Path> {
        self.config_file.as_deref()
    }
}
