// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The interface to the host test runner.
//!
//! A host drives [`ZephyrPlugin`] through three hooks:
//!
//! 1. [`ZephyrPlugin::on_configure`] once, before any test runs;
//! 2. [`ZephyrPlugin::on_test_finished`] after each test, possibly from several threads;
//! 3. [`ZephyrPlugin::on_session_finished`] once, after every test has finished.
//!
//! Configuration problems are returned from `on_configure` so the host can refuse to start.
//! Problems synchronizing results are logged and never reach the host.

use crate::{
    aggregator::{ResultAggregator, ResultSnapshot},
    case_key::TestCaseKey,
    config::{PluginOptions, SettingsLoader},
    errors::{ConfigError, DisplayErrorChain, StatusCatalogError},
    service::{RemoteTestService, ZephyrClient},
    status::{StatusCatalog, TestOutcome},
    sync::{SyncOptions, SyncOrchestrator, SyncSummary},
};
use tracing::{debug, error, info, warn};

/// Reports test outcomes to a Zephyr Scale server.
#[derive(Debug)]
pub struct ZephyrPlugin<S = ZephyrClient> {
    aggregator: ResultAggregator,
    sync: Option<EnabledSync<S>>,
}

#[derive(Debug)]
struct EnabledSync<S> {
    service: S,
    catalog: StatusCatalog,
    options: SyncOptions,
}

impl ZephyrPlugin {
    /// Configures the plugin, loading server settings from `zephyr.toml` and `JIRA_*`
    /// environment variables.
    ///
    /// If reporting is enabled, this also fetches the server's result statuses, so that a
    /// misconfigured server is noticed before any test runs.
    pub fn on_configure(options: PluginOptions) -> Result<Self, ConfigError> {
        Self::on_configure_with(options, &SettingsLoader::new())
    }

    /// Configures the plugin, loading server settings with `loader`.
    pub fn on_configure_with(
        options: PluginOptions,
        loader: &SettingsLoader,
    ) -> Result<Self, ConfigError> {
        let Some(token) = options.validate()? else {
            debug!("reporting to Zephyr Scale is disabled");
            return Ok(Self::disabled());
        };

        let settings = loader.load()?;
        let client = ZephyrClient::new(&settings, token);
        let sync_options = SyncOptions::new(options.cycle_name)
            .with_folder_name(settings.folder_name)
            .with_existing_cycle_key(options.cycle_key);
        Self::with_service(client, sync_options)
    }
}

impl<S: RemoteTestService> ZephyrPlugin<S> {
    /// Creates a plugin that records outcomes but never reports them.
    pub fn disabled() -> Self {
        Self {
            aggregator: ResultAggregator::new(),
            sync: None,
        }
    }

    /// Creates an enabled plugin reporting through `service`.
    ///
    /// Fails if the server's result statuses can't be fetched or lack `PASS` or `FAIL`.
    pub fn with_service(service: S, options: SyncOptions) -> Result<Self, ConfigError> {
        let entries = service
            .result_statuses()
            .map_err(StatusCatalogError::Fetch)?;
        let catalog = StatusCatalog::from_entries(&entries)?;
        info!(cycle = %options.cycle_name, "reporting to Zephyr Scale is enabled");

        Ok(Self {
            aggregator: ResultAggregator::new(),
            sync: Some(EnabledSync {
                service,
                catalog,
                options,
            }),
        })
    }

    /// Returns true if results will be reported when the session finishes.
    pub fn is_enabled(&self) -> bool {
        self.sync.is_some()
    }

    /// Records the outcome of one test. `node_id` identifies the test execution; tests without
    /// a case key in their node id are not tracked.
    ///
    /// Returns the case key the outcome was recorded under.
    pub fn on_test_finished(&self, node_id: &str, passed: bool) -> Option<TestCaseKey> {
        self.aggregator
            .record(node_id, TestOutcome::from_passed(passed))
    }

    /// Returns the outcomes recorded so far.
    pub fn aggregator(&self) -> &ResultAggregator {
        &self.aggregator
    }

    /// Reports the recorded outcomes.
    ///
    /// Returns `None` if reporting is disabled or synchronization failed as a whole. Errors are
    /// logged rather than returned, so reporting never changes the outcome of the test session.
    pub fn on_session_finished(self) -> Option<SyncSummary> {
        let snapshot = self.aggregator.into_snapshot();
        let sync = self.sync?;
        sync.run(&snapshot)
    }
}

impl<S: RemoteTestService> EnabledSync<S> {
    fn run(self, snapshot: &ResultSnapshot) -> Option<SyncSummary> {
        let orchestrator = SyncOrchestrator::new(self.service, &self.catalog, self.options);
        match orchestrator.run(snapshot) {
            Ok(summary) => {
                if !summary.is_complete() {
                    warn!(
                        unresolved = summary.unresolved.len(),
                        step_failures = summary.step_failures.len(),
                        case_statuses_failed = summary.case_status_failure.is_some(),
                        "some results were not reported to Zephyr Scale"
                    );
                }
                Some(summary)
            }
            Err(err) => {
                error!("failed to report results to Zephyr Scale: {}", DisplayErrorChain::new(err));
                None
            }
        }
    }
}
