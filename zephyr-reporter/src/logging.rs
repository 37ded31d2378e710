// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Installing a log subscriber for the reporter.
//!
//! The reporter logs through `tracing` and never installs a subscriber on its own. Hosts that
//! don't set one up themselves can call [`init_logging`].

use std::sync::Once;
use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{Layer, filter::Targets, layer::SubscriberExt, util::SubscriberInitExt};

/// The environment variable read by [`init_logging`], in `tracing_subscriber` [`Targets`]
/// syntax, e.g. `zephyr_reporter=debug`.
pub const LOG_ENV_VAR: &str = "ZEPHYR_LOG";

static INIT_LOGGER: Once = Once::new();

/// Installs a global subscriber writing to stderr, filtered by [`LOG_ENV_VAR`].
///
/// Only the first call has an effect. If another global subscriber is already installed, it is
/// kept.
pub fn init_logging() {
    INIT_LOGGER.call_once(|| {
        let level_str = std::env::var(LOG_ENV_VAR).unwrap_or_default();
        let (targets, parse_error) = parse_targets(&level_str);

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(targets);

        if tracing_subscriber::registry().with(layer).try_init().is_ok() {
            if let Some(err) = parse_error {
                warn!(value = %level_str, error = %err, "invalid {LOG_ENV_VAR}, logging at INFO");
            }
        }
    });
}

/// Parses a filter, falling back to `INFO` for everything if the string is empty or invalid.
fn parse_targets(level_str: &str) -> (Targets, Option<tracing_subscriber::filter::ParseError>) {
    let default = || Targets::new().with_default(LevelFilter::INFO);
    if level_str.is_empty() {
        return (default(), None);
    }
    match level_str.parse() {
        Ok(targets) => (targets, None),
        Err(err) => (default(), Some(err)),
    }
}
