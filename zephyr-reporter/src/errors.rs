// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by zephyr-reporter.

use crate::{case_key::TestCaseKey, http::HttpMethod, status::ResultStatus};
use std::{error::Error as StdError, fmt};
use thiserror::Error;

/// An error that occurred while configuring the reporter.
///
/// All of these are fatal: they are reported before any test runs.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The integration was enabled without an auth token.
    #[error("reporting to Zephyr is enabled, but no auth token was provided")]
    MissingAuthToken,

    /// A required setting was not provided by any config source.
    #[error("required setting `{name}` is missing (set it in zephyr.toml or via {env_var})")]
    MissingSetting {
        /// The name of the setting.
        name: &'static str,

        /// The environment variable that can provide it.
        env_var: &'static str,
    },

    /// The config sources could not be merged.
    #[error("failed to build reporter config")]
    Build(#[source] config::ConfigError),

    /// The merged config could not be deserialized.
    #[error("failed to deserialize reporter config")]
    Deserialize(#[source] serde_path_to_error::Error<config::ConfigError>),

    /// The status catalog could not be resolved.
    #[error("failed to resolve the test result status catalog")]
    StatusCatalog(#[from] StatusCatalogError),
}

/// An error that occurred while resolving the status catalog.
#[derive(Debug, Error)]
pub enum StatusCatalogError {
    /// The catalog could not be fetched.
    #[error("failed to fetch status catalog")]
    Fetch(#[source] RequestError),

    /// A status the reporter depends on is not in the catalog.
    #[error(
        "status `{status}` not found in catalog (known statuses: {})",
        .known.join(", "),
    )]
    MissingStatus {
        /// The status that was expected.
        status: ResultStatus,

        /// The names of the statuses the server knows about.
        known: Vec<String>,
    },
}

/// An error produced by an [`HttpTransport`](crate::http::HttpTransport) before a response was
/// received.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    /// Creates a new transport error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new transport error caused by `source`.
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// An error that occurred while sending a request to the server.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The server kept rate-limiting the request.
    #[error("{method} {url}: still rate-limited after {attempts} attempts")]
    RateLimitExceeded {
        /// The request method.
        method: HttpMethod,

        /// The request URL.
        url: String,

        /// The number of attempts made.
        attempts: u32,
    },

    /// The server responded with a non-success status.
    #[error("{method} {url}: server responded with status {status}")]
    Http {
        /// The request method.
        method: HttpMethod,

        /// The request URL.
        url: String,

        /// The HTTP status code.
        status: u16,

        /// The response body.
        body: String,
    },

    /// No response was received.
    #[error("{method} {url}: request failed")]
    Transport {
        /// The request method.
        method: HttpMethod,

        /// The request URL.
        url: String,

        /// The underlying error.
        #[source]
        err: TransportError,
    },

    /// A request body could not be serialized.
    #[error("{method} {url}: failed to serialize request body")]
    Serialize {
        /// The request method.
        method: HttpMethod,

        /// The request URL.
        url: String,

        /// The underlying error.
        #[source]
        err: serde_json::Error,
    },

    /// The response body was not what was expected.
    #[error("{url}: failed to deserialize response body")]
    Deserialize {
        /// The request URL.
        url: String,

        /// The underlying error.
        #[source]
        err: serde_json::Error,
    },
}

impl RequestError {
    /// Returns the HTTP status code, if the server responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::RateLimitExceeded { .. } => Some(429),
            Self::Transport { .. } | Self::Serialize { .. } | Self::Deserialize { .. } => None,
        }
    }
}

/// A test case key that could not be mapped to a remote test case.
///
/// The case is left out of the cycle; other cases are unaffected.
#[derive(Debug, Error)]
#[error("failed to resolve test case `{key}`")]
pub struct UnresolvedCaseKey {
    key: TestCaseKey,
    #[source]
    err: RequestError,
}

impl UnresolvedCaseKey {
    pub(crate) fn new(key: TestCaseKey, err: RequestError) -> Self {
        Self { key, err }
    }

    /// The key that could not be resolved.
    pub fn key(&self) -> &TestCaseKey {
        &self.key
    }

    /// The error returned by the server.
    pub fn error(&self) -> &RequestError {
        &self.err
    }
}

/// Updating the script step statuses of a single test case failed.
#[derive(Debug, Error)]
#[error("failed to update script step statuses for `{key}`")]
pub struct StepSyncError {
    key: TestCaseKey,
    #[source]
    err: RequestError,
}

impl StepSyncError {
    pub(crate) fn new(key: TestCaseKey, err: RequestError) -> Self {
        Self { key, err }
    }

    /// The case whose steps could not be updated.
    pub fn key(&self) -> &TestCaseKey {
        &self.key
    }

    /// The error returned by the server.
    pub fn error(&self) -> &RequestError {
        &self.err
    }
}

/// The phase of synchronization that failed in a [`SyncError`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SyncPhase {
    /// Looking up the project key.
    ProjectLookup,

    /// Finding or creating the target folder.
    Folder,

    /// Creating the test cycle.
    CycleCreate,

    /// Registering test cases in the cycle.
    Registration,

    /// Listing the run items of the cycle.
    RunItems,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ProjectLookup => "project lookup",
            Self::Folder => "folder resolution",
            Self::CycleCreate => "cycle creation",
            Self::Registration => "test case registration",
            Self::RunItems => "run item listing",
        };
        f.write_str(s)
    }
}

/// An error that aborted synchronization for the whole session.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A request required by every later step failed.
    #[error("synchronization failed during {phase}")]
    Request {
        /// The phase that failed.
        phase: SyncPhase,

        /// The underlying error.
        #[source]
        err: RequestError,
    },

    /// The server returned no cycle statuses to create the cycle with.
    #[error(
        "synchronization failed during {}: the cycle status catalog is empty",
        SyncPhase::CycleCreate
    )]
    NoCycleStatus,
}

impl SyncError {
    pub(crate) fn request(phase: SyncPhase) -> impl FnOnce(RequestError) -> Self {
        move |err| Self::Request { phase, err }
    }

    /// The phase that failed.
    pub fn phase(&self) -> SyncPhase {
        match self {
            Self::Request { phase, .. } => *phase,
            Self::NoCycleStatus => SyncPhase::CycleCreate,
        }
    }
}

/// Displays an error along with the chain of errors that caused it.
///
/// ```text
/// synchronization failed during project lookup
///   caused by:
///   - GET https://jira.example.com/...: server responded with status 404
/// ```
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: StdError> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: StdError> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut source = self.error.source();
        if source.is_some() {
            write!(f, "\n  caused by:")?;
        }
        while let Some(err) = source {
            write!(f, "\n  - {err}")?;
            source = err.source();
        }

        Ok(())
    }
}
