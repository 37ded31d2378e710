// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{HttpMethod, HttpRequest, HttpResponse};
use crate::{config::AuthToken, errors::TransportError};
use debug_ignore::DebugIgnore;
use std::time::Duration;
use ureq::Agent;

/// Sends a single request and returns the response, whatever its status.
///
/// Implementations are expected to be already authenticated: callers only supply the method,
/// URL and body.
pub trait HttpTransport {
    /// Sends `request`.
    ///
    /// Non-success statuses are returned as responses, not errors. An error means no response
    /// was received at all.
    fn send(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError>;
}

impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    fn send(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
        (**self).send(request)
    }
}

/// An [`HttpTransport`] backed by a `ureq` agent, authenticating with a bearer token.
#[derive(Debug)]
pub struct UreqTransport {
    agent: Agent,
    authorization: DebugIgnore<String>,
}

impl UreqTransport {
    /// Creates a new transport. `timeout` bounds each request as a whole.
    pub fn new(token: &AuthToken, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            // Statuses are interpreted by the retrying sender, so they must not become errors.
            .http_status_as_error(false)
            .timeout_global(Some(timeout))
            .build();

        Self {
            agent: config.into(),
            authorization: DebugIgnore(format!("Bearer {}", token.expose())),
        }
    }
}

impl HttpTransport for UreqTransport {
    fn send(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
        let authorization = self.authorization.as_str();
        let result = match request.method {
            HttpMethod::Get => self
                .agent
                .get(request.url)
                .header("Authorization", authorization)
                .header("Accept", "application/json")
                .call(),
            HttpMethod::Post => self
                .agent
                .post(request.url)
                .header("Authorization", authorization)
                .header("Accept", "application/json")
                .header("Content-Type", "application/json")
                .send(request.body.unwrap_or_default()),
            HttpMethod::Put => self
                .agent
                .put(request.url)
                .header("Authorization", authorization)
                .header("Accept", "application/json")
                .header("Content-Type", "application/json")
                .send(request.body.unwrap_or_default()),
        };

        let mut response =
            result.map_err(|err| TransportError::with_source("error sending request", err))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|err| TransportError::with_source("error reading response body", err))?;

        Ok(HttpResponse { status, body })
    }
}
