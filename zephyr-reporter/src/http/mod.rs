// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sending requests to the Zephyr server.
//!
//! [`HttpTransport`] is the seam between the reporter and the network: it sends one
//! authenticated request and returns the raw response. [`RetryingSender`] layers rate-limit
//! handling on top of any transport.

mod retry;
mod transport;

pub use retry::*;
pub use transport::*;

use serde::de::DeserializeOwned;
use std::fmt;

/// The HTTP methods used by the Zephyr API.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
}

impl HttpMethod {
    /// Returns the method as an uppercase string.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A request to be sent by an [`HttpTransport`].
#[derive(Clone, Copy, Debug)]
pub struct HttpRequest<'a> {
    /// The method.
    pub method: HttpMethod,

    /// The absolute URL.
    pub url: &'a str,

    /// The JSON body, if any.
    pub body: Option<&'a str>,
}

/// A response received by an [`HttpTransport`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub status: u16,

    /// The response body as text.
    pub body: String,
}

impl HttpResponse {
    /// The status code the server uses to signal rate limiting.
    pub const TOO_MANY_REQUESTS: u16 = 429;

    /// Creates a new response.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Returns true if the status code is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns true if the server asked the client to slow down.
    pub fn is_rate_limited(&self) -> bool {
        self.status == Self::TOO_MANY_REQUESTS
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}
