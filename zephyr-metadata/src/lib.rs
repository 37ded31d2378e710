// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Wire types for the Zephyr Scale test-management REST API (`/rest/tests/1.0`).
//!
//! These types mirror the JSON shapes sent to and returned by the server. They carry no behavior
//! beyond (de)serialization; the logic that drives them lives in `zephyr-reporter`.

mod ids;
mod rest;

pub use ids::*;
pub use rest::*;
