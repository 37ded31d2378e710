// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Reports test outcomes to a [Zephyr Scale](https://smartbear.com/test-management/zephyr-scale/)
//! server.
//!
//! Tests are associated with test cases through a case key embedded in their names (`T` followed
//! by digits, e.g. `test_login_T123`). A host test runner feeds outcomes to a
//! [`ZephyrPlugin`](plugin::ZephyrPlugin) as tests finish; when the session ends, the plugin
//! creates a test cycle, registers every case seen, and sets the status of each case and of the
//! script steps of parametrized cases.

pub mod aggregator;
pub mod case_key;
pub mod config;
pub mod errors;
pub mod folder;
pub mod http;
pub mod logging;
pub mod plugin;
pub mod service;
pub mod status;
pub mod sync;
#[cfg(test)]
mod test_helpers;
