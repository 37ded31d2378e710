// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed access to the Zephyr Scale REST API.
//!
//! [`RemoteTestService`] has one method per endpoint the reporter uses. [`ZephyrClient`] is its
//! implementation over HTTP.

mod client;

pub use client::*;

use crate::{case_key::TestCaseKey, errors::RequestError};
use zephyr_metadata::{
    CaseId, CaseStatusUpdate, CycleId, FolderId, FolderTree, RunItem, RunItemId, ScriptResultSet,
    ScriptStatusUpdate, StatusEntry, StatusId,
};

/// The operations the reporter performs against the test-management server.
///
/// Every method fails if the server responds with a non-success status.
pub trait RemoteTestService {
    /// Returns the key of the configured project, e.g. `PROJ`.
    fn project_key(&self) -> Result<String, RequestError>;

    /// Returns the statuses a test result can have.
    fn result_statuses(&self) -> Result<Vec<StatusEntry>, RequestError>;

    /// Returns the statuses a test cycle can have.
    fn cycle_statuses(&self) -> Result<Vec<StatusEntry>, RequestError>;

    /// Returns the tree of test cycle folders.
    fn folder_tree(&self) -> Result<FolderTree, RequestError>;

    /// Creates a test cycle folder at the root of the tree.
    fn create_folder(&self, name: &str) -> Result<FolderId, RequestError>;

    /// Creates a test cycle.
    fn create_cycle(
        &self,
        name: &str,
        status_id: StatusId,
        folder_id: Option<FolderId>,
    ) -> Result<CycleId, RequestError>;

    /// Looks up the id of an existing test cycle by its key, e.g. `PROJ-C12`.
    fn cycle_id(&self, cycle_key: &str) -> Result<CycleId, RequestError>;

    /// Looks up the internal id of a test case.
    fn case_id(&self, project_key: &str, case_key: &TestCaseKey) -> Result<CaseId, RequestError>;

    /// Adds test cases to a cycle. Each case's position in `case_ids` becomes its index.
    fn register_cases(&self, cycle_id: CycleId, case_ids: &[CaseId]) -> Result<(), RequestError>;

    /// Lists the run items of a cycle.
    fn run_items(&self, cycle_id: CycleId) -> Result<Vec<RunItem>, RequestError>;

    /// Lists the script step results of a run item.
    fn script_results(
        &self,
        cycle_id: CycleId,
        run_item_id: RunItemId,
    ) -> Result<Vec<ScriptResultSet>, RequestError>;

    /// Sets the status of test results.
    fn set_case_statuses(&self, updates: &[CaseStatusUpdate]) -> Result<(), RequestError>;

    /// Sets the status of script step results.
    fn set_script_statuses(&self, updates: &[ScriptStatusUpdate]) -> Result<(), RequestError>;
}

impl<S: RemoteTestService + ?Sized> RemoteTestService for &S {
    fn project_key(&self) -> Result<String, RequestError> {
        (**self).project_key()
    }

    fn result_statuses(&self) -> Result<Vec<StatusEntry>, RequestError> {
        (**self).result_statuses()
    }

    fn cycle_statuses(&self) -> Result<Vec<StatusEntry>, RequestError> {
        (**self).cycle_statuses()
    }

    fn folder_tree(&self) -> Result<FolderTree, RequestError> {
        (**self).folder_tree()
    }

    fn create_folder(&self, name: &str) -> Result<FolderId, RequestError> {
        (**self).create_folder(name)
    }

    fn create_cycle(
        &self,
        name: &str,
        status_id: StatusId,
        folder_id: Option<FolderId>,
    ) -> Result<CycleId, RequestError> {
        (**self).create_cycle(name, status_id, folder_id)
    }

    fn cycle_id(&self, cycle_key: &str) -> Result<CycleId, RequestError> {
        (**self).cycle_id(cycle_key)
    }

    fn case_id(&self, project_key: &str, case_key: &TestCaseKey) -> Result<CaseId, RequestError> {
        (**self).case_id(project_key, case_key)
    }

    fn register_cases(&self, cycle_id: CycleId, case_ids: &[CaseId]) -> Result<(), RequestError> {
        (**self).register_cases(cycle_id, case_ids)
    }

    fn run_items(&self, cycle_id: CycleId) -> Result<Vec<RunItem>, RequestError> {
        (**self).run_items(cycle_id)
    }

    fn script_results(
        &self,
        cycle_id: CycleId,
        run_item_id: RunItemId,
    ) -> Result<Vec<ScriptResultSet>, RequestError> {
        (**self).script_results(cycle_id, run_item_id)
    }

    fn set_case_statuses(&self, updates: &[CaseStatusUpdate]) -> Result<(), RequestError> {
        (**self).set_case_statuses(updates)
    }

    fn set_script_statuses(&self, updates: &[ScriptStatusUpdate]) -> Result<(), RequestError> {
        (**self).set_script_statuses(updates)
    }
}
