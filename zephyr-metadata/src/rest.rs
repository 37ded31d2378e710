// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{
    CaseId, CycleId, FolderId, ParameterSetId, ProjectId, RunItemId, ScriptResultId, StatusId,
    TestResultId,
};
use serde::{Deserialize, Serialize};

/// Response of `GET /project/{id}`.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct ProjectSummary {
    /// The project key, e.g. `PROJ`.
    pub key: String,
}

/// A single entry of a status catalog (`/testresultstatus` or `/testrunstatus`).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct StatusEntry {
    /// The status id.
    pub id: StatusId,

    /// The display name, e.g. `Pass` or `Not Executed`.
    pub name: String,
}

/// Response of `GET /project/{id}/foldertree/testrun`.
///
/// The root itself is not a folder: only its children are.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct FolderTree {
    /// Top-level folders.
    #[serde(default)]
    pub children: Vec<FolderNode>,
}

/// A folder in a [`FolderTree`].
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FolderNode {
    /// The folder id.
    pub id: FolderId,

    /// The folder name.
    pub name: String,

    /// Nested folders.
    #[serde(default)]
    pub children: Vec<FolderNode>,
}

/// A response that only carries the id of an entity, e.g. after creating it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
pub struct EntityRef<T> {
    /// The id of the entity.
    pub id: T,
}

/// Body of `POST /folder/testrun`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFolder<'a> {
    /// The folder name.
    pub name: &'a str,

    /// The project to create the folder in.
    pub project_id: ProjectId,

    /// Position among siblings. New folders are placed first.
    pub index: u32,
}

/// Body of `POST /testrun`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCycle<'a> {
    /// The cycle name.
    pub name: &'a str,

    /// The project to create the cycle in.
    pub project_id: ProjectId,

    /// The initial cycle status.
    pub status_id: StatusId,

    /// The folder to place the cycle in, or the root folder if absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderId>,
}

/// Body of `PUT /testrunitem/bulk/save`.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunItemRegistration {
    /// The cycle to add run items to.
    pub test_run_id: CycleId,

    /// The run items to add, in order.
    pub added_test_run_items: Vec<NewRunItem>,
}

impl RunItemRegistration {
    /// Builds a registration where each case's position in `case_ids` becomes its run item index.
    pub fn new(cycle_id: CycleId, case_ids: impl IntoIterator<Item = CaseId>) -> Self {
        let added_test_run_items = case_ids
            .into_iter()
            .enumerate()
            .map(|(index, test_case_id)| NewRunItem {
                index,
                last_test_result: NewTestResult { test_case_id },
            })
            .collect();
        Self {
            test_run_id: cycle_id,
            added_test_run_items,
        }
    }
}

/// A run item to be added to a cycle.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRunItem {
    /// Position of the run item within the cycle.
    pub index: usize,

    /// The initial result, which names the test case.
    pub last_test_result: NewTestResult,
}

/// The initial result of a [`NewRunItem`].
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTestResult {
    /// The test case the run item is for.
    pub test_case_id: CaseId,
}

/// Response of `GET /testrun/{id}/testrunitems`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunItemList {
    /// The run items of the cycle.
    #[serde(default)]
    pub test_run_items: Vec<RunItem>,
}

/// A run item of a cycle.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct RunItem {
    /// The run item id.
    pub id: RunItemId,

    /// The latest result recorded for this run item.
    #[serde(rename = "$lastTestResult")]
    pub last_test_result: LastTestResult,
}

/// The latest result of a [`RunItem`].
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastTestResult {
    /// The result id, which case-level status updates target.
    pub id: TestResultId,

    /// The test case this result is for.
    pub test_case: TestCaseRef,
}

/// A reference to a test case by its full key.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct TestCaseRef {
    /// The full key, e.g. `PROJ-T123`.
    pub key: String,
}

impl TestCaseRef {
    /// Returns the key without its project prefix: `PROJ-T123` becomes `T123`.
    pub fn local_key(&self) -> &str {
        match self.key.rsplit_once('-') {
            Some((_, local)) => local,
            None => &self.key,
        }
    }
}

/// One entry of the response of `GET /testrun/{id}/testresults`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptResultSet {
    /// The step results of this test result.
    #[serde(default)]
    pub test_script_results: Vec<ScriptStepResult>,
}

/// The result of a single script step.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptStepResult {
    /// The step result id.
    pub id: ScriptResultId,

    /// The parameter set this step belongs to. Absent for non-parametrized cases.
    #[serde(default)]
    pub parameter_set_id: Option<ParameterSetId>,
}

/// An element of the body of `PUT /testresult` or `PUT /testscriptresult`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate<T> {
    /// The result being updated.
    pub id: T,

    /// The new status.
    pub test_result_status_id: StatusId,
}

/// A case-level status update.
pub type CaseStatusUpdate = StatusUpdate<TestResultId>;

/// A script-step status update.
pub type ScriptStatusUpdate = StatusUpdate<ScriptResultId>;
