// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for the network-facing traits.

use crate::{
    case_key::TestCaseKey,
    errors::{RequestError, TransportError},
    http::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, Sleep},
    service::RemoteTestService,
};
use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
    time::Duration,
};
use zephyr_metadata::{
    CaseId, CaseStatusUpdate, CycleId, FolderId, FolderTree, LastTestResult, RunItem, RunItemId,
    ScriptResultSet, ScriptStatusUpdate, StatusEntry, StatusId, TestCaseRef, TestResultId,
};

/// A request seen by [`FakeTransport`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct RecordedRequest {
    pub(crate) method: HttpMethod,
    pub(crate) url: String,
    pub(crate) body: Option<String>,
}

/// An [`HttpTransport`] that replays queued responses in order and records requests.
#[derive(Debug, Default)]
pub(crate) struct FakeTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, String>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_response(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Ok(HttpResponse::new(status, body)));
    }

    pub(crate) fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_owned()));
    }

    pub(crate) fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

impl HttpTransport for FakeTransport {
    fn send(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(RecordedRequest {
            method: request.method,
            url: request.url.to_owned(),
            body: request.body.map(str::to_owned),
        });
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(message)) => Err(TransportError::new(message)),
            None => panic!("no response queued for {} {}", request.method, request.url),
        }
    }
}

/// A [`Sleep`] that records durations instead of sleeping.
#[derive(Debug, Default)]
pub(crate) struct RecordingSleep {
    waits: Mutex<Vec<Duration>>,
}

impl RecordingSleep {
    pub(crate) fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

impl Sleep for RecordingSleep {
    fn sleep(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

/// A call made to [`FakeService`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum ServiceCall {
    ProjectKey,
    ResultStatuses,
    CycleStatuses,
    FolderTree,
    CreateFolder(String),
    CreateCycle {
        name: String,
        status_id: StatusId,
        folder_id: Option<FolderId>,
    },
    CycleId(String),
    CaseId(String),
    RegisterCases(CycleId, Vec<CaseId>),
    RunItems(CycleId),
    ScriptResults(CycleId, RunItemId),
    SetCaseStatuses(Vec<CaseStatusUpdate>),
    SetScriptStatuses(Vec<ScriptStatusUpdate>),
}

#[derive(Debug)]
struct FakeServiceState {
    calls: Vec<ServiceCall>,
    failures: Vec<ServiceCall>,
    result_statuses: Vec<StatusEntry>,
    cycle_statuses: Vec<StatusEntry>,
    folder_tree: FolderTree,
    created_folder: FolderId,
    created_cycle: CycleId,
    case_ids: HashMap<String, CaseId>,
    registered: Vec<CaseId>,
    script_results: HashMap<RunItemId, Vec<ScriptResultSet>>,
}

/// An in-memory [`RemoteTestService`].
///
/// Registering cases creates run items the way the server does: run item `i` (in registration
/// order) gets id `100 + i` and last result id `200 + i`. Case ids are looked up in the map set
/// with [`set_case_id`](Self::set_case_id); unknown keys fail with a 404.
#[derive(Debug)]
pub(crate) struct FakeService {
    state: Mutex<FakeServiceState>,
}

impl FakeService {
    pub(crate) const PROJECT_KEY: &'static str = "PROJ";
    pub(crate) const PASS: StatusId = StatusId(3238);
    pub(crate) const FAIL: StatusId = StatusId(3239);
    pub(crate) const NOT_EXECUTED: StatusId = StatusId(4000);

    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(FakeServiceState {
                calls: Vec::new(),
                failures: Vec::new(),
                result_statuses: vec![
                    status_entry(3237, "Not Executed"),
                    status_entry(Self::PASS.0, "Pass"),
                    status_entry(Self::FAIL.0, "Fail"),
                ],
                cycle_statuses: vec![
                    status_entry(3999, "In Progress"),
                    status_entry(Self::NOT_EXECUTED.0, "Not Executed"),
                ],
                folder_tree: FolderTree::default(),
                created_folder: FolderId(1),
                created_cycle: CycleId(900),
                case_ids: HashMap::new(),
                registered: Vec::new(),
                script_results: HashMap::new(),
            }),
        }
    }

    pub(crate) fn run_item_id(index: usize) -> RunItemId {
        RunItemId(100 + index as u64)
    }

    pub(crate) fn result_id(index: usize) -> TestResultId {
        TestResultId(200 + index as u64)
    }

    pub(crate) fn calls(&self) -> Vec<ServiceCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn fail_on(&self, call: ServiceCall) {
        self.state.lock().unwrap().failures.push(call);
    }

    pub(crate) fn set_result_statuses(&self, statuses: Vec<StatusEntry>) {
        self.state.lock().unwrap().result_statuses = statuses;
    }

    pub(crate) fn set_cycle_statuses(&self, statuses: Vec<StatusEntry>) {
        self.state.lock().unwrap().cycle_statuses = statuses;
    }

    pub(crate) fn set_folder_tree(&self, tree: FolderTree) {
        self.state.lock().unwrap().folder_tree = tree;
    }

    pub(crate) fn set_created_folder(&self, id: FolderId) {
        self.state.lock().unwrap().created_folder = id;
    }

    pub(crate) fn set_case_id(&self, key: &str, id: CaseId) {
        self.state
            .lock()
            .unwrap()
            .case_ids
            .insert(key.to_owned(), id);
    }

    pub(crate) fn set_script_results(&self, run_item_id: RunItemId, results: Vec<ScriptResultSet>) {
        self.state
            .lock()
            .unwrap()
            .script_results
            .insert(run_item_id, results);
    }

    /// Records `call`, failing with a 500 if it was registered with `fail_on`.
    fn record(&self, call: ServiceCall) -> Result<(), RequestError> {
        let mut state = self.state.lock().unwrap();
        let fails = state.failures.contains(&call);
        state.calls.push(call.clone());
        if fails {
            Err(RequestError::Http {
                method: HttpMethod::Get,
                url: format!("fake://{call:?}"),
                status: 500,
                body: "injected failure".to_owned(),
            })
        } else {
            Ok(())
        }
    }
}

impl RemoteTestService for FakeService {
    fn project_key(&self) -> Result<String, RequestError> {
        self.record(ServiceCall::ProjectKey)?;
        Ok(Self::PROJECT_KEY.to_owned())
    }

    fn result_statuses(&self) -> Result<Vec<StatusEntry>, RequestError> {
        self.record(ServiceCall::ResultStatuses)?;
        Ok(self.state.lock().unwrap().result_statuses.clone())
    }

    fn cycle_statuses(&self) -> Result<Vec<StatusEntry>, RequestError> {
        self.record(ServiceCall::CycleStatuses)?;
        Ok(self.state.lock().unwrap().cycle_statuses.clone())
    }

    fn folder_tree(&self) -> Result<FolderTree, RequestError> {
        self.record(ServiceCall::FolderTree)?;
        Ok(self.state.lock().unwrap().folder_tree.clone())
    }

    fn create_folder(&self, name: &str) -> Result<FolderId, RequestError> {
        self.record(ServiceCall::CreateFolder(name.to_owned()))?;
        Ok(self.state.lock().unwrap().created_folder)
    }

    fn create_cycle(
        &self,
        name: &str,
        status_id: StatusId,
        folder_id: Option<FolderId>,
    ) -> Result<CycleId, RequestError> {
        self.record(ServiceCall::CreateCycle {
            name: name.to_owned(),
            status_id,
            folder_id,
        })?;
        Ok(self.state.lock().unwrap().created_cycle)
    }

    fn cycle_id(&self, cycle_key: &str) -> Result<CycleId, RequestError> {
        self.record(ServiceCall::CycleId(cycle_key.to_owned()))?;
        Ok(self.state.lock().unwrap().created_cycle)
    }

    fn case_id(&self, project_key: &str, case_key: &TestCaseKey) -> Result<CaseId, RequestError> {
        assert_eq!(project_key, Self::PROJECT_KEY);
        self.record(ServiceCall::CaseId(case_key.to_string()))?;
        let state = self.state.lock().unwrap();
        state
            .case_ids
            .get(case_key.as_str())
            .copied()
            .ok_or_else(|| RequestError::Http {
                method: HttpMethod::Get,
                url: format!("fake://testcase/{project_key}-{case_key}"),
                status: 404,
                body: String::new(),
            })
    }

    fn register_cases(&self, cycle_id: CycleId, case_ids: &[CaseId]) -> Result<(), RequestError> {
        self.record(ServiceCall::RegisterCases(cycle_id, case_ids.to_vec()))?;
        self.state
            .lock()
            .unwrap()
            .registered
            .extend_from_slice(case_ids);
        Ok(())
    }

    fn run_items(&self, cycle_id: CycleId) -> Result<Vec<RunItem>, RequestError> {
        self.record(ServiceCall::RunItems(cycle_id))?;
        let state = self.state.lock().unwrap();
        let items = state
            .registered
            .iter()
            .enumerate()
            .map(|(index, case_id)| {
                let key = state
                    .case_ids
                    .iter()
                    .find(|(_, id)| *id == case_id)
                    .map(|(key, _)| key.clone())
                    .expect("registered case ids are known");
                RunItem {
                    id: Self::run_item_id(index),
                    last_test_result: LastTestResult {
                        id: Self::result_id(index),
                        test_case: TestCaseRef {
                            key: format!("{}-{key}", Self::PROJECT_KEY),
                        },
                    },
                }
            })
            .collect();
        Ok(items)
    }

    fn script_results(
        &self,
        cycle_id: CycleId,
        run_item_id: RunItemId,
    ) -> Result<Vec<ScriptResultSet>, RequestError> {
        self.record(ServiceCall::ScriptResults(cycle_id, run_item_id))?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .script_results
            .get(&run_item_id)
            .cloned()
            .unwrap_or_default())
    }

    fn set_case_statuses(&self, updates: &[CaseStatusUpdate]) -> Result<(), RequestError> {
        self.record(ServiceCall::SetCaseStatuses(updates.to_vec()))
    }

    fn set_script_statuses(&self, updates: &[ScriptStatusUpdate]) -> Result<(), RequestError> {
        self.record(ServiceCall::SetScriptStatuses(updates.to_vec()))
    }
}

pub(crate) fn status_entry(id: u64, name: &str) -> StatusEntry {
    StatusEntry {
        id: StatusId(id),
        name: name.to_owned(),
    }
}
