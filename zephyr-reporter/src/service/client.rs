// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::RemoteTestService;
use crate::{
    case_key::TestCaseKey,
    config::{AuthToken, ReporterSettings},
    errors::RequestError,
    http::{
        HttpMethod, HttpResponse, HttpTransport, RetryingSender, Sleep, ThreadSleep, UreqTransport,
    },
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::trace;
use zephyr_metadata::{
    CaseId, CaseStatusUpdate, CycleId, EntityRef, FolderId, FolderTree, NewCycle, NewFolder,
    ProjectId, ProjectSummary, RunItem, RunItemId, RunItemList, RunItemRegistration,
    ScriptResultSet, ScriptStatusUpdate, StatusEntry, StatusId,
};

/// A [`RemoteTestService`] that talks to a Zephyr Scale server over HTTP.
#[derive(Debug)]
pub struct ZephyrClient<T = UreqTransport, S = ThreadSleep> {
    sender: RetryingSender<T, S>,
    api_url: String,
    project_id: ProjectId,
}

impl ZephyrClient {
    /// Creates a client for the server described by `settings`.
    pub fn new(settings: &ReporterSettings, token: &AuthToken) -> Self {
        let transport = UreqTransport::new(token, settings.timeout);
        Self::with_sender(
            RetryingSender::new(transport, settings.rate_limit),
            &settings.base_url,
            settings.project_id,
        )
    }
}

impl<T: HttpTransport, S: Sleep> ZephyrClient<T, S> {
    /// The path of the API below the base URL.
    pub const API_PATH: &'static str = "/rest/tests/1.0";

    /// Creates a client sending requests through `sender`.
    pub fn with_sender(
        sender: RetryingSender<T, S>,
        base_url: &str,
        project_id: ProjectId,
    ) -> Self {
        Self {
            sender,
            api_url: format!("{}{}", base_url.trim_end_matches('/'), Self::API_PATH),
            project_id,
        }
    }

    /// Returns the project this client reports into.
    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    // ---
    // Helper methods
    // ---

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn send(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&str>,
    ) -> Result<HttpResponse, RequestError> {
        let response = self.sender.send(method, url, body)?;
        trace!(%method, url, status = response.status, body = %response.body, "received response");
        Ok(response)
    }

    fn get<R: DeserializeOwned>(&self, url: &str) -> Result<R, RequestError> {
        let response = self.send(HttpMethod::Get, url, None)?;
        Self::parse(url, &response)
    }

    fn send_json<B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        url: &str,
        body: &B,
    ) -> Result<HttpResponse, RequestError> {
        let body = serde_json::to_string(body).map_err(|err| RequestError::Serialize {
            method,
            url: url.to_owned(),
            err,
        })?;
        self.send(method, url, Some(&body))
    }

    fn parse<R: DeserializeOwned>(url: &str, response: &HttpResponse) -> Result<R, RequestError> {
        response.json().map_err(|err| RequestError::Deserialize {
            url: url.to_owned(),
            err,
        })
    }
}

impl<T: HttpTransport, S: Sleep> RemoteTestService for ZephyrClient<T, S> {
    fn project_key(&self) -> Result<String, RequestError> {
        let url = self.url(&format!("/project/{}", self.project_id));
        let project: ProjectSummary = self.get(&url)?;
        Ok(project.key)
    }

    fn result_statuses(&self) -> Result<Vec<StatusEntry>, RequestError> {
        let url = self.url(&format!("/project/{}/testresultstatus", self.project_id));
        self.get(&url)
    }

    fn cycle_statuses(&self) -> Result<Vec<StatusEntry>, RequestError> {
        let url = self.url(&format!("/project/{}/testrunstatus", self.project_id));
        self.get(&url)
    }

    fn folder_tree(&self) -> Result<FolderTree, RequestError> {
        let url = self.url(&format!("/project/{}/foldertree/testrun", self.project_id));
        self.get(&url)
    }

    fn create_folder(&self, name: &str) -> Result<FolderId, RequestError> {
        let url = self.url("/folder/testrun");
        let body = NewFolder {
            name,
            project_id: self.project_id,
            index: 0,
        };
        let response = self.send_json(HttpMethod::Post, &url, &body)?;
        let created: EntityRef<FolderId> = Self::parse(&url, &response)?;
        Ok(created.id)
    }

    fn create_cycle(
        &self,
        name: &str,
        status_id: StatusId,
        folder_id: Option<FolderId>,
    ) -> Result<CycleId, RequestError> {
        let url = self.url("/testrun");
        let body = NewCycle {
            name,
            project_id: self.project_id,
            status_id,
            folder_id,
        };
        let response = self.send_json(HttpMethod::Post, &url, &body)?;
        let created: EntityRef<CycleId> = Self::parse(&url, &response)?;
        Ok(created.id)
    }

    fn cycle_id(&self, cycle_key: &str) -> Result<CycleId, RequestError> {
        let url = self.url(&format!("/testrun/{cycle_key}?fields=id"));
        let cycle: EntityRef<CycleId> = self.get(&url)?;
        Ok(cycle.id)
    }

    fn case_id(&self, project_key: &str, case_key: &TestCaseKey) -> Result<CaseId, RequestError> {
        let url = self.url(&format!("/testcase/{project_key}-{case_key}?fields=id"));
        let case: EntityRef<CaseId> = self.get(&url)?;
        Ok(case.id)
    }

    fn register_cases(&self, cycle_id: CycleId, case_ids: &[CaseId]) -> Result<(), RequestError> {
        let url = self.url("/testrunitem/bulk/save");
        let body = RunItemRegistration::new(cycle_id, case_ids.iter().copied());
        self.send_json(HttpMethod::Put, &url, &body)?;
        Ok(())
    }

    fn run_items(&self, cycle_id: CycleId) -> Result<Vec<RunItem>, RequestError> {
        let url = self.url(&format!(
            "/testrun/{cycle_id}/testrunitems?fields=testCaseId,testScriptResults(id),testRunId"
        ));
        let list: RunItemList = self.get(&url)?;
        Ok(list.test_run_items)
    }

    fn script_results(
        &self,
        cycle_id: CycleId,
        run_item_id: RunItemId,
    ) -> Result<Vec<ScriptResultSet>, RequestError> {
        let url = self.url(&format!(
            "/testrun/{cycle_id}/testresults?fields=testScriptResults(id,parameterSetId)&itemId={run_item_id}"
        ));
        self.get(&url)
    }

    fn set_case_statuses(&self, updates: &[CaseStatusUpdate]) -> Result<(), RequestError> {
        let url = self.url("/testresult");
        self.send_json(HttpMethod::Put, &url, updates)?;
        Ok(())
    }

    fn set_script_statuses(&self, updates: &[ScriptStatusUpdate]) -> Result<(), RequestError> {
        let url = self.url("/testscriptresult");
        self.send_json(HttpMethod::Put, &url, updates)?;
        Ok(())
    }
}
