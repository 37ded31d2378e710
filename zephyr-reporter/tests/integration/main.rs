// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests: a plugin talking to a fake server through the real client and retry logic.


use fake_server::{BASE_URL, FakeServer, NoSleep};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use zephyr_metadata::{CycleId, ProjectId};
use zephyr_reporter::{
    config::RateLimitPolicy,
    http::{HttpMethod, RetryingSender},
    plugin::ZephyrPlugin,
    service::ZephyrClient,
    sync::SyncOptions,
};

type TestClient<'a> = ZephyrClient<&'a FakeServer, &'a NoSleep>;

fn client<'a>(server: &'a FakeServer, sleep: &'a NoSleep) -> TestClient<'a> {
    ZephyrClient::with_sender(
        RetryingSender::with_sleeper(server, RateLimitPolicy::default(), sleep),
        BASE_URL,
        ProjectId(10100),
    )
}

fn serve_catalogs(server: &FakeServer) {
    server
        .route(HttpMethod::Get, "/project/10100", 200, r#"{"id": 10100, "key": "PROJ"}"#)
        .route(
            HttpMethod::Get,
            "/project/10100/testresultstatus",
            200,
            r#"[{"id": 1, "name": "Not Executed"}, {"id": 2, "name": "Pass"}, {"id": 3, "name": "Fail"}]"#,
        )
        .route(
            HttpMethod::Get,
            "/project/10100/testrunstatus",
            200,
            r#"[{"id": 6, "name": "In Progress"}, {"id": 7, "name": "NOT EXECUTED"}]"#,
        );
}

#[test]
fn session_is_reported() {
    let server = FakeServer::new();
    let sleep = NoSleep::default();
    serve_catalogs(&server);
    server
        .route(
            HttpMethod::Get,
            "/project/10100/foldertree/testrun",
            200,
            r#"{"children": [{"id": 50, "name": "Releases", "children": [{"id": 55, "name": "Nightly", "children": []}]}]}"#,
        )
        .route(HttpMethod::Post, "/testrun", 429, "")
        .route(HttpMethod::Post, "/testrun", 201, r#"{"id": 900, "key": "PROJ-C1"}"#)
        .route(HttpMethod::Get, "/testcase/PROJ-T1?fields=id", 200, r#"{"id": 501}"#)
        .route(HttpMethod::Get, "/testcase/PROJ-T3?fields=id", 200, r#"{"id": 503}"#)
        .route(HttpMethod::Put, "/testrunitem/bulk/save", 200, "")
        .route(
            HttpMethod::Get,
            "/testrun/900/testrunitems?fields=testCaseId,testScriptResults(id),testRunId",
            200,
            r#"{"testRunItems": [
                {"id": 100, "$lastTestResult": {"id": 200, "testCase": {"key": "PROJ-T1"}}},
                {"id": 101, "$lastTestResult": {"id": 201, "testCase": {"key": "PROJ-T3"}}}
            ]}"#,
        )
        .route(
            HttpMethod::Get,
            "/testrun/900/testresults?fields=testScriptResults(id,parameterSetId)&itemId=100",
            200,
            r#"[{"testScriptResults": [
                {"id": 30, "parameterSetId": 12},
                {"id": 31, "parameterSetId": 11},
                {"id": 32, "parameterSetId": 12},
                {"id": 33, "parameterSetId": 11}
            ]}]"#,
        )
        .route(
            HttpMethod::Get,
            "/testrun/900/testresults?fields=testScriptResults(id,parameterSetId)&itemId=101",
            200,
            r#"[{"testScriptResults": [{"id": 40}]}]"#,
        )
        .route(HttpMethod::Put, "/testresult", 200, "")
        .route(HttpMethod::Put, "/testscriptresult", 200, "");

    let options =
        SyncOptions::new("Nightly 2024-05-01").with_folder_name(Some("Nightly".to_owned()));
    let plugin = ZephyrPlugin::with_service(client(&server, &sleep), options).expect("configured");

    plugin.on_test_finished("tests/test_login.py::test_login_T1[chrome]", true);
    plugin.on_test_finished("tests/test_login.py::test_login_T1[firefox]", false);
    plugin.on_test_finished("tests/test_login.py::test_logout_T2", true);
    plugin.on_test_finished("tests/test_search.py::test_search_T3", true);
    plugin.on_test_finished("tests/test_search.py::test_helper", false);

    let summary = plugin.on_session_finished().expect("synchronized");
    assert_eq!(summary.cycle_id, CycleId(900));
    assert_eq!(summary.registered, 2);
    assert_eq!(summary.case_statuses_updated, 2);
    assert_eq!(summary.step_statuses_updated, 4);
    assert_eq!(summary.unresolved.len(), 1);
    assert_eq!(summary.unresolved[0].key().as_str(), "T2");
    assert!(!summary.is_complete());

    // The cycle was created in the existing nested folder after one rate-limited attempt.
    assert_eq!(*sleep.waits.lock().unwrap(), vec![Duration::from_secs(1)]);
    assert!(server.bodies(HttpMethod::Post, "/folder/testrun").is_empty());
    assert_eq!(
        server.bodies(HttpMethod::Post, "/testrun"),
        vec![
            json!({
                "name": "Nightly 2024-05-01",
                "projectId": 10100,
                "statusId": 7,
                "folderId": 55,
            });
            2
        ]
    );

    assert_eq!(
        server.bodies(HttpMethod::Put, "/testrunitem/bulk/save"),
        vec![json!({
            "testRunId": 900,
            "addedTestRunItems": [
                { "index": 0, "lastTestResult": { "testCaseId": 501 } },
                { "index": 1, "lastTestResult": { "testCaseId": 503 } },
            ],
        })]
    );
    assert_eq!(
        server.bodies(HttpMethod::Put, "/testresult"),
        vec![json!([
            { "id": 200, "testResultStatusId": 3 },
            { "id": 201, "testResultStatusId": 2 },
        ])]
    );
    // Parameter set 11 ran first (chrome, passed), parameter set 12 second (firefox, failed).
    // Updates are sent a set at a time. T3's only step has no parameter set, so it gets no
    // update.
    assert_eq!(
        server.bodies(HttpMethod::Put, "/testscriptresult"),
        vec![json!([
            { "id": 31, "testResultStatusId": 2 },
            { "id": 33, "testResultStatusId": 2 },
            { "id": 30, "testResultStatusId": 3 },
            { "id": 32, "testResultStatusId": 3 },
        ])]
    );
}

#[test]
fn missing_folder_is_created() {
    let server = FakeServer::new();
    let sleep = NoSleep::default();
    serve_catalogs(&server);
    server
        .route(HttpMethod::Get, "/project/10100/foldertree/testrun", 200, r#"{"children": []}"#)
        .route(HttpMethod::Post, "/folder/testrun", 201, r#"{"id": 77}"#)
        .route(HttpMethod::Post, "/testrun", 201, r#"{"id": 901}"#);

    let options = SyncOptions::new("Smoke").with_folder_name(Some("Smoke runs".to_owned()));
    let plugin = ZephyrPlugin::with_service(client(&server, &sleep), options).expect("configured");

    let summary = plugin.on_session_finished().expect("synchronized");
    assert_eq!(summary.cycle_id, CycleId(901));
    assert_eq!(summary.registered, 0);
    assert_eq!(
        server.bodies(HttpMethod::Post, "/folder/testrun"),
        vec![json!({ "name": "Smoke runs", "projectId": 10100, "index": 0 })]
    );
    assert_eq!(
        server.bodies(HttpMethod::Post, "/testrun"),
        vec![json!({ "name": "Smoke", "projectId": 10100, "statusId": 7, "folderId": 77 })]
    );
}

#[test]
fn failed_project_lookup_reports_nothing() {
    let server = FakeServer::new();
    let sleep = NoSleep::default();
    server
        .route(
            HttpMethod::Get,
            "/project/10100/testresultstatus",
            200,
            r#"[{"id": 2, "name": "Pass"}, {"id": 3, "name": "Fail"}]"#,
        )
        .route(HttpMethod::Get, "/project/10100", 503, "maintenance");

    let plugin = ZephyrPlugin::with_service(client(&server, &sleep), SyncOptions::new("Nightly"))
        .expect("configured");
    plugin.on_test_finished("test_T1", true);

    assert!(plugin.on_session_finished().is_none());
    assert!(
        server
            .received()
            .iter()
            .all(|received| received.method == HttpMethod::Get),
        "nothing was written after the failure"
    );
}

#[test]
fn persistent_rate_limiting_fails_configuration() {
    let server = FakeServer::new();
    let sleep = NoSleep::default();
    server.route(HttpMethod::Get, "/project/10100/testresultstatus", 429, "");

    let err = ZephyrPlugin::with_service(client(&server, &sleep), SyncOptions::new("Nightly"))
        .expect_err("rate limited");
    assert!(err.to_string().contains("result status"), "unexpected error: {err}");
    assert_eq!(server.received().len(), 5);
    assert_eq!(
        *sleep.waits.lock().unwrap(),
        vec![
            Duration::from_secs(1),
            Duration::from_secs(2),
            Duration::from_secs(4),
            Duration::from_secs(8),
        ]
    );
}
