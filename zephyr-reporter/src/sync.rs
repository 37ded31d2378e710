// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-of-session synchronization of results with the server.
//!
//! [`SyncOrchestrator::run`] takes the [`ResultSnapshot`] of a finished session and:
//!
//! 1. looks up the project key;
//! 2. finds or creates the configured folder;
//! 3. creates the test cycle (or looks up an existing one);
//! 4. resolves case keys to case ids and registers them in the cycle;
//! 5. lists the run items of the cycle;
//! 6. sets the status of every registered case;
//! 7. sets the status of the script steps of every registered parametrized case.
//!
//! Failures in steps 1, 2, 3 and 5, and of the registration request in step 4, leave nothing
//! sensible to do and abort with a [`SyncError`]. Other failures only affect the cases they are
//! about and are collected in the [`SyncSummary`].

use crate::{
    aggregator::ResultSnapshot,
    case_key::TestCaseKey,
    errors::{RequestError, StepSyncError, SyncError, SyncPhase, UnresolvedCaseKey},
    folder,
    service::RemoteTestService,
    status::{StatusCatalog, initial_cycle_status},
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};
use zephyr_metadata::{
    CaseId, CaseStatusUpdate, CycleId, FolderId, ParameterSetId, RunItemId, ScriptResultId,
    ScriptStatusUpdate, ScriptStepResult, StatusId, StatusUpdate, TestResultId,
};

/// What to synchronize into.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyncOptions {
    /// The name of the test cycle to create.
    pub cycle_name: String,

    /// The folder to create the cycle in, if any.
    pub folder_name: Option<String>,

    /// The key of an existing cycle (e.g. `PROJ-C12`) to report into instead of creating one.
    pub existing_cycle_key: Option<String>,
}

impl SyncOptions {
    /// Options creating a cycle named `cycle_name` at the root.
    pub fn new(cycle_name: impl Into<String>) -> Self {
        Self {
            cycle_name: cycle_name.into(),
            folder_name: None,
            existing_cycle_key: None,
        }
    }

    /// Creates the cycle in the folder `folder_name`.
    pub fn with_folder_name(mut self, folder_name: Option<String>) -> Self {
        self.folder_name = folder_name;
        self
    }

    /// Reports into the existing cycle `cycle_key`.
    pub fn with_existing_cycle_key(mut self, cycle_key: Option<String>) -> Self {
        self.existing_cycle_key = cycle_key;
        self
    }
}

/// What a synchronization run did.
#[derive(Debug)]
pub struct SyncSummary {
    /// The cycle results were reported into.
    pub cycle_id: CycleId,

    /// The number of cases registered in the cycle.
    pub registered: usize,

    /// The number of case statuses set.
    pub case_statuses_updated: usize,

    /// The number of script step statuses set.
    pub step_statuses_updated: usize,

    /// Case keys that could not be resolved, and were left out of the cycle.
    pub unresolved: Vec<UnresolvedCaseKey>,

    /// Cases whose step statuses could not be set.
    pub step_failures: Vec<StepSyncError>,

    /// The error returned by the bulk case status update, if it failed.
    pub case_status_failure: Option<RequestError>,
}

impl SyncSummary {
    fn new(cycle_id: CycleId) -> Self {
        Self {
            cycle_id,
            registered: 0,
            case_statuses_updated: 0,
            step_statuses_updated: 0,
            unresolved: Vec::new(),
            step_failures: Vec::new(),
            case_status_failure: None,
        }
    }

    /// Returns true if every recorded case was synchronized.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
            && self.step_failures.is_empty()
            && self.case_status_failure.is_none()
    }
}

/// Run item ids by local case key.
#[derive(Clone, Copy, Debug)]
struct RunItemIds {
    run_item: RunItemId,
    last_result: TestResultId,
}

/// Synchronizes a session's results with the server.
#[derive(Debug)]
pub struct SyncOrchestrator<'a, S> {
    service: S,
    catalog: &'a StatusCatalog,
    options: SyncOptions,
}

impl<'a, S: RemoteTestService> SyncOrchestrator<'a, S> {
    /// Creates a new orchestrator. `catalog` maps outcomes to result statuses.
    pub fn new(service: S, catalog: &'a StatusCatalog, options: SyncOptions) -> Self {
        Self {
            service,
            catalog,
            options,
        }
    }

    /// Runs synchronization.
    pub fn run(&self, snapshot: &ResultSnapshot) -> Result<SyncSummary, SyncError> {
        let project_key = self
            .service
            .project_key()
            .map_err(SyncError::request(SyncPhase::ProjectLookup))?;
        debug!(%project_key, "resolved project key");

        let cycle_id = self.cycle()?;
        let mut summary = SyncSummary::new(cycle_id);

        let case_ids = self.resolve_cases(&project_key, snapshot, &mut summary);
        if case_ids.is_empty() {
            info!(%cycle_id, "no test cases to register");
            return Ok(summary);
        }
        self.service
            .register_cases(cycle_id, &case_ids)
            .map_err(SyncError::request(SyncPhase::Registration))?;
        summary.registered = case_ids.len();
        info!(%cycle_id, count = case_ids.len(), "registered test cases");

        let run_items = self.run_items(cycle_id)?;

        self.update_case_statuses(snapshot, &run_items, &mut summary);

        for case_key in snapshot.case_keys() {
            let Some(ids) = run_items.get(case_key.as_str()) else {
                continue;
            };
            match self.update_step_statuses(cycle_id, ids.run_item, case_key, snapshot) {
                Ok(count) => summary.step_statuses_updated += count,
                Err(err) => {
                    warn!(%case_key, error = %err, "failed to update script step statuses");
                    summary
                        .step_failures
                        .push(StepSyncError::new(case_key.clone(), err));
                }
            }
        }

        info!(
            %cycle_id,
            cases = summary.case_statuses_updated,
            steps = summary.step_statuses_updated,
            complete = summary.is_complete(),
            "synchronized test results"
        );
        Ok(summary)
    }

    fn cycle(&self) -> Result<CycleId, SyncError> {
        if let Some(cycle_key) = &self.options.existing_cycle_key {
            let cycle_id = self
                .service
                .cycle_id(cycle_key)
                .map_err(SyncError::request(SyncPhase::CycleCreate))?;
            info!(%cycle_key, %cycle_id, "reporting into existing test cycle");
            return Ok(cycle_id);
        }

        let folder_id = self.folder()?;
        let statuses = self
            .service
            .cycle_statuses()
            .map_err(SyncError::request(SyncPhase::CycleCreate))?;
        let status_id = initial_cycle_status(&statuses).ok_or(SyncError::NoCycleStatus)?;

        let cycle_id = self
            .service
            .create_cycle(&self.options.cycle_name, status_id, folder_id)
            .map_err(SyncError::request(SyncPhase::CycleCreate))?;
        info!(name = %self.options.cycle_name, %cycle_id, "created test cycle");
        Ok(cycle_id)
    }

    fn folder(&self) -> Result<Option<FolderId>, SyncError> {
        let Some(name) = &self.options.folder_name else {
            return Ok(None);
        };
        let tree = self
            .service
            .folder_tree()
            .map_err(SyncError::request(SyncPhase::Folder))?;
        folder::resolve_or_create(&self.service, &tree, name)
            .map(Some)
            .map_err(SyncError::request(SyncPhase::Folder))
    }

    fn resolve_cases(
        &self,
        project_key: &str,
        snapshot: &ResultSnapshot,
        summary: &mut SyncSummary,
    ) -> Vec<CaseId> {
        let mut case_ids = Vec::with_capacity(snapshot.case_keys().len());
        for case_key in snapshot.case_keys() {
            match self.service.case_id(project_key, case_key) {
                Ok(case_id) => case_ids.push(case_id),
                Err(err) => {
                    warn!(%case_key, error = %err, "failed to resolve test case, skipping it");
                    summary
                        .unresolved
                        .push(UnresolvedCaseKey::new(case_key.clone(), err));
                }
            }
        }
        case_ids
    }

    fn run_items(&self, cycle_id: CycleId) -> Result<HashMap<String, RunItemIds>, SyncError> {
        let items = self
            .service
            .run_items(cycle_id)
            .map_err(SyncError::request(SyncPhase::RunItems))?;

        let mut by_key = HashMap::with_capacity(items.len());
        for item in items {
            by_key
                .entry(item.last_test_result.test_case.local_key().to_owned())
                .or_insert(RunItemIds {
                    run_item: item.id,
                    last_result: item.last_test_result.id,
                });
        }
        Ok(by_key)
    }

    fn update_case_statuses(
        &self,
        snapshot: &ResultSnapshot,
        run_items: &HashMap<String, RunItemIds>,
        summary: &mut SyncSummary,
    ) {
        let updates: Vec<CaseStatusUpdate> = snapshot
            .case_outcomes()
            .iter()
            .filter_map(|(case_key, outcome)| {
                let ids = run_items.get(case_key.as_str())?;
                Some(StatusUpdate {
                    id: ids.last_result,
                    test_result_status_id: self.catalog.status_id(*outcome),
                })
            })
            .collect();
        if updates.is_empty() {
            return;
        }

        match self.service.set_case_statuses(&updates) {
            Ok(()) => summary.case_statuses_updated = updates.len(),
            Err(err) => {
                warn!(count = updates.len(), error = %err, "failed to update test case statuses");
                summary.case_status_failure = Some(err);
            }
        }
    }

    fn update_step_statuses(
        &self,
        cycle_id: CycleId,
        run_item_id: RunItemId,
        case_key: &TestCaseKey,
        snapshot: &ResultSnapshot,
    ) -> Result<usize, RequestError> {
        let results = self.service.script_results(cycle_id, run_item_id)?;
        let Some(steps) = results.first() else {
            return Ok(0);
        };

        let statuses: Vec<StatusId> = snapshot
            .outcomes_for(case_key)
            .map(|outcome| self.catalog.status_id(outcome))
            .collect();
        let updates = assign_step_statuses(&steps.test_script_results, &statuses);
        if updates.is_empty() {
            return Ok(0);
        }

        self.service.set_script_statuses(&updates)?;
        debug!(%case_key, count = updates.len(), "updated script step statuses");
        Ok(updates.len())
    }
}

/// Assigns a status to each script step of a parametrized case.
///
/// Steps are grouped by parameter set, and the groups sorted by parameter set id are paired with
/// `statuses` in order: the lowest set gets the first status. Every step in a group gets that
/// group's status. Steps without a parameter set, and groups beyond the end of `statuses`, get
/// no update.
///
/// Updates are returned one group at a time in ascending parameter set order, and in the order
/// of `steps` within a group.
pub fn assign_step_statuses(
    steps: &[ScriptStepResult],
    statuses: &[StatusId],
) -> Vec<ScriptStatusUpdate> {
    let mut groups: BTreeMap<ParameterSetId, Vec<ScriptResultId>> = BTreeMap::new();
    for step in steps {
        if let Some(set) = step.parameter_set_id {
            groups.entry(set).or_default().push(step.id);
        }
    }

    groups
        .into_values()
        .zip(statuses.iter().copied())
        .flat_map(|(step_ids, status)| {
            step_ids.into_iter().map(move |id| StatusUpdate {
                id,
                test_result_status_id: status,
            })
        })
        .collect()
}
