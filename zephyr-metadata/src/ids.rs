// Copyright (c) The zephyr-reporter Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! remote_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw numeric id.
            #[inline]
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            #[inline]
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

remote_id!(
    /// The numeric id of a Jira project.
    ProjectId
);
remote_id!(
    /// The id of a status value, as assigned by the server's status catalogs.
    StatusId
);
remote_id!(
    /// The id of a test-run folder.
    FolderId
);
remote_id!(
    /// The id of a test cycle (called a "test run" by the API).
    CycleId
);
remote_id!(
    /// The internal id of a test case.
    CaseId
);
remote_id!(
    /// The id of a run item, which binds a test case to a cycle.
    RunItemId
);
remote_id!(
    /// The id of a test result, the target of case-level status updates.
    TestResultId
);
remote_id!(
    /// The id of a single script step result.
    ScriptResultId
);
remote_id!(
    /// The id of a parameter set of a parametrized test case.
    ParameterSetId
);
