//! Concurrent execution of the issue sources of parallel branches

use std::sync::Arc;

use futures::future;
use log::warn;
use tokio::task;

use crate::aggregation::{self, AggregatedIssues, BranchContribution};
use crate::errors::SourceError;
use crate::models::IssueSet;
use crate::sources::IssueSource;

/// One branch of a build and the source that produces its issues
#[derive(Clone)]
pub struct Branch {
    pub id: String,
    pub source: Arc<dyn IssueSource>,
}

impl Branch {
    pub fn new(id: impl Into<String>, source: Arc<dyn IssueSource>) -> Self {
        Self {
            id: id.into(),
            source,
        }
    }
}

/// Runs branch sources in parallel and merges once all have finished
pub struct BranchRunner {}

impl Default for BranchRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl BranchRunner {
    pub fn new() -> Self {
        Self {}
    }

    /// Produce the issues of every branch concurrently
    ///
    /// Results are returned in the order of `branches`.
    pub async fn run_branches(&self, branches: Vec<Branch>) -> Vec<(String, Result<IssueSet, SourceError>)> {
        let mut handles = Vec::new();
        let mut ids = Vec::new();

        for branch in branches {
            let source = branch.source.clone();
            ids.push(branch.id);
            handles.push(task::spawn_blocking(move || source.produce()));
        }

        // Barrier: nothing is merged before every branch is done
        let results = future::join_all(handles).await;

        ids.into_iter()
            .zip(results)
            .map(|(id, res)| {
                let result = res.unwrap_or_else(|e| {
                    Err(SourceError::Unreadable {
                        path: id.clone().into(),
                        message: format!("Task panicked: {}", e),
                    })
                });
                (id, result)
            })
            .collect()
    }

    /// Run all branches and merge their issues for `tool_id`
    ///
    /// A failing branch is treated as a missing contribution.
    pub async fn run_and_merge(&self, tool_id: &str, branches: Vec<Branch>) -> AggregatedIssues {
        let contributions = self
            .run_branches(branches)
            .await
            .into_iter()
            .map(|(id, result)| match result {
                Ok(issues) => BranchContribution::new(id, issues),
                Err(e) => {
                    warn!("Branch '{}' failed: {}", id, e);
                    BranchContribution::missing(id)
                }
            })
            .collect();

        aggregation::merge(tool_id, contributions)
    }
}
