// crates/repo-law-core/src/runtime/fleet.rs
// ============================================================================
// Module: Fleet Execution
// Description: Bounded execution of independent runs.
// Purpose: Produce one fleet report from many repository runs.
// Dependencies: crate::{core, runtime}, time, tokio
// ============================================================================

//! ## Overview
//! Runs of different repositories share no mutable state, so they may execute
//! concurrently. [`run_fleet`] bounds parallelism with a semaphore; with a
//! concurrency of one it awaits runs strictly in input order. A failed run is
//! reported as a [`RunFailure`] and never stops its siblings. Results are
//! returned in input order regardless of completion order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::core::ComplianceRecord;
use crate::core::FleetReport;
use crate::core::RepoRef;
use crate::core::RunFailure;
use crate::runtime::run::Run;

// ============================================================================
// SECTION: Fleet Execution
// ============================================================================

/// Upper bound on concurrent runs.
pub const MAX_CONCURRENCY: usize = 32;

/// Outcome of one run before it is placed in the report.
type RunOutcome = Result<ComplianceRecord, String>;

/// Executes runs with at most `concurrency` in flight.
pub async fn run_fleet(runs: Vec<Run>, concurrency: usize) -> FleetReport {
    let mut report = FleetReport::new(OffsetDateTime::now_utc());
    let repos: Vec<RepoRef> = runs.iter().map(|run| run.repo().clone()).collect();
    let outcomes = if concurrency <= 1 {
        run_sequential(runs).await
    } else {
        run_parallel(runs, concurrency.min(MAX_CONCURRENCY)).await
    };
    for (repo, outcome) in repos.into_iter().zip(outcomes) {
        match outcome {
            Some(Ok(record)) => report.records.push(record),
            Some(Err(error)) => report.failures.push(failure(&repo, error)),
            None => report.failures.push(failure(&repo, "run task aborted".to_string())),
        }
    }
    report
}

/// Awaits runs one after another.
async fn run_sequential(runs: Vec<Run>) -> Vec<Option<RunOutcome>> {
    let mut outcomes = Vec::with_capacity(runs.len());
    for run in runs {
        outcomes.push(Some(run.full().await.map_err(|err| err.to_string())));
    }
    outcomes
}

/// Spawns runs behind a semaphore and collects outcomes by input index.
async fn run_parallel(runs: Vec<Run>, concurrency: usize) -> Vec<Option<RunOutcome>> {
    let semaphore = Arc::new(Semaphore::new(concurrency));
    let mut outcomes: Vec<Option<RunOutcome>> = runs.iter().map(|_| None).collect();
    let mut tasks = JoinSet::new();
    for (index, run) in runs.into_iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        tasks.spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return (index, Err("run scheduler closed".to_string()));
            };
            (index, run.full().await.map_err(|err| err.to_string()))
        });
    }
    while let Some(joined) = tasks.join_next().await {
        if let Ok((index, outcome)) = joined
            && let Some(slot) = outcomes.get_mut(index)
        {
            *slot = Some(outcome);
        }
    }
    outcomes
}

/// Builds a failure entry.
fn failure(repo: &RepoRef, error: String) -> RunFailure {
    RunFailure {
        owner: repo.owner.clone(),
        repo: repo.name.clone(),
        error,
    }
}
