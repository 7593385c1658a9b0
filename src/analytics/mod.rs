pub mod contribution;
pub mod distribution;
pub mod period;
pub mod rollup;
pub mod snapshot;
pub mod types;

pub use types::*;

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::error::{Error, Result};
use crate::storage::Database;
use period::PeriodWindows;
use rollup::{trailing_months, DISTRIBUTION_MONTHS, PROGRESS_MONTHS};
use snapshot::Snapshot;

fn out_of_range(now: DateTime<Utc>) -> Error {
    Error::Validation(format!("{now} is outside the supported calendar range"))
}

/// Run one builder against the shared snapshot on the blocking pool.
fn spawn_builder<T, F>(snapshot: &Arc<Snapshot>, build: F) -> JoinHandle<T>
where
    T: Send + 'static,
    F: FnOnce(&Snapshot) -> T + Send + 'static,
{
    let snapshot = Arc::clone(snapshot);
    tokio::task::spawn_blocking(move || build(&snapshot))
}

/// Compute dashboard analytics for a workspace as of `now`.
///
/// `user_id` is the caller's global user id; it is resolved to their member
/// id in this workspace before "assigned to me" counting.
pub async fn compute_workspace_analytics(
    db: &Database,
    workspace_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<WorkspaceAnalytics> {
    let windows = PeriodWindows::at(now).ok_or_else(|| out_of_range(now))?;
    let progress_months = trailing_months(now, PROGRESS_MONTHS).ok_or_else(|| out_of_range(now))?;
    let distribution_months =
        trailing_months(now, DISTRIBUTION_MONTHS).ok_or_else(|| out_of_range(now))?;
    let snapshot = Arc::new(snapshot::load_workspace(db, workspace_id, user_id, windows.floor()).await?);
    let started = Instant::now();

    let (
        comparison,
        tasks_by_priority,
        tasks_by_status,
        task_completion_overview,
        monthly_task_progress,
        monthly_task_distribution,
        projects_task_distribution,
        member_task_contribution,
    ) = tokio::try_join!(
        spawn_builder(&snapshot, move |s| {
            period::compare_periods(&s.window_tasks, &s.caller.id, &windows, now)
        }),
        spawn_builder(&snapshot, |s| distribution::tasks_by_priority(&s.tasks)),
        spawn_builder(&snapshot, |s| distribution::tasks_by_status(&s.tasks)),
        spawn_builder(&snapshot, |s| distribution::completion_overview(&s.tasks)),
        spawn_builder(&snapshot, move |s| {
            rollup::monthly_task_progress(&s.tasks, &s.projects, &progress_months)
        }),
        spawn_builder(&snapshot, move |s| {
            rollup::monthly_task_distribution(&s.tasks, &distribution_months)
        }),
        spawn_builder(&snapshot, |s| distribution::projects_task_distribution(&s.tasks, &s.projects)),
        spawn_builder(&snapshot, |s| {
            contribution::member_task_contribution(&s.tasks, &s.members, &s.projects)
        }),
    )?;

    log::debug!(
        "Workspace {} analytics built in {:?}",
        snapshot.workspace_id,
        started.elapsed()
    );

    Ok(WorkspaceAnalytics {
        summary: AnalyticsSummary::new(&comparison, tasks_by_priority, tasks_by_status),
        task_completion_overview,
        monthly_task_progress,
        monthly_task_distribution,
        projects_task_distribution,
        member_task_contribution,
    })
}

/// Compute dashboard analytics for a single project as of `now`.
pub async fn compute_project_analytics(
    db: &Database,
    project_id: &str,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<AnalyticsSummary> {
    let windows = PeriodWindows::at(now).ok_or_else(|| out_of_range(now))?;
    let snapshot = Arc::new(snapshot::load_project(db, project_id, user_id, windows.floor()).await?);

    let (comparison, tasks_by_priority, tasks_by_status) = tokio::try_join!(
        spawn_builder(&snapshot, move |s| {
            period::compare_periods(&s.window_tasks, &s.caller.id, &windows, now)
        }),
        spawn_builder(&snapshot, |s| distribution::tasks_by_priority(&s.tasks)),
        spawn_builder(&snapshot, |s| distribution::tasks_by_status(&s.tasks)),
    )?;

    Ok(AnalyticsSummary::new(&comparison, tasks_by_priority, tasks_by_status))
}
