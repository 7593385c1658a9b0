use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::period::MonthWindow;
use super::types::{MonthlyDistributionPoint, MonthlyProgress, MonthlyProgressPoint};
use crate::model::{Project, Task};

/// Window length of the per-project progress series.
pub const PROGRESS_MONTHS: usize = 4;
/// Window length of the aggregate distribution series.
pub const DISTRIBUTION_MONTHS: usize = 6;
/// Series key that aggregates every project.
pub const ALL_SERIES: &str = "All";

/// `count` consecutive calendar months ending with the month containing `now`,
/// oldest first. `None` if any of them falls outside chrono's range.
pub fn trailing_months(now: DateTime<Utc>, count: usize) -> Option<Vec<MonthWindow>> {
    let mut windows = (0..count as i32)
        .map(|back| MonthWindow::relative_to(now, -back))
        .collect::<Option<Vec<_>>>()?;
    windows.reverse();
    Some(windows)
}

#[derive(Default, Clone, Copy)]
struct Tally {
    total: u64,
    completed: u64,
}

impl Tally {
    fn add(&mut self, task: &Task) {
        self.total += 1;
        if task.status.is_completed() {
            self.completed += 1;
        }
    }
}

/// Created vs. completed counts per month in `months`, for "All" and for each
/// project keyed by display name.
///
/// Two projects with the same name share one key; the later project in
/// `projects` wins, keeping the position of the first.
pub fn monthly_task_progress(
    tasks: &[Task],
    projects: &[Project],
    months: &[MonthWindow],
) -> MonthlyProgress {
    // One pass per month; per-project tallies keyed by project id.
    let per_month: Vec<(Tally, HashMap<&str, Tally>)> = months
        .iter()
        .map(|window| {
            let mut all = Tally::default();
            let mut by_project: HashMap<&str, Tally> = HashMap::new();
            for task in tasks.iter().filter(|t| window.contains(t.created_at)) {
                all.add(task);
                by_project.entry(task.project_id.as_str()).or_default().add(task);
            }
            (all, by_project)
        })
        .collect();

    let mut progress = MonthlyProgress::new();
    progress.insert(
        ALL_SERIES,
        progress_points(months, per_month.iter().map(|(all, _)| *all)),
    );
    for project in projects {
        let points = progress_points(
            months,
            per_month.iter().map(|(_, by_project)| {
                by_project.get(project.id.as_str()).copied().unwrap_or_default()
            }),
        );
        if progress.insert(project.name.clone(), points).is_some() {
            log::warn!(
                "Project name {:?} is used more than once; monthly progress for {} replaces an earlier series",
                project.name,
                project.id
            );
        }
    }
    progress
}

fn progress_points(
    windows: &[MonthWindow],
    tallies: impl Iterator<Item = Tally>,
) -> Vec<MonthlyProgressPoint> {
    windows
        .iter()
        .zip(tallies)
        .map(|(window, tally)| MonthlyProgressPoint {
            name: window.short_label.to_string(),
            total: tally.total,
            completed: tally.completed,
        })
        .collect()
}

/// Tasks created per month in `months`, across the whole scope.
pub fn monthly_task_distribution(tasks: &[Task], months: &[MonthWindow]) -> Vec<MonthlyDistributionPoint> {
    months
        .iter()
        .map(|window| MonthlyDistributionPoint {
            month: window.long_label.to_string(),
            task_count: tasks.iter().filter(|t| window.contains(t.created_at)).count() as u64,
        })
        .collect()
}
