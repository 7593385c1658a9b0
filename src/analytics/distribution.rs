use std::collections::HashMap;

use super::types::{CompletionOverview, PriorityBucket, ProjectTaskDistribution, StatusBucket};
use crate::model::{Priority, Project, Task, TaskStatus};

/// Task counts per priority, one entry for every priority in canonical order.
pub fn tasks_by_priority(tasks: &[Task]) -> Vec<PriorityBucket> {
    let mut counts: HashMap<Priority, u64> = HashMap::new();
    for task in tasks {
        *counts.entry(task.priority).or_default() += 1;
    }
    Priority::ALL
        .into_iter()
        .map(|priority| PriorityBucket {
            priority: priority.label(),
            task_count: counts.get(&priority).copied().unwrap_or(0),
        })
        .collect()
}

/// Task counts per status, one entry for every status in canonical order.
pub fn tasks_by_status(tasks: &[Task]) -> Vec<StatusBucket> {
    let mut counts: HashMap<TaskStatus, u64> = HashMap::new();
    for task in tasks {
        *counts.entry(task.status).or_default() += 1;
    }
    TaskStatus::ALL
        .into_iter()
        .map(|status| StatusBucket {
            status: status.label(),
            task_count: counts.get(&status).copied().unwrap_or(0),
        })
        .collect()
}

/// Three-way fold used on workspace dashboards. Only `TODO` counts as not
/// started; `BACKLOG` is active.
pub fn completion_overview(tasks: &[Task]) -> CompletionOverview {
    let mut overview = CompletionOverview::default();
    for task in tasks {
        match task.status {
            TaskStatus::Completed => overview.completed_tasks += 1,
            TaskStatus::Todo => overview.not_started_tasks += 1,
            TaskStatus::Backlog | TaskStatus::InProgress | TaskStatus::InReview => {
                overview.active_tasks += 1
            }
        }
    }
    overview
}

/// Total and completed task counts for each project, in project order.
pub fn projects_task_distribution(
    tasks: &[Task],
    projects: &[Project],
) -> Vec<ProjectTaskDistribution> {
    let mut counts: HashMap<&str, (u64, u64)> = HashMap::new();
    for task in tasks {
        let entry = counts.entry(task.project_id.as_str()).or_default();
        entry.0 += 1;
        if task.status.is_completed() {
            entry.1 += 1;
        }
    }
    projects
        .iter()
        .map(|project| {
            let (total, completed) = counts.get(project.id.as_str()).copied().unwrap_or_default();
            ProjectTaskDistribution {
                project: project.name.clone(),
                task_count: total,
                completed_task_count: completed,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn task(id: &str, project: &str, status: TaskStatus, priority: Priority) -> Task {
        Task {
            id: id.into(),
            workspace_id: "w1".into(),
            project_id: project.into(),
            assignee_id: None,
            status,
            priority,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
            due_date: None,
        }
    }

    fn sample() -> Vec<Task> {
        vec![
            task("t1", "p1", TaskStatus::Backlog, Priority::High),
            task("t2", "p1", TaskStatus::Todo, Priority::High),
            task("t3", "p2", TaskStatus::InProgress, Priority::Low),
            task("t4", "p2", TaskStatus::Completed, Priority::High),
            task("t5", "p2", TaskStatus::InReview, Priority::Low),
        ]
    }

    #[test]
    fn test_priority_zero_fill() {
        let buckets = tasks_by_priority(&sample());
        assert_eq!(
            buckets,
            vec![
                PriorityBucket { priority: "Low".into(), task_count: 2 },
                PriorityBucket { priority: "Medium".into(), task_count: 0 },
                PriorityBucket { priority: "High".into(), task_count: 3 },
            ]
        );
    }

    #[test]
    fn test_status_zero_fill_on_empty_input() {
        let buckets = tasks_by_status(&[]);
        let labels: Vec<&str> = buckets.iter().map(|b| b.status.as_str()).collect();
        assert_eq!(
            labels,
            vec!["Backlog", "Todo", "In Progress", "In Review", "Completed"]
        );
        assert!(buckets.iter().all(|b| b.task_count == 0));
    }

    #[test]
    fn test_status_counts() {
        let buckets = tasks_by_status(&sample());
        let counts: Vec<u64> = buckets.iter().map(|b| b.task_count).collect();
        assert_eq!(counts, vec![1, 1, 1, 1, 1]);
    }

    #[test]
    fn test_completion_overview_partitions_tasks() {
        let tasks = sample();
        let overview = completion_overview(&tasks);
        assert_eq!(
            overview,
            CompletionOverview {
                active_tasks: 3,
                completed_tasks: 1,
                not_started_tasks: 1,
            }
        );
        assert_eq!(
            overview.active_tasks + overview.completed_tasks + overview.not_started_tasks,
            tasks.len() as u64
        );
    }

    #[test]
    fn test_projects_task_distribution_zero_fills_projects() {
        let projects = vec![
            Project { id: "p1".into(), workspace_id: "w1".into(), name: "Alpha".into() },
            Project { id: "p2".into(), workspace_id: "w1".into(), name: "Beta".into() },
            Project { id: "p3".into(), workspace_id: "w1".into(), name: "Gamma".into() },
        ];
        let dist = projects_task_distribution(&sample(), &projects);
        assert_eq!(
            dist,
            vec![
                ProjectTaskDistribution { project: "Alpha".into(), task_count: 2, completed_task_count: 0 },
                ProjectTaskDistribution { project: "Beta".into(), task_count: 3, completed_task_count: 1 },
                ProjectTaskDistribution { project: "Gamma".into(), task_count: 0, completed_task_count: 0 },
            ]
        );
    }
}
