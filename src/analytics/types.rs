use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::model::TaskStatus;

/// String-keyed map that keeps insertion order and serializes as a JSON object.
///
/// Re-inserting an existing key replaces the value but keeps the key's
/// original position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for OrderedMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> OrderedMap<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace. Returns the previous value when the key was already present.
    pub fn insert(&mut self, key: impl Into<String>, value: V) -> Option<V> {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Serialize for OrderedMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

/// Headline counters for one calendar month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodCounts {
    pub task_count: u64,
    pub assigned_task_count: u64,
    pub incomplete_task_count: u64,
    pub completed_task_count: u64,
    pub overdue_task_count: u64,
}

/// This month against last month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodComparison {
    pub this_month: PeriodCounts,
    pub last_month: PeriodCounts,
}

impl PeriodComparison {
    pub fn task_diff(&self) -> i64 {
        diff(self.this_month.task_count, self.last_month.task_count)
    }

    pub fn assigned_task_diff(&self) -> i64 {
        diff(
            self.this_month.assigned_task_count,
            self.last_month.assigned_task_count,
        )
    }

    pub fn incomplete_task_diff(&self) -> i64 {
        diff(
            self.this_month.incomplete_task_count,
            self.last_month.incomplete_task_count,
        )
    }

    pub fn completed_task_diff(&self) -> i64 {
        diff(
            self.this_month.completed_task_count,
            self.last_month.completed_task_count,
        )
    }

    pub fn overdue_task_diff(&self) -> i64 {
        diff(
            self.this_month.overdue_task_count,
            self.last_month.overdue_task_count,
        )
    }
}

fn diff(this: u64, last: u64) -> i64 {
    this as i64 - last as i64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityBucket {
    pub priority: String,
    pub task_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBucket {
    pub status: String,
    pub task_count: u64,
}

/// Workspace-scope fold of statuses into three buckets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOverview {
    pub active_tasks: u64,
    pub completed_tasks: u64,
    pub not_started_tasks: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyProgressPoint {
    /// Short month label, e.g. "Mar".
    pub name: String,
    pub total: u64,
    pub completed: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyDistributionPoint {
    /// Long month label, e.g. "March".
    pub month: String,
    pub task_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTaskDistribution {
    pub project: String,
    pub task_count: u64,
    pub completed_task_count: u64,
}

/// Series key ("All" or a project name) to its trailing monthly points.
pub type MonthlyProgress = OrderedMap<Vec<MonthlyProgressPoint>>;

/// One member's tasks, tabulated by status label and then by "all" plus project name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemberContribution {
    pub member: String,
    #[serde(flatten)]
    pub statuses: OrderedMap<OrderedMap<u64>>,
}

impl MemberContribution {
    /// Count for `status` under `key` ("all" or a project name).
    pub fn count(&self, status: TaskStatus, key: &str) -> Option<u64> {
        self.statuses
            .get(&status.label())
            .and_then(|row| row.get(key))
            .copied()
    }
}

/// Fields shared by project and workspace analytics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub task_count: u64,
    pub task_diff: i64,
    pub assigned_task_count: u64,
    pub assigned_task_diff: i64,
    pub incomplete_task_count: u64,
    pub incomplete_task_diff: i64,
    pub completed_task_count: u64,
    #[serde(rename = "completeTaskDiff")]
    pub completed_task_diff: i64,
    pub overdue_task_count: u64,
    pub overdue_task_diff: i64,
    pub tasks_by_priority: Vec<PriorityBucket>,
    pub tasks_by_status: Vec<StatusBucket>,
}

impl AnalyticsSummary {
    pub fn new(
        comparison: &PeriodComparison,
        tasks_by_priority: Vec<PriorityBucket>,
        tasks_by_status: Vec<StatusBucket>,
    ) -> Self {
        let this = &comparison.this_month;
        Self {
            task_count: this.task_count,
            task_diff: comparison.task_diff(),
            assigned_task_count: this.assigned_task_count,
            assigned_task_diff: comparison.assigned_task_diff(),
            incomplete_task_count: this.incomplete_task_count,
            incomplete_task_diff: comparison.incomplete_task_diff(),
            completed_task_count: this.completed_task_count,
            completed_task_diff: comparison.completed_task_diff(),
            overdue_task_count: this.overdue_task_count,
            overdue_task_diff: comparison.overdue_task_diff(),
            tasks_by_priority,
            tasks_by_status,
        }
    }
}

/// Dashboard analytics for a whole workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceAnalytics {
    #[serde(flatten)]
    pub summary: AnalyticsSummary,
    pub task_completion_overview: CompletionOverview,
    pub monthly_task_progress: MonthlyProgress,
    pub monthly_task_distribution: Vec<MonthlyDistributionPoint>,
    pub projects_task_distribution: Vec<ProjectTaskDistribution>,
    pub member_task_contribution: Vec<MemberContribution>,
}
