use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Backlog,
    Todo,
    InProgress,
    InReview,
    Completed,
}

impl TaskStatus {
    /// Canonical order used whenever statuses are enumerated in output.
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Backlog,
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::InReview,
        TaskStatus::Completed,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Backlog => "BACKLOG",
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::InReview => "IN_REVIEW",
            TaskStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }

    /// Human label, e.g. "In Progress".
    pub fn label(self) -> String {
        humanize_enum_name(self.as_str())
    }

    pub fn is_completed(self) -> bool {
        self == TaskStatus::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.as_str() == s)
    }

    pub fn label(self) -> String {
        humanize_enum_name(self.as_str())
    }
}

/// Lowercase, turn underscores into spaces, then capitalise each word:
/// `IN_PROGRESS` becomes `In Progress`.
pub fn humanize_enum_name(name: &str) -> String {
    name.to_lowercase()
        .split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub workspace_id: String,
    pub name: String,
}

/// Workspace-scoped identity of a user. Tasks are assigned to members, not users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: String,
    pub workspace_id: String,
    pub user_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub workspace_id: String,
    pub project_id: String,
    /// Member id of the assignee.
    #[serde(default)]
    pub assignee_id: Option<String>,
    pub status: TaskStatus,
    pub priority: Priority,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Open and past its due date as of `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_completed() && self.due_date.is_some_and(|due| due < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_humanize_enum_name() {
        assert_eq!(humanize_enum_name("IN_PROGRESS"), "In Progress");
        assert_eq!(humanize_enum_name("TODO"), "Todo");
        assert_eq!(humanize_enum_name("in_review"), "In Review");
        assert_eq!(humanize_enum_name(""), "");
    }

    #[test]
    fn test_status_labels_in_canonical_order() {
        let labels: Vec<String> = TaskStatus::ALL.iter().map(|s| s.label()).collect();
        assert_eq!(
            labels,
            vec!["Backlog", "Todo", "In Progress", "In Review", "Completed"]
        );
        let labels: Vec<String> = Priority::ALL.iter().map(|p| p.label()).collect();
        assert_eq!(labels, vec!["Low", "Medium", "High"]);
    }

    #[test]
    fn test_parse_round_trips_wire_names() {
        for s in TaskStatus::ALL {
            assert_eq!(TaskStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(Priority::parse("MEDIUM"), Some(Priority::Medium));
        assert_eq!(TaskStatus::parse("DONE"), None);
        assert_eq!(Priority::parse("high"), None);
    }

    #[test]
    fn test_task_deserializes_wire_format() {
        let task: Task = serde_json::from_str(
            r#"{
                "id": "t1",
                "workspaceId": "w1",
                "projectId": "p1",
                "assigneeId": "m1",
                "status": "IN_REVIEW",
                "priority": "HIGH",
                "createdAt": "2025-03-02T10:00:00Z",
                "dueDate": "2025-03-09T10:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(task.status, TaskStatus::InReview);
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.assignee_id.as_deref(), Some("m1"));
    }

    #[test]
    fn test_overdue_excludes_completed_and_undated() {
        let now = Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap();
        let mut task = Task {
            id: "t1".into(),
            workspace_id: "w1".into(),
            project_id: "p1".into(),
            assignee_id: None,
            status: TaskStatus::Todo,
            priority: Priority::Low,
            created_at: now,
            due_date: Some(Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap()),
        };
        assert!(task.is_overdue(now));

        task.status = TaskStatus::Completed;
        assert!(!task.is_overdue(now));

        task.status = TaskStatus::InProgress;
        task.due_date = None;
        assert!(!task.is_overdue(now));

        task.due_date = Some(now);
        assert!(!task.is_overdue(now));
    }
}
