use std::collections::HashMap;

use super::types::{MemberContribution, OrderedMap};
use crate::model::{Member, Project, Task, TaskStatus};

/// Key of the per-status cell that counts across every project.
pub const ALL_PROJECTS: &str = "all";

/// Member x status x project task counts, one entry per member in `members` order.
///
/// Every status appears for every member, and every project appears under
/// every status, even when the count is zero. Project cells are keyed by
/// display name; a repeated name keeps the later project's count.
pub fn member_task_contribution(
    tasks: &[Task],
    members: &[Member],
    projects: &[Project],
) -> Vec<MemberContribution> {
    let mut by_status: HashMap<(&str, TaskStatus), u64> = HashMap::new();
    let mut by_project: HashMap<(&str, TaskStatus, &str), u64> = HashMap::new();
    for task in tasks {
        let Some(assignee) = task.assignee_id.as_deref() else {
            continue;
        };
        *by_status.entry((assignee, task.status)).or_default() += 1;
        *by_project
            .entry((assignee, task.status, task.project_id.as_str()))
            .or_default() += 1;
    }

    members
        .iter()
        .map(|member| {
            let mut statuses = OrderedMap::new();
            for status in TaskStatus::ALL {
                let mut row = OrderedMap::new();
                row.insert(
                    ALL_PROJECTS,
                    by_status.get(&(member.id.as_str(), status)).copied().unwrap_or(0),
                );
                for project in projects {
                    let count = by_project
                        .get(&(member.id.as_str(), status, project.id.as_str()))
                        .copied()
                        .unwrap_or(0);
                    row.insert(project.name.clone(), count);
                }
                statuses.insert(status.label(), row);
            }
            MemberContribution {
                member: member.name.clone(),
                statuses,
            }
        })
        .collect()
}
