use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::model::{Member, Project, Task};
use crate::storage::repository::{self, TaskScope};
use crate::storage::Database;

/// Read-only records for one analytics call.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub workspace_id: String,
    /// The requesting user's membership in `workspace_id`.
    pub caller: Member,
    /// Tasks created on or after the period floor; feeds the month-over-month counters.
    pub window_tasks: Vec<Task>,
    /// Every task in scope regardless of age.
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    /// Workspace members. Empty for project-scoped snapshots, which never tabulate members.
    pub members: Vec<Member>,
}

fn require_id(kind: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{kind} is required")));
    }
    Ok(value.to_string())
}

fn not_a_member(user_id: &str, workspace_id: &str) -> Error {
    Error::Unauthorized(format!(
        "user {user_id} is not a member of workspace {workspace_id}"
    ))
}

/// Load everything workspace analytics needs. `floor` bounds the narrow
/// window fetch used by the period counters.
///
/// All reads share one transaction, so the window and the full history come
/// from the same database state even while an import commits.
pub async fn load_workspace(
    db: &Database,
    workspace_id: &str,
    user_id: &str,
    floor: DateTime<Utc>,
) -> Result<Snapshot> {
    let workspace_id = require_id("workspace id", workspace_id)?;
    let user_id = require_id("user id", user_id)?;

    let snapshot = db
        .reader()
        .call(move |conn| -> std::result::Result<Result<Snapshot>, rusqlite::Error> {
            let tx = conn.transaction()?;
            if repository::find_workspace(&tx, &workspace_id)?.is_none() {
                return Ok(Err(Error::NotFound(format!("workspace {workspace_id}"))));
            }
            let Some(caller) = repository::find_member_by_user(&tx, &workspace_id, &user_id)? else {
                return Ok(Err(not_a_member(&user_id, &workspace_id)));
            };

            let scope = TaskScope::Workspace(workspace_id.clone());
            let window_tasks = repository::list_tasks(&tx, &scope, Some(floor))?;
            let tasks = repository::list_tasks(&tx, &scope, None)?;
            let projects = repository::list_projects(&tx, &workspace_id)?;
            let members = repository::list_members(&tx, &workspace_id)?;
            tx.commit()?;

            Ok(Ok(Snapshot {
                workspace_id,
                caller,
                window_tasks,
                tasks,
                projects,
                members,
            }))
        })
        .await??;

    log::debug!(
        "Loaded workspace {}: {} tasks ({} in period window), {} projects, {} members",
        snapshot.workspace_id,
        snapshot.tasks.len(),
        snapshot.window_tasks.len(),
        snapshot.projects.len(),
        snapshot.members.len()
    );
    Ok(snapshot)
}

/// Load everything project analytics needs. Membership is checked against
/// the project's parent workspace.
pub async fn load_project(
    db: &Database,
    project_id: &str,
    user_id: &str,
    floor: DateTime<Utc>,
) -> Result<Snapshot> {
    let project_id = require_id("project id", project_id)?;
    let user_id = require_id("user id", user_id)?;

    let snapshot = db
        .reader()
        .call(move |conn| -> std::result::Result<Result<Snapshot>, rusqlite::Error> {
            let tx = conn.transaction()?;
            let Some(project) = repository::find_project(&tx, &project_id)? else {
                return Ok(Err(Error::NotFound(format!("project {project_id}"))));
            };
            let Some(caller) = repository::find_member_by_user(&tx, &project.workspace_id, &user_id)?
            else {
                return Ok(Err(not_a_member(&user_id, &project.workspace_id)));
            };

            let scope = TaskScope::Project(project_id);
            let window_tasks = repository::list_tasks(&tx, &scope, Some(floor))?;
            let tasks = repository::list_tasks(&tx, &scope, None)?;
            tx.commit()?;

            Ok(Ok(Snapshot {
                workspace_id: project.workspace_id.clone(),
                caller,
                window_tasks,
                tasks,
                projects: vec![project],
                members: Vec::new(),
            }))
        })
        .await??;

    log::debug!(
        "Loaded project {}: {} tasks ({} in period window)",
        snapshot.projects[0].id,
        snapshot.tasks.len(),
        snapshot.window_tasks.len()
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Member, Priority, Project, TaskStatus, Workspace};
    use chrono::TimeZone;

    async fn seeded() -> Database {
        let db = Database::open_memory().await.unwrap();
        db.writer()
            .call(|conn| {
                repository::upsert_workspace(conn, &Workspace { id: "w1".into(), name: "Acme".into() })?;
                repository::upsert_project(
                    conn,
                    &Project { id: "p1".into(), workspace_id: "w1".into(), name: "Alpha".into() },
                )?;
                repository::upsert_member(
                    conn,
                    &Member {
                        id: "m1".into(),
                        workspace_id: "w1".into(),
                        user_id: "u1".into(),
                        name: "Mia".into(),
                    },
                )?;
                for (id, month) in [("t1", 1), ("t2", 2), ("t3", 3)] {
                    repository::upsert_task(
                        conn,
                        &Task {
                            id: id.into(),
                            workspace_id: "w1".into(),
                            project_id: "p1".into(),
                            assignee_id: None,
                            status: TaskStatus::Todo,
                            priority: Priority::Low,
                            created_at: Utc.with_ymd_and_hms(2025, month, 5, 0, 0, 0).unwrap(),
                            due_date: None,
                        },
                    )?;
                }
                Ok::<(), rusqlite::Error>(())
            })
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_window_is_drawn_from_the_same_history() {
        let db = seeded().await;
        let floor = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        let snapshot = load_workspace(&db, "w1", "u1", floor).await.unwrap();

        let expected: Vec<Task> = snapshot
            .tasks
            .iter()
            .filter(|t| t.created_at >= floor)
            .cloned()
            .collect();
        assert_eq!(snapshot.tasks.len(), 3);
        assert_eq!(snapshot.window_tasks, expected);
        assert_eq!(snapshot.caller.id, "m1");
        assert_eq!(snapshot.projects.len(), 1);
        assert_eq!(snapshot.members.len(), 1);

        // The read transaction is closed; the reader stays usable.
        let again = load_project(&db, "p1", "u1", floor).await.unwrap();
        assert_eq!(again.window_tasks.len(), 2);
        assert!(again.members.is_empty());
    }
}
