use std::path::Path;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Member, Project, Task, Workspace};
use crate::storage::repository;
use crate::storage::Database;

/// A JSON document of records to load into the local store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDocument {
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl SnapshotDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject records with blank identifiers before touching the database.
    fn validate(&self) -> Result<()> {
        let blank = |s: &str| s.trim().is_empty();
        if let Some(w) = self.workspaces.iter().find(|w| blank(&w.id)) {
            return Err(Error::Validation(format!("workspace {:?} has no id", w.name)));
        }
        if let Some(p) = self.projects.iter().find(|p| blank(&p.id) || blank(&p.workspace_id)) {
            return Err(Error::Validation(format!(
                "project {:?} needs an id and a workspaceId",
                p.name
            )));
        }
        if let Some(m) = self
            .members
            .iter()
            .find(|m| blank(&m.id) || blank(&m.workspace_id) || blank(&m.user_id))
        {
            return Err(Error::Validation(format!(
                "member {:?} needs an id, workspaceId and userId",
                m.name
            )));
        }
        if let Some(t) = self
            .tasks
            .iter()
            .find(|t| blank(&t.id) || blank(&t.workspace_id) || blank(&t.project_id))
        {
            return Err(Error::Validation(format!(
                "task {:?} needs an id, workspaceId and projectId",
                t.id
            )));
        }
        Ok(())
    }
}

/// Number of records written per entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub workspaces: u64,
    pub projects: u64,
    pub members: u64,
    pub tasks: u64,
}

/// Read and import a snapshot document from disk.
pub async fn import_file(db: &Database, path: impl AsRef<Path>) -> Result<ImportReport> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .map_err(|e| Error::Import(format!("{}: {e}", path.display())))?;
    import_document(db, SnapshotDocument::from_json(&json)?).await
}

/// Upsert every record of `doc` in one transaction. Nothing is written if any
/// record is rejected.
pub async fn import_document(db: &Database, doc: SnapshotDocument) -> Result<ImportReport> {
    doc.validate()?;

    let outcome = db
        .writer()
        .call(move |conn| {
            let tx = conn.transaction()?;
            let outcome = write_document(&tx, &doc)?;
            if outcome.is_ok() {
                tx.commit()?;
            }
            // An uncommitted transaction rolls back on drop.
            Ok::<_, rusqlite::Error>(outcome)
        })
        .await?;

    let report = outcome.map_err(Error::Validation)?;
    log::info!(
        "Imported {} workspaces, {} projects, {} members, {} tasks",
        report.workspaces,
        report.projects,
        report.members,
        report.tasks
    );
    Ok(report)
}

/// Inner `Err` is a validation message; outer `Err` is a storage failure.
fn write_document(
    conn: &Connection,
    doc: &SnapshotDocument,
) -> std::result::Result<std::result::Result<ImportReport, String>, rusqlite::Error> {
    let mut report = ImportReport::default();

    for workspace in &doc.workspaces {
        repository::upsert_workspace(conn, workspace)?;
        report.workspaces += 1;
    }
    for project in &doc.projects {
        if repository::find_workspace(conn, &project.workspace_id)?.is_none() {
            return Ok(Err(format!(
                "project {} references unknown workspace {}",
                project.id, project.workspace_id
            )));
        }
        repository::upsert_project(conn, project)?;
        report.projects += 1;
    }
    for member in &doc.members {
        if repository::find_workspace(conn, &member.workspace_id)?.is_none() {
            return Ok(Err(format!(
                "member {} references unknown workspace {}",
                member.id, member.workspace_id
            )));
        }
        repository::upsert_member(conn, member)?;
        report.members += 1;
    }
    for task in &doc.tasks {
        match repository::find_project(conn, &task.project_id)? {
            Some(project) if project.workspace_id == task.workspace_id => {}
            Some(project) => {
                return Ok(Err(format!(
                    "task {} is in workspace {} but its project {} belongs to {}",
                    task.id, task.workspace_id, project.id, project.workspace_id
                )))
            }
            None => {
                return Ok(Err(format!(
                    "task {} references unknown project {}",
                    task.id, task.project_id
                )))
            }
        }
        if let Some(assignee_id) = task.assignee_id.as_deref() {
            match repository::find_member(conn, assignee_id)? {
                Some(member) if member.workspace_id == task.workspace_id => {}
                Some(member) => {
                    return Ok(Err(format!(
                        "task {} is in workspace {} but its assignee {} belongs to {}",
                        task.id, task.workspace_id, member.id, member.workspace_id
                    )))
                }
                None => {
                    return Ok(Err(format!(
                        "task {} references unknown assignee {}",
                        task.id, assignee_id
                    )))
                }
            }
        }
        repository::upsert_task(conn, task)?;
        report.tasks += 1;
    }

    Ok(Ok(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::repository::TaskScope;
    use std::io::Write;

    const DOC: &str = r#"{
        "workspaces": [{ "id": "w1", "name": "Acme" }],
        "projects": [{ "id": "p1", "workspaceId": "w1", "name": "Alpha" }],
        "members": [{ "id": "m1", "workspaceId": "w1", "userId": "u1", "name": "Mia" }],
        "tasks": [
            {
                "id": "t1", "workspaceId": "w1", "projectId": "p1", "assigneeId": "m1",
                "status": "TODO", "priority": "LOW", "createdAt": "2025-01-02T03:04:05Z"
            },
            {
                "id": "t2", "workspaceId": "w1", "projectId": "p1",
                "status": "COMPLETED", "priority": "HIGH",
                "createdAt": "2025-01-03T00:00:00Z", "dueDate": "2025-01-10T00:00:00Z"
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_import_file() {
        let db = Database::open_memory().await.unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DOC.as_bytes()).unwrap();

        let report = import_file(&db, file.path()).await.unwrap();
        assert_eq!(
            report,
            ImportReport { workspaces: 1, projects: 1, members: 1, tasks: 2 }
        );

        let tasks = db
            .reader()
            .call(|conn| repository::list_tasks(conn, &TaskScope::Workspace("w1".into()), None))
            .await
            .unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks[1].due_date.is_some());
        assert_eq!(tasks[0].assignee_id.as_deref(), Some("m1"));
    }

    #[tokio::test]
    async fn test_import_is_idempotent() {
        let db = Database::open_memory().await.unwrap();
        let doc = SnapshotDocument::from_json(DOC).unwrap();
        import_document(&db, doc.clone()).await.unwrap();
        import_document(&db, doc).await.unwrap();

        let counts = db.reader().call(|conn| repository::count_rows(conn)).await.unwrap();
        assert_eq!(counts.tasks, 2);
    }

    #[tokio::test]
    async fn test_cross_workspace_task_rolls_back() {
        let db = Database::open_memory().await.unwrap();
        let mut doc = SnapshotDocument::from_json(DOC).unwrap();
        doc.workspaces.push(Workspace { id: "w2".into(), name: "Other".into() });
        doc.tasks[1].workspace_id = "w2".into();

        let err = import_document(&db, doc).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err}");

        let counts = db.reader().call(|conn| repository::count_rows(conn)).await.unwrap();
        assert_eq!(counts.workspaces, 0);
        assert_eq!(counts.tasks, 0);
    }

    #[tokio::test]
    async fn test_unknown_assignee_is_validation_error() {
        let db = Database::open_memory().await.unwrap();
        let mut doc = SnapshotDocument::from_json(DOC).unwrap();
        doc.tasks[0].assignee_id = Some("m404".into());

        let err = import_document(&db, doc).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err}");
        let counts = db.reader().call(|conn| repository::count_rows(conn)).await.unwrap();
        assert_eq!(counts.tasks, 0);
    }

    #[tokio::test]
    async fn test_assignee_from_other_workspace_rejected() {
        let db = Database::open_memory().await.unwrap();
        let mut doc = SnapshotDocument::from_json(DOC).unwrap();
        doc.workspaces.push(Workspace { id: "w2".into(), name: "Other".into() });
        doc.members.push(Member {
            id: "m2".into(),
            workspace_id: "w2".into(),
            user_id: "u2".into(),
            name: "Noa".into(),
        });
        doc.tasks[0].assignee_id = Some("m2".into());

        let err = import_document(&db, doc).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err}");
        let counts = db.reader().call(|conn| repository::count_rows(conn)).await.unwrap();
        assert_eq!(counts.members, 0);
    }

    #[tokio::test]
    async fn test_blank_ids_rejected() {
        let db = Database::open_memory().await.unwrap();
        let mut doc = SnapshotDocument::from_json(DOC).unwrap();
        doc.members[0].user_id = " ".into();
        let err = import_document(&db, doc).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)), "{err}");
    }

    #[test]
    fn test_malformed_json_is_import_error() {
        let err = SnapshotDocument::from_json(r#"{"tasks": [{"id": 1}]}"#).unwrap_err();
        assert!(matches!(err, Error::Import(_)), "{err}");
    }
}
