use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::date_util::{format_timestamp, parse_timestamp};
use crate::model::{Member, Priority, Project, Task, TaskStatus, Workspace};

/// Which slice of the task table a `list_tasks` call reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskScope {
    Workspace(String),
    Project(String),
}

// ── Workspaces ─────────────────────────────────────────────────────

pub fn upsert_workspace(conn: &Connection, workspace: &Workspace) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO workspaces (workspace_id, name, cached_at)
         VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(workspace_id) DO UPDATE SET
            name=excluded.name, cached_at=excluded.cached_at",
        params![workspace.id, workspace.name],
    )?;
    Ok(())
}

pub fn find_workspace(conn: &Connection, workspace_id: &str) -> Result<Option<Workspace>, rusqlite::Error> {
    conn.query_row(
        "SELECT workspace_id, name FROM workspaces WHERE workspace_id = ?1",
        params![workspace_id],
        |row| {
            Ok(Workspace {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )
    .optional()
}

// ── Projects ───────────────────────────────────────────────────────

pub fn upsert_project(conn: &Connection, project: &Project) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO projects (project_id, workspace_id, name, cached_at)
         VALUES (?1, ?2, ?3, datetime('now'))
         ON CONFLICT(project_id) DO UPDATE SET
            workspace_id=excluded.workspace_id, name=excluded.name,
            cached_at=excluded.cached_at",
        params![project.id, project.workspace_id, project.name],
    )?;
    Ok(())
}

pub fn find_project(conn: &Connection, project_id: &str) -> Result<Option<Project>, rusqlite::Error> {
    conn.query_row(
        "SELECT project_id, workspace_id, name FROM projects WHERE project_id = ?1",
        params![project_id],
        project_from_row,
    )
    .optional()
}

/// All projects of a workspace, ordered by name then id.
pub fn list_projects(conn: &Connection, workspace_id: &str) -> Result<Vec<Project>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT project_id, workspace_id, name FROM projects
         WHERE workspace_id = ?1 ORDER BY name, project_id",
    )?;
    let rows = stmt.query_map(params![workspace_id], project_from_row)?;
    rows.collect()
}

fn project_from_row(row: &Row<'_>) -> Result<Project, rusqlite::Error> {
    Ok(Project {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        name: row.get(2)?,
    })
}

// ── Members ────────────────────────────────────────────────────────

pub fn upsert_member(conn: &Connection, member: &Member) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO members (member_id, workspace_id, user_id, name, cached_at)
         VALUES (?1, ?2, ?3, ?4, datetime('now'))
         ON CONFLICT(member_id) DO UPDATE SET
            workspace_id=excluded.workspace_id, user_id=excluded.user_id,
            name=excluded.name, cached_at=excluded.cached_at",
        params![member.id, member.workspace_id, member.user_id, member.name],
    )?;
    Ok(())
}

pub fn find_member(conn: &Connection, member_id: &str) -> Result<Option<Member>, rusqlite::Error> {
    conn.query_row(
        "SELECT member_id, workspace_id, user_id, name FROM members WHERE member_id = ?1",
        params![member_id],
        member_from_row,
    )
    .optional()
}

/// All members of a workspace, ordered by display name then id.
pub fn list_members(conn: &Connection, workspace_id: &str) -> Result<Vec<Member>, rusqlite::Error> {
    let mut stmt = conn.prepare(
        "SELECT member_id, workspace_id, user_id, name FROM members
         WHERE workspace_id = ?1 ORDER BY name, member_id",
    )?;
    let rows = stmt.query_map(params![workspace_id], member_from_row)?;
    rows.collect()
}

/// Resolve a global user id to that user's membership in one workspace.
pub fn find_member_by_user(
    conn: &Connection,
    workspace_id: &str,
    user_id: &str,
) -> Result<Option<Member>, rusqlite::Error> {
    conn.query_row(
        "SELECT member_id, workspace_id, user_id, name FROM members
         WHERE workspace_id = ?1 AND user_id = ?2",
        params![workspace_id, user_id],
        member_from_row,
    )
    .optional()
}

fn member_from_row(row: &Row<'_>) -> Result<Member, rusqlite::Error> {
    Ok(Member {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        user_id: row.get(2)?,
        name: row.get(3)?,
    })
}

// ── Tasks ──────────────────────────────────────────────────────────

pub fn upsert_task(conn: &Connection, task: &Task) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO tasks (
            task_id, workspace_id, project_id, assignee_id, status, priority,
            created_at, due_date, cached_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))
        ON CONFLICT(task_id) DO UPDATE SET
            workspace_id=excluded.workspace_id, project_id=excluded.project_id,
            assignee_id=excluded.assignee_id, status=excluded.status,
            priority=excluded.priority, created_at=excluded.created_at,
            due_date=excluded.due_date, cached_at=excluded.cached_at",
        params![
            task.id,
            task.workspace_id,
            task.project_id,
            task.assignee_id,
            task.status.as_str(),
            task.priority.as_str(),
            format_timestamp(task.created_at),
            task.due_date.map(format_timestamp),
        ],
    )?;
    Ok(())
}

/// Tasks in `scope`, optionally restricted to `created_at >= created_after`.
/// Ordered by creation time then id.
pub fn list_tasks(
    conn: &Connection,
    scope: &TaskScope,
    created_after: Option<DateTime<Utc>>,
) -> Result<Vec<Task>, rusqlite::Error> {
    let (scope_column, scope_id) = match scope {
        TaskScope::Workspace(id) => ("workspace_id", id.as_str()),
        TaskScope::Project(id) => ("project_id", id.as_str()),
    };
    let floor = created_after.map(format_timestamp);
    let sql = format!(
        "SELECT task_id, workspace_id, project_id, assignee_id, status, priority,
                created_at, due_date
         FROM tasks
         WHERE {scope_column} = ?1 AND (?2 IS NULL OR created_at >= ?2)
         ORDER BY created_at, task_id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![scope_id, floor], task_from_row)?;
    rows.collect()
}

fn task_from_row(row: &Row<'_>) -> Result<Task, rusqlite::Error> {
    let status: String = row.get(4)?;
    let priority: String = row.get(5)?;
    let created_at: String = row.get(6)?;
    let due_date: Option<String> = row.get(7)?;

    Ok(Task {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        project_id: row.get(2)?,
        assignee_id: row.get(3)?,
        status: TaskStatus::parse(&status)
            .ok_or_else(|| conversion_error(4, format!("unknown task status {status:?}")))?,
        priority: Priority::parse(&priority)
            .ok_or_else(|| conversion_error(5, format!("unknown priority {priority:?}")))?,
        created_at: parse_timestamp(&created_at)
            .ok_or_else(|| conversion_error(6, format!("bad created_at {created_at:?}")))?,
        due_date: match due_date {
            Some(s) => Some(
                parse_timestamp(&s)
                    .ok_or_else(|| conversion_error(7, format!("bad due_date {s:?}")))?,
            ),
            None => None,
        },
    })
}

fn conversion_error(column: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, message.into())
}

// ── Summary ────────────────────────────────────────────────────────

/// Row counts per entity table, for the `status` command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreCounts {
    pub workspaces: u64,
    pub projects: u64,
    pub members: u64,
    pub tasks: u64,
}

pub fn count_rows(conn: &Connection) -> Result<StoreCounts, rusqlite::Error> {
    let count = |table: &str| -> Result<u64, rusqlite::Error> {
        let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        Ok(n as u64)
    };
    Ok(StoreCounts {
        workspaces: count("workspaces")?,
        projects: count("projects")?,
        members: count("members")?,
        tasks: count("tasks")?,
    })
}

// ── Config ─────────────────────────────────────────────────────────

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>, rusqlite::Error> {
    conn.query_row(
        "SELECT value FROM app_config WHERE key = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR REPLACE INTO app_config (key, value, updated_at)
         VALUES (?1, ?2, datetime('now'))",
        params![key, value],
    )?;
    Ok(())
}

pub fn list_config(conn: &Connection) -> Result<Vec<(String, String)>, rusqlite::Error> {
    let mut stmt = conn.prepare("SELECT key, value FROM app_config ORDER BY key")?;
    let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
    rows.collect()
}
