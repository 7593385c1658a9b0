pub mod analytics;
pub mod date_util;
pub mod error;
pub mod import;
pub mod model;
pub mod storage;

pub use analytics::{AnalyticsSummary, MemberContribution, WorkspaceAnalytics};
pub use error::{Error, Result};
pub use import::{ImportReport, SnapshotDocument};
pub use model::{Member, Priority, Project, Task, TaskStatus, Workspace};
pub use storage::repository::StoreCounts;
pub use storage::Database;

use chrono::{DateTime, Utc};
use storage::repository;

/// Config key holding the default requesting user.
pub const USER_ID_KEY: &str = "user_id";

/// Main entry point: analytics over a local agile-workspace store.
pub struct AgileDW {
    db: Database,
}

impl AgileDW {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Access the database (for direct queries in the CLI).
    pub fn db(&self) -> &Database {
        &self.db
    }

    // ── Analytics ──────────────────────────────────────────────────

    /// Workspace dashboard analytics as of the current wall-clock time.
    pub async fn workspace_analytics(
        &self,
        workspace_id: &str,
        user_id: &str,
    ) -> Result<WorkspaceAnalytics> {
        self.workspace_analytics_at(workspace_id, user_id, Utc::now())
            .await
    }

    pub async fn workspace_analytics_at(
        &self,
        workspace_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<WorkspaceAnalytics> {
        analytics::compute_workspace_analytics(&self.db, workspace_id, user_id, now).await
    }

    /// Project dashboard analytics as of the current wall-clock time.
    pub async fn project_analytics(&self, project_id: &str, user_id: &str) -> Result<AnalyticsSummary> {
        self.project_analytics_at(project_id, user_id, Utc::now())
            .await
    }

    pub async fn project_analytics_at(
        &self,
        project_id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AnalyticsSummary> {
        analytics::compute_project_analytics(&self.db, project_id, user_id, now).await
    }

    // ── Import ─────────────────────────────────────────────────────

    pub async fn import_file(&self, path: impl AsRef<std::path::Path>) -> Result<ImportReport> {
        import::import_file(&self.db, path).await
    }

    pub async fn import_document(&self, doc: SnapshotDocument) -> Result<ImportReport> {
        import::import_document(&self.db, doc).await
    }

    // ── Config & status ────────────────────────────────────────────

    /// The caller to use when none is given explicitly.
    pub async fn default_user_id(&self) -> Result<Option<String>> {
        self.config_get(USER_ID_KEY).await
    }

    pub async fn config_get(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .db
            .reader()
            .call({
                let key = key.to_string();
                move |conn| repository::get_config(conn, &key)
            })
            .await?)
    }

    pub async fn config_set(&self, key: &str, value: &str) -> Result<()> {
        Ok(self
            .db
            .writer()
            .call({
                let key = key.to_string();
                let value = value.to_string();
                move |conn| repository::set_config(conn, &key, &value)
            })
            .await?)
    }

    pub async fn config_list(&self) -> Result<Vec<(String, String)>> {
        Ok(self
            .db
            .reader()
            .call(|conn| repository::list_config(conn))
            .await?)
    }

    pub async fn status(&self) -> Result<StoreCounts> {
        Ok(self
            .db
            .reader()
            .call(|conn| repository::count_rows(conn))
            .await?)
    }
}
