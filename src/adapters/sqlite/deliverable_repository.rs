//! SQLite implementation of the DeliverableRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AgentKind, Deliverable};
use crate::domain::ports::DeliverableRepository;

#[derive(Clone)]
pub struct SqliteDeliverableRepository {
    pool: SqlitePool,
}

impl SqliteDeliverableRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DeliverableRepository for SqliteDeliverableRepository {
    async fn insert(&self, deliverable: &Deliverable) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO deliverables (id, user_id, task_id, agent, title, description,
               content, file_type, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(deliverable.id.to_string())
        .bind(deliverable.user_id.to_string())
        .bind(deliverable.task_id.to_string())
        .bind(deliverable.agent.as_str())
        .bind(&deliverable.title)
        .bind(&deliverable.description)
        .bind(&deliverable.content)
        .bind(&deliverable.file_type)
        .bind(deliverable.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: Uuid) -> DomainResult<Vec<Deliverable>> {
        let rows: Vec<DeliverableRow> = sqlx::query_as(
            "SELECT * FROM deliverables WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Deliverable::try_from).collect()
    }

    async fn list_for_task(&self, task_id: Uuid) -> DomainResult<Vec<Deliverable>> {
        let rows: Vec<DeliverableRow> = sqlx::query_as(
            "SELECT * FROM deliverables WHERE task_id = ? ORDER BY created_at DESC",
        )
        .bind(task_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Deliverable::try_from).collect()
    }
}

#[derive(sqlx::FromRow)]
struct DeliverableRow {
    id: String,
    user_id: String,
    task_id: String,
    agent: String,
    title: String,
    description: String,
    content: String,
    file_type: String,
    created_at: String,
}

impl TryFrom<DeliverableRow> for Deliverable {
    type Error = DomainError;

    fn try_from(row: DeliverableRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;
        let user_id = Uuid::parse_str(&row.user_id)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;
        let task_id = Uuid::parse_str(&row.task_id)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;

        let agent = AgentKind::from_str(&row.agent)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid agent: {}", row.agent)))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?
            .with_timezone(&chrono::Utc);

        Ok(Deliverable {
            id,
            user_id,
            task_id,
            agent,
            title: row.title,
            description: row.description,
            content: row.content,
            file_type: row.file_type,
            created_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::connection::create_test_pool;
    use crate::adapters::sqlite::migrations::{all_embedded_migrations, Migrator};
    use crate::adapters::sqlite::task_repository::SqliteTaskRepository;
    use crate::domain::models::Task;
    use crate::domain::ports::TaskRepository;

    #[tokio::test]
    async fn test_synthesis_appends_rows() {
        let pool = create_test_pool().await.unwrap();
        Migrator::new(pool.clone())
            .run_embedded_migrations(all_embedded_migrations())
            .await
            .unwrap();

        let user_id = Uuid::new_v4();
        let task = Task::new(user_id, AgentKind::ContentCreator, "Plan content", "d");
        SqliteTaskRepository::new(pool.clone())
            .insert(&task)
            .await
            .unwrap();

        let repo = SqliteDeliverableRepository::new(pool);
        for run in 0..2 {
            let d = Deliverable::new(
                user_id,
                task.id,
                AgentKind::ContentCreator,
                "Content Calendar",
                "A month of planned posts",
                format!("# Calendar v{run}"),
            );
            repo.insert(&d).await.unwrap();
        }

        // Both synthesis runs are kept
        assert_eq!(repo.list_for_task(task.id).await.unwrap().len(), 2);
        assert_eq!(repo.list_for_user(user_id).await.unwrap().len(), 2);
    }
}
