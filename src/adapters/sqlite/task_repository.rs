//! SQLite implementation of the TaskRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AgentKind, Task, TaskStatus};
use crate::domain::ports::TaskRepository;

#[derive(Clone)]
pub struct SqliteTaskRepository {
    pool: SqlitePool,
}

impl SqliteTaskRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn insert_with<'e, E>(task: &Task, executor: E) -> DomainResult<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
    {
        sqlx::query(
            r#"INSERT INTO tasks (id, user_id, agent, title, description, status,
               priority, estimated_effort, created_at, updated_at, completed_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(task.id.to_string())
        .bind(task.user_id.to_string())
        .bind(task.agent.as_str())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(i64::from(task.priority))
        .bind(&task.estimated_effort)
        .bind(task.created_at.to_rfc3339())
        .bind(task.updated_at.to_rfc3339())
        .bind(task.completed_at.map(|t| t.to_rfc3339()))
        .execute(executor)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskRepository {
    async fn insert(&self, task: &Task) -> DomainResult<()> {
        Self::insert_with(task, &self.pool).await
    }

    async fn insert_batch(&self, tasks: &[Task]) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;
        for task in tasks {
            Self::insert_with(task, &mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<Task>> {
        let row: Option<TaskRow> = sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Task::try_from).transpose()
    }

    async fn list_active(&self, user_id: Uuid) -> DomainResult<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks WHERE user_id = ?
             AND status IN ('pending', 'in_progress')
             ORDER BY created_at ASC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn list_completed(&self, user_id: Uuid) -> DomainResult<Vec<Task>> {
        let rows: Vec<TaskRow> = sqlx::query_as(
            "SELECT * FROM tasks WHERE user_id = ? AND status = 'completed'
             ORDER BY completed_at DESC",
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Task::try_from).collect()
    }

    async fn count_active(&self, user_id: Uuid) -> DomainResult<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM tasks WHERE user_id = ?
             AND status IN ('pending', 'in_progress')",
        )
        .bind(user_id.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn update(&self, task: &Task) -> DomainResult<()> {
        let result = sqlx::query(
            r#"UPDATE tasks SET agent = ?, title = ?, description = ?, status = ?,
               priority = ?, estimated_effort = ?, updated_at = ?, completed_at = ?
               WHERE id = ?"#,
        )
        .bind(task.agent.as_str())
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status.as_str())
        .bind(i64::from(task.priority))
        .bind(&task.estimated_effort)
        .bind(task.updated_at.to_rfc3339())
        .bind(task.completed_at.map(|t| t.to_rfc3339()))
        .bind(task.id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::TaskNotFound(task.id));
        }
        Ok(())
    }

    async fn cancel_many(&self, ids: &[Uuid]) -> DomainResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let now = chrono::Utc::now().to_rfc3339();
        let placeholders = vec!["?"; ids.len()].join(", ");
        let query = format!(
            "UPDATE tasks SET status = 'cancelled', updated_at = ? WHERE id IN ({placeholders})"
        );

        let mut q = sqlx::query(&query).bind(now);
        for id in ids {
            q = q.bind(id.to_string());
        }
        q.execute(&self.pool).await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct TaskRow {
    id: String,
    user_id: String,
    agent: String,
    title: String,
    description: String,
    status: String,
    priority: i64,
    estimated_effort: Option<String>,
    created_at: String,
    updated_at: String,
    completed_at: Option<String>,
}

impl TryFrom<TaskRow> for Task {
    type Error = DomainError;

    fn try_from(row: TaskRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;
        let user_id = Uuid::parse_str(&row.user_id)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;

        let agent = AgentKind::from_str(&row.agent)
            .ok_or_else(|| DomainError::SerializationError(format!("Invalid agent: {}", row.agent)))?;
        let status = TaskStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid status: {}", row.status))
        })?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?
            .with_timezone(&chrono::Utc);
        let updated_at = chrono::DateTime::parse_from_rfc3339(&row.updated_at)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?
            .with_timezone(&chrono::Utc);
        let completed_at = row
            .completed_at
            .map(|s| {
                chrono::DateTime::parse_from_rfc3339(&s).map(|d| d.with_timezone(&chrono::Utc))
            })
            .transpose()
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;

        Ok(Task {
            id,
            user_id,
            agent,
            title: row.title,
            description: row.description,
            status,
            priority: u8::try_from(row.priority.clamp(1, 5))
                .map_err(|e| DomainError::SerializationError(e.to_string()))?,
            estimated_effort: row.estimated_effort,
            created_at,
            updated_at,
            completed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::connection::create_test_pool;
    use crate::adapters::sqlite::migrations::{all_embedded_migrations, Migrator};

    async fn setup() -> SqlitePool {
        let pool = create_test_pool().await.unwrap();
        Migrator::new(pool.clone())
            .run_embedded_migrations(all_embedded_migrations())
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let pool = setup().await;
        let repo = SqliteTaskRepository::new(pool);

        let task = Task::new(
            Uuid::new_v4(),
            AgentKind::MarketingSpecialist,
            "Define brand voice",
            "Write a one-page brand voice guide",
        )
        .with_priority(2)
        .with_estimated_effort("2 hours");

        repo.insert(&task).await.unwrap();
        let fetched = repo.get(task.id).await.unwrap().unwrap();
        assert_eq!(fetched, task);
    }

    #[tokio::test]
    async fn test_active_listing_and_count() {
        let pool = setup().await;
        let repo = SqliteTaskRepository::new(pool);
        let user_id = Uuid::new_v4();

        for i in 0..3 {
            let task = Task::new(
                user_id,
                AgentKind::OperationsSpecialist,
                format!("Task {i}"),
                "desc",
            );
            repo.insert(&task).await.unwrap();
        }

        let mut done = Task::new(user_id, AgentKind::LegalAdvisor, "Done task", "desc");
        done.transition_to(TaskStatus::Completed).unwrap();
        repo.insert(&done).await.unwrap();

        assert_eq!(repo.count_active(user_id).await.unwrap(), 3);
        assert_eq!(repo.list_active(user_id).await.unwrap().len(), 3);
        assert_eq!(repo.list_completed(user_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_many() {
        let pool = setup().await;
        let repo = SqliteTaskRepository::new(pool);
        let user_id = Uuid::new_v4();

        let a = Task::new(user_id, AgentKind::ContentCreator, "A", "d");
        let b = Task::new(user_id, AgentKind::ContentCreator, "B", "d");
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();

        repo.cancel_many(&[a.id]).await.unwrap();
        assert_eq!(repo.count_active(user_id).await.unwrap(), 1);
        let cancelled = repo.get(a.id).await.unwrap().unwrap();
        assert_eq!(cancelled.status, TaskStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_update_missing_task() {
        let pool = setup().await;
        let repo = SqliteTaskRepository::new(pool);

        let task = Task::new(Uuid::new_v4(), AgentKind::FinancialManagement, "T", "d");
        let err = repo.update(&task).await.unwrap_err();
        assert!(matches!(err, DomainError::TaskNotFound(_)));
    }
}
