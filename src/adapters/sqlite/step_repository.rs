//! SQLite implementation of the StepRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{StepInputKind, StepStatus, TaskStep};
use crate::domain::ports::StepRepository;

#[derive(Clone)]
pub struct SqliteStepRepository {
    pool: SqlitePool,
}

impl SqliteStepRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StepRepository for SqliteStepRepository {
    async fn insert_batch(&self, steps: &[TaskStep]) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;
        for step in steps {
            let criteria = step
                .validation_criteria
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            let input = step
                .user_input
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;

            sqlx::query(
                r#"INSERT INTO task_steps (id, task_id, step_number, title, description,
                   input_kind, validation_criteria, guidance, status, user_input,
                   created_at, updated_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )
            .bind(step.id.to_string())
            .bind(step.task_id.to_string())
            .bind(i64::from(step.step_number))
            .bind(&step.title)
            .bind(&step.description)
            .bind(step.input_kind.as_str())
            .bind(&criteria)
            .bind(&step.guidance)
            .bind(step.status.as_str())
            .bind(&input)
            .bind(step.created_at.to_rfc3339())
            .bind(step.updated_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn list_for_task(&self, task_id: Uuid) -> DomainResult<Vec<TaskStep>> {
        let rows: Vec<StepRow> = sqlx::query_as(
            "SELECT * FROM task_steps WHERE task_id = ? ORDER BY step_number ASC",
        )
        .bind(task_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TaskStep::try_from).collect()
    }

    async fn get(&self, id: Uuid) -> DomainResult<Option<TaskStep>> {
        let row: Option<StepRow> = sqlx::query_as("SELECT * FROM task_steps WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(TaskStep::try_from).transpose()
    }

    async fn mark_completed(
        &self,
        id: Uuid,
        user_input: &serde_json::Value,
    ) -> DomainResult<()> {
        let input = serde_json::to_string(user_input)?;
        let result = sqlx::query(
            "UPDATE task_steps SET status = 'completed', user_input = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&input)
        .bind(chrono::Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DomainError::StepNotFound(id));
        }
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct StepRow {
    id: String,
    task_id: String,
    step_number: i64,
    title: String,
    description: String,
    input_kind: String,
    validation_criteria: Option<String>,
    guidance: Option<String>,
    status: String,
    user_input: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<StepRow> for TaskStep {
    type Error = DomainError;

    fn try_from(row: StepRow) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;
        let task_id = Uuid::parse_str(&row.task_id)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;

        let input_kind = StepInputKind::from_str(&row.input_kind).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid input kind: {}", row.input_kind))
        })?;
        let status = StepStatus::from_str(&row.status).ok_or_else(|| {
            DomainError::SerializationError(format!("Invalid step status: {}", row.status))
        })?;

        let validation_criteria = row
            .validation_criteria
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;
        let user_input = row
            .user_input
            .map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| DomainError::SerializationError(e.to_string()))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&row.created_at)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?
            .with_timezone(&chrono::Utc);
        let updated_at = chrono::DateTime::parse_from_rfc3339(&row.updated_at)
            .map_err(|e| DomainError::SerializationError(e.to_string()))?
            .with_timezone(&chrono::Utc);

        Ok(TaskStep {
            id,
            task_id,
            step_number: u32::try_from(row.step_number)
                .map_err(|e| DomainError::SerializationError(e.to_string()))?,
            title: row.title,
            description: row.description,
            input_kind,
            validation_criteria,
            guidance: row.guidance,
            status,
            user_input,
            created_at,
            updated_at,
        })
    }
}
