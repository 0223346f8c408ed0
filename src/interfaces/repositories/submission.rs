use async_trait::async_trait;
use sqlx::{types::Json, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    entities::submission::{
        NewSubmission, Submission, SubmissionFilter, SubmissionRow, SubmissionStats, SubmissionStatus,
    },
    errors::AppError,
    repositories::sqlx_repo::SqlxSubmissionRepo,
};

#[async_trait]
pub trait SubmissionRepository: Send + Sync {
    async fn create_submission(&self, submission: &NewSubmission) -> Result<Submission, AppError>;
    async fn get_submission(&self, id: &Uuid) -> Result<Option<Submission>, AppError>;
    async fn list_submissions(&self, filter: &SubmissionFilter) -> Result<(Vec<Submission>, i64), AppError>;
    async fn update_status(&self, id: &Uuid, status: SubmissionStatus) -> Result<Option<Submission>, AppError>;
    async fn delete_submission(&self, id: &Uuid) -> Result<bool, AppError>;
    async fn submission_stats(&self) -> Result<SubmissionStats, AppError>;
}

impl SqlxSubmissionRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxSubmissionRepo { pool }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &SubmissionFilter) {
    builder.push(" WHERE TRUE");

    if let Some(kind) = filter.kind {
        builder.push(" AND kind = ").push_bind(kind.as_str());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
}

#[async_trait]
impl SubmissionRepository for SqlxSubmissionRepo {
    async fn create_submission(&self, submission: &NewSubmission) -> Result<Submission, AppError> {
        let row = sqlx::query_as::<_, SubmissionRow>(
            r#"
            INSERT INTO submissions (
                kind, name, email, phone, company, subject, message, details, ip_address
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(submission.kind.as_str())
        .bind(&submission.name)
        .bind(&submission.email)
        .bind(&submission.phone)
        .bind(&submission.company)
        .bind(&submission.subject)
        .bind(&submission.message)
        .bind(Json(&submission.details))
        .bind(&submission.ip_address)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn get_submission(&self, id: &Uuid) -> Result<Option<Submission>, AppError> {
        sqlx::query_as::<_, SubmissionRow>("SELECT * FROM submissions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Submission::try_from)
            .transpose()
    }

    async fn list_submissions(&self, filter: &SubmissionFilter) -> Result<(Vec<Submission>, i64), AppError> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM submissions");
        push_filters(&mut count_builder, filter);
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::new("SELECT * FROM submissions");
        push_filters(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC");
        builder.push(" LIMIT ").push_bind(filter.limit);
        builder.push(" OFFSET ").push_bind(filter.offset);

        let submissions = builder
            .build_query_as::<SubmissionRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Submission::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((submissions, total))
    }

    async fn update_status(&self, id: &Uuid, status: SubmissionStatus) -> Result<Option<Submission>, AppError> {
        sqlx::query_as::<_, SubmissionRow>(
            r#"
            UPDATE submissions
            SET status = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING *
            "#,
        )
        .bind(status.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(Submission::try_from)
        .transpose()
    }

    async fn delete_submission(&self, id: &Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM submissions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn submission_stats(&self) -> Result<SubmissionStats, AppError> {
        let stats = sqlx::query_as::<_, SubmissionStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'new') AS new,
                COUNT(*) FILTER (WHERE kind = 'contact') AS contact,
                COUNT(*) FILTER (WHERE kind = 'onboarding') AS onboarding
            FROM submissions
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
