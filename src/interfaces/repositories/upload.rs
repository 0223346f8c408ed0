use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    entities::upload::{FileRecord, NewFileRecord, UploadFilter, UploadStats},
    errors::AppError,
    repositories::sqlx_repo::SqlxUploadRepo,
};

#[async_trait]
pub trait UploadRepository: Send + Sync {
    async fn insert_file(&self, file: &NewFileRecord) -> Result<FileRecord, AppError>;
    async fn get_file(&self, id: &Uuid) -> Result<Option<FileRecord>, AppError>;
    async fn delete_file(&self, id: &Uuid) -> Result<bool, AppError>;
    async fn list_files(&self, filter: &UploadFilter) -> Result<(Vec<FileRecord>, i64), AppError>;
    async fn upload_stats(&self) -> Result<UploadStats, AppError>;
}

impl SqlxUploadRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxUploadRepo { pool }
    }
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &UploadFilter) {
    if let Some(upload_type) = filter.upload_type {
        builder.push(" WHERE upload_type = ").push_bind(upload_type.as_str());
    }
}

#[async_trait]
impl UploadRepository for SqlxUploadRepo {
    async fn insert_file(&self, file: &NewFileRecord) -> Result<FileRecord, AppError> {
        let record = sqlx::query_as::<_, FileRecord>(
            r#"
            INSERT INTO uploaded_files (
                storage_key, file_name, original_name, mime_type, size, url,
                upload_type, related_id, width, height
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(&file.storage_key)
        .bind(&file.file_name)
        .bind(&file.original_name)
        .bind(&file.mime_type)
        .bind(file.size)
        .bind(&file.url)
        .bind(file.upload_type.as_str())
        .bind(&file.related_id)
        .bind(file.width)
        .bind(file.height)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn get_file(&self, id: &Uuid) -> Result<Option<FileRecord>, AppError> {
        let record = sqlx::query_as::<_, FileRecord>("SELECT * FROM uploaded_files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn delete_file(&self, id: &Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM uploaded_files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_files(&self, filter: &UploadFilter) -> Result<(Vec<FileRecord>, i64), AppError> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM uploaded_files");
        push_filters(&mut count_builder, filter);
        let total = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = QueryBuilder::new("SELECT * FROM uploaded_files");
        push_filters(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC");
        builder.push(" LIMIT ").push_bind(filter.limit);
        builder.push(" OFFSET ").push_bind(filter.offset);

        let files = builder
            .build_query_as::<FileRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok((files, total))
    }

    async fn upload_stats(&self) -> Result<UploadStats, AppError> {
        let stats = sqlx::query_as::<_, UploadStats>(
            "SELECT COUNT(*) AS count, COALESCE(SUM(size), 0)::BIGINT AS total_bytes FROM uploaded_files",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}
