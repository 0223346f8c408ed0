use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxBlogPostRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxUploadRepo {
    pub pool: PgPool,
}

#[derive(Clone)]
pub struct SqlxSubmissionRepo {
    pub pool: PgPool,
}

/// Round-trips a trivial query; used by the health endpoint.
pub async fn check_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await.map(|_| ())
}
