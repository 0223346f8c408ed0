use async_trait::async_trait;
use sqlx::{self, PgPool, Postgres, QueryBuilder};

use crate::{
    entities::blog_post::{BlogPost, BlogPostFilter, BlogPostInsert, BlogPostRow, BlogStats},
    errors::AppError,
    repositories::sqlx_repo::SqlxBlogPostRepo,
};

const SLUG_CONSTRAINT: &str = "blog_posts_slug_key";

#[async_trait]
pub trait BlogPostRepository: Send + Sync {
    /// Fails with `AppError::Conflict` when the slug is already taken.
    async fn create_blog_post(&self, post: &BlogPostInsert) -> Result<BlogPost, AppError>;
    async fn slug_exists(&self, slug: &str) -> Result<bool, AppError>;
    async fn get_blog_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, AppError>;
    /// Bumps the view counter and returns the post as stored afterwards.
    async fn increment_view_count(&self, slug: &str, published_only: bool) -> Result<Option<BlogPost>, AppError>;
    /// Writes every mutable column of `post`; the slug is left alone.
    async fn update_blog_post(&self, post: &BlogPost) -> Result<BlogPost, AppError>;
    async fn delete_blog_post_by_slug(&self, slug: &str) -> Result<bool, AppError>;
    async fn list_blog_posts(&self, filter: &BlogPostFilter) -> Result<(Vec<BlogPost>, i64), AppError>;
    async fn blog_stats(&self) -> Result<BlogStats, AppError>;
}

impl SqlxBlogPostRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxBlogPostRepo { pool }
    }
}

/// Escapes LIKE wildcards so user input only ever matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filter: &BlogPostFilter) {
    builder.push(" WHERE TRUE");

    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(category) = &filter.category {
        builder.push(" AND LOWER(category) = LOWER(").push_bind(category.clone()).push(")");
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        builder.push(" AND (title ILIKE ").push_bind(pattern.clone());
        builder.push(" OR content ILIKE ").push_bind(pattern).push(")");
    }
}

/// Newest publication first; unpublished rows (no `published_at`) sort last,
/// ties broken by creation time.
fn list_query(filter: &BlogPostFilter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT * FROM blog_posts");
    push_filters(&mut builder, filter);
    builder.push(" ORDER BY published_at DESC NULLS LAST, created_at DESC");
    builder.push(" LIMIT ").push_bind(filter.limit);
    builder.push(" OFFSET ").push_bind(filter.offset);
    builder
}

#[async_trait]
impl BlogPostRepository for SqlxBlogPostRepo {
    async fn create_blog_post(&self, post: &BlogPostInsert) -> Result<BlogPost, AppError> {
        let row = sqlx::query_as::<_, BlogPostRow>(
            r#"
            INSERT INTO blog_posts (
                title, slug, content, excerpt, featured_image, category, tags,
                status, seo_title, seo_description, published_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.featured_image)
        .bind(&post.category)
        .bind(&post.tags)
        .bind(post.status.as_str())
        .bind(&post.seo_title)
        .bind(&post.seo_description)
        .bind(post.published_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some(SLUG_CONSTRAINT) {
                    return AppError::Conflict("Slug already exists".into());
                }
            }
            AppError::from(e)
        })?;

        row.try_into()
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM blog_posts WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;

        Ok(exists)
    }

    async fn get_blog_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, AppError> {
        sqlx::query_as::<_, BlogPostRow>("SELECT * FROM blog_posts WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?
            .map(BlogPost::try_from)
            .transpose()
    }

    async fn increment_view_count(&self, slug: &str, published_only: bool) -> Result<Option<BlogPost>, AppError> {
        sqlx::query_as::<_, BlogPostRow>(
            r#"
            UPDATE blog_posts
            SET view_count = view_count + 1
            WHERE slug = $1
              AND ($2::boolean IS FALSE OR status = 'published')
            RETURNING *
            "#,
        )
        .bind(slug)
        .bind(published_only)
        .fetch_optional(&self.pool)
        .await?
        .map(BlogPost::try_from)
        .transpose()
    }

    async fn update_blog_post(&self, post: &BlogPost) -> Result<BlogPost, AppError> {
        let row = sqlx::query_as::<_, BlogPostRow>(
            r#"
            UPDATE blog_posts SET
                title = $1,
                content = $2,
                excerpt = $3,
                featured_image = $4,
                category = $5,
                tags = $6,
                status = $7,
                seo_title = $8,
                seo_description = $9,
                published_at = $10,
                updated_at = $11
            WHERE id = $12
            RETURNING *
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.featured_image)
        .bind(&post.category)
        .bind(&post.tags)
        .bind(post.status.as_str())
        .bind(&post.seo_title)
        .bind(&post.seo_description)
        .bind(post.published_at)
        .bind(post.updated_at)
        .bind(post.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Blog post not found".into()))?;

        row.try_into()
    }

    async fn delete_blog_post_by_slug(&self, slug: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_blog_posts(&self, filter: &BlogPostFilter) -> Result<(Vec<BlogPost>, i64), AppError> {
        let mut count_builder = QueryBuilder::new("SELECT COUNT(*) FROM blog_posts");
        push_filters(&mut count_builder, filter);
        let total: i64 = count_builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut builder = list_query(filter);
        let posts = builder
            .build_query_as::<BlogPostRow>()
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(BlogPost::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((posts, total))
    }

    async fn blog_stats(&self) -> Result<BlogStats, AppError> {
        let stats = sqlx::query_as::<_, BlogStats>(
            r#"
            SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'draft') AS draft,
                COUNT(*) FILTER (WHERE status = 'published') AS published,
                COUNT(*) FILTER (WHERE status = 'archived') AS archived,
                COALESCE(SUM(view_count), 0)::BIGINT AS total_views
            FROM blog_posts
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::blog_post::PostStatus;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("loyalty"), "%loyalty%");
        assert_eq!(like_pattern("100%_off"), "%100\\%\\_off%");
    }

    #[test]
    fn filters_bind_every_clause() {
        let filter = BlogPostFilter {
            status: Some(PostStatus::Published),
            category: Some("Guides".into()),
            search: Some("loyalty".into()),
            limit: 10,
            offset: 0,
        };
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM blog_posts");
        push_filters(&mut builder, &filter);

        assert_eq!(
            builder.sql(),
            "SELECT COUNT(*) FROM blog_posts WHERE TRUE AND status = $1 AND LOWER(category) = LOWER($2) AND (title ILIKE $3 OR content ILIKE $4)"
        );
    }

    #[test]
    fn list_orders_by_publication_then_creation() {
        let filter = BlogPostFilter {
            status: None,
            category: None,
            search: Some("loyalty".into()),
            limit: 20,
            offset: 40,
        };

        assert_eq!(
            list_query(&filter).sql(),
            "SELECT * FROM blog_posts WHERE TRUE AND (title ILIKE $1 OR content ILIKE $2) \
             ORDER BY published_at DESC NULLS LAST, created_at DESC LIMIT $3 OFFSET $4"
        );
    }
}
