use chrono::Utc;

use crate::{
    entities::{
        blog_post::{BlogPost, BlogPostFilter, BlogPostListResponse, BlogStats, NewBlogPostRequest, UpdateBlogPostRequest},
        Pagination,
    },
    errors::AppError,
    repositories::blog_post::BlogPostRepository,
    slug::{ensure_unique, slugify},
};

/// Inserts attempted before a slug conflict is reported to the caller.
const MAX_INSERT_ATTEMPTS: u32 = 3;

pub struct BlogPostHandler<R>
where
    R: BlogPostRepository,
{
    pub blog_post_repo: R,
}

impl<R> BlogPostHandler<R>
where
    R: BlogPostRepository,
{
    pub fn new(blog_post_repo: R) -> Self {
        BlogPostHandler { blog_post_repo }
    }

    /// Creates a post under a fresh slug derived from its title. The unique
    /// index is the final arbiter: losing a race to a concurrent insert
    /// re-probes and retries.
    pub async fn create_blog_post(&self, request: NewBlogPostRequest) -> Result<BlogPost, AppError> {
        let mut insert = request.into_insert(Utc::now())?;
        let base = slugify(&insert.title);
        let repo = &self.blog_post_repo;

        let mut attempt = 0;
        loop {
            attempt += 1;
            insert.slug = ensure_unique(&base, |candidate| async move { repo.slug_exists(&candidate).await }).await?;

            match repo.create_blog_post(&insert).await {
                Ok(post) => {
                    tracing::info!(slug = %post.slug, status = %post.status, "Blog post created");
                    return Ok(post);
                }
                Err(AppError::Conflict(_)) if attempt < MAX_INSERT_ATTEMPTS => {
                    tracing::warn!(slug = %insert.slug, attempt, "Slug taken by a concurrent insert, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Public read: published posts only. Counts the view.
    pub async fn get_published_post(&self, slug: &str) -> Result<BlogPost, AppError> {
        self.blog_post_repo
            .increment_view_count(slug, true)
            .await?
            .ok_or_else(|| AppError::NotFound("Blog post not found".into()))
    }

    /// Admin read: any status. Counts the view.
    pub async fn get_post(&self, slug: &str) -> Result<BlogPost, AppError> {
        self.blog_post_repo
            .increment_view_count(slug, false)
            .await?
            .ok_or_else(|| AppError::NotFound("Blog post not found".into()))
    }

    pub async fn update_blog_post(&self, slug: &str, update: UpdateBlogPostRequest) -> Result<BlogPost, AppError> {
        let mut post = self
            .blog_post_repo
            .get_blog_post_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound("Blog post not found".into()))?;

        post.apply_update(update, Utc::now())?;
        let updated = self.blog_post_repo.update_blog_post(&post).await?;

        tracing::info!(slug = %updated.slug, status = %updated.status, "Blog post updated");
        Ok(updated)
    }

    pub async fn delete_blog_post(&self, slug: &str) -> Result<(), AppError> {
        if !self.blog_post_repo.delete_blog_post_by_slug(slug).await? {
            return Err(AppError::NotFound("Blog post not found".into()));
        }

        tracing::info!(slug = %slug, "Blog post deleted");
        Ok(())
    }

    pub async fn list_blog_posts(&self, filter: &BlogPostFilter) -> Result<BlogPostListResponse, AppError> {
        let (posts, total) = self.blog_post_repo.list_blog_posts(filter).await?;

        Ok(BlogPostListResponse {
            posts,
            pagination: Pagination::new(total, filter.limit, filter.offset),
        })
    }

    pub async fn stats(&self) -> Result<BlogStats, AppError> {
        self.blog_post_repo.blog_stats().await
    }
}
