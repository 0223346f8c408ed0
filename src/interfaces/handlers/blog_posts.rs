use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::blog_post::{
        BlogListQuery, BlogPostDeletedResponse, BlogPostDetailResponse, BlogPostResponse, NewBlogPostRequest,
        UpdateBlogPostRequest,
    },
    errors::AppError,
    use_cases::extractors::AdminClaims,
    AppState,
};

// ───── Public ───────────────────────────────────────────────────────

#[instrument(skip(state, query))]
pub async fn list_published_posts(
    state: web::Data<AppState>,
    query: web::Query<BlogListQuery>,
) -> Result<impl Responder, AppError> {
    let filter = query.into_inner().into_public_filter();
    let response = state.blog_handler.list_blog_posts(&filter).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[instrument(skip(state))]
pub async fn get_published_post(
    slug: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let post = state.blog_handler.get_published_post(&slug).await?;
    Ok(HttpResponse::Ok().json(BlogPostDetailResponse { post }))
}

// ───── Admin ────────────────────────────────────────────────────────

#[instrument(skip(_claims, state, data))]
pub async fn create_blog_post(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    data: web::Json<NewBlogPostRequest>,
) -> Result<impl Responder, AppError> {
    let post = state.blog_handler.create_blog_post(data.into_inner()).await?;
    Ok(HttpResponse::Created().json(BlogPostResponse { success: true, post }))
}

#[instrument(skip(_claims, state, query))]
pub async fn admin_list_blog_posts(
    _claims: AdminClaims,
    state: web::Data<AppState>,
    query: web::Query<BlogListQuery>,
) -> Result<impl Responder, AppError> {
    let filter = query.into_inner().into_admin_filter()?;
    let response = state.blog_handler.list_blog_posts(&filter).await?;
    Ok(HttpResponse::Ok().json(response))
}

#[instrument(skip(_claims, state))]
pub async fn admin_get_blog_post(
    _claims: AdminClaims,
    slug: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let post = state.blog_handler.get_post(&slug).await?;
    Ok(HttpResponse::Ok().json(BlogPostDetailResponse { post }))
}

#[instrument(skip(_claims, state, data))]
pub async fn update_blog_post(
    _claims: AdminClaims,
    slug: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateBlogPostRequest>,
) -> Result<impl Responder, AppError> {
    let post = state.blog_handler.update_blog_post(&slug, data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(BlogPostResponse { success: true, post }))
}

#[instrument(skip(_claims, state))]
pub async fn delete_blog_post(
    _claims: AdminClaims,
    slug: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.blog_handler.delete_blog_post(&slug).await?;
    Ok(HttpResponse::Ok().json(BlogPostDeletedResponse {
        success: true,
        message: "Blog post deleted".to_string(),
    }))
}

#[instrument(skip(_claims, state))]
pub async fn blog_stats(_claims: AdminClaims, state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let stats = state.blog_handler.stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}
