use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;

pub use domain::{calculator, entities, slug, use_cases};
pub use interfaces::{handlers, middlewares, repositories, routes};
pub use infrastructure::{auth, db, limiter, media, notify, storage, utils};

use auth::jwt::JwtService;
use limiter::RateLimiterStore;
use notify::Notifier;
use repositories::sqlx_repo::{SqlxBlogPostRepo, SqlxSubmissionRepo, SqlxUploadRepo};
use storage::Storage;
use use_cases::{
    auth::AuthHandler,
    blog::BlogPostHandler,
    submission::SubmissionHandler,
    upload::{UploadHandler, UploadPipeline},
};

pub type AppAuthHandler = AuthHandler<JwtService>;
pub type AppBlogHandler = BlogPostHandler<SqlxBlogPostRepo>;
pub type AppUploadHandler = UploadHandler<SqlxUploadRepo>;
pub type AppSubmissionHandler = SubmissionHandler<SqlxSubmissionRepo>;

pub struct AppState {
    pub config: settings::AppConfig,
    pub auth_handler: AppAuthHandler,
    pub blog_handler: AppBlogHandler,
    pub upload_handler: AppUploadHandler,
    pub submission_handler: AppSubmissionHandler,
    pub submission_limiter: RateLimiterStore,
    pub pool: sqlx::PgPool,
}

impl AppState {
    pub fn new(
        config: settings::AppConfig,
        pool: sqlx::PgPool,
        storage: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let auth_handler = AuthHandler::new(JwtService::new(&config), &config);
        let blog_handler = BlogPostHandler::new(SqlxBlogPostRepo::new(pool.clone()));

        let pipeline = UploadPipeline::new(storage, config.transform_options());
        let upload_handler = UploadHandler::new(pipeline, SqlxUploadRepo::new(pool.clone()));

        let submission_handler = SubmissionHandler::new(SqlxSubmissionRepo::new(pool.clone()), notifier);
        let submission_limiter = RateLimiterStore::per_hour(config.contact_limit_per_hour);

        AppState {
            config,
            auth_handler,
            blog_handler,
            upload_handler,
            submission_handler,
            submission_limiter,
            pool,
        }
    }
}
