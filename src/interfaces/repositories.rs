pub mod blog_post;
pub mod sqlx_repo;
pub mod submission;
pub mod token;
pub mod upload;
