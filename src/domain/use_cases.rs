pub mod auth;
pub mod blog;
pub mod extractors;
pub mod submission;
pub mod upload;
