pub mod auth;
pub mod blog_posts;
pub mod calculator;
pub mod home;
pub mod json_error;
pub mod submissions;
pub mod system;
pub mod uploads;
