pub mod auth;
pub mod db;
pub mod limiter;
pub mod media;
pub mod notify;
pub mod storage;
pub mod utils;
