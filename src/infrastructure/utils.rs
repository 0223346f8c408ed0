pub mod get_client_ip;
pub mod sanitize;
pub mod valid_uuid;
