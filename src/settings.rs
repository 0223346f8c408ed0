use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::{env, fmt, str::FromStr};
use zeroize::Zeroizing;

use crate::media::TransformOptions;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

/// Where uploaded assets are persisted. Chosen once at start-up.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    Local,
    S3,
}

/// How admin requests are authenticated.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    Jwt,
    Mock,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_true")]
    pub run_migrations: bool,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub trust_x_forwarded_for: bool,

    // ───── Admin auth ─────
    #[serde(default = "default_auth_mode")]
    pub auth_mode: AuthMode,

    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_minutes: i64,

    #[serde(default)]
    pub admin_email: String,

    #[serde(default)]
    pub admin_password_hash: String,

    // ───── Upload storage ─────
    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackendKind,

    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    #[serde(default)]
    pub s3_bucket: Option<String>,

    #[serde(default)]
    pub s3_region: Option<String>,

    #[serde(default)]
    pub s3_endpoint: Option<String>,

    #[serde(default)]
    pub s3_public_url: Option<String>,

    // ───── Image transform ─────
    #[serde(default = "default_image_max_width")]
    pub image_max_width: u32,

    #[serde(default = "default_image_max_height")]
    pub image_max_height: u32,

    #[serde(default = "default_image_quality")]
    pub image_quality: u8,

    #[serde(default = "default_png_compression_level")]
    pub png_compression_level: u8,

    // ───── Notifications ─────
    #[serde(default)]
    pub smtp_host: Option<String>,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default)]
    pub smtp_username: Option<String>,

    #[serde(default)]
    pub smtp_password: Option<String>,

    #[serde(default)]
    pub smtp_from: Option<String>,

    #[serde(default)]
    pub notification_email: Option<String>,

    #[serde(default = "default_contact_limit")]
    pub contact_limit_per_hour: u64,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Partners-Points-API".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_true() -> bool {
    true
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_auth_mode() -> AuthMode {
    AuthMode::Jwt
}
fn default_jwt_expiration() -> i64 {
    60
}
fn default_storage_backend() -> StorageBackendKind {
    StorageBackendKind::Local
}
fn default_upload_dir() -> String {
    "uploads".to_string()
}
fn default_public_base_url() -> String {
    "/uploads".to_string()
}
fn default_image_max_width() -> u32 {
    1920
}
fn default_image_max_height() -> u32 {
    1080
}
fn default_image_quality() -> u8 {
    85
}
fn default_png_compression_level() -> u8 {
    6
}
fn default_smtp_port() -> u16 {
    587
}
fn default_contact_limit() -> u64 {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: default_worker_count(),
            database_url: String::new(),
            run_migrations: default_true(),
            cors_allowed_origins: default_cors_origins(),
            trust_x_forwarded_for: false,
            auth_mode: default_auth_mode(),
            jwt_secret: String::new(),
            jwt_expiration_minutes: default_jwt_expiration(),
            admin_email: String::new(),
            admin_password_hash: String::new(),
            storage_backend: default_storage_backend(),
            upload_dir: default_upload_dir(),
            public_base_url: default_public_base_url(),
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            s3_public_url: None,
            image_max_width: default_image_max_width(),
            image_max_height: default_image_max_height(),
            image_quality: default_image_quality(),
            png_compression_level: default_png_compression_level(),
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            smtp_from: None,
            notification_email: None,
            contact_limit_per_hour: default_contact_limit(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .ignore_empty(true)
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty");
        }
        if self.auth_mode == AuthMode::Jwt {
            if self.jwt_secret.len() < 32 {
                errors.push("JWT_SECRET must be at least 32 characters");
            }
            if self.admin_email.trim().is_empty() || self.admin_password_hash.trim().is_empty() {
                errors.push("ADMIN_EMAIL and ADMIN_PASSWORD_HASH must be set in jwt auth mode");
            }
        }
        if self.is_production() && self.auth_mode == AuthMode::Mock {
            errors.push("Mock authentication is not allowed in production");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }
        if self.storage_backend == StorageBackendKind::S3
            && (is_blank(&self.s3_bucket) || is_blank(&self.s3_region))
        {
            errors.push("S3_BUCKET and S3_REGION must be set for the s3 storage backend");
        }
        if self.image_max_width == 0 || self.image_max_height == 0 {
            errors.push("IMAGE_MAX_WIDTH and IMAGE_MAX_HEIGHT must be positive");
        }
        if self.image_quality == 0 || self.image_quality > 100 {
            errors.push("IMAGE_QUALITY must be between 1 and 100");
        }
        if self.png_compression_level > 9 {
            errors.push("PNG_COMPRESSION_LEVEL must be between 0 and 9");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Default resize/re-encode parameters applied to every accepted image.
    pub fn transform_options(&self) -> TransformOptions {
        TransformOptions {
            max_width: self.image_max_width,
            max_height: self.image_max_height,
            quality: self.image_quality,
            png_compression_level: self.png_compression_level,
        }
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for StorageBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackendKind::Local => write!(f, "local"),
            StorageBackendKind::S3 => write!(f, "s3"),
        }
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else if self.len() < 32 {
            "[TOO_SHORT]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &self.database_url.redact())
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("auth_mode", &self.auth_mode)
            .field("jwt_secret", &self.jwt_secret.redact())
            .field("jwt_expiration_minutes", &self.jwt_expiration_minutes)
            .field("admin_email", &self.admin_email)
            .field("admin_password_hash", &self.admin_password_hash.redact())
            .field("storage_backend", &self.storage_backend)
            .field("upload_dir", &self.upload_dir)
            .field("public_base_url", &self.public_base_url)
            .field("s3_bucket", &self.s3_bucket)
            .field("s3_region", &self.s3_region)
            .field("s3_endpoint", &self.s3_endpoint)
            .field("image_max_width", &self.image_max_width)
            .field("image_max_height", &self.image_max_height)
            .field("image_quality", &self.image_quality)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_password", &self.smtp_password.as_deref().map(|p| p.redact()))
            .field("notification_email", &self.notification_email)
            .finish()
    }
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl From<&AppConfig> for JwtKeys {
    fn from(config: &AppConfig) -> Self {
        let jwt_secret = Zeroizing::new(config.jwt_secret.clone());

        JwtKeys {
            encoding: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(jwt_secret.as_bytes()),
        }
    }
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("encoding", &"[REDACTED]")
            .field("decoding", &"[REDACTED]")
            .finish()
    }
}
