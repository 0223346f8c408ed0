use validator::Validate;

use crate::auth::password::verify_password;
use crate::entities::token::{AuthResponse, Claims, LoginRequest};
use crate::errors::AuthError;
use crate::repositories::token::TokenServiceRepository;
use crate::settings::{AppConfig, AuthMode};

const ADMIN_SUBJECT: &str = "admin";

/// Single-admin authentication. The mode is fixed at construction.
pub struct AuthHandler<T>
where
    T: TokenServiceRepository,
{
    pub token_service: T,
    mode: AuthMode,
    admin_email: String,
    admin_password_hash: String,
}

impl<T> AuthHandler<T>
where
    T: TokenServiceRepository,
{
    pub fn new(token_service: T, config: &AppConfig) -> Self {
        AuthHandler {
            token_service,
            mode: config.auth_mode,
            admin_email: config.admin_email.trim().to_lowercase(),
            admin_password_hash: config.admin_password_hash.clone(),
        }
    }

    /// Checks the configured admin credentials and issues an access token.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, AuthError> {
        if self.mode == AuthMode::Mock {
            return Err(AuthError::LoginDisabled);
        }
        request.validate()?;

        if request.email.trim().to_lowercase() != self.admin_email {
            tracing::warn!("Login attempt for unknown account");
            return Err(AuthError::WrongCredentials);
        }

        if !verify_password(&request.password, &self.admin_password_hash)? {
            tracing::warn!("Login attempt with wrong password");
            return Err(AuthError::WrongCredentials);
        }

        let access_token = self
            .token_service
            .create_jwt(ADMIN_SUBJECT, &self.admin_email)
            .map_err(|e| {
                tracing::warn!("Failed to create JWT: {}", e);
                AuthError::TokenCreation
            })?;

        tracing::info!("Admin logged in successfully");
        Ok(AuthResponse::new(access_token, self.token_service.expires_in()))
    }

    /// Claims for a bearer token, or the development identity in mock mode.
    pub fn authenticate(&self, bearer: Option<&str>) -> Result<Claims, AuthError> {
        match self.mode {
            AuthMode::Mock => Ok(Claims::development_admin(&self.admin_email)),
            AuthMode::Jwt => {
                let token = bearer.ok_or(AuthError::MissingCredentials)?;
                Ok(self.token_service.decode_jwt(token)?.claims)
            }
        }
    }
}
