use jsonwebtoken::TokenData;

use crate::{entities::token::Claims, errors::AuthError};

pub trait TokenServiceRepository: Send + Sync {
    /// Issues an access token for the configured admin.
    fn create_jwt(&self, subject: &str, email: &str) -> Result<String, AuthError>;

    /// Verifies signature and expiry and returns the claims.
    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError>;

    /// Access token lifetime in seconds.
    fn expires_in(&self) -> i64;
}
