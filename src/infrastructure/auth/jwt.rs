use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, Header, TokenData, Validation};

use crate::entities::token::Claims;
use crate::errors::AuthError;
use crate::repositories::token::TokenServiceRepository;
use crate::settings::{AppConfig, JwtKeys};

const JWT_ALGORITHM: Algorithm = Algorithm::HS512;

#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    access_expiration: Duration,
}

impl JwtService {
    pub fn new(config: &AppConfig) -> Self {
        JwtService {
            keys: JwtKeys::from(config),
            access_expiration: Duration::minutes(config.jwt_expiration_minutes),
        }
    }

    pub fn create_jwt(&self, subject: &str, email: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = (now + self.access_expiration).timestamp() as usize;

        let claims = Claims {
            sub: subject.to_string(),
            email: email.to_string(),
            admin: true,
            exp,
            iat: now.timestamp() as usize,
        };

        encode(&Header::new(JWT_ALGORITHM), &claims, &self.keys.encoding).map_err(AuthError::from)
    }

    pub fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;

        decode::<Claims>(token, &self.keys.decoding, &validation).map_err(AuthError::from)
    }
}

impl TokenServiceRepository for JwtService {
    fn create_jwt(&self, subject: &str, email: &str) -> Result<String, AuthError> {
        self.create_jwt(subject, email)
    }

    fn decode_jwt(&self, token: &str) -> Result<TokenData<Claims>, AuthError> {
        self.decode_jwt(token)
    }

    fn expires_in(&self) -> i64 {
        self.access_expiration.num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(minutes: i64) -> JwtService {
        let config = AppConfig {
            jwt_secret: "a-test-secret-that-is-long-enough-for-hs512".into(),
            jwt_expiration_minutes: minutes,
            ..AppConfig::default()
        };
        JwtService::new(&config)
    }

    #[test]
    fn issued_token_decodes_to_admin_claims() {
        let jwt = service(60);
        let token = jwt.create_jwt("admin", "admin@partnerspoints.test").unwrap();
        let claims = jwt.decode_jwt(&token).unwrap().claims;

        assert_eq!(claims.email, "admin@partnerspoints.test");
        assert!(claims.admin);
        assert_eq!(TokenServiceRepository::expires_in(&jwt), 3600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = service(-10);
        let token = jwt.create_jwt("admin", "admin@partnerspoints.test").unwrap();
        assert!(matches!(jwt.decode_jwt(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn token_from_another_secret_is_invalid() {
        let token = service(60).create_jwt("admin", "a@b.test").unwrap();
        let other = JwtService::new(&AppConfig {
            jwt_secret: "another-secret-that-is-also-long-enough!!".into(),
            ..AppConfig::default()
        });
        assert!(matches!(other.decode_jwt(&token), Err(AuthError::InvalidToken)));
    }
}
