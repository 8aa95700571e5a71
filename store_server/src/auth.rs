//! Access tokens.
//!
//! Clients authenticate with `Authorization: Bearer <jwt>`. Tokens are HS256 JWTs carrying the customer id (`sub`),
//! the customer's role and an expiry. The server never logs customers in itself; [`TokenIssuer`] exists for operators
//! and tests.
use std::future::{ready, Ready};

use actix_web::{dev::Payload, FromRequest, HttpMessage, HttpRequest};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};
use store_engine::db_types::Role;

use crate::{
    config::AuthConfig,
    errors::{AuthError, ServerError},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwtClaims {
    /// The customer id
    pub sub: i64,
    pub role: Role,
    /// Expiry, as a unix timestamp
    pub exp: i64,
}

impl JwtClaims {
    pub fn user_id(&self) -> i64 {
        self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Handlers can take `JwtClaims` as an argument on any route behind the JWT middleware.
impl FromRequest for JwtClaims {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let claims = req.extensions().get::<JwtClaims>().cloned().ok_or_else(|| {
            warn!("💻️ No JWT claims found in request extensions for {}", req.path());
            ServerError::AuthenticationError(AuthError::MissingToken)
        });
        ready(claims)
    }
}

#[derive(Clone)]
pub struct TokenIssuer {
    key: EncodingKey,
    lifetime: Duration,
}

impl TokenIssuer {
    pub fn new(config: &AuthConfig) -> Self {
        let key = EncodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        Self { key, lifetime: config.token_lifetime }
    }

    pub fn issue_token(&self, user_id: i64, role: Role) -> Result<String, AuthError> {
        let exp = (Utc::now() + self.lifetime).timestamp();
        let claims = JwtClaims { sub: user_id, role, exp };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AuthError::CouldNotIssueToken(e.to_string()))?;
        debug!("💻️ Issued a {role} token for customer {user_id}, valid until {exp}");
        Ok(token)
    }
}

/// Validates access tokens. Cheap to clone.
#[derive(Clone)]
pub struct TokenValidator {
    key: DecodingKey,
    validation: Validation,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        let key = DecodingKey::from_secret(config.jwt_secret.reveal().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp"]);
        validation.leeway = 0;
        Self { key, validation }
    }

    pub fn validate(&self, token: &str) -> Result<JwtClaims, AuthError> {
        let data = decode::<JwtClaims>(token, &self.key, &self.validation).map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::ExpiredToken,
            ErrorKind::InvalidSignature => AuthError::ValidationError("signature has failed verification".into()),
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::PoorlyFormattedToken(e.to_string())
            },
            _ => AuthError::ValidationError(e.to_string()),
        })?;
        Ok(data.claims)
    }

    /// Extracts the token from an `Authorization` header value.
    pub fn bearer_token(header: &str) -> Result<&str, AuthError> {
        header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthError::PoorlyFormattedToken("expected 'Bearer <token>'".into()))
    }
}
