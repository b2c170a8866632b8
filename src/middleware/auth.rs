//! Authentication middleware
//!
//! Turns an `Authorization: Bearer <jwt>` header into a [`Principal`].
//! Tokens are HS256-signed and carry the user's id, role and, optionally,
//! their name and e-mail.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;
use crate::config::AuthConfig;
use crate::models::{Principal, Role};
use crate::state::AppState;
use crate::utils::errors::{CampusFlowError, Result};

/// Token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Signs and verifies bearer tokens
#[derive(Clone)]
pub struct JwtAuth {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: Option<String>,
}

impl JwtAuth {
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &config.issuer {
            validation.set_issuer(&[issuer]);
            validation.set_required_spec_claims(&["exp", "iss"]);
        }

        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
        }
    }

    /// Verify a token and return the principal it vouches for
    pub fn verify(&self, token: &str) -> Result<Principal> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)?.claims;

        Ok(Principal {
            id: claims.sub,
            role: claims.role,
            name: claims.name,
            email: claims.email,
        })
    }

    /// Issue a token for `principal`, valid for `ttl`
    pub fn issue(&self, principal: &Principal, ttl: Duration) -> Result<String> {
        let claims = Claims {
            sub: principal.id,
            role: principal.role,
            name: principal.name.clone(),
            email: principal.email.clone(),
            exp: (Utc::now() + ttl).timestamp(),
            iss: self.issuer.clone(),
        };

        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// An authenticated caller; rejects with 401 when no valid token is present
#[derive(Debug, Clone)]
pub struct AuthUser(pub Principal);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = CampusFlowError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(CampusFlowError::Unauthenticated)?;

        match state.auth.verify(token) {
            Ok(principal) => {
                debug!(user_id = %principal.id, role = %principal.role, "Request authenticated");
                Ok(Self(principal))
            }
            Err(e) => {
                warn!(error = %e, "Rejected bearer token");
                Err(CampusFlowError::Unauthenticated)
            }
        }
    }
}

/// A caller who may or may not be signed in
///
/// An invalid token is treated like no token at all.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<Principal>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = CampusFlowError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> std::result::Result<Self, Self::Rejection> {
        let principal = bearer_token(parts).and_then(|token| match state.auth.verify(token) {
            Ok(principal) => Some(principal),
            Err(e) => {
                debug!(error = %e, "Ignoring invalid bearer token on public route");
                None
            }
        });

        Ok(Self(principal))
    }
}
