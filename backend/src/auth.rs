use std::{convert::Infallible, fmt, sync::Arc};

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::{config::AppConfig, policy::Role};

/// SessionToken
///
/// Payload of the session cookie written by the credential issuer. The cookie is a
/// compact HS256 JWT signed with the shared session secret; `exp` bounds its life
/// (one day by default).
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionToken {
    /// Bearer token issued by the backend API at sign-in. Forwarded verbatim on
    /// every backend call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    /// Display name copied from the backend token at sign-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

/// The part of the backend's access token this console reads. Values are kept
/// loosely typed since the backend owns the format.
#[derive(Debug, Default, Deserialize)]
struct AccessTokenClaims {
    #[serde(default)]
    role: Option<Value>,
    #[serde(default, rename = "userId")]
    user_id: Option<Value>,
}

/// SessionClaim
///
/// The identity resolved from a valid session cookie. Lives for one request.
#[derive(Clone)]
pub struct SessionClaim {
    pub role: Role,
    pub user_id: Option<String>,
    pub name: Option<String>,
    /// Opaque bearer token for the backend API. Never validated here: the backend
    /// rejects stale tokens with 401.
    pub access_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl fmt::Debug for SessionClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionClaim")
            .field("role", &self.role)
            .field("user_id", &self.user_id)
            .field("name", &self.name)
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// SessionError
///
/// Every reason a request ends up anonymous. These are ordinary values: the guard
/// logs them and carries on, nothing here turns into a 5xx.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no session cookie present")]
    MissingCookie,
    #[error("session token rejected: {0:?}")]
    InvalidSessionToken(ErrorKind),
    #[error("session token carries no access token")]
    MissingAccessToken,
    #[error("access token is malformed: {0}")]
    MalformedAccessToken(&'static str),
}

/// Session
///
/// Outcome of session resolution for one request.
#[derive(Debug, Clone)]
pub enum Session {
    Authenticated(SessionClaim),
    Anonymous,
}

impl Session {
    /// Folds a resolver result into a session, logging why it failed.
    pub fn from_resolution(result: Result<SessionClaim, SessionError>) -> Self {
        match result {
            Ok(claim) => Session::Authenticated(claim),
            Err(SessionError::MissingCookie) => {
                tracing::debug!("No session cookie, treating request as anonymous");
                Session::Anonymous
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to resolve user session");
                Session::Anonymous
            }
        }
    }

    pub fn claim(&self) -> Option<&SessionClaim> {
        match self {
            Session::Authenticated(claim) => Some(claim),
            Session::Anonymous => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }
}

/// SessionResolver
///
/// Exchanges request cookies for an identity. This is the seam to the external
/// credential issuer; implementations must be cheap to share across requests.
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> Result<SessionClaim, SessionError>;
}

pub type SessionResolverState = Arc<dyn SessionResolver>;

/// JwtSessionResolver
///
/// Default resolver: verifies the session cookie against the shared secret, then
/// reads role and user id out of the embedded backend token.
#[derive(Clone)]
pub struct JwtSessionResolver {
    cookie_name: &'static str,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtSessionResolver {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            cookie_name: config.session_cookie_name(),
            decoding_key: DecodingKey::from_secret(config.session_secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

#[async_trait]
impl SessionResolver for JwtSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> Result<SessionClaim, SessionError> {
        let cookie = session_cookie(headers, self.cookie_name).ok_or(SessionError::MissingCookie)?;

        let token = decode::<SessionToken>(cookie, &self.decoding_key, &self.validation)
            .map_err(|e| SessionError::InvalidSessionToken(e.into_kind()))?
            .claims;

        let access_token = token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or(SessionError::MissingAccessToken)?;

        let claims = decode_access_token(&access_token)?;

        Ok(SessionClaim {
            role: Role::parse(claims.role.as_ref().and_then(Value::as_str)),
            user_id: claims.user_id.and_then(|id| match id {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
            name: token.name,
            access_token,
            expires_at: i64::try_from(token.exp)
                .ok()
                .and_then(|exp| DateTime::from_timestamp(exp, 0)),
        })
    }
}

/// Finds the named cookie across all `Cookie` headers. An empty value counts as
/// absent.
pub fn session_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// Reads the payload of the backend token without checking its signature.
fn decode_access_token(token: &str) -> Result<AccessTokenClaims, SessionError> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or(SessionError::MalformedAccessToken("missing payload segment"))?;

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|_| SessionError::MalformedAccessToken("payload is not base64url"))?;

    serde_json::from_slice(&bytes)
        .map_err(|_| SessionError::MalformedAccessToken("payload is not a JSON object"))
}

/// encode_session_token
///
/// Mints a session cookie value in the format `JwtSessionResolver` accepts,
/// expiring `session_max_age` seconds from now. Oversized lifetimes saturate.
pub fn encode_session_token(
    config: &AppConfig,
    access_token: &str,
    name: Option<&str>,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp().max(0) as usize;
    let claims = SessionToken {
        access_token: Some(access_token.to_string()),
        name: name.map(str::to_string),
        iat: now,
        exp: now.saturating_add(usize::try_from(config.session_max_age).unwrap_or(usize::MAX)),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
}

/// Session Extractor
///
/// Hands the caller's session to a handler. The route guard stores the session it
/// resolved in the request extensions; when it is absent (e.g. a router built
/// without the guard) the configured resolver runs again. Never rejects: failure
/// means `Session::Anonymous`.
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    SessionResolverState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(session.clone());
        }

        let resolver = SessionResolverState::from_ref(state);
        Ok(Session::from_resolution(
            resolver.resolve(&parts.headers).await,
        ))
    }
}
