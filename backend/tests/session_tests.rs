use axum::http::{HeaderMap, HeaderValue, header};
use jsonwebtoken::{EncodingKey, Header, encode, errors::ErrorKind};
use serde_json::json;
use std::time::SystemTime;
use stockzy_console::{
    AppConfig, JwtSessionResolver, Role, Session, SessionResolver,
    auth::{SessionError, SessionToken, encode_session_token, session_cookie},
    config::Env,
};

// --- Helper Functions ---

const TEST_SECRET: &str = "test-session-secret-1234567890";

fn test_config(env: Env) -> AppConfig {
    AppConfig {
        env,
        session_secret: TEST_SECRET.to_string(),
        ..AppConfig::default()
    }
}

fn now() -> usize {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

/// A backend access token. Signed with a key this console never sees.
fn backend_token(claims: serde_json::Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"backend-only-secret"),
    )
    .unwrap()
}

fn cookie_headers(name: &str, value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&format!("theme=dark; {name}={value}")).unwrap(),
    );
    headers
}

fn session_for(config: &AppConfig, access_token: &str) -> HeaderMap {
    let token = encode_session_token(config, access_token, Some("Asha")).unwrap();
    cookie_headers(config.session_cookie_name(), &token)
}

// --- Tests ---

#[tokio::test]
async fn test_valid_session_resolves_claim() {
    let config = test_config(Env::Local);
    let resolver = JwtSessionResolver::new(&config);
    let access = backend_token(json!({ "role": "SALESEMPLOYEE", "userId": "u-42" }));

    let claim = resolver
        .resolve(&session_for(&config, &access))
        .await
        .expect("session should resolve");

    assert_eq!(claim.role, Role::SalesEmployee);
    assert_eq!(claim.user_id.as_deref(), Some("u-42"));
    assert_eq!(claim.name.as_deref(), Some("Asha"));
    assert_eq!(claim.access_token, access);
    assert!(claim.expires_at.is_some());
}

#[tokio::test]
async fn test_missing_cookie_is_missing_cookie() {
    let resolver = JwtSessionResolver::new(&test_config(Env::Local));

    let result = resolver.resolve(&HeaderMap::new()).await;
    assert!(matches!(result, Err(SessionError::MissingCookie)));

    let result = resolver
        .resolve(&cookie_headers("next-auth.session-token", ""))
        .await;
    assert!(matches!(result, Err(SessionError::MissingCookie)));
}

#[tokio::test]
async fn test_cookie_signed_with_other_secret_is_rejected() {
    let issuer = AppConfig {
        session_secret: "someone-elses-secret".to_string(),
        ..test_config(Env::Local)
    };
    let resolver = JwtSessionResolver::new(&test_config(Env::Local));
    let access = backend_token(json!({ "role": "ADMIN" }));

    let result = resolver.resolve(&session_for(&issuer, &access)).await;

    assert!(matches!(
        result,
        Err(SessionError::InvalidSessionToken(ErrorKind::InvalidSignature))
    ));
}

#[tokio::test]
async fn test_expired_session_is_rejected() {
    let config = test_config(Env::Local);
    let resolver = JwtSessionResolver::new(&config);

    let expired = SessionToken {
        access_token: Some(backend_token(json!({ "role": "ADMIN" }))),
        name: None,
        iat: now() - 2 * 86_400,
        exp: now() - 86_400,
    };
    let cookie = encode(
        &Header::default(),
        &expired,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let result = resolver
        .resolve(&cookie_headers(config.session_cookie_name(), &cookie))
        .await;

    assert!(matches!(
        result,
        Err(SessionError::InvalidSessionToken(ErrorKind::ExpiredSignature))
    ));
}

#[tokio::test]
async fn test_garbage_cookie_is_rejected() {
    let config = test_config(Env::Local);
    let resolver = JwtSessionResolver::new(&config);

    let result = resolver
        .resolve(&cookie_headers(config.session_cookie_name(), "not-a-jwt"))
        .await;

    assert!(matches!(result, Err(SessionError::InvalidSessionToken(_))));
}

#[tokio::test]
async fn test_session_without_access_token() {
    let config = test_config(Env::Local);
    let resolver = JwtSessionResolver::new(&config);

    let bare = SessionToken {
        access_token: None,
        name: Some("Asha".to_string()),
        iat: now(),
        exp: now() + 3600,
    };
    let cookie = encode(
        &Header::default(),
        &bare,
        &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
    )
    .unwrap();

    let result = resolver
        .resolve(&cookie_headers(config.session_cookie_name(), &cookie))
        .await;

    assert!(matches!(result, Err(SessionError::MissingAccessToken)));
}

#[tokio::test]
async fn test_malformed_access_token() {
    let config = test_config(Env::Local);
    let resolver = JwtSessionResolver::new(&config);

    let result = resolver
        .resolve(&session_for(&config, "opaque-token-without-segments"))
        .await;
    assert!(matches!(result, Err(SessionError::MalformedAccessToken(_))));

    let result = resolver
        .resolve(&session_for(&config, "aGVhZGVy.%%%.c2ln"))
        .await;
    assert!(matches!(result, Err(SessionError::MalformedAccessToken(_))));
}

#[tokio::test]
async fn test_backend_token_expiry_is_not_checked() {
    let config = test_config(Env::Local);
    let resolver = JwtSessionResolver::new(&config);
    let stale = backend_token(json!({ "role": "ADMIN", "userId": "u-1", "exp": 1 }));

    let claim = resolver.resolve(&session_for(&config, &stale)).await.unwrap();

    assert_eq!(claim.role, Role::Admin);
}

#[tokio::test]
async fn test_odd_role_and_user_id_shapes() {
    let config = test_config(Env::Local);
    let resolver = JwtSessionResolver::new(&config);

    let access = backend_token(json!({ "role": 7, "userId": 1001 }));
    let claim = resolver.resolve(&session_for(&config, &access)).await.unwrap();
    assert_eq!(claim.role, Role::Unrecognized);
    assert_eq!(claim.user_id.as_deref(), Some("1001"));

    let access = backend_token(json!({ "sub": "nobody" }));
    let claim = resolver.resolve(&session_for(&config, &access)).await.unwrap();
    assert_eq!(claim.role, Role::Unrecognized);
    assert_eq!(claim.user_id, None);
}

#[tokio::test]
async fn test_production_reads_secure_cookie_only() {
    let config = test_config(Env::Production);
    let resolver = JwtSessionResolver::new(&config);
    let access = backend_token(json!({ "role": "ADMIN" }));
    let token = encode_session_token(&config, &access, None).unwrap();

    let result = resolver
        .resolve(&cookie_headers("next-auth.session-token", &token))
        .await;
    assert!(matches!(result, Err(SessionError::MissingCookie)));

    let claim = resolver
        .resolve(&cookie_headers("__Secure-next-auth.session-token", &token))
        .await
        .unwrap();
    assert_eq!(claim.role, Role::Admin);
}

#[test]
fn test_session_cookie_parsing() {
    let mut headers = HeaderMap::new();
    headers.append(header::COOKIE, HeaderValue::from_static("a=1;b=2"));
    headers.append(header::COOKIE, HeaderValue::from_static(" c = x ; d=4=4"));

    assert_eq!(session_cookie(&headers, "b"), Some("2"));
    assert_eq!(session_cookie(&headers, "d"), Some("4=4"));
    assert_eq!(session_cookie(&headers, "missing"), None);
}

#[test]
fn test_from_resolution_swallows_errors() {
    let session = Session::from_resolution(Err(SessionError::MissingAccessToken));
    assert!(!session.is_authenticated());
    assert!(session.claim().is_none());
}

#[tokio::test]
async fn test_debug_output_redacts_bearer_token() {
    let config = test_config(Env::Local);
    let resolver = JwtSessionResolver::new(&config);
    let access = backend_token(json!({ "role": "ADMIN" }));

    let claim = resolver.resolve(&session_for(&config, &access)).await.unwrap();
    let printed = format!("{claim:?}");

    assert!(!printed.contains(&access));
    assert!(printed.contains("<redacted>"));
}

#[tokio::test]
async fn test_huge_session_max_age_saturates() {
    let config = AppConfig {
        session_max_age: u64::MAX,
        ..test_config(Env::Local)
    };
    let resolver = JwtSessionResolver::new(&config);
    let access = backend_token(json!({ "role": "ADMIN" }));

    let claim = resolver
        .resolve(&session_for(&config, &access))
        .await
        .expect("a far-future session should still resolve");

    assert_eq!(claim.role, Role::Admin);
}
