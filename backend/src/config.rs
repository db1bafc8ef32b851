use std::env;

use url::Url;

/// Fallback signing secret for local development. Never accepted in production.
const LOCAL_SESSION_SECRET: &str = "super-secure-session-secret-value-local";

/// Origin the console is served from when NEXTAUTH_URL is unset.
const LOCAL_PUBLIC_URL: &str = "http://localhost:3000";

/// Session lifetime handed out by the credential issuer (one day).
pub const DEFAULT_SESSION_MAX_AGE: u64 = 24 * 60 * 60;

/// AppConfig
///
/// Holds the console's entire configuration state. Built once at startup and never
/// mutated afterwards; the router shares it by cloning it into `AppState` and
/// handlers pull it back out through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects the session cookie name and log format.
    pub env: Env,
    // Shared secret the session cookie is signed with (NEXTAUTH_SECRET).
    pub session_secret: String,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
    // Lifetime of a freshly issued session cookie, in seconds.
    pub session_max_age: u64,
    // Public origin of the console (NEXTAUTH_URL). Post-sign-in callbacks must stay on it.
    pub public_url: Url,
}

/// Env
///
/// Runtime context. Production switches to the `__Secure-` cookie prefix and
/// JSON logs, and refuses to start without an explicit session secret.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Safe, non-panicking configuration for tests and state scaffolding.
    fn default() -> Self {
        Self {
            env: Env::Local,
            session_secret: LOCAL_SESSION_SECRET.to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
            session_max_age: DEFAULT_SESSION_MAX_AGE,
            public_url: Url::parse(LOCAL_PUBLIC_URL).expect("local public URL is valid"),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics when `NEXTAUTH_SECRET` is missing in production. The console must not
    /// come up trusting cookies signed with a well-known development secret.
    /// Also panics when `NEXTAUTH_URL` is set but is not an absolute URL.
    pub fn load() -> Self {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let session_secret = match env {
            Env::Production => env::var("NEXTAUTH_SECRET")
                .expect("FATAL: NEXTAUTH_SECRET must be set in production."),
            Env::Local => {
                env::var("NEXTAUTH_SECRET").unwrap_or_else(|_| LOCAL_SESSION_SECRET.to_string())
            }
        };

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let session_max_age = match env::var("SESSION_MAX_AGE") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Ignoring unparsable SESSION_MAX_AGE");
                DEFAULT_SESSION_MAX_AGE
            }),
            Err(_) => DEFAULT_SESSION_MAX_AGE,
        };

        let public_url = env::var("NEXTAUTH_URL").unwrap_or_else(|_| LOCAL_PUBLIC_URL.to_string());
        let public_url =
            Url::parse(&public_url).expect("FATAL: NEXTAUTH_URL must be an absolute URL.");

        Self {
            env,
            session_secret,
            bind_addr,
            session_max_age,
            public_url,
        }
    }

    /// Name of the cookie the credential issuer stores the session in.
    pub fn session_cookie_name(&self) -> &'static str {
        match self.env {
            Env::Production => "__Secure-next-auth.session-token",
            Env::Local => "next-auth.session-token",
        }
    }
}
