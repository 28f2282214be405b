use std::env;

/// AppConfig
///
/// Holds the application's entire configuration state. This struct is designed to be
/// immutable once loaded, ensuring consistency across all threads and services
/// (Repository, Mailer). It is pulled into the application state via FromRef.
#[derive(Clone)]
pub struct AppConfig {
    // Database connection string (SQLite).
    pub db_url: String,
    // Runtime environment marker. Controls feature activation (e.g., Dev Bypass).
    pub env: Env,
    // Secret key used to sign and validate issued JWTs.
    pub jwt_secret: String,
    // Lifetime of issued bearer tokens, in hours.
    pub token_ttl_hours: i64,
    // SMTP settings for confirmation-code delivery. When absent, codes are
    // written to the log instead (console delivery for local development).
    pub smtp: Option<SmtpConfig>,
}

/// Env
///
/// Defines the runtime context, used to switch between development utilities
/// (console mail delivery, auth bypass) and production behavior.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// SmtpConfig
///
/// Connection settings for the outgoing SMTP relay.
#[derive(Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    // Sender address used for every confirmation email.
    pub from: String,
}

impl SmtpConfig {
    /// from_env
    ///
    /// Reads the SMTP relay settings. `SMTP_HOST` decides whether SMTP delivery
    /// is configured at all; the other variables refine it.
    pub fn from_env() -> Option<Self> {
        let host = env::var("SMTP_HOST").ok()?;
        let port = env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587);
        Some(Self {
            host,
            port,
            username: env::var("SMTP_USERNAME").ok(),
            password: env::var("SMTP_PASSWORD").ok(),
            from: env::var("MAIL_FROM").unwrap_or_else(|_| "noreply@reviewdb.local".to_string()),
        })
    }
}

impl Default for AppConfig {
    /// default
    ///
    /// Provides a safe, non-panicking AppConfig instance primarily used for test setup.
    /// This allows us to instantiate the configuration without needing to set environment
    /// variables for lightweight unit or integration testing state scaffolding.
    fn default() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            env: Env::Local,
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
            token_ttl_hours: 24,
            smtp: None,
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// The canonical function for initializing the application configuration at startup.
    /// It reads all parameters from environment variables and implements the **fail-fast**
    /// principle.
    ///
    /// # Panics
    /// Panics if a critical environment variable required for the current runtime
    /// environment (especially Production) is not found. This prevents the application
    /// from starting with an incomplete or insecure configuration.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        // JWT Secret Resolution
        // The production secret is mandatory and must be explicitly set.
        let jwt_secret = match env {
            Env::Production => {
                env::var("JWT_SECRET").expect("FATAL: JWT_SECRET must be set in production.")
            }
            // In local, we provide a fallback, though the developer should ideally set one.
            _ => env::var("JWT_SECRET")
                .unwrap_or_else(|_| "super-secure-test-secret-value-local".to_string()),
        };

        let token_ttl_hours = env::var("TOKEN_TTL_HOURS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(24);

        match env {
            Env::Local => Self {
                env: Env::Local,
                // Local development runs on a file-backed SQLite database by default.
                db_url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:reviewdb.sqlite?mode=rwc".to_string()),
                jwt_secret,
                token_ttl_hours,
                smtp: SmtpConfig::from_env(),
            },
            Env::Production => Self {
                env: Env::Production,
                // Production demands explicit settings for every piece of infrastructure.
                db_url: env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                jwt_secret,
                token_ttl_hours,
                smtp: SmtpConfig::from_env(),
            },
        }
    }
}
