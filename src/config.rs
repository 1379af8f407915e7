use std::env;

/// Environment-driven configuration, loaded once at startup and shared
/// through `web::Data`. Required variables panic early instead of
/// failing on the first request.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub app_env: String,
    pub client_uri: String,
    pub smtp: SmtpConfig,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
    pub from: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            client_uri: env::var("CLIENT_URI")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            smtp: SmtpConfig {
                host: env::var("SMTP_HOST").unwrap_or_else(|_| "smtp.gmail.com".to_string()),
                port: env::var("SMTP_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(587),
                user: env::var("SMTP_USER").unwrap_or_default(),
                pass: env::var("SMTP_PASS").unwrap_or_default(),
                from: env::var("SMTP_FROM").unwrap_or_else(|_| "LeadFlow <no-reply@leadflow.app>".to_string()),
            },
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}

#[cfg(test)]
impl Config {
    /// Minimal config for tests that never touch the network.
    pub fn for_tests(app_env: &str) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_url: "postgres://localhost/leadflow_test".to_string(),
            jwt_secret: "test-secret".to_string(),
            app_env: app_env.to_string(),
            client_uri: "http://localhost:5173".to_string(),
            smtp: SmtpConfig {
                host: "localhost".to_string(),
                port: 587,
                user: String::new(),
                pass: String::new(),
                from: "LeadFlow <no-reply@leadflow.app>".to_string(),
            },
        }
    }
}
