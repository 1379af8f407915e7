use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;
use std::sync::OnceLock;

/// Whether 500-class messages are masked in responses. Set once at
/// startup from the loaded config; falls back to APP_ENV when the
/// setter was never called (tests, early panics).
static MASK_SERVER_ERRORS: OnceLock<bool> = OnceLock::new();

pub fn mask_server_errors(enabled: bool) {
    let _ = MASK_SERVER_ERRORS.set(enabled);
}

fn masking_enabled() -> bool {
    *MASK_SERVER_ERRORS.get_or_init(|| {
        std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()) == "production"
    })
}

/// Application error carrying the HTTP status it renders with.
/// Every failure surfaces to the client as a terminal JSON envelope;
/// nothing is retried.
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    MailDelivery(String),
    Database(String),
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MailDelivery(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::BadRequest(msg)
            | AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::MailDelivery(msg)
            | AppError::Database(msg)
            | AppError::Internal(msg) => msg,
        }
    }

    /// Message shown to the client. 500-class details are masked outside
    /// development so internals never leak through the envelope.
    fn public_message(&self, mask: bool) -> String {
        if self.status().is_server_error() && mask {
            "Internal server error".to_string()
        } else {
            self.message().to_string()
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::MailDelivery(msg) => write!(f, "Mail delivery failed: {}", msg),
            AppError::Database(msg) => write!(f, "Database error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        if self.status().is_server_error() {
            log::error!("❌ {}", self);
        }
        HttpResponse::build(self.status()).json(serde_json::json!({
            "success": false,
            "error": self.public_message(masking_enabled()),
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".to_string()),
            other => AppError::Database(other.to_string()),
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AppError::Internal(format!("Password hashing failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_variants() {
        assert_eq!(AppError::BadRequest("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized("x".into()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Forbidden("x".into()).status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::NotFound("x".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::MailDelivery("x".into()).status(), StatusCode::BAD_GATEWAY);
        assert_eq!(AppError::Database("x".into()).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err = AppError::BadRequest("Email is required".into());
        let res = err.error_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Email is required");
    }

    #[test]
    fn row_not_found_becomes_404() {
        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn server_errors_are_masked_only_when_enabled() {
        let err = AppError::Database("connection reset".into());
        assert_eq!(err.public_message(true), "Internal server error");
        assert_eq!(err.public_message(false), "connection reset");
    }

    #[test]
    fn masking_never_touches_client_errors() {
        let err = AppError::Forbidden("Forbidden".into());
        assert_eq!(err.public_message(true), "Forbidden");
    }
}
