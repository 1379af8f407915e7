// ==================== SESSION ISSUER ====================
// Signed, time-limited session tokens carried in an http-only cookie.
// Stateless: validity is purely a function of signature and expiry.

use crate::config::Config;
use crate::utils::error::AppError;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "token";

const SESSION_DAYS: i64 = 7;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // user id
    pub email: String,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

/// Issues a session token for an authenticated identity, valid 7 days.
pub fn issue(user_id: i64, email: &str, secret: &str) -> Result<String, AppError> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::days(SESSION_DAYS)).timestamp() as usize,
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to generate token: {}", e)))
}

/// Verifies signature and expiry, returning the decoded identity.
pub fn verify(token: &str, secret: &str) -> Result<Claims, AppError> {
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_ref()), &validation)
        .map(|data| data.claims)
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))
}

/// Builds the http-only session cookie. `Secure` only outside
/// development so local HTTP still works.
pub fn session_cookie(token: String, config: &Config) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(config.is_production())
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::days(SESSION_DAYS))
        .finish()
}

/// Expired cookie used to clear the session on logout.
pub fn clear_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .secure(config.is_production())
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::ZERO)
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    #[test]
    fn issue_then_verify_round_trips_identity() {
        let token = issue(42, "a@x.com", SECRET).unwrap();
        let claims = verify(&token, SECRET).unwrap();
        assert_eq!(claims.sub, "42");
        assert_eq!(claims.email, "a@x.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue(42, "a@x.com", SECRET).unwrap();
        let err = verify(&token, "other-secret").unwrap_err();
        assert_eq!(err, AppError::Unauthorized("Invalid token".to_string()));
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(verify("not.a.jwt", SECRET).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let past = Utc::now() - Duration::days(1);
        let claims = Claims {
            sub: "42".to_string(),
            email: "a@x.com".to_string(),
            iat: (past - Duration::days(SESSION_DAYS)).timestamp() as usize,
            exp: past.timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_ref()),
        )
        .unwrap();
        assert!(verify(&token, SECRET).is_err());
    }

    #[test]
    fn token_expires_seven_days_out() {
        let token = issue(1, "a@x.com", SECRET).unwrap();
        let claims = verify(&token, SECRET).unwrap();
        let lifetime = claims.exp - claims.iat;
        assert_eq!(lifetime as i64, SESSION_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn cookie_is_http_only_and_secure_only_in_production() {
        let dev = session_cookie("t".to_string(), &Config::for_tests("development"));
        assert_eq!(dev.http_only(), Some(true));
        assert_ne!(dev.secure(), Some(true));

        let prod = session_cookie("t".to_string(), &Config::for_tests("production"));
        assert_eq!(prod.secure(), Some(true));
        assert_eq!(prod.max_age(), Some(CookieDuration::days(7)));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_cookie(&Config::for_tests("development"));
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(CookieDuration::ZERO));
    }
}
