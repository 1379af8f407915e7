use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::config::Config;
use crate::database::Postgres;
use crate::services::auth_service::{
    self, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    SendOtpRequest,
};
use crate::services::email_service::Mailer;
use crate::services::token_service;
use crate::utils::cache::OtpCache;
use crate::utils::error::AppError;

#[utoipa::path(
    post,
    path = "/api/auth/send-otp",
    tag = "Auth",
    request_body = SendOtpRequest,
    responses(
        (status = 200, description = "OTP sent successfully"),
        (status = 400, description = "Email is required"),
        (status = 502, description = "OTP delivery failed")
    )
)]
pub async fn send_otp(
    cache: web::Data<OtpCache>,
    mailer: web::Data<dyn Mailer>,
    request: web::Json<SendOtpRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📨 POST /auth/send-otp - email: {}", request.email.as_deref().unwrap_or("N/A"));

    auth_service::send_otp(&cache, mailer.as_ref(), &request).await?;

    log::info!("✅ OTP sent: {}", request.email.as_deref().unwrap_or("N/A"));
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "OTP sent successfully"
    })))
}

#[utoipa::path(
    post,
    path = "/api/auth/create-user",
    tag = "Auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created successfully"),
        (status = 400, description = "Missing fields, existing user, or invalid/expired OTP")
    )
)]
pub async fn create_user(
    db: web::Data<Postgres>,
    cache: web::Data<OtpCache>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let email = request.email.as_deref().unwrap_or("N/A");
    log::info!("📝 POST /auth/create-user - email: {}", email);

    auth_service::register(&db, &cache, &request).await?;

    log::info!("✅ Registration successful: {}", email);
    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "User created successfully"
    })))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set"),
        (status = 400, description = "Unknown user or invalid password")
    )
)]
pub async fn login(
    db: web::Data<Postgres>,
    config: web::Data<Config>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("🔐 POST /auth/login - email: {}", request.email);

    let token = auth_service::login(&db, &config.jwt_secret, &request).await?;

    log::info!("✅ Login successful: {}", request.email);
    Ok(HttpResponse::Ok()
        .cookie(token_service::session_cookie(token, &config))
        .json(json!({
            "success": true,
            "message": "Login successful"
        })))
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "Auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset OTP sent successfully"),
        (status = 404, description = "No account for this email"),
        (status = 502, description = "OTP delivery failed")
    )
)]
pub async fn forgot_password(
    db: web::Data<Postgres>,
    cache: web::Data<OtpCache>,
    mailer: web::Data<dyn Mailer>,
    request: web::Json<ForgotPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    log::info!("📨 POST /auth/forgot-password - email: {}", request.email.as_deref().unwrap_or("N/A"));

    auth_service::forgot_password(&db, &cache, mailer.as_ref(), &request).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "OTP sent successfully"
    })))
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "Auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset successfully"),
        (status = 400, description = "Missing fields, mismatched passwords, or bad OTP"),
        (status = 404, description = "No account for this email")
    )
)]
pub async fn reset_password(
    db: web::Data<Postgres>,
    cache: web::Data<OtpCache>,
    request: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let email = request.email.as_deref().unwrap_or("N/A");
    log::info!("🔑 POST /auth/reset-password - email: {}", email);

    auth_service::reset_password(&db, &cache, &request).await?;

    log::info!("✅ Password reset: {}", email);
    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Password reset successfully"
    })))
}
