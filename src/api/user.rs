use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::config::Config;
use crate::database::Postgres;
use crate::middleware::auth::AuthUser;
use crate::services::{token_service, user_service};
use crate::utils::error::AppError;

#[utoipa::path(
    get,
    path = "/api/user/me",
    tag = "User",
    responses(
        (status = 200, description = "Current identity", body = crate::models::UserInfo),
        (status = 401, description = "Missing or invalid session cookie"),
        (status = 404, description = "Account no longer exists")
    ),
    security(("session_cookie" = []))
)]
pub async fn me(db: web::Data<Postgres>, user: AuthUser) -> Result<HttpResponse, AppError> {
    log::info!("👤 GET /user/me - user: {}", user.user_id);

    let info = user_service::get_current_user(&db, user.user_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "data": info
    })))
}

#[utoipa::path(
    post,
    path = "/api/user/logout",
    tag = "User",
    responses(
        (status = 200, description = "Session cookie cleared"),
        (status = 401, description = "Missing or invalid session cookie")
    ),
    security(("session_cookie" = []))
)]
pub async fn logout(config: web::Data<Config>, user: AuthUser) -> Result<HttpResponse, AppError> {
    log::info!("👋 POST /user/logout - user: {}", user.user_id);

    Ok(HttpResponse::Ok()
        .cookie(token_service::clear_cookie(&config))
        .json(json!({
            "success": true,
            "message": "Logged out successfully"
        })))
}
