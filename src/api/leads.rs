use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;

use crate::database::Postgres;
use crate::middleware::auth::AuthUser;
use crate::models::LeadPayload;
use crate::services::lead_service;
use crate::utils::error::AppError;

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[utoipa::path(
    post,
    path = "/api/leads/add-lead",
    tag = "Leads",
    request_body = LeadPayload,
    responses(
        (status = 201, description = "Lead created"),
        (status = 400, description = "Owner already has a lead with this email"),
        (status = 401, description = "Missing or invalid session cookie")
    ),
    security(("session_cookie" = []))
)]
pub async fn add_lead(
    db: web::Data<Postgres>,
    user: AuthUser,
    payload: web::Json<LeadPayload>,
) -> Result<HttpResponse, AppError> {
    log::info!("➕ POST /leads/add-lead - user: {} email: {}", user.user_id, payload.email);

    lead_service::create_lead(&db, user.user_id, &payload).await?;

    Ok(HttpResponse::Created().json(json!({
        "success": true,
        "message": "Lead Added Successfully"
    })))
}

#[utoipa::path(
    get,
    path = "/api/leads/get-leads",
    tag = "Leads",
    params(ListQuery),
    responses(
        (status = 200, description = "One page of leads, newest first", body = lead_service::LeadPage),
        (status = 401, description = "Missing or invalid session cookie")
    ),
    security(("session_cookie" = []))
)]
pub async fn get_leads(
    db: web::Data<Postgres>,
    user: AuthUser,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    log::info!(
        "📋 GET /leads/get-leads - user: {} page: {:?} limit: {:?}",
        user.user_id,
        query.page,
        query.limit
    );

    let page = lead_service::get_leads(&db, user.user_id, query.page, query.limit).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Leads fetched successfully",
        "data": page.data,
        "page": page.page,
        "limit": page.limit,
        "total": page.total,
        "totalPages": page.total_pages
    })))
}

#[utoipa::path(
    put,
    path = "/api/leads/{id}",
    tag = "Leads",
    request_body = LeadPayload,
    params(("id" = i64, Path, description = "Lead id")),
    responses(
        (status = 200, description = "Lead updated"),
        (status = 403, description = "Lead belongs to a different user"),
        (status = 404, description = "No lead with this id")
    ),
    security(("session_cookie" = []))
)]
pub async fn update_lead(
    db: web::Data<Postgres>,
    user: AuthUser,
    path: web::Path<i64>,
    payload: web::Json<LeadPayload>,
) -> Result<HttpResponse, AppError> {
    let lead_id = path.into_inner();
    log::info!("✏️ PUT /leads/{} - user: {}", lead_id, user.user_id);

    lead_service::update_lead(&db, user.user_id, lead_id, &payload).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Lead updated successfully"
    })))
}

#[utoipa::path(
    delete,
    path = "/api/leads/{id}",
    tag = "Leads",
    params(("id" = i64, Path, description = "Lead id")),
    responses(
        (status = 200, description = "Lead deleted"),
        (status = 403, description = "Lead belongs to a different user"),
        (status = 404, description = "No lead with this id")
    ),
    security(("session_cookie" = []))
)]
pub async fn delete_lead(
    db: web::Data<Postgres>,
    user: AuthUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let lead_id = path.into_inner();
    log::info!("🗑️ DELETE /leads/{} - user: {}", lead_id, user.user_id);

    lead_service::delete_lead(&db, user.user_id, lead_id).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Lead deleted successfully"
    })))
}
