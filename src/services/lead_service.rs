// ==================== LEAD CRUD ====================
// All operations are scoped to the authenticated owner. Update and
// delete distinguish "not found" (no such id) from "forbidden" (id
// exists but belongs to someone else).

use crate::{
    database::Postgres,
    models::{Lead, LeadPayload},
    utils::error::AppError,
};
use serde::Serialize;

const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 100;

/// One page of leads plus the pagination bookkeeping the client renders.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct LeadPage {
    pub data: Vec<Lead>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

/// Clamps page to >= 1 and limit into [1, 100].
fn clamp_pagination(page: Option<i64>, limit: Option<i64>) -> (i64, i64) {
    let page = page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    (page, limit)
}

fn total_pages(total: i64, limit: i64) -> i64 {
    (total + limit - 1) / limit
}

/// Rows to skip. Saturates so an absurd `?page=` value degrades to an
/// empty page instead of overflowing into a negative OFFSET.
fn page_offset(page: i64, limit: i64) -> i64 {
    (page - 1).saturating_mul(limit)
}

async fn find_owner_lead_by_email(
    db: &Postgres,
    user_id: i64,
    email: &str,
) -> Result<Option<i64>, AppError> {
    let id: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM leads WHERE user_id = $1 AND email = $2")
            .bind(user_id)
            .bind(email)
            .fetch_optional(db.pool())
            .await?;
    Ok(id.map(|(id,)| id))
}

/// Loads a lead by id alone, then checks ownership, so the caller can
/// tell 404 and 403 apart.
async fn load_owned_lead(db: &Postgres, user_id: i64, lead_id: i64) -> Result<Lead, AppError> {
    let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE id = $1")
        .bind(lead_id)
        .fetch_optional(db.pool())
        .await?
        .ok_or_else(|| AppError::NotFound("Lead not found".to_string()))?;

    if lead.user_id != user_id {
        return Err(AppError::Forbidden("Forbidden".to_string()));
    }
    Ok(lead)
}

pub async fn create_lead(
    db: &Postgres,
    user_id: i64,
    payload: &LeadPayload,
) -> Result<(), AppError> {
    if find_owner_lead_by_email(db, user_id, &payload.email)
        .await?
        .is_some()
    {
        return Err(AppError::BadRequest(
            "Lead with this email already exists".to_string(),
        ));
    }

    sqlx::query(
        "INSERT INTO leads (user_id, first_name, last_name, email, phone, company, city, state, \
         source, status, score, lead_value, is_qualified, last_activity_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
    )
    .bind(user_id)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.company)
    .bind(&payload.city)
    .bind(&payload.state)
    .bind(payload.source)
    .bind(payload.status)
    .bind(payload.score)
    .bind(payload.lead_value)
    .bind(payload.is_qualified)
    .bind(payload.last_activity_at)
    .execute(db.pool())
    .await?;

    Ok(())
}

pub async fn get_leads(
    db: &Postgres,
    user_id: i64,
    page: Option<i64>,
    limit: Option<i64>,
) -> Result<LeadPage, AppError> {
    let (page, limit) = clamp_pagination(page, limit);
    let offset = page_offset(page, limit);

    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leads WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db.pool())
        .await?;

    let leads = sqlx::query_as::<_, Lead>(
        "SELECT * FROM leads WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db.pool())
    .await?;

    Ok(LeadPage {
        data: leads,
        page,
        limit,
        total,
        total_pages: total_pages(total, limit),
    })
}

pub async fn update_lead(
    db: &Postgres,
    user_id: i64,
    lead_id: i64,
    payload: &LeadPayload,
) -> Result<(), AppError> {
    let existing = load_owned_lead(db, user_id, lead_id).await?;

    // Moving the lead onto an email the owner already uses elsewhere is
    // the same uniqueness violation as on create.
    if payload.email != existing.email
        && find_owner_lead_by_email(db, user_id, &payload.email)
            .await?
            .is_some()
    {
        return Err(AppError::BadRequest(
            "Lead with this email already exists".to_string(),
        ));
    }

    sqlx::query(
        "UPDATE leads SET first_name = $1, last_name = $2, email = $3, phone = $4, \
         company = $5, city = $6, state = $7, source = $8, status = $9, score = $10, \
         lead_value = $11, is_qualified = $12, last_activity_at = $13, updated_at = now() \
         WHERE id = $14",
    )
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.phone)
    .bind(&payload.company)
    .bind(&payload.city)
    .bind(&payload.state)
    .bind(payload.source)
    .bind(payload.status)
    .bind(payload.score)
    .bind(payload.lead_value)
    .bind(payload.is_qualified)
    .bind(payload.last_activity_at)
    .bind(lead_id)
    .execute(db.pool())
    .await?;

    Ok(())
}

pub async fn delete_lead(db: &Postgres, user_id: i64, lead_id: i64) -> Result<(), AppError> {
    load_owned_lead(db, user_id, lead_id).await?;

    sqlx::query("DELETE FROM leads WHERE id = $1")
        .bind(lead_id)
        .execute(db.pool())
        .await?;

    Ok(())
}
