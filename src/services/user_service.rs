use crate::{
    database::Postgres,
    models::UserInfo,
    utils::error::AppError,
};

/// Loads the public profile for the session identity. 404 covers the
/// edge where the account vanished after the token was issued.
pub async fn get_current_user(db: &Postgres, user_id: i64) -> Result<UserInfo, AppError> {
    sqlx::query_as::<_, UserInfo>("SELECT id, name, email, role FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(db.pool())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}
