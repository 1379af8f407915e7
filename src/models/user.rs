use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role assigned at registration. Everyone signs up as USER; the column
/// is open for future values.
pub const ROLE_USER: &str = "USER";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public shape returned by `/api/user/me` — never includes the hash.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, utoipa::ToSchema)]
pub struct UserInfo {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: String,
}
