use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LeadFlow API",
        version = "1.0.0",
        description = "Lead management backend. \n\n**Authentication:** Signup and password reset are verified with an emailed OTP; authenticated endpoints use an http-only session cookie set by `/api/auth/login`."
    ),
    paths(
        // Auth endpoints
        crate::api::auth::send_otp,
        crate::api::auth::create_user,
        crate::api::auth::login,
        crate::api::auth::forgot_password,
        crate::api::auth::reset_password,

        // User endpoints
        crate::api::user::me,
        crate::api::user::logout,

        // Lead endpoints
        crate::api::leads::add_lead,
        crate::api::leads::get_leads,
        crate::api::leads::update_lead,
        crate::api::leads::delete_lead,

        // Health
        crate::api::health::health_check,
    ),
    components(
        schemas(
            // Auth
            crate::services::auth_service::SendOtpRequest,
            crate::services::auth_service::RegisterRequest,
            crate::services::auth_service::LoginRequest,
            crate::services::auth_service::ForgotPasswordRequest,
            crate::services::auth_service::ResetPasswordRequest,

            // User
            crate::models::UserInfo,

            // Leads
            crate::models::Lead,
            crate::models::LeadPayload,
            crate::models::LeadSource,
            crate::models::LeadStatus,
            crate::services::lead_service::LeadPage,

            // Health
            crate::api::health::HealthResponse,
        )
    ),
    tags(
        (name = "Auth", description = "OTP-verified registration, login, and password reset."),
        (name = "User", description = "Session identity and logout."),
        (name = "Leads", description = "CRUD over the authenticated user's leads, with pagination."),
        (name = "Health", description = "Liveness check."),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("token"))),
            );
        }
    }
}
