pub mod auth_service;
pub mod email_service;
pub mod lead_service;
pub mod token_service;
pub mod user_service;
