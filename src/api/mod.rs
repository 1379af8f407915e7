pub mod auth;
pub mod health;
pub mod leads;
pub mod swagger;
pub mod user;
