mod api;
mod config;
mod database;
mod jobs;
mod middleware;
mod models;
mod services;
mod utils;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::services::email_service::{Mailer, SmtpMailer};
use crate::utils::cache::OtpCache;
use crate::utils::error::AppError;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = config::Config::from_env();
    utils::error::mask_server_errors(config.is_production());

    log::info!("🚀 Starting LeadFlow Service...");
    log::info!("🌍 Environment: {}", config.app_env);

    // Connect to Postgres and run migrations
    let db = database::Postgres::new(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");
    log::info!("✅ Postgres connected successfully");

    // SMTP transport for OTP delivery
    let mailer: Arc<dyn Mailer> = Arc::new(
        SmtpMailer::new(&config.smtp).expect("Failed to configure SMTP mailer"),
    );

    // One-time code cache, swept in the background
    let otp_cache = web::Data::new(OtpCache::new());
    jobs::cache_sweeper::start_cache_sweeper(otp_cache.clone().into_inner());

    let db_data = web::Data::new(db);
    let config_data = web::Data::new(config.clone());
    let mailer_data: web::Data<dyn Mailer> = web::Data::from(mailer);

    log::info!("🌐 Server starting on {}:{}", config.host, config.port);
    log::info!(
        "📚 Swagger UI available at: http://{}:{}/swagger-ui/",
        config.host,
        config.port
    );

    let client_uri = config.client_uri.clone();
    let bind_addr = format!("{}:{}", config.host, config.port);

    // Start HTTP server
    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&client_uri)
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .supports_credentials()
            .max_age(3600);

        // Malformed JSON bodies render through the same envelope
        let json_config = web::JsonConfig::default().error_handler(|err, _req| {
            AppError::BadRequest(err.to_string()).into()
        });

        // Generate OpenAPI specification
        let openapi = api::swagger::ApiDoc::openapi();

        App::new()
            .app_data(db_data.clone())
            .app_data(config_data.clone())
            .app_data(otp_cache.clone())
            .app_data(mailer_data.clone())
            .app_data(json_config)
            .wrap(cors)
            .wrap(middleware::SecurityHeaders)
            .wrap(Logger::default())
            // Swagger UI
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", openapi.clone()),
            )
            // Health check
            .route("/health", web::get().to(api::health::health_check))
            // Auth endpoints (no session required)
            .service(
                web::scope("/api/auth")
                    .route("/send-otp", web::post().to(api::auth::send_otp))
                    .route("/create-user", web::post().to(api::auth::create_user))
                    .route("/login", web::post().to(api::auth::login))
                    .route("/forgot-password", web::post().to(api::auth::forgot_password))
                    .route("/reset-password", web::post().to(api::auth::reset_password)),
            )
            // Current user (session cookie required)
            .service(
                web::scope("/api/user")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("/me", web::get().to(api::user::me))
                    .route("/logout", web::post().to(api::user::logout)),
            )
            // Leads CRUD (session cookie required)
            .service(
                web::scope("/api/leads")
                    .wrap(middleware::auth::AuthMiddleware)
                    .route("/add-lead", web::post().to(api::leads::add_lead))
                    .route("/get-leads", web::get().to(api::leads::get_leads))
                    .route("/{id}", web::put().to(api::leads::update_lead))
                    .route("/{id}", web::delete().to(api::leads::delete_lead)),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
