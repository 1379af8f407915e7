use sqlx::postgres::{PgPool, PgPoolOptions};
use std::error::Error;
use std::time::Duration;

#[derive(Clone)]
pub struct Postgres {
    pool: PgPool,
}

impl Postgres {
    pub async fn new(url: &str) -> Result<Self, Box<dyn Error>> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(5)
            .idle_timeout(Duration::from_secs(300))
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;

        log::info!("🔧 Running database migrations...");
        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("   ✅ Migrations up to date");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}
