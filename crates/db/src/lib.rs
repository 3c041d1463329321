use std::time::Duration;

use db_migration::Migrator;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use utils_assets::assets::asset_dir;

pub mod entities;
pub mod models;
mod retry;
pub mod types;

pub use sea_orm::{DbErr, TransactionTrait};

pub type DbPool = DatabaseConnection;

const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Clone)]
pub struct DBService {
    pub pool: DbPool,
}

impl DBService {
    /// Connects to `DATABASE_URL`, falling back to the SQLite file in the asset
    /// directory, and brings the schema up to date.
    pub async fn new() -> Result<DBService, DbErr> {
        Self::new_with_url(&database_url()).await
    }

    pub async fn new_with_url(database_url: &str) -> Result<DBService, DbErr> {
        let mut options = ConnectOptions::new(database_url.to_string());
        options
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(30))
            .sqlx_logging(false);
        let pool = Database::connect(options).await?;
        Migrator::up(&pool, None).await?;
        tracing::debug!("Database migrations applied");
        Ok(DBService { pool })
    }
}

fn database_url() -> String {
    match std::env::var(DATABASE_URL_ENV) {
        Ok(url) if !url.trim().is_empty() => url.trim().to_string(),
        _ => format!(
            "sqlite://{}?mode=rwc",
            asset_dir().join("db.sqlite").to_string_lossy()
        ),
    }
}
