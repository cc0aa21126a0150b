#![cfg(test)]
use configs::DatabaseConfig;
use sea_orm::DatabaseConnection;

/// Fresh, migrated in-memory SQLite database; each call is isolated.
pub async fn get_db() -> Result<DatabaseConnection, anyhow::Error> {
    let cfg = DatabaseConfig { url: "sqlite::memory:".into(), ..Default::default() };
    let db = models::db::connect_with_config(&cfg).await?;
    models::db::migrate(&db).await?;
    Ok(db)
}
