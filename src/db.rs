use anyhow::Context;
use sqlx::MySqlPool;
use tracing::info;

/// Connects to MySQL and brings the schema up to date.
pub async fn init_db(database_url: &str) -> anyhow::Result<MySqlPool> {
    let pool = MySqlPool::connect(database_url)
        .await
        .context("Failed to connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;
    info!("Database ready");

    Ok(pool)
}
