use sqlx::{Pool, Postgres, postgres::PgPoolOptions};
use anyhow::Result;

pub type DbPool = Pool<Postgres>;

/// Config lookups are short point reads, so a small pool suffices.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    Ok(pool)
}

pub async fn migrate(pool: &DbPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
