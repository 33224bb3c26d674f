use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::{Pool, Postgres};

pub mod memory;
pub mod queries;
pub mod store;

pub use memory::MemoryStore;
pub use store::{IncidentStore, PgIncidentStore, StoreError};

pub type DbPool = Pool<Postgres>;

pub async fn init_pool(database_url: &str) -> Result<DbPool> {
    // One run issues strictly sequential statements.
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn ensure_schema(pool: &DbPool) -> Result<()> {
    sqlx::query(queries::CREATE_INCIDENTS_TABLE)
        .execute(pool)
        .await
        .context("creating ncdot_incidents table")?;
    sqlx::query(queries::CREATE_STATUS_INDEX)
        .execute(pool)
        .await
        .context("creating ncdot_incidents status index")?;
    Ok(())
}
