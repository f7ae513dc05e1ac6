//! Prints the columns and indexes of the `leads` table.

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let database_url = env::var("DB_URL")
        .or_else(|_| env::var("DATABASE_URL"))
        .map_err(|_| anyhow::anyhow!("DB_URL or DATABASE_URL must be set"))?;
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    let columns: Vec<(String, String, String)> = sqlx::query_as(
        "SELECT column_name, data_type, is_nullable FROM information_schema.columns WHERE table_name = $1 ORDER BY ordinal_position",
    )
    .bind("leads")
    .fetch_all(&pool)
    .await?;

    if columns.is_empty() {
        println!("Table 'leads' not found. Start the server with RUN_MIGRATIONS=true to create it.");
        return Ok(());
    }

    println!("leads columns:");
    for (col, type_, nullable) in columns {
        println!("  - {}: {} (nullable: {})", col, type_, nullable);
    }

    let indexes: Vec<(String, String)> =
        sqlx::query_as("SELECT indexname, indexdef FROM pg_indexes WHERE tablename = $1 ORDER BY indexname")
            .bind("leads")
            .fetch_all(&pool)
            .await?;

    println!();
    println!("leads indexes:");
    for (name, def) in indexes {
        println!("  - {}: {}", name, def);
    }

    Ok(())
}
