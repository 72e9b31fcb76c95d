use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::env;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL")
        .context("DATABASE_URL environment variable is required")?;

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("up");

    match command {
        "up" => {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to apply migrations")?;
            info!("Database migrations completed successfully");
        }
        "status" => show_migration_status(&pool).await?,
        _ => {
            eprintln!("Usage: migrate [up|status]");
            eprintln!("  up      - Run all pending migrations (default)");
            eprintln!("  status  - Show applied and pending migrations");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn show_migration_status(pool: &sqlx::PgPool) -> Result<()> {
    let migrator = sqlx::migrate!("./migrations");

    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = 'public' AND table_name = '_sqlx_migrations'
        )
        "#,
    )
    .fetch_one(pool)
    .await
    .context("Failed to check migrations table")?;

    let applied: Vec<i64> = if table_exists {
        sqlx::query_scalar("SELECT version FROM _sqlx_migrations WHERE success = TRUE ORDER BY version")
            .fetch_all(pool)
            .await
            .context("Failed to fetch applied migrations")?
    } else {
        Vec::new()
    };

    for migration in migrator.iter() {
        let state = if applied.contains(&migration.version) { "applied" } else { "pending" };
        info!("  {} {} ({})", migration.version, migration.description, state);
    }

    Ok(())
}
