// src/db.rs - Database migrations and setup
use sqlx::SqlitePool;
use anyhow::Result;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(pool)
        .await?;

    // Ids are assigned by the caller, never by SQLite
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS medicines (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL CHECK(length(name) > 0 AND length(name) <= 255),
            quantity INTEGER NOT NULL CHECK(quantity >= 0),
            price REAL NOT NULL CHECK(price >= 0)
        )
        "#,
    )
        .execute(pool)
        .await?;

    create_indexes(pool).await?;

    log::info!("Database migrations completed");
    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_medicines_name ON medicines(name COLLATE NOCASE)",
        "CREATE INDEX IF NOT EXISTS idx_medicines_quantity ON medicines(quantity)",
    ];

    for index_sql in indexes {
        sqlx::query(index_sql).execute(pool).await?;
    }

    Ok(())
}
