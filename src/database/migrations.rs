use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    create_employees_table(pool).await?;
    create_work_sessions_table(pool).await?;
    create_breaks_table(pool).await?;
    create_location_samples_table(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}

async fn create_employees_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            id INTEGER PRIMARY KEY,
            login_handle TEXT UNIQUE NOT NULL,
            display_name TEXT NOT NULL,
            credential TEXT,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_work_sessions_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS work_sessions (
            id BLOB PRIMARY KEY,
            employee_id INTEGER NOT NULL,
            clock_in DATETIME NOT NULL,
            clock_out DATETIME,
            clock_in_location TEXT NOT NULL,
            clock_out_location TEXT,
            total_hours REAL NOT NULL DEFAULT 0,
            FOREIGN KEY (employee_id) REFERENCES employees (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // At most one open session per employee.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_work_sessions_one_open
        ON work_sessions (employee_id) WHERE clock_out IS NULL
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_work_sessions_employee_clock_in
        ON work_sessions (employee_id, clock_in)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_breaks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS breaks (
            id BLOB PRIMARY KEY,
            session_id BLOB NOT NULL,
            start_time DATETIME NOT NULL,
            end_time DATETIME,
            FOREIGN KEY (session_id) REFERENCES work_sessions (id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_location_samples_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS location_samples (
            id BLOB PRIMARY KEY,
            session_id BLOB NOT NULL,
            recorded_at DATETIME NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            address TEXT NOT NULL,
            FOREIGN KEY (session_id) REFERENCES work_sessions (id) ON DELETE CASCADE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
