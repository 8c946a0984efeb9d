//! Database module
//!
//! Database connection and schema checks.

use sqlx::PgPool;

/// Verify database connectivity.
/// The schema itself comes from the raw SQL files in migrations/.
pub async fn verify_connection(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;

    Ok(())
}

/// Check if required tables exist
pub async fn check_schema(pool: &PgPool) -> Result<bool, sqlx::Error> {
    let required_tables = ["rides"];

    for table in required_tables {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = 'public' AND table_name = $1
            )
            "#,
        )
        .bind(table)
        .fetch_one(pool)
        .await?;

        if !exists {
            tracing::error!("Required table '{}' does not exist", table);
            return Ok(false);
        }
    }

    let has_version: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM information_schema.columns
            WHERE table_schema = 'public' AND table_name = 'rides' AND column_name = 'version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !has_version {
        tracing::error!("Table 'rides' has no version column. Please run migrations.");
        return Ok(false);
    }

    Ok(true)
}
