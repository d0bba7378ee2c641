//! Database bootstrap: create the target database before the pool connects to it.

use crate::error::{AppError, ConfigError, RepositoryError};
use sqlx::ConnectOptions;
use std::str::FromStr;

/// Connect to the server's `postgres` database and create the one named in `database_url` if missing.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), AppError> {
    let (admin_url, db_name) = split_database_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)
        .map_err(|e| ConfigError::Load(format!("DATABASE_URL: {}", e)))?;
    let mut conn: sqlx::PgConnection = opts
        .connect()
        .await
        .map_err(|e| RepositoryError::from_sqlx("Failed to connect to database server", e))?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await
        .map_err(|e| RepositoryError::from_sqlx("Failed to look up database", e))?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE {}", crate::sql::quoted(&db_name)))
            .execute(&mut conn)
            .await
            .map_err(|e| RepositoryError::from_sqlx(format!("Failed to create database {}", db_name), e))?;
    }
    Ok(())
}

/// `(admin url pointing at "postgres", database name)`.
fn split_database_url(url: &str) -> Result<(String, String), ConfigError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| ConfigError::Load("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let mut parts = path_and_query.splitn(2, '?');
    let db_name = parts.next().unwrap_or("").trim().to_string();
    let query = parts.next().map(|q| format!("?{}", q)).unwrap_or_default();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres{}", base, query), db_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_name_and_keeps_query() {
        let (admin, name) = split_database_url("postgres://u:p@db:5432/sih_erp?sslmode=disable").unwrap();
        assert_eq!(name, "sih_erp");
        assert_eq!(admin, "postgres://u:p@db:5432/postgres?sslmode=disable");
    }

    #[test]
    fn url_without_path_is_rejected() {
        assert!(split_database_url("not-a-url").is_err());
    }
}
