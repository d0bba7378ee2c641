//! Process settings read from the environment (and `.env` via dotenvy).

use crate::error::ConfigError;
use std::net::SocketAddr;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_DATABASE_URL: &str = "postgres://localhost/sih_erp";
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,https://localhost:5173";
/// Request bodies above this size are rejected with 413.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Where entity rows live.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    Memory,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub max_connections: u32,
    pub cors_origins: Vec<String>,
    pub storage: StorageKind,
    /// Create missing tables from the catalog at startup.
    pub run_migrations: bool,
    pub body_limit: usize,
}

impl Settings {
    /// Load `.env` from the working directory when present, then read the environment.
    /// Call before installing the tracing subscriber so `RUST_LOG` from `.env` applies.
    pub fn load() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(ConfigError::Load(format!(".env: {}", e))),
        }
        Self::from_env()
    }

    /// Read settings from the process environment only.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` over an arbitrary lookup; lets tests supply variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.into());
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.into())
            .parse()
            .map_err(|e| ConfigError::Load(format!("BIND_ADDR: {}", e)))?;
        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::Load(format!("DB_MAX_CONNECTIONS: not a number: {}", v)))?,
            None => 5,
        };
        let cors_origins = lookup("CORS_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let storage = match lookup("ERP_STORAGE").as_deref().map(str::to_ascii_lowercase).as_deref() {
            None | Some("postgres") | Some("pg") => StorageKind::Postgres,
            Some("memory") => StorageKind::Memory,
            Some(other) => return Err(ConfigError::Load(format!("ERP_STORAGE: unknown storage '{}'", other))),
        };
        let run_migrations = lookup("RUN_MIGRATIONS")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(true);
        let body_limit = match lookup("BODY_LIMIT_BYTES") {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::Load(format!("BODY_LIMIT_BYTES: not a number: {}", v)))?,
            None => DEFAULT_BODY_LIMIT,
        };
        Ok(Settings {
            database_url,
            bind_addr,
            max_connections,
            cors_origins,
            storage,
            run_migrations,
            body_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Settings::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults() {
        let s = settings(&[]).unwrap();
        assert_eq!(s.bind_addr.port(), 5000);
        assert_eq!(s.max_connections, 5);
        assert_eq!(s.storage, StorageKind::Postgres);
        assert_eq!(s.cors_origins.len(), 2);
        assert!(s.run_migrations);
    }

    #[test]
    fn overrides() {
        let s = settings(&[
            ("ERP_STORAGE", "memory"),
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("CORS_ORIGINS", "https://erp.example.edu"),
            ("RUN_MIGRATIONS", "false"),
        ])
        .unwrap();
        assert_eq!(s.storage, StorageKind::Memory);
        assert_eq!(s.bind_addr.port(), 8080);
        assert_eq!(s.cors_origins, vec!["https://erp.example.edu".to_string()]);
        assert!(!s.run_migrations);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(settings(&[("DB_MAX_CONNECTIONS", "many")]).is_err());
        assert!(settings(&[("ERP_STORAGE", "sqlite")]).is_err());
        assert!(settings(&[("BIND_ADDR", "nowhere")]).is_err());
    }
}
