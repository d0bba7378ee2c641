//! SIH ERP: student-records backend. One entity catalog served over REST, SOAP and a realtime hub.

pub mod config;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod hub;
pub mod middleware;
pub mod migration;
pub mod repository;
pub mod response;
pub mod routes;
pub mod service;
pub mod soap;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{Catalog, Record, Settings, StorageKind};
pub use error::{AppError, ConfigError, RepositoryError};
pub use hub::Hub;
pub use migration::apply_migrations;
pub use repository::{EntityRepository, MemoryStore, PgProbe, StorageProbe};
pub use response::Envelope;
pub use routes::app;
pub use service::{EntityService, Registry};
pub use state::AppState;
pub use store::ensure_database_exists;
