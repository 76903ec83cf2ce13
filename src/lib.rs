//! People app: a small service that demonstrates zero-downtime rolling deploys.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod store;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::{DrainCoordinator, Service, ShutdownRequest, ShutdownState};
pub use store::{MemoryStore, PeopleStore, PostgresStore};
