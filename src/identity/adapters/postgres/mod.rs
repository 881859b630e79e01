//! `PostgreSQL` adapters for the identity store.

mod models;
mod repository;
pub(crate) mod schema;

pub use repository::PostgresUserRepository;
