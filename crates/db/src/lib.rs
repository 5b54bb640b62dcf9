//! `db` crate — Postgres persistence layer.
//!
//! Provides a connection pool, the embedded schema, typed row structs,
//! repository functions, and [`PgStore`], which implements the `store`
//! traits on top of them. No business logic lives here.

pub mod error;
pub mod pool;
pub mod repository;
pub mod models;
pub mod pg_store;

pub use pool::DbPool;
pub use error::DbError;
pub use pg_store::PgStore;
