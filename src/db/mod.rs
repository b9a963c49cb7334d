//! Database module: the persistence gateway for user records.
//!
//! Layout:
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)
//! - `sqlite.rs`: pool construction and the SQLite gateway
//! - `traits.rs`: the gateway contract the service depends on

pub mod models;
pub mod schema;
pub mod sqlite;
pub mod traits;

pub use models::{DbUser, NewUser};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, UserStorage, connect};
pub use traits::UserGateway;
