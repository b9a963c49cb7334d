pub mod bootstrap;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;
pub mod service;
pub mod types;

pub use error::{BootstrapError, StoreError, UserError};
pub use service::UserService;
