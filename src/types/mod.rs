pub mod users;

pub use users::{SignUpRequest, UserView};
