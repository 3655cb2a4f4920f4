pub mod auth;
pub mod identity;
pub mod jwt;
pub mod password;

pub use auth::AuthenticatedUser;
pub use identity::{Requester, Role};
