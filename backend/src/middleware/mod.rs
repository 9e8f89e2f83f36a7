pub mod auth;

pub use auth::{auth, auth_admin, AuthContext};
