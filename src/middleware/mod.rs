pub mod auth;

pub use auth::{identity_layer, Caller, CurrentUser, SESSION_USER_KEY};
