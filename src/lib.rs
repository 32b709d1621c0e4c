//! Meetup - community groups, venues, events and their attendees
//!
//! The core of this crate is the resource-hierarchy authorization engine
//! ([`permission`]) together with the membership and attendance state machines
//! ([`membership`], [`attendance`]), driven by the [`lifecycle`] manager over
//! an entity [`store`].

pub mod attendance;
pub mod config;
pub mod db;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod membership;
pub mod middleware;
pub mod permission;
pub mod routes;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use state::AppState;
