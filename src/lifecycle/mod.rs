//! Resource lifecycle
//!
//! Every operation runs the same pipeline: resolve the resource path (NotFound),
//! authorize against the caller's membership, then apply the mutation and any
//! state-machine step in a single store call.

mod attendees;
mod manager;
mod members;

pub use attendees::{AttendanceView, AttendeeView};
pub use manager::LifecycleManager;
pub use members::MemberView;

#[cfg(test)]
mod tests;
