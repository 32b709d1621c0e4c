//! Entity module - SeaORM 实体定义
//!
//! 包含所有数据库表对应的实体模型

pub mod event;
pub mod event_attendance;
pub mod group;
pub mod group_membership;
pub mod image;
pub mod user;
pub mod venue;

/// User identifier as stored in every foreign key
pub type UserId = i64;
