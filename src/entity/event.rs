//! Event entity - 活动表
//!
//! 表名: meetup_event, 场地可选

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meetup_event")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(indexed)]
    pub group_id: i64,

    #[sea_orm(nullable)]
    pub venue_id: Option<i64>,

    #[sea_orm(column_type = "String(Some(60))")]
    pub name: String,

    #[sea_orm(column_name = "type", column_type = "String(Some(32))")]
    #[serde(rename = "type")]
    pub kind: String,

    pub capacity: i32,

    /// Unused by the core beyond storage
    pub price: f64,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    pub start_date: DateTimeUtc,

    pub end_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFields {
    #[serde(default)]
    pub venue_id: Option<i64>,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub capacity: i32,
    pub price: f64,
    pub description: String,
    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
}
