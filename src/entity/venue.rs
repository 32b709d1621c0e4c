//! Venue entity - 场地表
//!
//! 表名: meetup_venue, 归属于唯一的群组

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meetup_venue")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(indexed)]
    pub group_id: i64,

    #[sea_orm(column_type = "String(Some(128))")]
    pub address: String,

    #[sea_orm(column_type = "String(Some(64))")]
    pub city: String,

    #[sea_orm(column_type = "String(Some(64))")]
    pub state: String,

    pub lat: f64,

    pub lng: f64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueFields {
    pub address: String,
    pub city: String,
    pub state: String,
    pub lat: f64,
    pub lng: f64,
}
