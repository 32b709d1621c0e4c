//! Group entity - 群组表
//!
//! 表名: meetup_group

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a group is listed publicly
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[sea_orm(string_value = "public")]
    Public,
    #[sea_orm(string_value = "private")]
    Private,
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meetup_group")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// 创建者; 创建后不可修改
    #[sea_orm(indexed)]
    pub organizer_id: i64,

    #[sea_orm(column_type = "String(Some(60))")]
    pub name: String,

    #[sea_orm(column_type = "Text")]
    pub about: String,

    /// "Online" / "In person"
    #[sea_orm(column_name = "type", column_type = "String(Some(32))")]
    #[serde(rename = "type")]
    pub kind: String,

    pub visibility: Visibility,

    #[sea_orm(column_type = "String(Some(64))")]
    pub city: String,

    #[sea_orm(column_type = "String(Some(64))")]
    pub state: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

// 成员、场地、活动通过 Store 按外键查询

impl ActiveModelBehavior for ActiveModel {}

/// Editable group attributes, used for both create and update
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupFields {
    pub name: String,
    pub about: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub visibility: Visibility,
    pub city: String,
    pub state: String,
}
