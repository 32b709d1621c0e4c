//! GroupMembership entity - 群组成员关系表
//!
//! 表名: meetup_group_membership, (user_id, group_id) 唯一

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum MembershipStatus {
    /// Join request awaiting an organizer/co-host decision
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "active")]
    Active,
}

/// Role inside a group. Only meaningful while the membership is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "kebab-case")]
pub enum MemberRole {
    #[sea_orm(string_value = "member")]
    Member,
    #[sea_orm(string_value = "co-host")]
    CoHost,
    #[sea_orm(string_value = "organizer")]
    Organizer,
}

impl MemberRole {
    /// Privilege rank: member < co-host < organizer
    pub fn privilege(self) -> u8 {
        match self {
            MemberRole::Member => 1,
            MemberRole::CoHost => 2,
            MemberRole::Organizer => 3,
        }
    }

    pub fn at_least(self, required: MemberRole) -> bool {
        self.privilege() >= required.privilege()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meetup_group_membership")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(indexed)]
    pub user_id: i64,

    #[sea_orm(indexed)]
    pub group_id: i64,

    pub status: MembershipStatus,

    pub role: MemberRole,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_privilege_order() {
        assert!(MemberRole::Organizer.at_least(MemberRole::CoHost));
        assert!(MemberRole::CoHost.at_least(MemberRole::Member));
        assert!(!MemberRole::Member.at_least(MemberRole::CoHost));
        assert!(!MemberRole::CoHost.at_least(MemberRole::Organizer));
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(serde_json::to_string(&MemberRole::CoHost).unwrap(), "\"co-host\"");
        let role: MemberRole = serde_json::from_str("\"organizer\"").unwrap();
        assert_eq!(role, MemberRole::Organizer);
    }
}
