//! Image entity - 图片表
//!
//! 表名: meetup_image, group_id / event_id / venue_id 恰好一个非空

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "meetup_image")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(column_type = "Text")]
    pub url: String,

    pub preview: bool,

    #[sea_orm(nullable, indexed)]
    pub group_id: Option<i64>,

    #[sea_orm(nullable, indexed)]
    pub event_id: Option<i64>,

    #[sea_orm(nullable, indexed)]
    pub venue_id: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn owner(&self) -> Option<ImageOwner> {
        ImageOwner::from_refs(self.group_id, self.event_id, self.venue_id).ok()
    }
}

/// The single resource an image is attached to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageOwner {
    Group(i64),
    Event(i64),
    Venue(i64),
}

impl ImageOwner {
    /// Exactly one reference must be set
    pub fn from_refs(
        group_id: Option<i64>,
        event_id: Option<i64>,
        venue_id: Option<i64>,
    ) -> AppResult<Self> {
        match (group_id, event_id, venue_id) {
            (Some(id), None, None) => Ok(ImageOwner::Group(id)),
            (None, Some(id), None) => Ok(ImageOwner::Event(id)),
            (None, None, Some(id)) => Ok(ImageOwner::Venue(id)),
            (None, None, None) => Err(AppError::Validation(
                "An image must reference a group, an event or a venue".to_string(),
            )),
            _ => Err(AppError::Validation(
                "An image can reference only one of group, event or venue".to_string(),
            )),
        }
    }

    /// Split back into (group_id, event_id, venue_id) columns
    pub fn refs(self) -> (Option<i64>, Option<i64>, Option<i64>) {
        match self {
            ImageOwner::Group(id) => (Some(id), None, None),
            ImageOwner::Event(id) => (None, Some(id), None),
            ImageOwner::Venue(id) => (None, None, Some(id)),
        }
    }
}

/// Image payload; owner references may come from the path or the body
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewImage {
    pub url: String,
    #[serde(default)]
    pub preview: bool,
    #[serde(default)]
    pub group_id: Option<i64>,
    #[serde(default)]
    pub event_id: Option<i64>,
    #[serde(default)]
    pub venue_id: Option<i64>,
}

impl NewImage {
    pub fn owner(&self) -> AppResult<ImageOwner> {
        ImageOwner::from_refs(self.group_id, self.event_id, self.venue_id)
    }

    /// Attach to `owner`, overwriting whatever references the body carried
    pub fn for_owner(url: String, preview: bool, owner: ImageOwner) -> Self {
        let (group_id, event_id, venue_id) = owner.refs();
        Self {
            url,
            preview,
            group_id,
            event_id,
            venue_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_owner() {
        assert_eq!(ImageOwner::from_refs(Some(1), None, None).unwrap(), ImageOwner::Group(1));
        assert_eq!(ImageOwner::from_refs(None, None, Some(4)).unwrap(), ImageOwner::Venue(4));
        assert!(matches!(
            ImageOwner::from_refs(None, Some(2), Some(3)),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            ImageOwner::from_refs(None, None, None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_new_image_body() {
        let img: NewImage =
            serde_json::from_str(r#"{"url":"https://x/y.png","eventId":7,"venueId":2}"#).unwrap();
        assert!(!img.preview);
        assert!(img.owner().is_err());
    }
}
