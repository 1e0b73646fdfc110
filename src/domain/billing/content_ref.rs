//! Reference to a purchasable piece of content.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ContentId;

/// Kind of paid content a purchase grants access to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Set,
    Course,
}

impl ItemType {
    /// Returns the stored discriminant string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Set => "set",
            ItemType::Course => "course",
        }
    }

    /// Parses a stored discriminant string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "set" => Some(ItemType::Set),
            "course" => Some(ItemType::Course),
            _ => None,
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Exactly one of a set id or a course id, with its discriminant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum ContentRef {
    Set { set_id: ContentId },
    Course { course_id: ContentId },
}

impl ContentRef {
    /// Creates a reference to a paid exercise set.
    pub fn set(id: ContentId) -> Self {
        ContentRef::Set { set_id: id }
    }

    /// Creates a reference to a paid course.
    pub fn course(id: ContentId) -> Self {
        ContentRef::Course { course_id: id }
    }

    /// Returns the discriminant.
    pub fn item_type(&self) -> ItemType {
        match self {
            ContentRef::Set { .. } => ItemType::Set,
            ContentRef::Course { .. } => ItemType::Course,
        }
    }

    /// Returns the referenced content id regardless of kind.
    pub fn content_id(&self) -> &ContentId {
        match self {
            ContentRef::Set { set_id } => set_id,
            ContentRef::Course { course_id } => course_id,
        }
    }
}
