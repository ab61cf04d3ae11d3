//! Entry point entity
//!
//! An entry point is one public base URL through which consumers reach the
//! platform, classified by a set of tags (environment, audience, ...).

use serde::{Deserialize, Serialize};

use crate::tags::same_tag_set;
use crate::types::{EntryPointId, Tags};

/// Public entity shape of an entry point
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    /// Unique identifier, assigned at creation
    pub id: EntryPointId,

    /// Address of the entry point
    pub value: String,

    /// Classification tags, in insertion order
    #[serde(default)]
    pub tags: Tags,
}

impl EntryPoint {
    /// Create an entry point from its parts
    pub fn new(id: EntryPointId, value: impl Into<String>, tags: Tags) -> Self {
        Self {
            id,
            value: value.into(),
            tags,
        }
    }

    /// Whether this entry point carries the given tag set (order-insensitive)
    pub fn has_tag_set(&self, tags: &[String]) -> bool {
        same_tag_set(&self.tags, tags)
    }

    /// Project this entry point for the public portal
    pub fn into_portal(self) -> PortalEntryPoint {
        PortalEntryPoint::from(self)
    }
}

/// Entry point as shown on the public portal, without its identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalEntryPoint {
    /// Address of the entry point
    pub value: String,

    /// Classification tags
    #[serde(default)]
    pub tags: Tags,
}

impl From<EntryPoint> for PortalEntryPoint {
    fn from(entry_point: EntryPoint) -> Self {
        Self {
            value: entry_point.value,
            tags: entry_point.tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> EntryPoint {
        EntryPoint::new(
            EntryPointId::from("123"),
            "https://api.mycompany.com",
            vec!["private".to_string(), "product".to_string()],
        )
    }

    #[test]
    fn test_has_tag_set() {
        let entry_point = sample();
        assert!(entry_point.has_tag_set(&["product".to_string(), "private".to_string()]));
        assert!(!entry_point.has_tag_set(&["product".to_string()]));
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "123",
                "value": "https://api.mycompany.com",
                "tags": ["private", "product"]
            })
        );
    }

    #[test]
    fn test_portal_projection_strips_id() {
        let portal = sample().into_portal();
        let json = serde_json::to_value(&portal).unwrap();
        assert!(json.get("id").is_none());
        assert_eq!(portal.value, "https://api.mycompany.com");
        assert_eq!(portal.tags.len(), 2);
    }
}
