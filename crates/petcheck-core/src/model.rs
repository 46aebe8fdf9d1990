//! Pet resource as exchanged with the `/pet` endpoints

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a pet. Serialized lowercase, matched case-sensitively.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PetStatus {
    #[default]
    Available,
    Pending,
    Sold,
}

impl PetStatus {
    /// Every status, in the order the filter step queries them.
    pub const ALL: [Self; 3] = [Self::Available, Self::Pending, Self::Sold];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Pending => "pending",
            Self::Sold => "sold",
        }
    }
}

impl std::fmt::Display for PetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

impl Category {
    #[must_use]
    pub fn to_json(&self) -> Value {
        id_name(self.id, &self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

impl Tag {
    #[must_use]
    pub fn to_json(&self) -> Value {
        id_name(self.id, &self.name)
    }
}

fn id_name(id: i64, name: &str) -> Value {
    let mut obj = Map::new();
    obj.insert("id".into(), Value::from(id));
    obj.insert("name".into(), Value::from(name));
    Value::Object(obj)
}

/// A pet record. `id` is caller-assigned and must be echoed unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pet {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub name: String,
    pub photo_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    pub status: PetStatus,
}

impl Pet {
    /// JSON body for create/update requests, in the same form serde writes.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut obj = Map::new();
        obj.insert("id".into(), Value::from(self.id));
        if let Some(category) = &self.category {
            obj.insert("category".into(), category.to_json());
        }
        obj.insert("name".into(), Value::from(self.name.as_str()));
        obj.insert("photoUrls".into(), Value::from(self.photo_urls.clone()));
        if let Some(tags) = &self.tags {
            obj.insert("tags".into(), tags.iter().map(Tag::to_json).collect());
        }
        obj.insert("status".into(), Value::from(self.status.as_str()));
        Value::Object(obj)
    }
}
