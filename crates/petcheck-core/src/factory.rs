//! Test pet generation
//!
//! A pet is built from a fixed template, then the caller's overrides replace
//! whole top-level fields. Given the same clock reading and random source the
//! output is identical.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::model::{Category, Pet, PetStatus, Tag};

/// Upper bound (exclusive) of the random offset added to the clock reading.
pub const ID_OFFSET_RANGE: i64 = 1_000_000;

/// Top-level fields to replace in the generated template.
///
/// Nested values are not merged: `category = Some(..)` replaces the whole
/// default category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PetOverrides {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub photo_urls: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<Tag>>,
    #[serde(default)]
    pub status: Option<PetStatus>,
}

impl PetOverrides {
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: PetStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Generate a pet from the system clock and an entropy-seeded generator.
#[must_use]
pub fn generate(overrides: PetOverrides) -> Pet {
    let now_ms = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0);
    let mut rng = SmallRng::from_entropy();
    generate_with(overrides, now_ms, &mut rng)
}

/// Deterministic core of [`generate`].
#[must_use]
pub fn generate_with(overrides: PetOverrides, now_ms: i64, rng: &mut impl Rng) -> Pet {
    let offset = rng.gen_range(0..ID_OFFSET_RANGE);
    let template = Pet {
        id: now_ms.saturating_add(offset),
        category: Some(Category {
            id: 1,
            name: "Dogs".to_string(),
        }),
        name: format!("TestPet_{now_ms}"),
        photo_urls: vec![
            "https://example.com/photo1.jpg".to_string(),
            "https://example.com/photo2.jpg".to_string(),
        ],
        tags: Some(vec![
            Tag {
                id: 1,
                name: "friendly".to_string(),
            },
            Tag {
                id: 2,
                name: "vaccinated".to_string(),
            },
        ]),
        status: PetStatus::Available,
    };

    Pet {
        id: overrides.id.unwrap_or(template.id),
        category: overrides.category.or(template.category),
        name: overrides.name.unwrap_or(template.name),
        photo_urls: overrides.photo_urls.unwrap_or(template.photo_urls),
        tags: overrides.tags.or(template.tags),
        status: overrides.status.unwrap_or(template.status),
    }
}
