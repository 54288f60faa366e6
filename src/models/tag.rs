use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::FieldErrors;

static HEX_COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid color pattern"));
static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-a-zA-Z0-9_]+$").expect("valid slug pattern"));

pub const MAX_TAG_FIELD_LEN: usize = 200;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub color: Option<String>,
    pub slug: String,
}

#[derive(Debug, Clone)]
pub struct NewTag {
    pub name: String,
    pub color: Option<String>,
    pub slug: String,
}

impl NewTag {
    pub fn new(name: &str, color: Option<&str>, slug: &str) -> Self {
        Self {
            name: name.trim().to_string(),
            color: color.map(|c| c.trim().to_string()).filter(|c| !c.is_empty()),
            slug: slug.trim().to_string(),
        }
    }

    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();

        if self.name.is_empty() {
            errors.add("name", "This field may not be blank.");
        } else if self.name.chars().count() > MAX_TAG_FIELD_LEN {
            errors.add("name", "Ensure this field has no more than 200 characters.");
        }

        if let Some(color) = &self.color {
            if !HEX_COLOR_RE.is_match(color) {
                errors.add("color", "Color must be a HEX code like #E26C2D.");
            }
        }

        if self.slug.chars().count() > MAX_TAG_FIELD_LEN {
            errors.add("slug", "Ensure this field has no more than 200 characters.");
        } else if !SLUG_RE.is_match(&self.slug) {
            errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        }

        errors
    }
}
