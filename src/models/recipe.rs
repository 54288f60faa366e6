use std::collections::HashSet;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::FieldErrors;

pub const MAX_RECIPE_NAME_LEN: usize = 200;
/// Upper bound for ingredient amounts and cooking time, so that summing a
/// whole cart stays well inside `i64`.
pub const MAX_QUANTITY: i64 = i32::MAX as i64;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub id: i64,
    pub author_id: i64,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i64,
    pub pub_date: String,
}

/// Fixed-width UTC timestamp so that `ORDER BY pub_date` sorts chronologically.
pub fn pub_date_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngredientAmount {
    pub id: i64,
    pub amount: i64,
}

/// Body of recipe create (all fields required) and update (any subset).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeInput {
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<i64>>,
    pub image: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    pub cooking_time: Option<i64>,
}

/// A create body with every field present.
#[derive(Debug, Clone)]
pub struct NewRecipe {
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i64>,
    pub image: String,
    pub name: String,
    pub text: String,
    pub cooking_time: i64,
}

const REQUIRED: &str = "This field is required.";
const BLANK: &str = "This field may not be blank.";

fn check_text(errors: &mut FieldErrors, field: &str, value: &Option<String>, partial: bool) {
    match value {
        None if !partial => errors.add(field, REQUIRED),
        None => {}
        Some(v) if v.trim().is_empty() => errors.add(field, BLANK),
        Some(_) => {}
    }
}

impl RecipeInput {
    /// Checks that need no database access. With `partial` set, absent fields
    /// are accepted and left unchanged by the update.
    pub fn validate(&self, partial: bool) -> FieldErrors {
        let mut errors = FieldErrors::new();

        match &self.ingredients {
            None if !partial => errors.add("ingredients", REQUIRED),
            None => {}
            Some(items) if items.is_empty() => {
                errors.add("ingredients", "A recipe needs at least one ingredient.")
            }
            Some(items) => {
                let mut seen = HashSet::new();
                for item in items {
                    if !seen.insert(item.id) {
                        errors.add(
                            "ingredients",
                            format!("Ingredient {} is listed more than once.", item.id),
                        );
                    }
                    if item.amount < 1 {
                        errors.add(
                            "ingredients",
                            format!("Amount of ingredient {} must be at least 1.", item.id),
                        );
                    } else if item.amount > MAX_QUANTITY {
                        errors.add(
                            "ingredients",
                            format!(
                                "Amount of ingredient {} must be at most {MAX_QUANTITY}.",
                                item.id
                            ),
                        );
                    }
                }
            }
        }

        match &self.tags {
            None if !partial => errors.add("tags", REQUIRED),
            None => {}
            Some(tags) if tags.is_empty() => errors.add("tags", "A recipe needs at least one tag."),
            Some(tags) => {
                let mut seen = HashSet::new();
                for id in tags {
                    if !seen.insert(*id) {
                        errors.add("tags", format!("Tag {id} is listed more than once."));
                    }
                }
            }
        }

        check_text(&mut errors, "image", &self.image, partial);
        check_text(&mut errors, "name", &self.name, partial);
        check_text(&mut errors, "text", &self.text, partial);
        if let Some(name) = &self.name {
            if name.chars().count() > MAX_RECIPE_NAME_LEN {
                errors.add("name", "Ensure this field has no more than 200 characters.");
            }
        }

        match self.cooking_time {
            None if !partial => errors.add("cooking_time", REQUIRED),
            Some(minutes) if minutes < 1 => {
                errors.add("cooking_time", "Cooking time must be at least 1 minute.")
            }
            Some(minutes) if minutes > MAX_QUANTITY => errors.add(
                "cooking_time",
                format!("Cooking time must be at most {MAX_QUANTITY} minutes."),
            ),
            _ => {}
        }

        errors
    }

    /// `None` if any field is missing.
    pub fn into_new(self) -> Option<NewRecipe> {
        Some(NewRecipe {
            ingredients: self.ingredients?,
            tags: self.tags?,
            image: self.image?,
            name: self.name?.trim().to_string(),
            text: self.text?,
            cooking_time: self.cooking_time?,
        })
    }

    pub fn tag_ids(&self) -> &[i64] {
        self.tags.as_deref().unwrap_or_default()
    }

    pub fn ingredient_ids(&self) -> Vec<i64> {
        self.ingredients
            .iter()
            .flatten()
            .map(|item| item.id)
            .collect()
    }
}
