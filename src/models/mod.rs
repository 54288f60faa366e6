pub mod user;
pub mod tag;
pub mod ingredient;
pub mod recipe;
pub mod bookmark;

pub use user::{NewUser, User};
pub use tag::{NewTag, Tag};
pub use ingredient::{Ingredient, IngredientCount};
pub use recipe::{IngredientAmount, NewRecipe, Recipe, RecipeInput};
pub use bookmark::{Bookmark, BookmarkChange};
