use sqlx::SqlitePool;

use crate::error::is_unique_violation;

/// The two per-user recipe sets that share add/remove semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bookmark {
    Favorite,
    ShoppingCart,
}

#[derive(Debug, PartialEq, Eq)]
pub enum BookmarkChange {
    Done,
    AlreadyPresent,
    NotPresent,
}

impl Bookmark {
    pub fn table(self) -> &'static str {
        match self {
            Bookmark::Favorite => "favorites",
            Bookmark::ShoppingCart => "shopping_cart",
        }
    }

    pub fn already_present_message(self) -> &'static str {
        match self {
            Bookmark::Favorite => "Recipe is already in favorites.",
            Bookmark::ShoppingCart => "Recipe is already in the shopping cart.",
        }
    }

    pub fn not_present_message(self) -> &'static str {
        match self {
            Bookmark::Favorite => "Recipe is not in favorites.",
            Bookmark::ShoppingCart => "Recipe is not in the shopping cart.",
        }
    }

    pub async fn contains(
        self,
        db: &SqlitePool,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let sql = format!(
            "SELECT 1 FROM {} WHERE user_id = ? AND recipe_id = ?",
            self.table()
        );
        let row: Option<(i64,)> = sqlx::query_as(&sql)
            .bind(user_id)
            .bind(recipe_id)
            .fetch_optional(db)
            .await?;
        Ok(row.is_some())
    }

    pub async fn add(
        self,
        db: &SqlitePool,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<BookmarkChange, sqlx::Error> {
        if self.contains(db, user_id, recipe_id).await? {
            return Ok(BookmarkChange::AlreadyPresent);
        }
        let sql = format!(
            "INSERT INTO {} (user_id, recipe_id) VALUES (?, ?)",
            self.table()
        );
        match sqlx::query(&sql)
            .bind(user_id)
            .bind(recipe_id)
            .execute(db)
            .await
        {
            Ok(_) => Ok(BookmarkChange::Done),
            // lost a race with a concurrent add
            Err(e) if is_unique_violation(&e) => Ok(BookmarkChange::AlreadyPresent),
            Err(e) => Err(e),
        }
    }

    pub async fn remove(
        self,
        db: &SqlitePool,
        user_id: i64,
        recipe_id: i64,
    ) -> Result<BookmarkChange, sqlx::Error> {
        let sql = format!(
            "DELETE FROM {} WHERE user_id = ? AND recipe_id = ?",
            self.table()
        );
        let done = sqlx::query(&sql)
            .bind(user_id)
            .bind(recipe_id)
            .execute(db)
            .await?;
        if done.rows_affected() == 0 {
            Ok(BookmarkChange::NotPresent)
        } else {
            Ok(BookmarkChange::Done)
        }
    }
}
