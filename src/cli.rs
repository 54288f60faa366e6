use clap::{Parser, Subcommand};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::fs;

use crate::error::is_unique_violation;
use crate::models::ingredient::search_key;
use crate::models::NewTag;

#[derive(Parser, Debug)]
#[command(author, version, about = "Foodgram recipe-sharing backend")]
pub struct Cli {
    /// SQLite database URL, e.g. sqlite:data/foodgram.db
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API (the default)
    Serve,
    /// Add a tag that recipes can be labelled with
    CreateTag {
        name: String,
        slug: String,
        #[arg(long)]
        color: Option<String>,
    },
    /// Load ingredients from a JSON array of {name, measurement_unit}
    ImportIngredients { path: String },
}

#[derive(Deserialize)]
struct IngredientRecord {
    name: String,
    measurement_unit: String,
}

/// Insert the records that are not already present, all in one transaction.
/// Returns how many rows were added.
pub async fn import_ingredients(pool: &SqlitePool, file_path: &str) -> Result<u64, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(file_path)?;
    let records: Vec<IngredientRecord> = serde_json::from_str(&content)?;

    let mut imported = 0;
    let mut tx = pool.begin().await?;

    for record in records {
        let name = record.name.trim();
        let unit = record.measurement_unit.trim();
        if name.is_empty() || unit.is_empty() {
            tracing::warn!(name, unit, "skipping ingredient with blank field");
            continue;
        }

        let done = sqlx::query(
            "INSERT OR IGNORE INTO ingredients (name, name_lower, measurement_unit) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(search_key(name))
        .bind(unit)
        .execute(&mut *tx)
        .await?;
        imported += done.rows_affected();
    }

    tx.commit().await?;
    println!("Imported {} ingredients", imported);
    Ok(imported)
}

pub async fn create_tag(
    pool: &SqlitePool,
    name: &str,
    color: Option<&str>,
    slug: &str,
) -> Result<i64, Box<dyn std::error::Error>> {
    let tag = NewTag::new(name, color, slug);
    let errors = tag.validate();
    if !errors.is_empty() {
        return Err(serde_json::to_string(&errors)?.into());
    }

    let result = sqlx::query("INSERT INTO tags (name, color, slug) VALUES (?, ?, ?)")
        .bind(&tag.name)
        .bind(&tag.color)
        .bind(&tag.slug)
        .execute(pool)
        .await;

    let id = match result {
        Ok(done) => done.last_insert_rowid(),
        Err(e) if is_unique_violation(&e) => {
            return Err(format!("A tag named '{}' or with slug '{}' already exists", tag.name, tag.slug).into());
        }
        Err(e) => return Err(e.into()),
    };

    println!("Created tag:");
    println!("  ID: {}", id);
    println!("  Name: {}", tag.name);
    println!("  Slug: {}", tag.slug);

    Ok(id)
}
