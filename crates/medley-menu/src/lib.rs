//! Drink catalogue records for the menu backend.
//!
//! A drink is a titled recipe: an ordered list of ingredients, each with
//! a name, a display color, and a parts count. Recipes persist as JSON
//! arrays in a TEXT column. Two wire representations exist: the public
//! listing shows only colors and proportions (`short`), authorized
//! callers get full ingredient names (`long`).

use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during drink operations.
#[derive(Debug, Error)]
pub enum MenuError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("drink not found: {0}")]
    NotFound(i64),
    #[error("drink title already exists: {0}")]
    DuplicateTitle(String),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One ingredient in a drink recipe.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    pub name: String,
    /// Display color for the graphic rendering of the glass.
    pub color: String,
    /// Relative proportion of the drink.
    pub parts: u32,
}

/// An ingredient with the name withheld, for the public listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngredientPart {
    pub color: String,
    pub parts: u32,
}

/// A drink on the menu.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Drink {
    pub id: i64,
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

impl Drink {
    /// The public representation: colors and proportions only.
    pub fn short(&self) -> Vec<IngredientPart> {
        self.recipe
            .iter()
            .map(|i| IngredientPart {
                color: i.color.clone(),
                parts: i.parts,
            })
            .collect()
    }
}

/// Parameters for creating a new drink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDrink {
    pub title: String,
    pub recipe: Vec<Ingredient>,
}

/// Parameters for updating an existing drink.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DrinkUpdate {
    pub title: Option<String>,
    pub recipe: Option<Vec<Ingredient>>,
}

/// Creates a new drink, returning its assigned ID.
pub fn create_drink(conn: &Connection, new: &NewDrink) -> Result<i64, MenuError> {
    let recipe_json = serde_json::to_string(&new.recipe)?;
    conn.execute(
        "INSERT INTO drinks (title, recipe) VALUES (?1, ?2)",
        params![new.title, recipe_json],
    )
    .map_err(|e| map_title_conflict(e, &new.title))?;
    Ok(conn.last_insert_rowid())
}

/// Retrieves a drink by ID.
pub fn get_drink(conn: &Connection, id: i64) -> Result<Drink, MenuError> {
    conn.query_row(
        "SELECT id, title, recipe FROM drinks WHERE id = ?1",
        [id],
        map_row_to_drink,
    )
    .optional()?
    .ok_or(MenuError::NotFound(id))
}

/// Lists all drinks ordered by title.
pub fn list_drinks(conn: &Connection) -> Result<Vec<Drink>, MenuError> {
    let mut stmt = conn.prepare("SELECT id, title, recipe FROM drinks ORDER BY title ASC")?;
    let rows = stmt.query_map([], map_row_to_drink)?;
    let mut drinks = Vec::new();
    for row in rows {
        drinks.push(row?);
    }
    Ok(drinks)
}

/// Updates an existing drink. Only fields that are `Some` change.
pub fn update_drink(conn: &Connection, id: i64, updates: &DrinkUpdate) -> Result<(), MenuError> {
    let mut set_parts: Vec<String> = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

    if let Some(title) = &updates.title {
        set_parts.push(format!("title = ?{}", values.len() + 1));
        values.push(Box::new(title.clone()));
    }
    if let Some(recipe) = &updates.recipe {
        let json = serde_json::to_string(recipe)?;
        set_parts.push(format!("recipe = ?{}", values.len() + 1));
        values.push(Box::new(json));
    }

    if set_parts.is_empty() {
        // No fields to update; verify the drink exists.
        let _ = get_drink(conn, id)?;
        return Ok(());
    }

    let sql = format!(
        "UPDATE drinks SET {} WHERE id = ?{}",
        set_parts.join(", "),
        values.len() + 1
    );
    values.push(Box::new(id));

    let title_for_err = updates.title.clone().unwrap_or_default();
    let params: Vec<&dyn rusqlite::types::ToSql> = values.iter().map(|v| v.as_ref()).collect();
    let count = conn
        .execute(&sql, params.as_slice())
        .map_err(|e| map_title_conflict(e, &title_for_err))?;
    if count == 0 {
        return Err(MenuError::NotFound(id));
    }
    Ok(())
}

/// Deletes a drink by ID.
pub fn delete_drink(conn: &Connection, id: i64) -> Result<(), MenuError> {
    let count = conn.execute("DELETE FROM drinks WHERE id = ?1", [id])?;
    if count == 0 {
        return Err(MenuError::NotFound(id));
    }
    Ok(())
}

/// Maps a unique-constraint failure on the title column to
/// [`MenuError::DuplicateTitle`]; other database errors pass through.
fn map_title_conflict(e: rusqlite::Error, title: &str) -> MenuError {
    if let rusqlite::Error::SqliteFailure(code, _) = &e {
        if code.code == rusqlite::ffi::ErrorCode::ConstraintViolation {
            return MenuError::DuplicateTitle(title.to_string());
        }
    }
    MenuError::Database(e)
}

fn map_row_to_drink(row: &Row) -> rusqlite::Result<Drink> {
    let recipe_json: String = row.get(2)?;
    let recipe: Vec<Ingredient> = serde_json::from_str(&recipe_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Drink {
        id: row.get(0)?,
        title: row.get(1)?,
        recipe,
    })
}
