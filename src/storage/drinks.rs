// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded drinks table backed by redb (pure Rust, ACID).
//!
//! ## Table Layout
//!
//! - `drinks`: id (u64, ascending) → serialized [`DrinkRow`]
//!
//! Ids are assigned as `last id + 1`, so they never go backwards while the
//! highest row exists.

use std::path::Path;

use redb::{Database, ReadableDatabase, ReadableTable, Table, TableDefinition};
use serde::{Deserialize, Serialize};

use crate::models::{Drink, Ingredient};

// =============================================================================
// Table Definitions
// =============================================================================

/// Primary table: drink id → serialized DrinkRow (JSON bytes).
const DRINKS: TableDefinition<u64, &[u8]> = TableDefinition::new("drinks");

// =============================================================================
// Error Type
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("redb error: {0}")]
    Redb(#[from] redb::Error),

    #[error("redb database error: {0}")]
    RedbDatabase(#[from] redb::DatabaseError),

    #[error("redb transaction error: {0}")]
    RedbTransaction(#[from] redb::TransactionError),

    #[error("redb table error: {0}")]
    RedbTable(#[from] redb::TableError),

    #[error("redb storage error: {0}")]
    RedbStorage(#[from] redb::StorageError),

    #[error("redb commit error: {0}")]
    RedbCommit(#[from] redb::CommitError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Drink {0} not found")]
    NotFound(u64),

    #[error("A drink titled '{0}' already exists")]
    DuplicateTitle(String),

    #[error("{0}")]
    Invalid(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Row payload; the id lives in the key.
#[derive(Debug, Serialize, Deserialize)]
struct DrinkRow {
    title: String,
    recipe: Vec<Ingredient>,
}

impl DrinkRow {
    fn into_drink(self, id: u64) -> Drink {
        Drink {
            id,
            title: self.title,
            recipe: self.recipe,
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

fn validate_title(title: &str) -> StoreResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StoreError::Invalid("Drink title must not be empty".into()));
    }
    Ok(title.to_string())
}

fn validate_recipe(recipe: Vec<Ingredient>) -> StoreResult<Vec<Ingredient>> {
    if recipe.is_empty() {
        return Err(StoreError::Invalid("Drink recipe must not be empty".into()));
    }
    for ingredient in &recipe {
        if ingredient.name.trim().is_empty() || ingredient.color.trim().is_empty() {
            return Err(StoreError::Invalid(
                "Every ingredient needs a name and a color".into(),
            ));
        }
        if ingredient.parts == 0 {
            return Err(StoreError::Invalid(format!(
                "Ingredient '{}' must have at least one part",
                ingredient.name
            )));
        }
    }
    Ok(recipe)
}

/// Whether another drink already uses `title`.
fn title_taken(
    table: &Table<'_, u64, &'static [u8]>,
    title: &str,
    except: Option<u64>,
) -> StoreResult<bool> {
    for entry in table.iter()? {
        let (key, value) = entry?;
        if Some(key.value()) == except {
            continue;
        }
        let row: DrinkRow = serde_json::from_slice(value.value())?;
        if row.title == title {
            return Ok(true);
        }
    }
    Ok(false)
}

// =============================================================================
// DrinkStore
// =============================================================================

/// Embedded ACID drinks store.
pub struct DrinkStore {
    db: Database,
}

impl DrinkStore {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let db = Database::create(path)?;

        // Pre-create the table so later read transactions don't fail
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(DRINKS)?;
        }
        write_txn.commit()?;

        Ok(Self { db })
    }

    /// All drinks, ordered by id.
    pub fn list(&self) -> StoreResult<Vec<Drink>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRINKS)?;

        let mut drinks = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let row: DrinkRow = serde_json::from_slice(value.value())?;
            drinks.push(row.into_drink(key.value()));
        }
        Ok(drinks)
    }

    /// Look up a single drink.
    pub fn get(&self, id: u64) -> StoreResult<Drink> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRINKS)?;
        match table.get(id)? {
            Some(value) => {
                let row: DrinkRow = serde_json::from_slice(value.value())?;
                Ok(row.into_drink(id))
            }
            None => Err(StoreError::NotFound(id)),
        }
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(DRINKS)?;
        let empty = table.first()?.is_none();
        Ok(empty)
    }

    /// Insert a new drink and return it with its assigned id.
    pub fn insert(&self, title: &str, recipe: Vec<Ingredient>) -> StoreResult<Drink> {
        let title = validate_title(title)?;
        let recipe = validate_recipe(recipe)?;
        let row = DrinkRow { title, recipe };
        let json = serde_json::to_vec(&row)?;

        let write_txn = self.db.begin_write()?;
        let id = {
            let mut table = write_txn.open_table(DRINKS)?;
            if title_taken(&table, &row.title, None)? {
                return Err(StoreError::DuplicateTitle(row.title));
            }
            let id = table.last()?.map(|(key, _)| key.value() + 1).unwrap_or(1);
            table.insert(id, json.as_slice())?;
            id
        };
        write_txn.commit()?;

        tracing::info!(drink_id = id, title = %row.title, "drink created");
        Ok(row.into_drink(id))
    }

    /// Replace the title and/or recipe of an existing drink.
    pub fn update(
        &self,
        id: u64,
        title: Option<&str>,
        recipe: Option<Vec<Ingredient>>,
    ) -> StoreResult<Drink> {
        let title = title.map(validate_title).transpose()?;
        let recipe = recipe.map(validate_recipe).transpose()?;

        let write_txn = self.db.begin_write()?;
        let row = {
            let mut table = write_txn.open_table(DRINKS)?;
            let mut row: DrinkRow = match table.get(id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StoreError::NotFound(id)),
            };

            if let Some(title) = title {
                if title_taken(&table, &title, Some(id))? {
                    return Err(StoreError::DuplicateTitle(title));
                }
                row.title = title;
            }
            if let Some(recipe) = recipe {
                row.recipe = recipe;
            }

            let json = serde_json::to_vec(&row)?;
            table.insert(id, json.as_slice())?;
            row
        };
        write_txn.commit()?;

        tracing::info!(drink_id = id, "drink updated");
        Ok(row.into_drink(id))
    }

    /// Remove a drink.
    pub fn delete(&self, id: u64) -> StoreResult<()> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(DRINKS)?;
            if table.remove(id)?.is_none() {
                return Err(StoreError::NotFound(id));
            }
        }
        write_txn.commit()?;

        tracing::info!(drink_id = id, "drink deleted");
        Ok(())
    }

    /// Put the sample drink on an empty menu. Returns it if it was added.
    pub fn seed_sample(&self) -> StoreResult<Option<Drink>> {
        if !self.is_empty()? {
            return Ok(None);
        }
        let water = vec![Ingredient {
            name: "water".into(),
            color: "blue".into(),
            parts: 1,
        }];
        self.insert("water", water).map(Some)
    }
}
