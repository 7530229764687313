// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # API Data Models
//!
//! Request and response structures for the drinks API. All types derive
//! `Serialize`, `Deserialize`, and `ToSchema` for JSON handling and the
//! OpenAPI document.
//!
//! ## Projections
//!
//! A [`Drink`] is served in two shapes:
//!
//! - **short** ([`ShortDrink`]): public menu view, ingredient names hidden
//! - **long** ([`Drink`]): full recipe, for baristas and managers

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// =============================================================================
// Drink
// =============================================================================

/// One recipe line: how many parts of which ingredient, and its colour in the
/// menu graphic.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Ingredient {
    /// Ingredient name, e.g. `milk`.
    pub name: String,
    /// Display colour, e.g. `white` or `#8b4513`.
    pub color: String,
    /// Relative amount.
    pub parts: u32,
}

/// Recipe line with the ingredient name removed.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ShortIngredient {
    pub color: String,
    pub parts: u32,
}

/// A drink on the menu (long projection).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Drink {
    /// Identifier assigned by the store.
    pub id: u64,
    /// Unique, non-empty title.
    pub title: String,
    /// Non-empty, ordered recipe.
    pub recipe: Vec<Ingredient>,
}

/// A drink as shown on the public menu.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ShortDrink {
    pub id: u64,
    pub title: String,
    pub recipe: Vec<ShortIngredient>,
}

impl Drink {
    pub fn short(&self) -> ShortDrink {
        ShortDrink {
            id: self.id,
            title: self.title.clone(),
            recipe: self
                .recipe
                .iter()
                .map(|ingredient| ShortIngredient {
                    color: ingredient.color.clone(),
                    parts: ingredient.parts,
                })
                .collect(),
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// A recipe as submitted: a single ingredient or a list of them.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(untagged)]
pub enum RecipeInput {
    One(Ingredient),
    Many(Vec<Ingredient>),
}

impl RecipeInput {
    pub fn into_vec(self) -> Vec<Ingredient> {
        match self {
            RecipeInput::One(ingredient) => vec![ingredient],
            RecipeInput::Many(ingredients) => ingredients,
        }
    }
}

/// Request to add a drink to the menu.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateDrinkRequest {
    pub title: String,
    pub recipe: RecipeInput,
}

/// Request to change a drink. Omitted fields are left as they are.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateDrinkRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub recipe: Option<RecipeInput>,
}

// =============================================================================
// Responses
// =============================================================================

/// Public menu listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct ShortDrinksResponse {
    pub success: bool,
    pub drinks: Vec<ShortDrink>,
}

/// Detailed listing, or the single drink a mutation produced.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DrinksResponse {
    pub success: bool,
    pub drinks: Vec<Drink>,
}

/// Outcome of a deletion.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct DeleteDrinkResponse {
    pub success: bool,
    /// Identifier of the deleted drink.
    pub delete: u64,
}
