// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Drinks menu endpoints.
//!
//! `GET /drinks` is public. Every other endpoint sits behind a permission
//! gate (see `api::router`); the handlers only read the claims for logging.

use axum::{extract::State, Json};

use super::extract::{ApiJson, ApiPath};
use crate::{
    auth::Authorized,
    error::{ApiError, ErrorBody},
    models::{
        CreateDrinkRequest, DeleteDrinkResponse, DrinksResponse, ShortDrinksResponse,
        UpdateDrinkRequest,
    },
    state::AppState,
};

/// List the menu in short form.
#[utoipa::path(
    get,
    path = "/drinks",
    tag = "Drinks",
    responses(
        (status = 200, description = "Menu, ingredient names hidden", body = ShortDrinksResponse),
        (status = 422, description = "Store failure", body = ErrorBody)
    )
)]
pub async fn list_drinks(
    State(state): State<AppState>,
) -> Result<Json<ShortDrinksResponse>, ApiError> {
    let drinks = state.store.list()?;
    Ok(Json(ShortDrinksResponse {
        success: true,
        drinks: drinks.iter().map(|drink| drink.short()).collect(),
    }))
}

/// List the menu with full recipes.
#[utoipa::path(
    get,
    path = "/drinks-detail",
    tag = "Drinks",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Menu with full recipes", body = DrinksResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Token lacks get:drinks-detail", body = ErrorBody)
    )
)]
pub async fn drinks_detail(
    Authorized(claims): Authorized,
    State(state): State<AppState>,
) -> Result<Json<DrinksResponse>, ApiError> {
    let drinks = state.store.list()?;
    tracing::debug!(sub = %claims.sub, count = drinks.len(), "detailed menu listed");
    Ok(Json(DrinksResponse {
        success: true,
        drinks,
    }))
}

/// Add a drink to the menu.
#[utoipa::path(
    post,
    path = "/drinks",
    tag = "Drinks",
    security(("bearer_auth" = [])),
    request_body = CreateDrinkRequest,
    responses(
        (status = 200, description = "The created drink", body = DrinksResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Token lacks post:drinks", body = ErrorBody),
        (status = 422, description = "Invalid or duplicate drink", body = ErrorBody)
    )
)]
pub async fn create_drink(
    Authorized(claims): Authorized,
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateDrinkRequest>,
) -> Result<Json<DrinksResponse>, ApiError> {
    let drink = state
        .store
        .insert(&request.title, request.recipe.into_vec())?;

    tracing::info!(sub = %claims.sub, drink_id = drink.id, "drink added to menu");
    Ok(Json(DrinksResponse {
        success: true,
        drinks: vec![drink],
    }))
}

/// Change a drink's title and/or recipe.
#[utoipa::path(
    patch,
    path = "/drinks/{id}",
    tag = "Drinks",
    security(("bearer_auth" = [])),
    params(("id" = u64, Path, description = "Identifier of the drink to update")),
    request_body = UpdateDrinkRequest,
    responses(
        (status = 200, description = "The updated drink", body = DrinksResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Token lacks patch:drinks", body = ErrorBody),
        (status = 404, description = "No such drink", body = ErrorBody),
        (status = 422, description = "Invalid or duplicate drink", body = ErrorBody)
    )
)]
pub async fn update_drink(
    Authorized(claims): Authorized,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u64>,
    ApiJson(request): ApiJson<UpdateDrinkRequest>,
) -> Result<Json<DrinksResponse>, ApiError> {
    if request.title.is_none() && request.recipe.is_none() {
        return Err(ApiError::unprocessable(
            "Nothing to update: provide a title and/or a recipe",
        ));
    }

    let drink = state.store.update(
        id,
        request.title.as_deref(),
        request.recipe.map(|recipe| recipe.into_vec()),
    )?;

    tracing::info!(sub = %claims.sub, drink_id = id, "drink changed");
    Ok(Json(DrinksResponse {
        success: true,
        drinks: vec![drink],
    }))
}

/// Take a drink off the menu.
#[utoipa::path(
    delete,
    path = "/drinks/{id}",
    tag = "Drinks",
    security(("bearer_auth" = [])),
    params(("id" = u64, Path, description = "Identifier of the drink to delete")),
    responses(
        (status = 200, description = "Identifier of the deleted drink", body = DeleteDrinkResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorBody),
        (status = 403, description = "Token lacks delete:drinks", body = ErrorBody),
        (status = 404, description = "No such drink", body = ErrorBody)
    )
)]
pub async fn delete_drink(
    Authorized(claims): Authorized,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<u64>,
) -> Result<Json<DeleteDrinkResponse>, ApiError> {
    state.store.delete(id)?;

    tracing::info!(sub = %claims.sub, drink_id = id, "drink removed from menu");
    Ok(Json(DeleteDrinkResponse {
        success: true,
        delete: id,
    }))
}
