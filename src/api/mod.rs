// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::from_fn_with_state,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{permissions, require_permission},
    error::{ApiError, ErrorBody},
    models::{
        CreateDrinkRequest, DeleteDrinkResponse, Drink, DrinksResponse, Ingredient, RecipeInput,
        ShortDrink, ShortDrinksResponse, ShortIngredient, UpdateDrinkRequest,
    },
    state::AppState,
};

pub mod drinks;
pub mod extract;
pub mod health;

pub fn router(state: AppState) -> Router {
    let gate = |permission: &'static str| from_fn_with_state(state.gate(permission), require_permission);

    let routes = Router::new()
        .route(
            "/drinks",
            get(drinks::list_drinks)
                .merge(post(drinks::create_drink).route_layer(gate(permissions::POST_DRINKS))),
        )
        .route(
            "/drinks-detail",
            get(drinks::drinks_detail).route_layer(gate(permissions::GET_DRINKS_DETAIL)),
        )
        .route(
            "/drinks/{id}",
            patch(drinks::update_drink)
                .route_layer(gate(permissions::PATCH_DRINKS))
                .merge(delete(drinks::delete_drink).route_layer(gate(permissions::DELETE_DRINKS))),
        )
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(not_found)
        .with_state(state);

    Router::new()
        .merge(routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("-");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                request_id,
            )
        }))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(CorsLayer::permissive())
}

async fn not_found() -> ApiError {
    ApiError::not_found("Resource not found")
}

async fn method_not_allowed() -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Registers the bearer token scheme referenced by the gated routes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        drinks::list_drinks,
        drinks::drinks_detail,
        drinks::create_drink,
        drinks::update_drink,
        drinks::delete_drink,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            Drink,
            Ingredient,
            ShortDrink,
            ShortIngredient,
            RecipeInput,
            CreateDrinkRequest,
            UpdateDrinkRequest,
            ShortDrinksResponse,
            DrinksResponse,
            DeleteDrinkResponse,
            ErrorBody,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Drinks", description = "Drinks menu"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
struct ApiDoc;
