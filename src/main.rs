// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use coffee_shop_server::{
    api::router,
    auth::{JwksManager, TokenVerifier},
    config::Settings,
    state::AppState,
    storage::DrinkStore,
    telemetry::init_tracing,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env()?;
    init_tracing(settings.log_format);

    let store = DrinkStore::open(&settings.database_path)?;
    if settings.seed_sample_drink {
        if let Some(drink) = store.seed_sample()? {
            tracing::info!(drink_id = drink.id, title = %drink.title, "seeded sample drink");
        }
    }

    let auth = &settings.auth;
    let jwks = JwksManager::new(auth.jwks_url.clone())?.with_cache_ttl(auth.jwks_cache_ttl);
    let verifier = TokenVerifier::new(jwks, auth.issuer.clone(), auth.audience.clone(), auth.algorithm)
        .with_leeway(auth.clock_skew);

    tracing::info!(
        issuer = %auth.issuer,
        audience = %auth.audience,
        jwks_url = %auth.jwks_url,
        algorithm = ?auth.algorithm,
        "token verification configured"
    );

    let app = router(AppState::new(store, verifier));

    let listener = tokio::net::TcpListener::bind(settings.bind_addr).await?;
    tracing::info!(
        addr = %settings.bind_addr,
        database = %settings.database_path.display(),
        "listening; Swagger UI at /docs"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
