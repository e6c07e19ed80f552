// File: services/booking_backend/src/main.rs
use axum::Router;
use booking_common::error::Context;
use booking_common::{logging, AppError};
use booking_config::load_config;
use booking_slots::routes::routes;
use booking_slots::BookingService;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

mod store_factory;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Arc::new(load_config().context("Failed to load config")?);
    logging::init_with_level(logging::parse_level(&config.logging.level));

    let store = store_factory::create_store(&config).await?;
    let booking = Arc::new(
        BookingService::new(store).with_operating_time_zone(config.booking.time_zone()),
    );
    info!(
        "Operating time zone: {}",
        config.booking.operating_time_zone
    );

    let api_router = Router::new().nest("/api", routes(booking));

    #[allow(unused_mut)] // only the openapi feature mutates it
    let mut app = api_router;

    // Conditionally add Swagger UI and JSON endpoint if openapi feature enabled
    #[cfg(feature = "openapi")]
    {
        use booking_slots::doc::BookingApiDoc;
        use utoipa::OpenApi;
        use utoipa_swagger_ui::SwaggerUi;

        info!("Adding Swagger UI at /api/docs");
        let swagger_ui =
            SwaggerUi::new("/api/docs").url("/api/docs/openapi.json", BookingApiDoc::openapi());
        app = app.merge(swagger_ui);
    }

    let app = app
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Starting server at http://{}", addr);
    info!("API endpoints available at http://{}/api", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("Server stopped unexpectedly")?;
    Ok(())
}
