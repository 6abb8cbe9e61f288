mod config;
mod errors;
mod export;
mod i18n;
mod layout;
mod models;
mod pdf;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::export::{Exporter, FileImageSource};
use crate::i18n::LocaleRegistry;
use crate::layout::PageGeometry;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting résumé site v{}", env!("CARGO_PKG_VERSION"));

    let locales = LocaleRegistry::load_embedded(&config.default_locale)?;

    let geometry = PageGeometry::a4();
    info!(
        "Export page: {}x{} mm, {} mm margins; photo from {}",
        geometry.width_mm, geometry.height_mm, geometry.margin_mm, config.profile_image_path
    );
    let images = Arc::new(FileImageSource::new(&config.profile_image_path));

    let state = AppState {
        locales: Arc::new(locales),
        exporter: Arc::new(Exporter::new(images, geometry)),
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
