//! Inkpress front-end server
//!
//! Serves the HTML pages. All data access goes through the API server
//! configured under the `web` config section.

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inkpress::{
    config::Config,
    web::{self, ApiClient, WebState},
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inkpress=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Inkpress front-end...");

    let config = Config::load_with_env(Path::new("config.yml"))?;

    let client = ApiClient::new(&config.web.api_url, config.web.request_timeout_secs)?;
    tracing::info!("Upstream API: {}", config.web.api_url);

    let tera = web::build_templates()?;

    let state = WebState {
        client: Arc::new(client),
        tera: Arc::new(tera),
    };

    let app = web::build_web_router(state);

    let addr = format!("{}:{}", config.web.host, config.web.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Front-end listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
