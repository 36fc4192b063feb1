#![deny(unused_crate_dependencies)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]

mod cache;
mod config;
mod error;
mod fetch;
mod menu;
mod parse;

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use tokio::{net::TcpListener, time::sleep};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};

use crate::{
    cache::{MenuCache, Multithreaded},
    config::Config,
    fetch::{Fetcher, MenuUrls},
};

type Menus = Multithreaded<Fetcher>;

#[derive(Clone)]
struct AppState {
    menus: Arc<Menus>,
    timezone: Tz,
}

#[derive(Debug, Deserialize)]
struct MenuQuery {
    date: Option<String>,
}

#[cfg(all(target_env = "musl", target_pointer_width = "64"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn today_in(timezone: Tz) -> NaiveDate {
    Utc::now().with_timezone(&timezone).date_naive()
}

/// The date a client asked for, or `today` when it is missing, malformed or in the future.
fn requested_date(raw: Option<&str>, today: NaiveDate) -> NaiveDate {
    raw.and_then(|raw| NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok())
        .filter(|date| *date <= today)
        .unwrap_or(today)
}

fn fetch_failed() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "Failed to fetch menus" })),
    )
        .into_response()
}

async fn menus(State(state): State<AppState>, Query(query): Query<MenuQuery>) -> Response {
    let date = requested_date(query.date.as_deref(), today_in(state.timezone));
    // spawned so a client hanging up cannot cancel a fetch before it is cached
    let menus = Arc::clone(&state.menus);
    match tokio::spawn(async move { menus.get(date).await }).await {
        Ok(Ok(snapshot)) => Json(snapshot.as_ref()).into_response(),
        Ok(Err(e)) => {
            log::error!("Failed to fetch menus for {date}: {e}");
            fetch_failed()
        }
        Err(e) => {
            log::error!("Menu task for {date} did not finish: {e}");
            fetch_failed()
        }
    }
}

/// Re-fetches today's menu on a fixed interval so lunch and dinner changes show up.
async fn keep_warm(state: AppState, interval: std::time::Duration) {
    loop {
        let date = today_in(state.timezone);
        match state.menus.refresh(date).await {
            Ok(snapshot) => {
                log::info!(
                    "refreshed menus for {}: {} residences",
                    snapshot.date(),
                    snapshot.residences().len()
                );
                for slug in snapshot.available_cafeterias() {
                    if let Some(residence) = snapshot.cafeteria(slug) {
                        log::debug!("{slug}: {} stations", residence.stations().len());
                    }
                }
            }
            Err(e) => log::warn!("Error while refreshing menus for {date}: {e}"),
        }
        sleep(interval).await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> core::result::Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let config = Config::from_env()?;
    log::debug!("{config:?}");

    let urls = MenuUrls::resolve(&config.menu_url_base)?;
    log::info!("reading menus from {}", urls.listing());
    let fetcher = Fetcher::new(config.requests_per_second)?;
    let cache = MenuCache::new(config.cache_ttl, config.cache_capacity);
    let state = AppState {
        menus: Arc::new(Multithreaded::new(cache, fetcher, urls)),
        timezone: config.timezone,
    };

    let compression_layer: CompressionLayer = CompressionLayer::new()
        .br(true)
        .deflate(true)
        .gzip(true)
        .zstd(true);
    let cors_layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_origin(Any);

    let app = Router::new()
        .route(
            "/",
            get(|| async { (StatusCode::FOUND, [(header::LOCATION, "/api/menus")]) }),
        )
        .route("/api/menus", get(menus))
        .with_state(state.clone())
        .layer(cors_layer)
        .layer(compression_layer);

    tokio::spawn(keep_warm(state, config.refresh_interval));

    let listener = TcpListener::bind(config.addr).await?;
    log::info!("listening on http://{}", config.addr);
    axum::serve(listener, app).await?;
    Ok(())
}
