//! Tote storefront - headless cart and wishlist runner.
//!
//! Loads configuration, mounts a [`Storefront`] against the remote API and
//! logs a summary of the catalog, cart and wishlist. With
//! `TOTE_SESSION_TOKEN` set the shopper is signed in first.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::Path;
use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tote_core::Product;
use tote_storefront::remote::HttpBackend;
use tote_storefront::{NoticeLevel, Session, SessionEvent, Storefront, StorefrontConfig};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Read the bundled product list. A broken file degrades to no local products.
fn load_local_catalog(path: &Path) -> Vec<Product> {
    let parsed = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<Vec<Product>>(&raw).map_err(|e| e.to_string()));

    match parsed {
        Ok(products) => {
            tracing::info!(path = %path.display(), count = products.len(), "Local catalog loaded");
            products
        }
        Err(error) => {
            tracing::warn!(path = %path.display(), %error, "Could not load local catalog");
            Vec::new()
        }
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "tote_storefront=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let local = config
        .local_catalog
        .as_deref()
        .map(load_local_catalog)
        .unwrap_or_default();

    let backend = Arc::new(HttpBackend::new(&config).expect("Failed to build HTTP client"));
    let event = config
        .session_token()
        .map_or(SessionEvent::Mounted, |token| {
            SessionEvent::LoggedIn(Session::new(token))
        });

    let mut storefront = Storefront::new(config, backend, local);
    for notice in storefront.handle(event).await {
        match notice.level {
            NoticeLevel::Error => tracing::warn!(message = %notice.message, "Notice"),
            NoticeLevel::Success | NoticeLevel::Info => {
                tracing::info!(message = %notice.message, "Notice");
            }
        }
    }

    tracing::info!(
        signed_in = storefront.identity().is_authenticated(),
        products = storefront.catalog().len(),
        cart_items = storefront.cart_count(),
        cart_total = %storefront.price(storefront.cart_total()),
        wishlist = storefront.wishlist().len(),
        "Storefront ready"
    );
}
