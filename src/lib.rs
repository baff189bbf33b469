// src/lib.rs
// Public library surface for the binaries and integration tests.

pub mod api;
pub mod config;
pub mod ingest;
pub mod metrics;
pub mod price;
pub mod snapshot;
pub mod store;
pub mod window;

// ---- Re-exports for stable public API ----
pub use crate::api::create_router;
pub use crate::config::Config;
pub use crate::ingest::types::{FeedFetch, FeedSource, NewsRecord};
pub use crate::store::ArticleStore;
pub use crate::window::DailyWindow;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Compact tracing to stderr, filterable via RUST_LOG. Shared by all bins;
/// a second call is a no-op.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("btcheck=info,warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}
