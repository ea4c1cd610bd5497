pub mod aggregator;
pub mod api;
pub mod cache;
pub mod config;
pub mod dispatcher;
pub mod errors;
pub mod model;
pub mod protocol;
pub mod request;
pub mod retry;
pub mod upstream;

#[cfg(test)]
mod testutils;

use crate::api::TrackingService;
use crate::cache::RecordCache;
use crate::dispatcher::Dispatcher;
use crate::errors::Result;
use crate::upstream::HttpUpstream;
use shared::http::run_http_service;
use std::sync::Arc;

/// Builds the lookup pipeline described by `config`.
pub fn build_dispatcher(config: &config::Config) -> Result<Dispatcher> {
    let upstream = HttpUpstream::new(&config.upstream)?;
    let cache = RecordCache::new(config.cache.ttl());
    Ok(Dispatcher::new(
        Arc::new(upstream),
        cache,
        config.concurrency_limit,
    ))
}

/// Serves `POST /api/tracking` until the listener fails.
pub async fn run(config: config::Config) -> Result<()> {
    config.validate()?;
    let dispatcher = build_dispatcher(&config)?;

    tokio::spawn(cache::run_sweeper(
        dispatcher.cache().clone(),
        config.cache.sweep_interval(),
    ));

    tracing::info!(
        host = %config.listener.host,
        port = config.listener.port,
        concurrency_limit = config.concurrency_limit,
        "Tracking service listening"
    );

    let service = TrackingService::new(dispatcher);
    run_http_service(&config.listener.host, config.listener.port, service).await
}
