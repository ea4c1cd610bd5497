//! Batch orchestration.
//!
//! Every identifier in a batch becomes its own task. A task first consults the
//! cache; on a miss it waits for one of the dispatcher's concurrency slots,
//! issues the detail and tracking calls in parallel, merges them, and writes
//! the result back to the cache. Failures are contained per task and turned
//! into the `{orderId, error}` record, so the batch always returns one entry
//! per identifier in submission order.

use crate::aggregator;
use crate::cache::RecordCache;
use crate::errors::UpstreamError;
use crate::model::{ShipmentRecord, TrackedShipment};
use crate::request::LookupRequest;
use crate::upstream::Upstream;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    upstream: Arc<dyn Upstream>,
    cache: RecordCache,
    // Shared by all batches, so the bound holds across concurrent requests too.
    slots: Semaphore,
}

impl Dispatcher {
    pub fn new(upstream: Arc<dyn Upstream>, cache: RecordCache, concurrency_limit: usize) -> Self {
        Dispatcher {
            inner: Arc::new(DispatcherInner {
                upstream,
                cache,
                slots: Semaphore::new(concurrency_limit),
            }),
        }
    }

    pub fn cache(&self) -> &RecordCache {
        &self.inner.cache
    }

    /// Looks up every identifier of the batch. The result has the same length
    /// and order as `request.identifiers()`.
    pub async fn run(&self, request: LookupRequest) -> Vec<ShipmentRecord> {
        let auth_token: Arc<str> = Arc::from(request.auth_token());
        let identifiers = request.identifiers();

        let mut join_set = JoinSet::new();
        // Maps task IDs to their batch position, so a panicked task can still
        // be reported at the right index.
        let mut task_positions = HashMap::with_capacity(identifiers.len());

        for (position, order_id) in identifiers.iter().enumerate() {
            let inner = self.inner.clone();
            let order_id = order_id.clone();
            let auth_token = auth_token.clone();

            let abort_handle = join_set.spawn(async move {
                let record = inner.lookup(&order_id, &auth_token).await;
                (position, record)
            });
            task_positions.insert(abort_handle.id(), position);
        }

        let mut results: Vec<Option<ShipmentRecord>> = vec![None; identifiers.len()];

        while let Some(join_result) = join_set.join_next_with_id().await {
            match join_result {
                Ok((task_id, (position, record))) => {
                    task_positions.remove(&task_id);
                    results[position] = Some(record);
                }
                Err(e) => {
                    tracing::error!("Lookup task failed: {e}");
                    if let Some(position) = task_positions.remove(&e.id()) {
                        results[position] = Some(ShipmentRecord::failed(&identifiers[position]));
                    }
                }
            }
        }

        results
            .into_iter()
            .zip(identifiers)
            .map(|(record, order_id)| record.unwrap_or_else(|| ShipmentRecord::failed(order_id)))
            .collect()
    }
}

impl DispatcherInner {
    async fn lookup(&self, order_id: &str, auth_token: &str) -> ShipmentRecord {
        if let Some(shipment) = self.cache.get(order_id) {
            return shipment.into();
        }

        // Hold the slot for the duration of the upstream calls
        let _permit = match self.slots.acquire().await {
            Ok(permit) => permit,
            Err(e) => {
                tracing::error!(order_id = %order_id, "Concurrency slots unavailable: {e}");
                return ShipmentRecord::failed(order_id);
            }
        };

        // Another task may have filled the cache while this one was waiting
        if let Some(shipment) = self.cache.get(order_id) {
            return shipment.into();
        }

        match self.fetch(order_id, auth_token).await {
            Ok(shipment) => {
                self.cache.set(order_id, shipment.clone());
                shipment.into()
            }
            Err(e) => {
                tracing::warn!(order_id = %order_id, error = %e, "Shipment lookup failed");
                ShipmentRecord::failed(order_id)
            }
        }
    }

    async fn fetch(&self, order_id: &str, auth_token: &str) -> Result<TrackedShipment, UpstreamError> {
        let (details, events) = tokio::try_join!(
            self.upstream.fetch_detail(order_id, auth_token),
            self.upstream.fetch_tracking_events(order_id, auth_token),
        )?;

        Ok(aggregator::merge(order_id, details, &events))
    }
}
