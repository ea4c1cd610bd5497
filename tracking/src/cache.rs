// Time-bounded cache of successful shipment lookups. Failed lookups are never
// stored, so a bad identifier is retried by the next batch that references it.
use crate::model::TrackedShipment;
use moka::sync::Cache;
use std::time::Duration;

#[derive(Clone)]
pub struct RecordCache {
    cache: Cache<String, TrackedShipment>,
}

impl RecordCache {
    /// TTL is the only eviction policy, there is no capacity bound.
    pub fn new(ttl: Duration) -> Self {
        let cache = Cache::builder().time_to_live(ttl).build();

        RecordCache { cache }
    }

    /// Returns the record if present and not yet expired.
    pub fn get(&self, key: &str) -> Option<TrackedShipment> {
        let hit = self.cache.get(key);
        match hit {
            Some(_) => tracing::debug!(order_id = %key, "Cache hit"),
            None => tracing::debug!(order_id = %key, "Cache miss"),
        }
        hit
    }

    /// Stores the record, restarting its TTL. Last writer wins.
    pub fn set(&self, key: &str, value: TrackedShipment) {
        self.cache.insert(key.to_string(), value);
    }

    /// Evicts expired entries now instead of waiting for them to be touched.
    pub fn sweep(&self) {
        self.cache.run_pending_tasks();
    }

    /// Approximate number of live entries, exact right after `sweep`.
    pub fn len(&self) -> u64 {
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Periodically sweeps the cache until the runtime shuts down.
pub async fn run_sweeper(cache: RecordCache, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        cache.sweep();
        tracing::debug!(entries = cache.len(), "Swept shipment cache");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn shipment(order_id: &str, event: &str) -> TrackedShipment {
        TrackedShipment {
            order_id: order_id.into(),
            receiver_name: "Tran Thi B".into(),
            receiver_address: "45 Nguyen Hue".into(),
            terminal_dispatch_code: "SGN-02".into(),
            latest_event_name: event.into(),
        }
    }

    #[test]
    fn test_get_and_set() {
        let cache = RecordCache::new(Duration::from_secs(60));
        assert_eq!(cache.get("100"), None);

        cache.set("100", shipment("100", "Picked up"));
        assert_eq!(cache.get("100"), Some(shipment("100", "Picked up")));
        assert_eq!(cache.get("101"), None);

        // Last writer wins
        cache.set("100", shipment("100", "Delivered"));
        assert_eq!(cache.get("100"), Some(shipment("100", "Delivered")));
    }

    #[test]
    fn test_entries_expire() {
        let cache = RecordCache::new(Duration::from_millis(50));
        cache.set("200", shipment("200", "In transit"));
        assert!(cache.get("200").is_some());

        std::thread::sleep(Duration::from_millis(120));
        assert_eq!(cache.get("200"), None);

        cache.sweep();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_concurrent_writers() {
        let cache = Arc::new(RecordCache::new(Duration::from_secs(60)));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = cache.clone();
                std::thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("{}", i % 20);
                        cache.set(&key, shipment(&key, &format!("writer-{t}")));
                        assert!(cache.get(&key).is_some());
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        cache.sweep();
        assert_eq!(cache.len(), 20);
        for i in 0..20 {
            let key = i.to_string();
            assert_eq!(cache.get(&key).unwrap().order_id, key);
        }
    }

    #[tokio::test]
    async fn test_sweeper_evicts_expired() {
        let cache = RecordCache::new(Duration::from_millis(30));
        cache.set("300", shipment("300", "Returned"));
        cache.sweep();
        assert_eq!(cache.len(), 1);

        let handle = tokio::spawn(run_sweeper(cache.clone(), Duration::from_millis(20)));
        tokio::time::sleep(Duration::from_millis(150)).await;
        handle.abort();

        assert!(cache.is_empty());
    }
}
