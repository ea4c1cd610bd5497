use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::Serialize;

/// Substituted for every field the upstream left out or sent empty.
pub const PLACEHOLDER: &str = "N/A";

/// Reported to the caller for an identifier whose lookup failed.
pub const LOOKUP_FAILED: &str = "could not fetch shipment data";

/// Normalized view of one shipment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedShipment {
    pub order_id: String,
    pub receiver_name: String,
    pub receiver_address: String,
    pub terminal_dispatch_code: String,
    pub latest_event_name: String,
}

/// One entry of a batch response. Serializes as either the full shipment or
/// `{orderId, error}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ShipmentRecord {
    Found(TrackedShipment),
    #[serde(rename_all = "camelCase")]
    Failed { order_id: String, error: String },
}

impl ShipmentRecord {
    pub fn failed(order_id: impl Into<String>) -> Self {
        ShipmentRecord::Failed {
            order_id: order_id.into(),
            error: LOOKUP_FAILED.to_string(),
        }
    }

    pub fn order_id(&self) -> &str {
        match self {
            ShipmentRecord::Found(shipment) => &shipment.order_id,
            ShipmentRecord::Failed { order_id, .. } => order_id,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ShipmentRecord::Failed { .. })
    }
}

impl From<TrackedShipment> for ShipmentRecord {
    fn from(shipment: TrackedShipment) -> Self {
        ShipmentRecord::Found(shipment)
    }
}

/// A single scan reported by the tracking endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrackingEvent {
    pub event_type_name: Option<String>,
    /// `None` when the upstream timestamp was missing or unparseable.
    pub scan_time: Option<NaiveDateTime>,
}

impl TrackingEvent {
    pub fn new(event_type_name: Option<String>, scan_time: Option<&str>) -> Self {
        TrackingEvent {
            event_type_name,
            scan_time: scan_time.and_then(parse_scan_time),
        }
    }
}

/// Offset of the provider's local scan times, matching the `timezone` header
/// sent with every request.
const PROVIDER_UTC_OFFSET_SECS: i32 = 7 * 3600;

/// Parses a scan time into UTC. Accepts RFC 3339, epoch milliseconds, and the
/// provider's `YYYY-MM-DD HH:MM:SS` form, which is local to GMT+7.
pub fn parse_scan_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        let millis = raw.parse::<i64>().ok()?;
        return DateTime::from_timestamp_millis(millis).map(|dt| dt.naive_utc());
    }
    let local = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").ok()?;
    let offset = FixedOffset::east_opt(PROVIDER_UTC_OFFSET_SECS)?;
    local
        .and_local_timezone(offset)
        .single()
        .map(|dt| dt.naive_utc())
}
