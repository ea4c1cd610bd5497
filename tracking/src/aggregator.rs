//! Merges the detail and tracking responses for one waybill into a single
//! normalized record.
//!
//! - Receiver fields come from the detail response
//! - The event name comes from the latest tracking event by scan time
//! - Anything absent or empty is replaced by [`PLACEHOLDER`]
//!
//! Merging never fails. A lookup only produces the error shape when the
//! upstream data could not be fetched at all, which the dispatcher handles.

use crate::model::{PLACEHOLDER, TrackedShipment, TrackingEvent};
use crate::protocol::ShipmentDetails;

pub fn merge(order_id: &str, details: ShipmentDetails, events: &[TrackingEvent]) -> TrackedShipment {
    let latest_event_name = latest_event(events)
        .and_then(|event| event.event_type_name.clone())
        .filter(|name| !name.trim().is_empty());

    TrackedShipment {
        order_id: order_id.to_string(),
        receiver_name: or_placeholder(details.receiver_name),
        receiver_address: or_placeholder(details.receiver_detailed_address),
        terminal_dispatch_code: or_placeholder(details.terminal_dispatch_code),
        latest_event_name: or_placeholder(latest_event_name),
    }
}

/// Single pass over the events in provider order. A later event only replaces
/// the best-so-far when its scan time is strictly greater, so the first event
/// to reach the maximum wins ties. Events without a usable scan time never
/// replace the current best, but the first event is always the starting point.
pub fn latest_event(events: &[TrackingEvent]) -> Option<&TrackingEvent> {
    let mut iter = events.iter();
    let mut best = iter.next()?;

    for event in iter {
        if let (Some(candidate), Some(current)) = (event.scan_time, best.scan_time)
            && candidate > current
        {
            best = event;
        }
    }

    Some(best)
}

fn or_placeholder(value: Option<String>) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}
