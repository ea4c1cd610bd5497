//! Wire types for the two upstream tracking provider endpoints.
//!
//! Responses are read leniently: every field is optional, unknown fields are
//! ignored, containers of the wrong shape count as absent, and scalar values
//! are accepted whether the provider sends them as strings or numbers. Defaulting absent fields happens later, in the
//! aggregator.

use crate::model::TrackingEvent;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

const COUNTRY_ID: &str = "1";
const TRACKING_TYPE_WAYBILL: &str = "WAYBILL";

/// Body of the shipment detail request.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DetailRequest<'a> {
    pub waybill_no: &'a str,
    pub country_id: &'static str,
}

impl<'a> DetailRequest<'a> {
    pub fn new(waybill_no: &'a str) -> Self {
        DetailRequest {
            waybill_no,
            country_id: COUNTRY_ID,
        }
    }
}

/// Body of the tracking event query.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRequest<'a> {
    pub keyword_list: [&'a str; 1],
    pub tracking_type_enum: &'static str,
    pub country_id: &'static str,
}

impl<'a> TrackingRequest<'a> {
    pub fn new(waybill_no: &'a str) -> Self {
        TrackingRequest {
            keyword_list: [waybill_no],
            tracking_type_enum: TRACKING_TYPE_WAYBILL,
            country_id: COUNTRY_ID,
        }
    }
}

/// `{ data: { details: {...} } }`
#[derive(Deserialize, Debug, Default)]
pub struct DetailResponse {
    #[serde(default, deserialize_with = "lenient")]
    data: Option<DetailData>,
}

#[derive(Deserialize, Debug, Default)]
struct DetailData {
    #[serde(default, deserialize_with = "lenient")]
    details: Option<ShipmentDetails>,
}

impl DetailResponse {
    pub fn into_details(self) -> ShipmentDetails {
        self.data.and_then(|d| d.details).unwrap_or_default()
    }
}

/// The subset of the shipment detail payload the aggregator uses.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct ShipmentDetails {
    #[serde(deserialize_with = "lenient_string")]
    pub receiver_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub receiver_detailed_address: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub terminal_dispatch_code: Option<String>,
}

/// `{ data: [ { details: [ {...}, ... ] } ] }`
#[derive(Deserialize, Debug, Default)]
pub struct TrackingResponse {
    #[serde(default, deserialize_with = "lenient")]
    data: Option<Vec<TrackingQueryResult>>,
}

#[derive(Deserialize, Debug, Default)]
struct TrackingQueryResult {
    #[serde(default, deserialize_with = "lenient")]
    details: Option<Vec<RawTrackingEvent>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawTrackingEvent {
    #[serde(deserialize_with = "lenient_string")]
    event_type_name: Option<String>,
    // Older provider payloads label the event with this field instead.
    #[serde(deserialize_with = "lenient_string")]
    scan_type_name: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    scan_time: Option<String>,
}

impl TrackingResponse {
    /// Events of the first query result, in provider order.
    pub fn into_events(self) -> Vec<TrackingEvent> {
        self.data
            .and_then(|results| results.into_iter().next())
            .and_then(|result| result.details)
            .unwrap_or_default()
            .into_iter()
            .map(RawTrackingEvent::into_event)
            .collect()
    }
}

impl RawTrackingEvent {
    fn into_event(self) -> TrackingEvent {
        let name = non_empty(self.event_type_name).or_else(|| non_empty(self.scan_type_name));
        TrackingEvent::new(name, self.scan_time.as_deref())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// A value that does not fit `T` becomes `None` instead of failing the whole
/// payload.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).ok())
}

/// Strings, numbers and booleans become `Some(String)`. Anything else,
/// including `null`, becomes `None` instead of failing the whole payload.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    })
}
