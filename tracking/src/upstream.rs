use crate::config::UpstreamConfig;
use crate::errors::UpstreamError;
use crate::model::TrackingEvent;
use crate::protocol::{
    DetailRequest, DetailResponse, ShipmentDetails, TrackingRequest, TrackingResponse,
};
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use http::header::{CONTENT_TYPE, ORIGIN, REFERER};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

const PROVIDER_ORIGIN: &str = "https://jms.jtexpress.vn";
const PROVIDER_REFERER: &str = "https://jms.jtexpress.vn/";

/// The two calls needed to build one shipment record.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch_detail(
        &self,
        order_id: &str,
        auth_token: &str,
    ) -> Result<ShipmentDetails, UpstreamError>;

    /// Events in the order the provider returned them.
    async fn fetch_tracking_events(
        &self,
        order_id: &str,
        auth_token: &str,
    ) -> Result<Vec<TrackingEvent>, UpstreamError>;
}

/// Talks to the tracking provider over HTTP. Each call carries the provider's
/// expected header set, is bounded by the client timeout, and is retried on
/// transient failures.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    detail_url: Url,
    tracking_url: Url,
    retry: RetryPolicy,
}

impl HttpUpstream {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(HttpUpstream {
            client,
            detail_url: config.detail_url.clone(),
            tracking_url: config.tracking_url.clone(),
            retry: RetryPolicy::new(config.retry_attempts, config.retry_backoff()),
        })
    }

    async fn post_json<B, T>(
        &self,
        url: &Url,
        body: &B,
        auth_token: &str,
    ) -> Result<T, UpstreamError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let headers = provider_headers(auth_token)?;
        let headers = &headers;
        self.retry
            .run(url.path(), move || self.post_once(url, body, headers))
            .await
    }

    async fn post_once<B, T>(
        &self,
        url: &Url,
        body: &B,
        headers: &HeaderMap,
    ) -> Result<T, UpstreamError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url.clone())
            .headers(headers.clone())
            .json(body)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::TOO_MANY_REQUESTS => return Err(UpstreamError::TooManyRequests),
            status => return Err(UpstreamError::Rejected(status)),
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| UpstreamError::MalformedBody(e.to_string()))
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch_detail(
        &self,
        order_id: &str,
        auth_token: &str,
    ) -> Result<ShipmentDetails, UpstreamError> {
        let response: DetailResponse = self
            .post_json(&self.detail_url, &DetailRequest::new(order_id), auth_token)
            .await?;
        Ok(response.into_details())
    }

    async fn fetch_tracking_events(
        &self,
        order_id: &str,
        auth_token: &str,
    ) -> Result<Vec<TrackingEvent>, UpstreamError> {
        let response: TrackingResponse = self
            .post_json(&self.tracking_url, &TrackingRequest::new(order_id), auth_token)
            .await?;
        Ok(response.into_events())
    }
}

/// Headers the provider's gateway expects on every query.
fn provider_headers(auth_token: &str) -> Result<HeaderMap, UpstreamError> {
    let token = HeaderValue::from_str(auth_token)
        .map_err(|e| UpstreamError::Request(format!("invalid auth token header: {e}")))?;

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/json;charset=utf-8"),
    );
    headers.insert(ORIGIN, HeaderValue::from_static(PROVIDER_ORIGIN));
    headers.insert(REFERER, HeaderValue::from_static(PROVIDER_REFERER));
    headers.insert(HeaderName::from_static("authtoken"), token);
    headers.insert(HeaderName::from_static("lang"), HeaderValue::from_static("VN"));
    headers.insert(
        HeaderName::from_static("langtype"),
        HeaderValue::from_static("VN"),
    );
    headers.insert(
        HeaderName::from_static("timezone"),
        HeaderValue::from_static("GMT+0700"),
    );
    headers.insert(
        HeaderName::from_static("routename"),
        HeaderValue::from_static("trackingExpress"),
    );
    Ok(headers)
}
