use crate::dispatcher::Dispatcher;
use crate::errors::TrackingError;
use crate::request::LookupRequest;
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use shared::http::{json_response, make_error_response};
use std::future::Future;
use std::pin::Pin;

pub const TRACKING_PATH: &str = "/api/tracking";
pub const HEALTH_PATH: &str = "/health";

/// Batch bodies above this size are refused outright.
const MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Serialize)]
struct ApiErrorResponse<'a> {
    error: &'a str,
}

/// HTTP front door for batch tracking lookups.
pub struct TrackingService {
    dispatcher: Dispatcher,
}

impl TrackingService {
    pub fn new(dispatcher: Dispatcher) -> Self {
        TrackingService { dispatcher }
    }
}

impl Service<Request<Incoming>> for TrackingService {
    type Response = Response<BoxBody<Bytes, Self::Error>>;
    type Error = TrackingError;
    type Future =
        Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send + 'static>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let dispatcher = self.dispatcher.clone();
        Box::pin(async move {
            let response = route(&dispatcher, req).await;
            Ok(response.map(|body| body.map_err(|e| match e {}).boxed()))
        })
    }
}

/// Dispatches a request to its handler by method and path.
pub async fn route<B>(dispatcher: &Dispatcher, req: Request<B>) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    tracing::debug!(method = %req.method(), path = %req.uri().path(), "Received request");

    match (req.method(), req.uri().path()) {
        (&Method::POST, TRACKING_PATH) => {
            let body = match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                    return make_error_response(StatusCode::PAYLOAD_TOO_LARGE);
                }
                Err(e) => {
                    tracing::debug!("Failed to read request body: {e}");
                    return make_error_response(StatusCode::BAD_REQUEST);
                }
            };
            handle_tracking(dispatcher, &body).await
        }
        (_, TRACKING_PATH) => make_error_response(StatusCode::METHOD_NOT_ALLOWED),
        (&Method::GET, HEALTH_PATH) => Response::new(Full::new(Bytes::from("ok\n"))),
        _ => make_error_response(StatusCode::NOT_FOUND),
    }
}

/// Validates the batch, runs it, and returns the records in submission order.
/// Validation failures are the only non-200 outcome once the body is read.
pub async fn handle_tracking(dispatcher: &Dispatcher, body: &[u8]) -> Response<Full<Bytes>> {
    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(_) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                &ApiErrorResponse {
                    error: "invalid JSON body",
                },
            );
        }
    };

    let request = match LookupRequest::from_json(&value) {
        Ok(request) => request,
        Err(e) => {
            return json_response(
                StatusCode::BAD_REQUEST,
                &ApiErrorResponse {
                    error: &e.to_string(),
                },
            );
        }
    };

    let batch_size = request.identifiers().len();
    let records = dispatcher.run(request).await;
    let failed = records.iter().filter(|r| r.is_failed()).count();
    tracing::info!(batch_size, failed, "Tracking batch completed");

    json_response(StatusCode::OK, &records)
}
