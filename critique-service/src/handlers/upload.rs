//! `POST /api/upload`: photo in, post-processing advice out.
//!
//! The handler is a short pipeline. Each step either hands its output to the
//! next one or stops with a terminal [`UploadOutcome`]:
//!
//! 1. method gate (`OPTIONS` answers immediately),
//! 2. multipart read of the `image` file,
//! 3. presence check,
//! 4. one call to the vision provider and mapping of its answer.

use crate::models::upload::IMAGE_FIELD;
use crate::models::UploadedImage;
use crate::services::critique;
use crate::services::metrics;
use crate::services::providers::VisionProvider;
use crate::startup::AppState;
use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::ops::ControlFlow;
use std::time::Instant;

/// Terminal result of an upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// `OPTIONS` short-circuit.
    Preflight,
    /// Model answer, forwarded as-is.
    Critique(String),
    NoFile,
    /// Body exceeded the configured upload limit.
    PayloadTooLarge,
    /// The provider answered without a result object.
    BadGateway,
    /// Anything else; the cause is only logged.
    InternalError,
}

impl UploadOutcome {
    pub fn status(&self) -> StatusCode {
        match self {
            UploadOutcome::Preflight | UploadOutcome::Critique(_) => StatusCode::OK,
            UploadOutcome::NoFile => StatusCode::BAD_REQUEST,
            UploadOutcome::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            UploadOutcome::BadGateway => StatusCode::BAD_GATEWAY,
            UploadOutcome::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            UploadOutcome::Preflight => "preflight",
            UploadOutcome::Critique(_) => "success",
            UploadOutcome::NoFile => "no_file",
            UploadOutcome::PayloadTooLarge => "payload_too_large",
            UploadOutcome::BadGateway => "bad_gateway",
            UploadOutcome::InternalError => "internal_error",
        }
    }
}

impl IntoResponse for UploadOutcome {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            UploadOutcome::Preflight => return status.into_response(),
            UploadOutcome::Critique(text) => json!({ "result": text }),
            UploadOutcome::NoFile => json!({ "error": "No file uploaded." }),
            UploadOutcome::PayloadTooLarge => json!({ "error": "Payload Too Large" }),
            UploadOutcome::BadGateway => json!({ "error": "Bad Gateway" }),
            UploadOutcome::InternalError => json!({ "error": "Internal Server Error" }),
        };
        (status, Json(body)).into_response()
    }
}

pub async fn upload_handler(State(state): State<AppState>, request: Request) -> Response {
    let outcome = match validate(request).await {
        ControlFlow::Break(outcome) => outcome,
        ControlFlow::Continue(image) => request_critique(state.provider.as_ref(), &image).await,
    };

    metrics::record_upload(outcome.label());
    outcome.into_response()
}

/// Steps 1 to 3: everything that can answer without calling the provider.
async fn validate(request: Request) -> ControlFlow<UploadOutcome, UploadedImage> {
    let request = method_gate(request)?;
    let image = read_image(request).await?;
    require_image(image)
}

fn method_gate(request: Request) -> ControlFlow<UploadOutcome, Request> {
    if request.method() == Method::OPTIONS {
        ControlFlow::Break(UploadOutcome::Preflight)
    } else {
        ControlFlow::Continue(request)
    }
}

/// Buffer the first `image` file part. Other fields, and further parts, are
/// never read.
async fn read_image(request: Request) -> ControlFlow<UploadOutcome, Option<UploadedImage>> {
    if !is_multipart(request.headers()) {
        tracing::debug!("Upload body is not multipart");
        return ControlFlow::Continue(None);
    }

    let mut multipart = match Multipart::from_request(request, &()).await {
        Ok(multipart) => multipart,
        Err(rejection) => {
            tracing::error!(error = %rejection, "Malformed multipart request");
            return ControlFlow::Break(UploadOutcome::InternalError);
        }
    };

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return ControlFlow::Continue(None),
            Err(e) => return ControlFlow::Break(multipart_failure(e)),
        };

        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);

        let data = match field.bytes().await {
            Ok(data) => data,
            Err(e) => return ControlFlow::Break(multipart_failure(e)),
        };

        let image = UploadedImage {
            file_name,
            content_type,
            data,
        };
        tracing::info!(
            file_name = %image.file_name,
            content_type = image.content_type.as_deref().unwrap_or("-"),
            size = image.size(),
            "Received upload"
        );
        return ControlFlow::Continue(Some(image));
    }
}

/// `multipart/form-data`, with or without a usable boundary.
fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .is_some_and(|essence| essence.trim().eq_ignore_ascii_case("multipart/form-data"))
}

fn multipart_failure(error: axum::extract::multipart::MultipartError) -> UploadOutcome {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!(error = %error, "Upload exceeds the configured limit");
        UploadOutcome::PayloadTooLarge
    } else {
        tracing::error!(error = %error, "Failed to read multipart body");
        UploadOutcome::InternalError
    }
}

fn require_image(image: Option<UploadedImage>) -> ControlFlow<UploadOutcome, UploadedImage> {
    match image {
        Some(image) => ControlFlow::Continue(image),
        None => {
            tracing::info!("No file uploaded.");
            ControlFlow::Break(UploadOutcome::NoFile)
        }
    }
}

/// Step 4: a single provider call, no retry.
async fn request_critique(provider: &dyn VisionProvider, image: &UploadedImage) -> UploadOutcome {
    tracing::info!(provider = provider.name(), model = provider.model(), "Starting request...");

    let request = critique::build_request(image);
    let started = Instant::now();
    let result = provider.generate_content(&request).await;
    metrics::record_provider_latency(
        provider.name(),
        provider.model(),
        started.elapsed().as_secs_f64(),
    );

    let response = match result {
        Ok(Some(response)) => response,
        Ok(None) => {
            tracing::warn!(provider = provider.name(), "Provider returned no result");
            return UploadOutcome::BadGateway;
        }
        Err(e) => {
            metrics::record_provider_error(provider.name(), e.kind());
            tracing::error!(provider = provider.name(), error = %e, "Provider call failed");
            return UploadOutcome::InternalError;
        }
    };

    match response.text() {
        Ok(text) => UploadOutcome::Critique(text),
        Err(e) => {
            metrics::record_provider_error(provider.name(), e.kind());
            tracing::error!(provider = provider.name(), error = %e, "Provider response has no usable text");
            UploadOutcome::InternalError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request(method: Method) -> Request {
        axum::http::Request::builder()
            .method(method)
            .uri("/api/upload")
            .body(Body::from("ignored"))
            .unwrap()
    }

    #[test]
    fn options_stops_at_the_gate() {
        assert!(matches!(
            method_gate(request(Method::OPTIONS)),
            ControlFlow::Break(UploadOutcome::Preflight)
        ));
        assert!(matches!(
            method_gate(request(Method::POST)),
            ControlFlow::Continue(_)
        ));
    }

    #[test]
    fn missing_image_stops_with_no_file() {
        assert!(matches!(
            require_image(None),
            ControlFlow::Break(UploadOutcome::NoFile)
        ));
    }

    #[tokio::test]
    async fn non_multipart_body_reads_as_no_image() {
        let flow = read_image(request(Method::POST)).await;
        assert!(matches!(flow, ControlFlow::Continue(None)));
    }

    #[tokio::test]
    async fn multipart_without_boundary_is_internal_error() {
        let request = axum::http::Request::builder()
            .method(Method::POST)
            .uri("/api/upload")
            .header(CONTENT_TYPE, "multipart/form-data")
            .body(Body::from("x"))
            .unwrap();

        let flow = read_image(request).await;
        assert!(matches!(
            flow,
            ControlFlow::Break(UploadOutcome::InternalError)
        ));
    }

    #[test]
    fn multipart_detection_ignores_parameters_and_case() {
        let mut headers = HeaderMap::new();
        assert!(!is_multipart(&headers));

        headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
        assert!(!is_multipart(&headers));

        headers.insert(
            CONTENT_TYPE,
            "Multipart/Form-Data; boundary=abc".parse().unwrap(),
        );
        assert!(is_multipart(&headers));
    }

    #[test]
    fn outcomes_map_to_statuses() {
        assert_eq!(UploadOutcome::Preflight.status(), StatusCode::OK);
        assert_eq!(UploadOutcome::NoFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(UploadOutcome::BadGateway.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            UploadOutcome::InternalError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
