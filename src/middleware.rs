//! Fault boundary: anything that escapes a handler becomes a 500 in the transport's own format.
//! Oversized SOAP requests are answered with a Client fault instead of the limit layer's plain text.

use crate::error::ErrorBody;
use crate::soap::{fault_envelope, SoapXml};
use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// Paths under this prefix get SOAP faults instead of JSON errors.
pub const SOAP_PREFIX: &str = "/soap";

pub fn is_soap_path(path: &str) -> bool {
    path == SOAP_PREFIX || path.starts_with("/soap/")
}

/// Use with `axum::middleware::from_fn(fault_boundary)` outside the body limit layer.
pub async fn fault_boundary(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) if response.status() == StatusCode::PAYLOAD_TOO_LARGE && is_soap_path(&path) => {
            tracing::warn!(path = %path, "request body too large");
            SoapXml {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                body: fault_envelope("Client", "Request body too large"),
            }
            .into_response()
        }
        Ok(response) => response,
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            tracing::error!(path = %path, error = %message, "unhandled failure");
            internal_error(&path, &message)
        }
    }
}

/// 500 for `path`: a `soap:Fault` with faultcode Server on SOAP paths, the JSON error body elsewhere.
pub fn internal_error(path: &str, message: &str) -> Response {
    if is_soap_path(path) {
        SoapXml {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: fault_envelope("Server", message),
        }
        .into_response()
    } else {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        (status, Json(ErrorBody::new(status, message))).into_response()
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Internal Server Error".to_string()
    }
}
