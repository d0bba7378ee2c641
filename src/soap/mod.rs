//! SOAP 1.1 transport: envelope parsing, operation dispatch names, and response/fault writing.

mod envelope;
mod writer;

pub use envelope::{parse_envelope, record_from_element, XmlElement};
pub use writer::{fault_envelope, response_envelope, SoapResult};

use crate::error::AppError;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

pub const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const XSI_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
/// Service namespace of every contract.
pub const SERVICE_NS: &str = "http://tempuri.org/";
/// Contract name of the table-generic endpoint at `/soap`.
pub const GENERIC_CONTRACT: &str = "IGenericCrud";
pub const CONTENT_TYPE: &str = "text/xml; charset=utf-8";

#[derive(Error, Debug)]
pub enum SoapError {
    #[error("malformed XML: {0}")]
    Xml(String),
    #[error("request is not a SOAP envelope")]
    NotEnvelope,
    #[error("SOAP envelope has no Body")]
    MissingBody,
    #[error("SOAP Body is empty")]
    EmptyBody,
    #[error("unknown operation: {0}")]
    UnknownOperation(String),
    #[error("SOAPAction contract {got} does not match endpoint contract {expected}")]
    ContractMismatch { expected: String, got: String },
    #[error("missing element: {0}")]
    MissingElement(String),
    #[error("{element}: {message}")]
    BadValue { element: String, message: String },
}

impl From<SoapError> for AppError {
    fn from(e: SoapError) -> Self {
        AppError::BadRequest(e.to_string())
    }
}

/// The five operations every contract exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    List,
    Get,
    Create,
    Update,
    Remove,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::List,
        Operation::Get,
        Operation::Create,
        Operation::Update,
        Operation::Remove,
    ];

    /// Wire name, e.g. `ListAsync`.
    pub fn name(self) -> &'static str {
        match self {
            Operation::List => "ListAsync",
            Operation::Get => "GetAsync",
            Operation::Create => "CreateAsync",
            Operation::Update => "UpdateAsync",
            Operation::Remove => "RemoveAsync",
        }
    }

    /// Accepts `ListAsync` and `List`, any case.
    pub fn parse(s: &str) -> Result<Self, SoapError> {
        let lower = s.trim().to_ascii_lowercase();
        let base = lower.strip_suffix("async").unwrap_or(&lower);
        Ok(match base {
            "list" => Operation::List,
            "get" => Operation::Get,
            "create" => Operation::Create,
            "update" => Operation::Update,
            "remove" => Operation::Remove,
            _ => return Err(SoapError::UnknownOperation(s.to_string())),
        })
    }
}

/// Split `"http://tempuri.org/IStudentService/ListAsync"` into `(Some("IStudentService"), "ListAsync")`.
/// Surrounding quotes are optional; an empty header yields `None`.
pub fn parse_soap_action(header: &str) -> Option<(Option<String>, String)> {
    let action = header.trim().trim_matches('"').trim();
    if action.is_empty() {
        return None;
    }
    let mut parts = action.rsplit('/');
    let op = parts.next()?.to_string();
    let contract = parts.next().filter(|c| !c.is_empty() && !c.contains(':') && !c.contains('.')).map(str::to_string);
    Some((contract, op))
}

/// An XML body with the SOAP content type.
pub struct SoapXml {
    pub status: StatusCode,
    pub body: String,
}

impl IntoResponse for SoapXml {
    fn into_response(self) -> Response {
        (self.status, [(header::CONTENT_TYPE, CONTENT_TYPE)], self.body).into_response()
    }
}
