//! API information: documentation pointer and the SOAP service directory.

use crate::soap::{Operation, GENERIC_CONTRACT};
use crate::state::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use serde::Serialize;

pub const API_TITLE: &str = "SIH ERP API";

#[derive(Serialize)]
pub struct Documentation {
    pub title: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub rest_base: &'static str,
    pub soap_base: &'static str,
    pub hub: &'static str,
    pub health: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub name: String,
    pub contract: String,
    pub endpoint: String,
    pub rest_endpoint: Option<String>,
    pub operations: Vec<&'static str>,
}

#[derive(Serialize)]
pub struct ServiceDirectory {
    pub message: &'static str,
    pub services: Vec<ServiceInfo>,
}

/// GET /api/documentation
pub async fn documentation() -> Json<Documentation> {
    Json(Documentation {
        title: API_TITLE,
        description: "Student-records ERP: parallel SOAP and REST endpoints over one entity catalog",
        version: env!("CARGO_PKG_VERSION"),
        rest_base: "/api/{entity}",
        soap_base: "/soap/{entity}",
        hub: "/api/dashboard/hub",
        health: "/health",
    })
}

fn base_url(headers: &HeaderMap) -> String {
    headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|h| format!("http://{}", h))
        .unwrap_or_default()
}

/// GET /api/services
pub async fn services(State(state): State<AppState>, headers: HeaderMap) -> Json<ServiceDirectory> {
    let base = base_url(&headers);
    let operations: Vec<&'static str> = Operation::ALL.iter().map(|o| o.name()).collect();
    let mut services: Vec<ServiceInfo> = state
        .registry
        .catalog()
        .entities
        .iter()
        .map(|e| ServiceInfo {
            name: format!("{}Service", e.label),
            contract: e.contract(),
            endpoint: format!("{}/soap/{}", base, e.name),
            rest_endpoint: Some(format!("{}/api/{}", base, e.name)),
            operations: operations.clone(),
        })
        .collect();
    services.push(ServiceInfo {
        name: "GenericCrudService".to_string(),
        contract: GENERIC_CONTRACT.to_string(),
        endpoint: format!("{}/soap", base),
        rest_endpoint: None,
        operations,
    });
    Json(ServiceDirectory {
        message: "Every SOAP service supports ListAsync, GetAsync, CreateAsync, UpdateAsync and RemoveAsync.",
        services,
    })
}
