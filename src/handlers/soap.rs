//! SOAP endpoints: one contract per entity at `/soap/{entity}`, plus the table-generic contract at `/soap`.

use crate::error::AppError;
use crate::service::EntityService;
use crate::soap::{
    fault_envelope, parse_envelope, parse_soap_action, record_from_element, response_envelope, Operation, SoapError,
    SoapResult, SoapXml, XmlElement, GENERIC_CONTRACT,
};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
};

const SOAP_ACTION: &str = "SOAPAction";

/// Every failure is HTTP 500 with a `soap:Fault`; the faultcode says whose fault it was.
fn fault(e: AppError) -> SoapXml {
    e.log();
    SoapXml {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        body: fault_envelope(e.fault_code(), &e.to_string()),
    }
}

fn ok(body: String) -> SoapXml {
    SoapXml {
        status: StatusCode::OK,
        body,
    }
}

fn body_text(body: &Bytes) -> Result<&str, AppError> {
    std::str::from_utf8(body).map_err(|_| AppError::BadRequest("request body is not UTF-8".into()))
}

/// Operation from the SOAPAction header when present, else from the Body's first element.
/// A contract named in SOAPAction must be the endpoint's own.
fn operation(headers: &HeaderMap, op_element: &XmlElement, contract: &str) -> Result<Operation, SoapError> {
    let action = headers
        .get(SOAP_ACTION)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_soap_action);
    match action {
        Some((named, op)) => {
            if let Some(named) = named {
                if !named.eq_ignore_ascii_case(contract) {
                    return Err(SoapError::ContractMismatch {
                        expected: contract.to_string(),
                        got: named,
                    });
                }
            }
            Operation::parse(&op)
        }
        None => Operation::parse(&op_element.name),
    }
}

/// `id`, or the entity's identifier element (`student_id`).
fn id_param(svc: &EntityService, el: &XmlElement) -> Result<i64, SoapError> {
    match el.child_i64("id")? {
        Some(id) => Ok(id),
        None => el
            .child_i64(svc.entity().id_name())?
            .ok_or_else(|| SoapError::MissingElement("id".into())),
    }
}

fn item_param<'a>(svc: &EntityService, el: &'a XmlElement) -> Result<&'a XmlElement, SoapError> {
    el.child("item")
        .or_else(|| el.child(svc.entity().label))
        .ok_or_else(|| SoapError::MissingElement("item".into()))
}

async fn execute(svc: &EntityService, op: Operation, el: &XmlElement) -> Result<String, AppError> {
    let entity = svc.entity();
    tracing::debug!(entity = %entity.name, operation = op.name(), "soap call");
    let xml = match op {
        Operation::List => {
            let rows = svc.list(el.child_i64("limit")?, el.child_i64("offset")?).await?;
            response_envelope(entity, op.name(), SoapResult::Many(&rows))
        }
        Operation::Get => {
            let row = svc.get(id_param(svc, el)?).await?;
            response_envelope(entity, op.name(), SoapResult::One(row.as_ref()))
        }
        Operation::Create => {
            let record = record_from_element(entity, item_param(svc, el)?)?;
            let row = svc.create(record).await?;
            response_envelope(entity, op.name(), SoapResult::One(Some(&row)))
        }
        Operation::Update => {
            let id = id_param(svc, el)?;
            let record = record_from_element(entity, item_param(svc, el)?)?;
            let row = svc.update(id, record).await?;
            response_envelope(entity, op.name(), SoapResult::One(row.as_ref()))
        }
        Operation::Remove => {
            let row = svc.remove(id_param(svc, el)?).await?;
            response_envelope(entity, op.name(), SoapResult::One(row.as_ref()))
        }
    };
    Ok(xml)
}

async fn run_entity(state: &AppState, path_segment: &str, headers: &HeaderMap, body: &Bytes) -> Result<String, AppError> {
    let svc = state.registry.resolve(path_segment)?;
    let op_element = parse_envelope(body_text(body)?)?;
    let op = operation(headers, &op_element, &svc.entity().contract())?;
    execute(svc, op, &op_element).await
}

async fn run_generic(state: &AppState, headers: &HeaderMap, body: &Bytes) -> Result<String, AppError> {
    let op_element = parse_envelope(body_text(body)?)?;
    let op = operation(headers, &op_element, GENERIC_CONTRACT)?;
    let table = op_element
        .child_text("table")
        .ok_or_else(|| SoapError::MissingElement("table".into()))?;
    let svc = state.registry.resolve_table(table)?;
    if let Some(pk) = op_element.child_text("primaryKey") {
        if !pk.eq_ignore_ascii_case(svc.entity().id_name()) {
            return Err(AppError::BadRequest(format!(
                "primaryKey '{}' is not the identifier of table '{}'",
                pk,
                svc.entity().table
            )));
        }
    }
    execute(svc, op, &op_element).await
}

/// POST /soap/:entity
pub async fn entity_endpoint(
    State(state): State<AppState>,
    Path(path_segment): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> SoapXml {
    match run_entity(&state, &path_segment, &headers, &body).await {
        Ok(xml) => ok(xml),
        Err(e) => fault(e),
    }
}

/// POST /soap
pub async fn generic_endpoint(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> SoapXml {
    match run_generic(&state, &headers, &body).await {
        Ok(xml) => ok(xml),
        Err(e) => fault(e),
    }
}
