//! REST success envelope: `{ "data": …, "meta": … }`. Single records carry no meta.

use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Envelope<T, M = ()> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<M>,
}

/// Paging echo for list responses; `count` is the number of records in this page.
#[derive(Serialize)]
pub struct PageMeta {
    pub count: u64,
    pub limit: i64,
    pub offset: i64,
}

pub type Reply<T, M = ()> = (StatusCode, Json<Envelope<T, M>>);

fn reply<T, M>(status: StatusCode, data: T, meta: Option<M>) -> Reply<T, M> {
    (status, Json(Envelope { data, meta }))
}

/// 201 with the created record.
pub fn created<T: Serialize>(data: T) -> Reply<T> {
    reply(StatusCode::CREATED, data, None)
}

/// 200 with one record.
pub fn one<T: Serialize>(data: T) -> Reply<T> {
    reply(StatusCode::OK, data, None)
}

/// 200 with a page of records.
pub fn page<T: Serialize>(data: Vec<T>, limit: i64, offset: i64) -> Reply<Vec<T>, PageMeta> {
    let count = data.len() as u64;
    reply(StatusCode::OK, data, Some(PageMeta { count, limit, offset }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_record_omits_meta() {
        let (status, Json(body)) = created(json!({"dept_id": 1}));
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(serde_json::to_value(body).unwrap(), json!({"data": {"dept_id": 1}}));
    }

    #[test]
    fn page_echoes_paging() {
        let (_, Json(body)) = page(vec![json!(1), json!(2)], 10, 20);
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"data": [1, 2], "meta": {"count": 2, "limit": 10, "offset": 20}})
        );
    }
}
