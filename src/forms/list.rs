//! Client-side list view: search, sort and paginate rows already fetched from the API.

use crate::config::{is_decimal_text, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Asc => SortDirection::Desc,
            SortDirection::Desc => SortDirection::Asc,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub sort: Option<(String, SortDirection)>,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        ListQuery {
            search: String::new(),
            sort: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListQuery {
    /// Header click: same column flips direction, a new column starts ascending.
    pub fn sort_by(&mut self, field: &str) {
        self.sort = match self.sort.take() {
            Some((f, dir)) if f == field => Some((f, dir.toggle())),
            _ => Some((field.to_string(), SortDirection::Asc)),
        };
    }

    /// New search term; back to the first page.
    pub fn search_for(&mut self, term: &str) {
        self.search = term.to_string();
        self.page = 1;
    }

    pub fn set_page_size(&mut self, size: usize) {
        self.page_size = size.max(1);
        self.page = 1;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Page {
    pub items: Vec<Record>,
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

fn display(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.to_lowercase()),
        other => Some(other.to_string().to_lowercase()),
    }
}

/// Numbers and decimal text compare by value.
fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if is_decimal_text(s) => s.parse().ok(),
        _ => None,
    }
}

/// Nulls last in either direction; numbers numerically, everything else by lowercase text.
fn compare(a: Option<&Value>, b: Option<&Value>, dir: SortDirection) -> Ordering {
    let a = a.filter(|v| !v.is_null());
    let b = b.filter(|v| !v.is_null());
    let ord = match (a, b) {
        (None, None) => return Ordering::Equal,
        (None, Some(_)) => return Ordering::Greater,
        (Some(_), None) => return Ordering::Less,
        (Some(x), Some(y)) => match (number(x), number(y)) {
            (Some(n), Some(m)) => n.partial_cmp(&m).unwrap_or(Ordering::Equal),
            _ => display(x).cmp(&display(y)),
        },
    };
    match dir {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

/// Filter by case-insensitive substring over `search_fields`, stable-sort, then cut one page.
pub fn apply(rows: &[Record], search_fields: &[String], query: &ListQuery) -> Page {
    let term = query.search.trim().to_lowercase();
    let mut matched: Vec<&Record> = rows
        .iter()
        .filter(|r| {
            term.is_empty()
                || search_fields
                    .iter()
                    .any(|f| r.get(f).and_then(display).map_or(false, |s| s.contains(&term)))
        })
        .collect();

    if let Some((field, dir)) = &query.sort {
        matched.sort_by(|a, b| compare(a.get(field), b.get(field), *dir));
    }

    let page_size = query.page_size.max(1);
    let page = query.page.max(1);
    let total = matched.len();
    let items = matched
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .cloned()
        .collect();
    Page {
        items,
        page,
        page_size,
        total,
        total_pages: total.div_ceil(page_size),
    }
}

/// Outcome of one list or form request.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestState<T> {
    Loading,
    Success(T),
    Error(String),
}

impl<T> RequestState<T> {
    pub fn from_result<E: std::fmt::Display>(r: Result<T, E>) -> Self {
        match r {
            Ok(v) => RequestState::Success(v),
            Err(e) => RequestState::Error(e.to_string()),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }
}

/// Delete needs an explicit confirmation of the same row.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum DeleteConfirmation {
    #[default]
    Idle,
    Pending { id: i64 },
}

impl DeleteConfirmation {
    pub fn request(&mut self, id: i64) {
        *self = DeleteConfirmation::Pending { id };
    }

    pub fn cancel(&mut self) {
        *self = DeleteConfirmation::Idle;
    }

    /// The id to delete, if `id` is the pending one. Resets either way.
    pub fn confirm(&mut self, id: i64) -> Option<i64> {
        let pending = std::mem::take(self);
        match pending {
            DeleteConfirmation::Pending { id: p } if p == id => Some(id),
            _ => None,
        }
    }
}
