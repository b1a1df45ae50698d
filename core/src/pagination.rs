//! Cursor pagination and query-string assembly.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::null_as_default;

/// One page of a list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// Cursor for the following page. An empty cursor means this is the last page.
    pub fn next_cursor(&self) -> Option<&str> {
        self.next_cursor.as_deref().filter(|c| !c.is_empty())
    }

    pub fn has_more(&self) -> bool {
        self.next_cursor().is_some()
    }
}

/// `limit` / `cursor` pair accepted by every list endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
}

impl ListParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn cursor(mut self, cursor: impl Into<String>) -> Self {
        self.cursor = Some(cursor.into());
        self
    }

    pub(crate) fn apply(&self, query: &mut Query) {
        query.push_opt("limit", self.limit.filter(|l| *l > 0));
        query.push_opt("cursor", self.cursor.as_deref().filter(|c| !c.is_empty()));
    }
}

/// Ordered query-string builder. Values are percent-encoded; unset
/// parameters are skipped entirely.
#[derive(Debug, Default)]
pub(crate) struct Query {
    pairs: Vec<(&'static str, String)>,
}

impl Query {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, key: &'static str, value: impl ToString) -> &mut Self {
        self.pairs.push((key, value.to_string()));
        self
    }

    pub(crate) fn push_opt(&mut self, key: &'static str, value: Option<impl ToString>) -> &mut Self {
        if let Some(value) = value {
            self.push(key, value);
        }
        self
    }

    /// Append the query string to `path`, or return `path` unchanged if empty.
    pub(crate) fn to_path(&self, path: &str) -> String {
        if self.pairs.is_empty() {
            return path.to_string();
        }
        let query = self
            .pairs
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        format!("{path}?{query}")
    }
}

/// Percent-encode one path segment (a resource id).
pub(crate) fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

/// Fetch every page, feeding each `next_cursor` back into `fetch` until the
/// server returns an empty one. Items keep server order.
pub fn paginate<T, F>(mut fetch: F) -> Result<Vec<T>>
where
    F: FnMut(Option<&str>) -> Result<Page<T>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let page = fetch(cursor.as_deref())?;
        let next = page.next_cursor().map(str::to_owned);
        items.extend(page.data);
        match next {
            None => return Ok(items),
            Some(next) if cursor.as_deref() == Some(next.as_str()) => {
                return Err(Error::Deserialization(format!(
                    "pagination cursor {next:?} did not advance"
                )));
            }
            Some(next) => cursor = Some(next),
        }
    }
}
