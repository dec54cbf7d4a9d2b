use crate::error::{InvalidPageLimitSnafu, Result};
use crate::storage::constants::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, MIN_PAGE_LIMIT};
use crate::storage::models::RawPage;
use serde::Serialize;
use snafu::ensure;
use std::future::Future;

/// One bounded window of a remote collection.
///
/// `has_more` is true exactly when `total > offset + count`, and
/// `next_offset` is present exactly when `has_more` is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub count: usize,
    pub offset: u64,
    pub has_more: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_offset: Option<u64>,
}

impl<T> Page<T> {
    /// Derive page metadata from a raw gateway response.
    ///
    /// Extra items beyond `limit` are dropped so a page never exceeds the
    /// requested size.
    pub fn from_raw(raw: RawPage<T>, limit: u32, offset: u64) -> Self {
        let mut items = raw.items;
        items.truncate(limit as usize);
        let count = items.len();
        let end = offset.saturating_add(count as u64);
        let has_more = raw.total > end;
        Self {
            items,
            total: raw.total,
            count,
            offset,
            has_more,
            next_offset: has_more.then_some(end),
        }
    }
}

/// Apply defaults and check bounds, before any remote call is made.
pub fn validate_window(limit: Option<u32>, offset: Option<u64>) -> Result<(u32, u64)> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    ensure!(
        (MIN_PAGE_LIMIT..=MAX_PAGE_LIMIT).contains(&limit),
        InvalidPageLimitSnafu {
            limit,
            min: MIN_PAGE_LIMIT,
            max: MAX_PAGE_LIMIT,
        }
    );
    Ok((limit, offset.unwrap_or(0)))
}

/// Fetch one page through `fetch`, which receives the validated limit and offset.
pub async fn paginate<T, F, Fut>(
    limit: Option<u32>,
    offset: Option<u64>,
    fetch: F,
) -> Result<Page<T>>
where
    F: FnOnce(u32, u64) -> Fut,
    Fut: Future<Output = Result<RawPage<T>>>,
{
    let (limit, offset) = validate_window(limit, offset)?;
    let raw = fetch(limit, offset).await?;
    Ok(Page::from_raw(raw, limit, offset))
}
