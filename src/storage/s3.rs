//! Offset-range object store adapter
//!
//! S3-compatible stores list lexicographically between a start and an end
//! offset, so one `(start_after, end_before)` pair covers any window: the
//! partition layout sorts keys chronologically within an account.

use crate::error::Result;
use crate::partition;
use crate::reader::ListReader;
use crate::storage::{EventSource, ObjectBody, ObjectFetcher, ObjectMeta};
use crate::window::TimeRange;
use async_trait::async_trait;
use std::sync::Arc;

/// Lexicographic key range selector: `start_after <= key < end_before`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeQuery {
    pub start_after: String,
    pub end_before: String,
}

/// The single range query covering `[window.start, window.end)` for one
/// account. Window boundaries are hour-aligned, so both offsets are plain
/// partition prefixes.
pub fn window_query(account: &str, window: &TimeRange) -> RangeQuery {
    RangeQuery {
        start_after: partition::key_prefix(account, window.start),
        end_before: partition::key_prefix(account, window.end),
    }
}

/// Minimal client surface of an offset-range-capable object store.
/// Credential and session setup belong to the caller constructing the
/// client.
#[async_trait]
pub trait RangeListClient: Send + Sync + 'static {
    /// List keys in `start_after <= key < end_before`, in key order.
    async fn list_range(
        &self,
        bucket: &str,
        start_after: &str,
        end_before: &str,
    ) -> Result<Vec<ObjectMeta>>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody>;
}

/// Event source over an offset-range store.
pub struct S3Source<C> {
    client: C,
    bucket: String,
}

impl<C: RangeListClient> S3Source<C> {
    pub fn new(client: C, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl<C: RangeListClient> ObjectFetcher for S3Source<C> {
    async fn fetch(&self, key: &str) -> Result<ObjectBody> {
        self.client.get_object(&self.bucket, key).await
    }
}

#[async_trait]
impl<C: RangeListClient> EventSource for S3Source<C> {
    async fn list_window(&self, account: &str, window: &TimeRange) -> Result<Vec<ObjectMeta>> {
        let query = window_query(account, window);
        self.client
            .list_range(&self.bucket, &query.start_after, &query.end_before)
            .await
    }
}

/// Sequential reader over every event in `range`, in key order. One list
/// call covers the whole range on this backend.
pub async fn event_reader<C: RangeListClient>(
    source: Arc<S3Source<C>>,
    account: &str,
    range: &TimeRange,
) -> Result<ListReader<S3Source<C>>> {
    let objects = source.list_window(account, &range.truncated()).await?;
    Ok(ListReader::new(source, objects))
}
