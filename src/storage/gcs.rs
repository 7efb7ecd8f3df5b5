//! Prefix-listing blob store adapter
//!
//! Stores without range listing can only enumerate by key prefix, so a
//! window expands into one discrete list request per hour boundary it
//! crosses. A multi-day window therefore issues many single-hour lists;
//! this is the backend's real capability and is kept explicit rather than
//! papered over with a range-like facade.

use crate::error::Result;
use crate::partition;
use crate::reader::{EventRead, ListReader, MultiReader};
use crate::storage::{EventSource, ObjectBody, ObjectFetcher, ObjectMeta};
use crate::window::TimeRange;
use async_trait::async_trait;
use std::sync::Arc;

/// One partition prefix per hour covered by the window: inclusive of the
/// start's hour, exclusive of the end's hour.
pub fn window_prefixes(account: &str, window: &TimeRange) -> Vec<String> {
    partition::hour_starts(window)
        .into_iter()
        .map(|hour| partition::key_prefix(account, hour))
        .collect()
}

/// Minimal client surface of a prefix-listing blob store.
#[async_trait]
pub trait PrefixListClient: Send + Sync + 'static {
    async fn list_prefix(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectMeta>>;

    async fn get_object(&self, bucket: &str, key: &str) -> Result<ObjectBody>;
}

/// Event source over a prefix-listing store.
pub struct GcsSource<C> {
    client: C,
    bucket: String,
}

impl<C: PrefixListClient> GcsSource<C> {
    pub fn new(client: C, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl<C: PrefixListClient> ObjectFetcher for GcsSource<C> {
    async fn fetch(&self, key: &str) -> Result<ObjectBody> {
        self.client.get_object(&self.bucket, key).await
    }
}

#[async_trait]
impl<C: PrefixListClient> EventSource for GcsSource<C> {
    async fn list_window(&self, account: &str, window: &TimeRange) -> Result<Vec<ObjectMeta>> {
        let mut objects = Vec::new();
        for prefix in window_prefixes(account, window) {
            objects.extend(self.client.list_prefix(&self.bucket, &prefix).await?);
        }
        Ok(objects)
    }
}

/// Sequential reader over every event in `range`: one per-hour list reader,
/// concatenated in chronological order.
pub async fn event_reader<C: PrefixListClient>(
    source: Arc<GcsSource<C>>,
    account: &str,
    range: &TimeRange,
) -> Result<MultiReader> {
    let range = range.truncated();
    let mut readers: Vec<Box<dyn EventRead>> = Vec::new();
    for prefix in window_prefixes(account, &range) {
        let objects = source.client.list_prefix(&source.bucket, &prefix).await?;
        readers.push(Box::new(ListReader::new(source.clone(), objects)));
    }
    Ok(MultiReader::new(readers))
}
