//! Shared fixtures: in-memory storage backends and event builders.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::collections::BTreeMap;
use std::io::Write;
use usage_meter::codec::EventEncoder;
use usage_meter::error::{Error, Result};
use usage_meter::models::{EventTags, UsageEvent, MAX_RESOURCE_COUNT};
use usage_meter::storage::azure::{ObjectPage, PagedListClient};
use usage_meter::storage::gcs::PrefixListClient;
use usage_meter::storage::s3::RangeListClient;
use usage_meter::storage::{ObjectBody, ObjectMeta};

pub fn event(scope: &str, kind: &str, t: DateTime<Utc>, value: f64) -> UsageEvent {
    UsageEvent {
        name: MAX_RESOURCE_COUNT.to_string(),
        tags: EventTags {
            scope_id: scope.to_string(),
            resource_group: "example.org".to_string(),
            resource_version: "v1".to_string(),
            resource_kind: kind.to_string(),
            account: String::new(),
        },
        timestamp: t,
        timestamp_end: t + chrono::Duration::minutes(5),
        value,
    }
}

pub fn encode_events(events: &[UsageEvent]) -> Vec<u8> {
    let mut encoder = EventEncoder::new(Vec::new()).unwrap();
    for e in events {
        encoder.encode(e).unwrap();
    }
    encoder.close().unwrap()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut gz = GzEncoder::new(Vec::new(), Compression::default());
    gz.write_all(data).unwrap();
    gz.finish().unwrap()
}

/// In-memory object store with sorted keys, serving all three backend
/// client shapes off the same data.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: BTreeMap<String, ObjectBody>,
}

impl MemoryStore {
    pub fn put_json(&mut self, key: &str, events: &[UsageEvent]) {
        self.objects.insert(
            key.to_string(),
            ObjectBody {
                content_type: Some("application/json".to_string()),
                data: encode_events(events),
            },
        );
    }

    pub fn put_gzip(&mut self, key: &str, events: &[UsageEvent]) {
        self.objects.insert(
            key.to_string(),
            ObjectBody {
                content_type: Some("application/gzip".to_string()),
                data: gzip(&encode_events(events)),
            },
        );
    }

    pub fn put_raw(&mut self, key: &str, data: Vec<u8>) {
        self.objects.insert(
            key.to_string(),
            ObjectBody {
                content_type: Some("application/json".to_string()),
                data,
            },
        );
    }

    fn get(&self, key: &str) -> Result<ObjectBody> {
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| Error::storage("memory", "get", format!("no such key {key}")))
    }
}

#[async_trait]
impl RangeListClient for MemoryStore {
    async fn list_range(
        &self,
        _bucket: &str,
        start_after: &str,
        end_before: &str,
    ) -> Result<Vec<ObjectMeta>> {
        Ok(self
            .objects
            .range(start_after.to_string()..end_before.to_string())
            .map(|(key, _)| ObjectMeta { key: key.clone() })
            .collect())
    }

    async fn get_object(&self, _bucket: &str, key: &str) -> Result<ObjectBody> {
        self.get(key)
    }
}

#[async_trait]
impl PrefixListClient for MemoryStore {
    async fn list_prefix(&self, _bucket: &str, prefix: &str) -> Result<Vec<ObjectMeta>> {
        Ok(self
            .objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .map(|key| ObjectMeta { key: key.clone() })
            .collect())
    }

    async fn get_object(&self, _bucket: &str, key: &str) -> Result<ObjectBody> {
        self.get(key)
    }
}

#[async_trait]
impl PagedListClient for MemoryStore {
    async fn list_prefix_page(
        &self,
        _container: &str,
        prefix: &str,
        marker: Option<&str>,
    ) -> Result<ObjectPage> {
        const PAGE_SIZE: usize = 2;
        let all: Vec<String> = self
            .objects
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect();
        let offset: usize = marker.map(|m| m.parse().unwrap_or(0)).unwrap_or(0);
        let end = std::cmp::min(offset + PAGE_SIZE, all.len());
        let next_marker = (end < all.len()).then(|| end.to_string());
        Ok(ObjectPage {
            objects: all[offset..end]
                .iter()
                .map(|key| ObjectMeta { key: key.clone() })
                .collect(),
            next_marker,
        })
    }

    async fn get_blob(&self, _container: &str, key: &str) -> Result<ObjectBody> {
        self.get(key)
    }
}

/// Unpack a plain (not gzipped) tar archive into (path, contents) pairs.
pub fn untar(archive: &[u8]) -> Vec<(String, Vec<u8>)> {
    use std::io::Read;
    let mut ar = tar::Archive::new(archive);
    ar.entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let path = entry.path().unwrap().to_string_lossy().into_owned();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            (path, data)
        })
        .collect()
}
