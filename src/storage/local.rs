//! Local directory backend
//!
//! Stores objects as plain files under a root directory using the same
//! partition layout as the cloud backends. Listing has prefix semantics: a
//! partition prefix maps onto a directory, and the files inside it are the
//! objects. Used by the CLI for development runs and by integration tests;
//! production runs construct one of the cloud adapters instead.

use crate::error::{Error, Result};
use crate::storage::gcs::window_prefixes;
use crate::storage::{EventSource, ObjectBody, ObjectFetcher, ObjectMeta};
use crate::window::TimeRange;
use async_trait::async_trait;
use std::path::PathBuf;

pub struct LocalSource {
    root: PathBuf,
}

impl LocalSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<ObjectMeta>> {
        let dir = self.root.join(prefix);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| Error::storage("local", "list", e.to_string()))?;

        let mut keys = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::storage("local", "list", e.to_string()))?
        {
            if entry.path().is_file() {
                keys.push(format!("{prefix}{}", entry.file_name().to_string_lossy()));
            }
        }
        // read_dir order is platform-dependent.
        keys.sort();
        Ok(keys.into_iter().map(|key| ObjectMeta { key }).collect())
    }
}

#[async_trait]
impl ObjectFetcher for LocalSource {
    async fn fetch(&self, key: &str) -> Result<ObjectBody> {
        let path = self.root.join(key);
        let data = tokio::fs::read(&path)
            .await
            .map_err(|e| Error::storage("local", "get", format!("{key}: {e}")))?;
        let content_type = if key.ends_with(".gz") {
            Some("application/gzip".to_string())
        } else {
            Some("application/json".to_string())
        };
        Ok(ObjectBody { content_type, data })
    }
}

#[async_trait]
impl EventSource for LocalSource {
    async fn list_window(&self, account: &str, window: &TimeRange) -> Result<Vec<ObjectMeta>> {
        let mut objects = Vec::new();
        for prefix in window_prefixes(account, window) {
            objects.extend(self.list_prefix(&prefix).await?);
        }
        Ok(objects)
    }
}
