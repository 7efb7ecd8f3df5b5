//! Backend-agnostic object storage interfaces
//!
//! Raw events live in object storage under the hourly partition layout
//! (see [`crate::partition`]). Backends genuinely differ in how they list:
//! an offset-range store takes lexicographic start/end offsets in a single
//! call ([`s3`]), a prefix-listing store needs one discrete request per
//! hour prefix ([`gcs`]), and a paged container walks pages per prefix
//! ([`azure`]). Each adapter keeps its own query-building code path rather
//! than hiding the difference behind one universal query type.
//!
//! What the adapters share is the read side: [`ObjectFetcher`] opens one
//! object for streaming decode, and [`EventSource`] is the pipeline-facing
//! capability of listing a window's objects plus fetching them. Cloud
//! client wiring (credentials, sessions, endpoints) stays behind the
//! per-backend client traits; this crate supplies a concrete
//! directory-backed implementation ([`local`]) for development and tests.

pub mod azure;
pub mod gcs;
pub mod local;
pub mod s3;

use crate::error::Result;
use crate::window::TimeRange;
use async_trait::async_trait;

/// A listed storage object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    pub key: String,
}

/// A fetched object: its declared content type and raw payload. Bodies
/// with a gzip content type are decompressed by the object reader.
#[derive(Debug, Clone)]
pub struct ObjectBody {
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl ObjectBody {
    pub fn is_gzip(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct == "application/gzip" || ct == "application/x-gzip")
            .unwrap_or(false)
    }
}

/// Opens a single object for reading.
#[async_trait]
pub trait ObjectFetcher: Send + Sync + 'static {
    async fn fetch(&self, key: &str) -> Result<ObjectBody>;
}

/// A backend able to enumerate the objects covering one window. This is
/// the capability the pipeline orchestrator runs against.
#[async_trait]
pub trait EventSource: ObjectFetcher {
    async fn list_window(&self, account: &str, window: &TimeRange) -> Result<Vec<ObjectMeta>>;
}
