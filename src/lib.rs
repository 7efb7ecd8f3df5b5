//! Usage Metering Library
//!
//! A usage-metering aggregation pipeline: reads raw per-resource usage
//! events partitioned by time from object storage, aggregates them into
//! per-window summary metrics, and packages the result into a portable
//! report archive suitable for billing and usage reporting.
//!
//! ## Core Features
//!
//! - **Hour-aligned windowing**: a time range is split into contiguous
//!   windows; each window is aggregated independently and can be safely
//!   recomputed, since max-wins aggregation is idempotent per window
//! - **Backend-agnostic readers**: one event-reader abstraction over three
//!   storage listing styles (offset-range, prefix listing, paged listing),
//!   with transparent gzip decompression of stored payloads
//! - **Streaming decode**: event arrays are decoded one element at a time,
//!   never materialized whole
//! - **Bounded concurrency**: per-object fetch and decode runs under a
//!   fixed-size semaphore; the first failure cancels its siblings
//! - **Deterministic reports**: a gzip-compressed tar archive with
//!   `report/meta.json` and `report/usage.json`
//!
//! ## Architecture Overview
//!
//! - [`window`] - time ranges and the hour-aligned window iterator
//! - [`partition`] - the `account=.../date=.../hour=.../` key layout
//! - [`storage`] - backend client traits and the three listing adapters
//! - [`reader`] - object, listing, and concatenating event readers
//! - [`codec`] - streaming JSON array decoder/encoder
//! - [`aggregate`] - per-window max-wins aggregation
//! - [`pipeline`] - the per-window orchestrator
//! - [`report`] - report archive packaging
//! - [`config`] / [`logging`] - runtime configuration and tracing setup
//!
//! ## Usage
//!
//! ```no_run
//! use chrono::{TimeZone, Utc};
//! use tokio_util::sync::CancellationToken;
//! use usage_meter::models::ReportMeta;
//! use usage_meter::pipeline::{CollectOptions, Pipeline};
//! use usage_meter::report::ReportWriter;
//! use usage_meter::storage::local::LocalSource;
//! use usage_meter::window::TimeRange;
//!
//! # async fn example() -> usage_meter::error::Result<()> {
//! let range = TimeRange::new(
//!     Utc.with_ymd_and_hms(2006, 5, 1, 0, 0, 0).unwrap(),
//!     Utc.with_ymd_and_hms(2006, 6, 1, 0, 0, 0).unwrap(),
//! )?;
//! let source = std::sync::Arc::new(LocalSource::new("/var/lib/usage"));
//! let pipeline = Pipeline::new(source, CollectOptions::new("acme"));
//!
//! let meta = ReportMeta {
//!     account: "acme".into(),
//!     time_range: range,
//!     collected_at: Utc::now(),
//! };
//! let mut writer = ReportWriter::new(meta, Vec::new())?;
//! pipeline.run(range, &mut writer, &CancellationToken::new()).await?;
//! let archive = writer.close()?;
//! # let _ = archive;
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod partition;
pub mod pipeline;
pub mod reader;
pub mod report;
pub mod storage;
pub mod window;

pub use aggregate::{AggregationKey, Aggregator};
pub use error::{Error, Result};
pub use models::{EventTags, ReportMeta, UsageEvent, MAX_RESOURCE_COUNT};
pub use pipeline::{CollectOptions, Pipeline};
pub use report::ReportWriter;
pub use window::{TimeRange, WindowIterator};
