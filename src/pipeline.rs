//! Pipeline orchestrator
//!
//! Drives one collection run: splits the requested time range into windows,
//! and for each window lists the matching objects, fetches and decodes them
//! with bounded parallelism, folds the events into a fresh per-window
//! [`Aggregator`], and emits one summary event per aggregation key stamped
//! with the window's start and end.
//!
//! ## Concurrency model
//!
//! Windows are processed strictly sequentially so summaries leave the
//! pipeline in chronological order. Within a window, per-object fetch and
//! decode runs on a [`JoinSet`] gated by a semaphore, which also caps the
//! number of simultaneously open object streams. The aggregator sits
//! behind a mutex held only for the duration of each `add`. Max-wins
//! aggregation commutes, so no cross-object ordering is needed.
//!
//! ## Failure semantics
//!
//! Any list, fetch, decode, validation, or write error is fatal to the
//! run: the first failing worker wins, its siblings are aborted, and the
//! error propagates to the caller. Nothing is retried at this layer, and a
//! partial report is never passed off as complete; already-emitted windows
//! stay emitted, and the caller decides what to do with the output file.

use crate::aggregate::Aggregator;
use crate::error::{Error, Result};
use crate::reader::{EventRead, ObjectReader};
use crate::report::ReportWriter;
use crate::storage::EventSource;
use crate::window::{TimeRange, WindowIterator};
use chrono::Duration;
use std::io::Write;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Default cap on simultaneous object fetches per window.
pub const DEFAULT_CONCURRENCY: usize = 10;

#[derive(Debug, Clone)]
pub struct CollectOptions {
    /// Account whose partitions are read.
    pub account: String,
    /// Aggregation window size; floored to whole hours.
    pub window: Duration,
    /// Maximum simultaneous fetches within one window.
    pub concurrency: usize,
}

impl CollectOptions {
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            window: Duration::hours(1),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }
}

pub struct Pipeline<S: EventSource> {
    source: Arc<S>,
    opts: CollectOptions,
}

impl<S: EventSource> Pipeline<S> {
    pub fn new(source: Arc<S>, opts: CollectOptions) -> Self {
        Self { source, opts }
    }

    /// Collect usage over `range` into `writer`. The caller still owns the
    /// writer's close; a returned error means the report must not be kept.
    pub async fn run<W: Write>(
        &self,
        range: TimeRange,
        writer: &mut ReportWriter<W>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let windows = WindowIterator::new(range, self.opts.window)?;
        for window in windows {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            self.collect_window(&window, writer, cancel).await?;
        }
        Ok(())
    }

    async fn collect_window<W: Write>(
        &self,
        window: &TimeRange,
        writer: &mut ReportWriter<W>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let objects = self
            .source
            .list_window(&self.opts.account, window)
            .await?;
        debug!(
            window_start = %window.start,
            window_end = %window.end,
            objects = objects.len(),
            "listed window"
        );

        let aggregator = Arc::new(Mutex::new(Aggregator::new()));
        let semaphore = Arc::new(Semaphore::new(self.opts.concurrency));
        // Child token: the first failing worker stops its siblings without
        // cancelling the overall run from outside.
        let window_cancel = cancel.child_token();

        let mut tasks: JoinSet<Result<()>> = JoinSet::new();
        for meta in objects {
            let source = self.source.clone();
            let aggregator = aggregator.clone();
            let semaphore = semaphore.clone();
            let cancel = window_cancel.clone();
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|_| Error::Cancelled)?;
                drain_object(source, meta.key, aggregator, cancel).await
            });
        }

        let mut first_err: Option<Error> = None;
        while let Some(joined) = tasks.join_next().await {
            let result = match joined {
                Ok(result) => result,
                Err(join_err) if join_err.is_cancelled() => Err(Error::Cancelled),
                Err(join_err) => Err(Error::Task(join_err.to_string())),
            };
            if let Err(err) = result {
                if first_err.is_none() {
                    first_err = Some(err);
                    window_cancel.cancel();
                    tasks.abort_all();
                }
            }
        }
        if let Some(err) = first_err {
            return Err(err);
        }

        let aggregator = Arc::try_unwrap(aggregator)
            .map_err(|_| Error::Task("aggregator still shared after join".to_string()))?
            .into_inner();
        let summaries = aggregator.summaries(window);
        info!(
            window_start = %window.start,
            window_end = %window.end,
            keys = summaries.len(),
            "window aggregated"
        );
        for event in &summaries {
            writer.write(event)?;
        }
        Ok(())
    }
}

/// Fetch and decode one object, folding its events into the shared
/// aggregator. The mutex is held only across each `add`.
async fn drain_object<S: EventSource>(
    source: Arc<S>,
    key: String,
    aggregator: Arc<Mutex<Aggregator>>,
    cancel: CancellationToken,
) -> Result<()> {
    let mut reader = ObjectReader::new(source, key);
    loop {
        if cancel.is_cancelled() {
            reader.close().await?;
            return Err(Error::Cancelled);
        }
        match reader.read().await {
            Ok(Some(event)) => {
                let mut aggregator = aggregator.lock().await;
                if let Err(err) = aggregator.add(&event) {
                    drop(aggregator);
                    reader.close().await?;
                    return Err(err);
                }
            }
            Ok(None) => {
                reader.close().await?;
                return Ok(());
            }
            Err(err) => {
                reader.close().await?;
                return Err(err);
            }
        }
    }
}
