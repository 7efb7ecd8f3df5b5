//! Event reader abstraction
//!
//! An [`EventRead`] yields one decoded [`UsageEvent`] at a time from some
//! underlying stream of stored objects. Exhaustion is signaled by
//! `Ok(None)`, never by an error value, so "no more data" can never be
//! confused with "failed to read more data". Any `Err` aborts the stream.
//!
//! `close` releases underlying handles; it is idempotent and safe to call
//! before or after exhaustion, but readers take `&mut self` so it can
//! never race a `read`.
//!
//! Three layers compose: [`object::ObjectReader`] decodes one object,
//! [`list::ListReader`] walks a listing constructing object readers
//! lazily, and [`multi::MultiReader`] concatenates readers in order.

pub mod list;
pub mod multi;
pub mod object;

use crate::error::Result;
use crate::models::UsageEvent;
use async_trait::async_trait;

/// Streaming source of decoded usage events.
#[async_trait]
pub trait EventRead: Send {
    /// The next event, or `Ok(None)` once the stream is exhausted.
    async fn read(&mut self) -> Result<Option<UsageEvent>>;

    /// Release underlying handles. Idempotent; reading after close fails.
    async fn close(&mut self) -> Result<()>;
}

pub use list::ListReader;
pub use multi::MultiReader;
pub use object::ObjectReader;
