//! Listing-backed event reader

use crate::error::{Error, Result};
use crate::models::UsageEvent;
use crate::reader::{EventRead, ObjectReader};
use crate::storage::{ObjectFetcher, ObjectMeta};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;

/// Streams the events of every object in a listing, in listing order.
///
/// Object readers are constructed lazily as the listing is consumed, so at
/// most one object is open at a time.
pub struct ListReader<F: ObjectFetcher> {
    fetcher: Arc<F>,
    objects: VecDeque<ObjectMeta>,
    current: Option<ObjectReader<F>>,
    closed: bool,
}

impl<F: ObjectFetcher> ListReader<F> {
    pub fn new(fetcher: Arc<F>, objects: Vec<ObjectMeta>) -> Self {
        Self {
            fetcher,
            objects: objects.into(),
            current: None,
            closed: false,
        }
    }
}

#[async_trait]
impl<F: ObjectFetcher> EventRead for ListReader<F> {
    async fn read(&mut self) -> Result<Option<UsageEvent>> {
        if self.closed {
            return Err(Error::ReaderClosed);
        }
        loop {
            if let Some(reader) = &mut self.current {
                match reader.read().await? {
                    Some(event) => return Ok(Some(event)),
                    None => {
                        reader.close().await?;
                        self.current = None;
                    }
                }
            } else if let Some(meta) = self.objects.pop_front() {
                self.current = Some(ObjectReader::new(self.fetcher.clone(), meta.key));
            } else {
                return Ok(None);
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.objects.clear();
        if let Some(mut reader) = self.current.take() {
            reader.close().await?;
        }
        Ok(())
    }
}
