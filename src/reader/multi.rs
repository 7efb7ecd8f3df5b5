//! Ordered reader concatenation

use crate::error::{Error, Result};
use crate::models::UsageEvent;
use crate::reader::EventRead;
use async_trait::async_trait;
use std::collections::VecDeque;

/// Concatenates a sequence of readers into one logical stream.
///
/// Reads always come from the head reader until it is exhausted; the head
/// is then closed and the next reader takes over. `Ok(None)` is returned
/// only once the list is empty, which guarantees in-order consumption and
/// at most one open underlying object at a time.
pub struct MultiReader {
    readers: VecDeque<Box<dyn EventRead>>,
    closed: bool,
}

impl MultiReader {
    pub fn new(readers: Vec<Box<dyn EventRead>>) -> Self {
        Self {
            readers: readers.into(),
            closed: false,
        }
    }
}

#[async_trait]
impl EventRead for MultiReader {
    async fn read(&mut self) -> Result<Option<UsageEvent>> {
        if self.closed {
            return Err(Error::ReaderClosed);
        }
        loop {
            let Some(head) = self.readers.front_mut() else {
                return Ok(None);
            };
            if let Some(event) = head.read().await? {
                return Ok(Some(event));
            }
            if let Some(mut exhausted) = self.readers.pop_front() {
                exhausted.close().await?;
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        while let Some(mut reader) = self.readers.pop_front() {
            reader.close().await?;
        }
        Ok(())
    }
}
