//! Single-object event reader

use crate::codec::EventDecoder;
use crate::error::{Error, Result};
use crate::models::UsageEvent;
use crate::reader::EventRead;
use crate::storage::{ObjectBody, ObjectFetcher};
use async_trait::async_trait;
use flate2::read::GzDecoder;
use std::io::{BufRead, BufReader, Cursor};
use std::sync::Arc;
use tracing::debug;

enum State {
    // Fetch happens on first read, so constructing a reader is cheap.
    Pending,
    Open(EventDecoder<Box<dyn BufRead + Send>>),
    Closed,
}

/// Reads the events of one stored object: fetches it, inspects the
/// declared content type, transparently decompresses gzip payloads, and
/// streams the decoded JSON array.
pub struct ObjectReader<F: ObjectFetcher> {
    fetcher: Arc<F>,
    key: String,
    state: State,
}

impl<F: ObjectFetcher> ObjectReader<F> {
    pub fn new(fetcher: Arc<F>, key: impl Into<String>) -> Self {
        Self {
            fetcher,
            key: key.into(),
            state: State::Pending,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    fn open(body: ObjectBody) -> Result<EventDecoder<Box<dyn BufRead + Send>>> {
        let stream: Box<dyn BufRead + Send> = if body.is_gzip() {
            Box::new(BufReader::new(GzDecoder::new(Cursor::new(body.data))))
        } else {
            Box::new(Cursor::new(body.data))
        };
        EventDecoder::new(stream)
    }
}

#[async_trait]
impl<F: ObjectFetcher> EventRead for ObjectReader<F> {
    async fn read(&mut self) -> Result<Option<UsageEvent>> {
        loop {
            match &mut self.state {
                State::Closed => return Err(Error::ReaderClosed),
                State::Pending => {
                    let body = self.fetcher.fetch(&self.key).await?;
                    debug!(key = %self.key, bytes = body.data.len(), gzip = body.is_gzip(), "opened object");
                    self.state = State::Open(Self::open(body)?);
                }
                State::Open(decoder) => {
                    if decoder.more()? {
                        return Ok(Some(decoder.decode()?));
                    }
                    return Ok(None);
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        self.state = State::Closed;
        Ok(())
    }
}
