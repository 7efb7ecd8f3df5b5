//! Report archive writer
//!
//! A report is a tar archive with exactly two regular files, written in
//! order with mode 0644:
//!
//! ```text
//! report/meta.json    pretty-printed ReportMeta
//! report/usage.json   the full encoded event array
//! ```
//!
//! The caller wraps the archive in gzip (the CLI hands in a
//! `GzEncoder`). Events are buffered through the streaming encoder and the
//! archive entries are appended at close time, since tar needs entry sizes
//! up front. `close` consumes the writer, so the archive is finalized
//! exactly once; dropping the writer without closing produces no archive
//! entries at all, never a half-written pair.

use crate::codec::EventEncoder;
use crate::error::{Error, Result};
use crate::models::{ReportMeta, UsageEvent};
use std::io::Write;

const META_ENTRY: &str = "report/meta.json";
const USAGE_ENTRY: &str = "report/usage.json";
const ENTRY_MODE: u32 = 0o644;

pub struct ReportWriter<W: Write> {
    meta: ReportMeta,
    encoder: EventEncoder<Vec<u8>>,
    builder: tar::Builder<W>,
    count: usize,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(meta: ReportMeta, writer: W) -> Result<Self> {
        Ok(Self {
            meta,
            encoder: EventEncoder::new(Vec::new())?,
            builder: tar::Builder::new(writer),
            count: 0,
        })
    }

    /// Buffer one event, stamping its account tag from the report
    /// metadata.
    pub fn write(&mut self, event: &UsageEvent) -> Result<()> {
        let mut event = event.clone();
        event.tags.account = self.meta.account.clone();
        self.encoder.encode(&event)?;
        self.count += 1;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Finalize the event stream and write the archive entries, meta
    /// first. Returns the inner writer for the caller to finish (e.g.
    /// completing the gzip stream).
    pub fn close(mut self) -> Result<W> {
        let usage = self.encoder.close()?;
        let meta = serde_json::to_vec_pretty(&self.meta)
            .map_err(|e| Error::encode(format!("report meta: {e}")))?;

        let mtime = self.meta.collected_at.timestamp().max(0) as u64;
        append_entry(&mut self.builder, META_ENTRY, &meta, mtime)?;
        append_entry(&mut self.builder, USAGE_ENTRY, &usage, mtime)?;

        let mut writer = self.builder.into_inner()?;
        writer.flush()?;
        Ok(writer)
    }
}

fn append_entry<W: Write>(
    builder: &mut tar::Builder<W>,
    path: &str,
    data: &[u8],
    mtime: u64,
) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(ENTRY_MODE);
    header.set_mtime(mtime);
    header.set_cksum();
    builder.append_data(&mut header, path, data)?;
    Ok(())
}
