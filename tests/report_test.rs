//! Report archive round-trip through gzip + tar

mod common;

use chrono::{TimeZone, Utc};
use common::event;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::Read;
use usage_meter::models::{ReportMeta, UsageEvent};
use usage_meter::report::ReportWriter;
use usage_meter::window::TimeRange;

fn meta() -> ReportMeta {
    ReportMeta {
        account: "acme".to_string(),
        time_range: TimeRange::new(
            Utc.with_ymd_and_hms(2006, 5, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2006, 6, 1, 0, 0, 0).unwrap(),
        )
        .unwrap(),
        collected_at: Utc.with_ymd_and_hms(2006, 6, 1, 12, 0, 0).unwrap(),
    }
}

#[test]
fn gzipped_archive_round_trips() {
    let t = Utc.with_ymd_and_hms(2006, 5, 4, 3, 0, 0).unwrap();
    let events = vec![
        event("s1", "Widget", t, 7.0),
        event("s2", "Gadget", t, 3.0),
    ];

    // The caller owns the gzip wrapping, as the CLI does.
    let gz = GzEncoder::new(Vec::new(), Compression::default());
    let mut writer = ReportWriter::new(meta(), gz).unwrap();
    for e in &events {
        writer.write(e).unwrap();
    }
    let compressed = writer.close().unwrap().finish().unwrap();

    let mut tar_bytes = Vec::new();
    GzDecoder::new(&compressed[..])
        .read_to_end(&mut tar_bytes)
        .unwrap();
    let entries = common::untar(&tar_bytes);

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].0, "report/meta.json");
    assert_eq!(entries[1].0, "report/usage.json");

    let got_meta: ReportMeta = serde_json::from_slice(&entries[0].1).unwrap();
    assert_eq!(got_meta, meta());

    let got_events: Vec<UsageEvent> = serde_json::from_slice(&entries[1].1).unwrap();
    assert_eq!(got_events.len(), 2);
    for (got, want) in got_events.iter().zip(&events) {
        assert_eq!(got.tags.scope_id, want.tags.scope_id);
        assert_eq!(got.value, want.value);
        assert_eq!(got.tags.account, "acme");
    }
}

#[test]
fn meta_json_is_pretty_printed() {
    let writer = ReportWriter::new(meta(), Vec::new()).unwrap();
    let archive = writer.close().unwrap();
    let entries = common::untar(&archive);
    let text = String::from_utf8(entries[0].1.clone()).unwrap();
    assert!(text.contains('\n'));
    assert!(text.contains("\"account\": \"acme\""));
}
