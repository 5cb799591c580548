//! ADIF import/export for the contact log.
//!
//! Import is tolerant: records without a call sign are dropped and counted,
//! fields outside the mapped vocabulary are ignored, and a missing file is an
//! empty import rather than an error. Export writes every populated field that
//! has an ADIF counterpart.

pub mod parser;
pub mod writer;

use std::fs;
use std::path::Path;

use chrono::Utc;
use log::{debug, info, warn};

use crate::error::{LogError, Result};
use crate::models::{now_stamp, NewQso, Qso, QsoCandidate};

pub use parser::{parse_adif, AdifFile, AdifRecord};
pub use writer::{qso_to_adif, write_adif, DATETIME_TAG};

/// Rows ready for [`crate::db::Store::insert_batch`], plus how many records
/// in the source had to be skipped.
#[derive(Debug, Clone, Default)]
pub struct AdifImport {
    pub candidates: Vec<QsoCandidate>,
    pub dropped: usize,
}

impl AdifImport {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Turn ADIF text into canonicalized rows stamped with the current time.
pub fn import_from(text: &str) -> AdifImport {
    let file = parse_adif(text);
    let addtime = now_stamp();

    let mut import = AdifImport::default();
    for record in &file.records {
        match candidate_from_record(record, &addtime) {
            Some(candidate) => import.candidates.push(candidate),
            None => {
                debug!("dropping ADIF record without CALL: {:?}", record.fields);
                import.dropped += 1;
            }
        }
    }
    if file.unterminated.is_some() {
        import.dropped += 1;
    }

    if import.dropped > 0 {
        warn!(
            "ADIF import: {} records parsed, {} dropped",
            import.candidates.len(),
            import.dropped
        );
    } else {
        info!("ADIF import: {} records parsed", import.candidates.len());
    }
    import
}

/// Read and import an ADIF file. A path that does not exist yields an empty
/// import.
pub fn import_file(path: &Path) -> Result<AdifImport> {
    if !path.exists() {
        info!("no ADIF file at {}, nothing to import", path.display());
        return Ok(AdifImport::default());
    }

    let bytes = fs::read(path).map_err(LogError::io("read adif", path))?;
    Ok(import_from(&String::from_utf8_lossy(&bytes)))
}

/// Render contacts as ADIF text.
pub fn render(records: &[Qso]) -> String {
    write_adif(records, &Utc::now())
}

/// Write contacts to `destination` as ADIF. Returns how many were written.
pub fn export_to(records: &[Qso], destination: &Path) -> Result<usize> {
    fs::write(destination, render(records)).map_err(LogError::io("export adif", destination))?;
    info!(
        "exported {} QSOs to {}",
        records.len(),
        destination.display()
    );
    Ok(records.len())
}

fn candidate_from_record(record: &AdifRecord, addtime: &str) -> Option<QsoCandidate> {
    let call = record.get_trimmed("CALL")?;
    let text = |tag: &str| record.get_trimmed(tag).unwrap_or_default().to_string();

    let qso = NewQso {
        call: call.to_string(),
        mode: text("MODE"),
        freq: number(record, "FREQ"),
        power: number(record, "TX_PWR"),
        datetime: datetime(record),
        qth_prov: text("STATE"),
        qth_city: text("QTH"),
        rst_sent: text("RST_SENT"),
        rst_recv: text("RST_RCVD"),
        content: record
            .get("COMMENT")
            .or_else(|| record.get("NOTES"))
            .unwrap_or_default()
            .to_string(),
        device: text("MY_RIG"),
    }
    .canonicalized();

    Some(QsoCandidate {
        qso,
        addtime: addtime.to_string(),
    })
}

fn number(record: &AdifRecord, tag: &str) -> Option<f64> {
    let raw = record.get_trimmed(tag)?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            debug!("ignoring non-numeric ADIF {tag}: {raw:?}");
            None
        }
    }
}

/// Our own export carries the stored text verbatim; other programs only give
/// us `QSO_DATE`/`TIME_ON`.
fn datetime(record: &AdifRecord) -> String {
    match record.get(DATETIME_TAG).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw.to_string(),
        None => join_datetime(record.get_trimmed("QSO_DATE"), record.get_trimmed("TIME_ON")),
    }
}

/// `20240101` + `1000` becomes `2024-01-01 10:00`; a six-digit time keeps its
/// seconds (`10:00:59`). A date without a usable time keeps just the date;
/// anything without a usable date is left blank.
fn join_datetime(date: Option<&str>, time: Option<&str>) -> String {
    let Some(date) = date.filter(|d| d.len() == 8 && d.bytes().all(|b| b.is_ascii_digit())) else {
        return String::new();
    };
    let day = format!("{}-{}-{}", &date[..4], &date[4..6], &date[6..]);

    let digits = |t: &str, n: usize| t.len() >= n && t.bytes().take(n).all(|b| b.is_ascii_digit());
    match time {
        Some(t) if digits(t, 6) => format!("{day} {}:{}:{}", &t[..2], &t[2..4], &t[4..6]),
        Some(t) if digits(t, 4) => format!("{day} {}:{}", &t[..2], &t[2..4]),
        _ => day,
    }
}
