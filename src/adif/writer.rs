// ADIF (.adi) serializer for stored contacts.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};

use crate::models::{format_number, Qso};

pub const ADIF_VERSION: &str = "3.1.4";
pub const PROGRAM_ID: &str = "HamLog";

/// Application-defined field carrying `datetime` exactly as stored, so text
/// with no `QSO_DATE`/`TIME_ON` form survives a round trip.
pub const DATETIME_TAG: &str = "APP_HAMLOG_DATETIME";

/// Serialize contacts as an ADIF document: header first, then one record per
/// line. Blank fields are left out.
pub fn write_adif(records: &[Qso], created: &DateTime<Utc>) -> String {
    let mut out = String::new();
    out.push_str("HamLog ADIF export\n");
    push_field(&mut out, "ADIF_VER", ADIF_VERSION);
    out.push('\n');
    push_field(&mut out, "PROGRAMID", PROGRAM_ID);
    out.push('\n');
    push_field(&mut out, "PROGRAMVERSION", env!("CARGO_PKG_VERSION"));
    out.push('\n');
    push_field(
        &mut out,
        "CREATED_TIMESTAMP",
        &created.format("%Y%m%d %H%M%S").to_string(),
    );
    out.push_str("\n<EOH>\n\n");

    for qso in records {
        for (tag, value) in qso_to_adif(qso) {
            push_field(&mut out, tag, &value);
            out.push(' ');
        }
        out.push_str("<EOR>\n");
    }

    out
}

/// Map a stored contact onto ADIF tags, in output order.
pub fn qso_to_adif(qso: &Qso) -> Vec<(&'static str, String)> {
    let (date, time) = split_datetime(&qso.datetime);

    let fields = [
        ("CALL", qso.call.clone()),
        ("QSO_DATE", date.unwrap_or_default()),
        ("TIME_ON", time.unwrap_or_default()),
        (DATETIME_TAG, qso.datetime.clone()),
        ("FREQ", format_number(qso.freq)),
        ("MODE", qso.mode.clone()),
        ("TX_PWR", format_number(qso.power)),
        ("RST_SENT", qso.rst_sent.clone()),
        ("RST_RCVD", qso.rst_recv.clone()),
        ("STATE", qso.qth_prov.clone()),
        ("QTH", qso.qth_city.clone()),
        ("MY_RIG", qso.device.clone()),
        ("COMMENT", qso.content.clone()),
    ];

    fields
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .collect()
}

/// Split `YYYY-MM-DD HH:MM[:SS]` into ADIF `YYYYMMDD` and `HHMM[SS]`. Text in
/// any other shape has no standard ADIF form and yields nothing.
fn split_datetime(datetime: &str) -> (Option<String>, Option<String>) {
    let mut parts = datetime.trim().splitn(2, ' ');
    let date = parts.next().and_then(adif_date);
    let time = match (&date, parts.next()) {
        (Some(_), Some(time)) => adif_time(time.trim()),
        _ => None,
    };
    (date, time)
}

fn adif_date(date: &str) -> Option<String> {
    let bytes = date.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    shaped.then(|| date.replace('-', ""))
}

fn adif_time(time: &str) -> Option<String> {
    let bytes = time.as_bytes();
    let shaped = bytes.len() >= 5
        && bytes[2] == b':'
        && bytes[..2].iter().all(u8::is_ascii_digit)
        && bytes[3..5].iter().all(u8::is_ascii_digit);
    if !shaped {
        return None;
    }

    let with_seconds = bytes.len() >= 8
        && bytes[5] == b':'
        && bytes[6..8].iter().all(u8::is_ascii_digit);
    if with_seconds {
        Some(format!("{}{}{}", &time[..2], &time[3..5], &time[6..8]))
    } else {
        Some(format!("{}{}", &time[..2], &time[3..5]))
    }
}

fn push_field(out: &mut String, tag: &str, value: &str) {
    // Writing into a String cannot fail.
    let _ = write!(out, "<{}:{}>{}", tag, value.chars().count(), value);
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn sample() -> Qso {
        Qso {
            id: 7,
            call: "BG5JQN".into(),
            mode: "SSB".into(),
            freq: Some(14.25),
            power: Some(50.0),
            datetime: "2024-01-01 10:00".into(),
            qth_prov: "BJ".into(),
            qth_city: "BJ".into(),
            rst_sent: "59".into(),
            rst_recv: "57".into(),
            content: "nice contact".into(),
            device: "FT-991".into(),
            addtime: "2024-01-01 10:05".into(),
        }
    }

    #[test]
    fn header_precedes_records() {
        let created = Utc.with_ymd_and_hms(2024, 2, 3, 4, 5, 6).unwrap();
        let text = write_adif(&[sample()], &created);

        let eoh = text.find("<EOH>").unwrap();
        assert!(text[..eoh].contains("<ADIF_VER:5>3.1.4"));
        assert!(text[..eoh].contains("<PROGRAMID:6>HamLog"));
        assert!(text[..eoh].contains("<CREATED_TIMESTAMP:15>20240203 040506"));
        assert!(text[eoh..].contains("<CALL:6>BG5JQN"));
        assert!(text.trim_end().ends_with("<EOR>"));
    }

    #[test]
    fn record_maps_every_populated_field() {
        let tags = qso_to_adif(&sample());
        let get = |tag: &str| {
            tags.iter()
                .find(|(t, _)| *t == tag)
                .map(|(_, v)| v.as_str())
        };

        assert_eq!(get("QSO_DATE"), Some("20240101"));
        assert_eq!(get("TIME_ON"), Some("1000"));
        assert_eq!(get(DATETIME_TAG), Some("2024-01-01 10:00"));
        assert_eq!(get("FREQ"), Some("14.25"));
        assert_eq!(get("TX_PWR"), Some("50"));
        assert_eq!(get("RST_RCVD"), Some("57"));
        assert_eq!(get("QTH"), Some("BJ"));
        assert_eq!(get("MY_RIG"), Some("FT-991"));
        assert_eq!(get("COMMENT"), Some("nice contact"));
    }

    #[test]
    fn blank_fields_are_omitted() {
        let mut qso = sample();
        qso.power = None;
        qso.content.clear();
        let tags: Vec<_> = qso_to_adif(&qso).into_iter().map(|(t, _)| t).collect();
        assert!(!tags.contains(&"TX_PWR"));
        assert!(!tags.contains(&"COMMENT"));
    }

    #[test]
    fn datetime_splits_into_adif_date_and_time() {
        assert_eq!(
            split_datetime("2024-01-01"),
            (Some("20240101".into()), None)
        );
        assert_eq!(
            split_datetime("2024-01-01 10:00:59"),
            (Some("20240101".into()), Some("100059".into()))
        );
        assert_eq!(
            split_datetime("2024-01-01 10:00"),
            (Some("20240101".into()), Some("1000".into()))
        );
        assert_eq!(split_datetime("yesterday evening"), (None, None));
        assert_eq!(split_datetime("1/2/2024 10:00"), (None, None));
    }

    #[test]
    fn free_text_datetime_is_kept_verbatim() {
        let mut qso = sample();
        qso.datetime = "yesterday evening".into();
        let tags = qso_to_adif(&qso);

        assert!(!tags.iter().any(|(t, _)| *t == "QSO_DATE" || *t == "TIME_ON"));
        assert!(tags.contains(&(DATETIME_TAG, "yesterday evening".to_string())));
    }

    #[test]
    fn lengths_are_character_counts() {
        let mut qso = sample();
        qso.content = "好的".into();
        let created = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(write_adif(&[qso], &created).contains("<COMMENT:2>好的"));
    }
}
