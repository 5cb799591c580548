//! Domain models that mirror the `qso` table and get passed between the store,
//! the ADIF codec and the statistics helpers. They stay plain data holders;
//! the only behaviour here is the canonicalization rule (which columns are
//! upper-cased) and the small parsing helpers every caller needs.

use std::fmt;
use std::str::FromStr;

use chrono::Local;

use crate::error::{LogError, Result};

/// Format used for both the caller-supplied `datetime` default and `addtime`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Current local time as `YYYY-MM-DD HH:MM`.
pub fn now_stamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

/// A contact as entered by the operator, before the store assigns `id` and
/// `addtime`. Empty strings mean "not supplied".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewQso {
    pub call: String,
    pub mode: String,
    /// Frequency in MHz.
    pub freq: Option<f64>,
    /// Output power in Watts.
    pub power: Option<f64>,
    /// Contact time as typed by the operator. Never parsed or normalized.
    pub datetime: String,
    pub qth_prov: String,
    pub qth_city: String,
    pub rst_sent: String,
    pub rst_recv: String,
    /// Free-text notes. Case is preserved.
    pub content: String,
    pub device: String,
}

impl NewQso {
    /// Upper-case the canonicalized columns, leaving `content`, `datetime` and
    /// the numeric fields alone.
    pub fn canonicalized(mut self) -> Self {
        for field in QsoField::ALL {
            if field.is_canonicalized() {
                if let Some(value) = self.text_mut(field) {
                    *value = value.to_uppercase();
                }
            }
        }
        self
    }

    /// Set a field from its textual form. Numeric fields go through
    /// [`parse_numeric`], so non-numeric input is rejected here.
    pub fn set(&mut self, field: QsoField, raw: &str) -> Result<()> {
        match field {
            QsoField::Freq => self.freq = parse_numeric(field, raw)?,
            QsoField::Power => self.power = parse_numeric(field, raw)?,
            _ => {
                if let Some(value) = self.text_mut(field) {
                    *value = raw.to_string();
                }
            }
        }
        Ok(())
    }

    fn text_mut(&mut self, field: QsoField) -> Option<&mut String> {
        match field {
            QsoField::Call => Some(&mut self.call),
            QsoField::Mode => Some(&mut self.mode),
            QsoField::Datetime => Some(&mut self.datetime),
            QsoField::QthProv => Some(&mut self.qth_prov),
            QsoField::QthCity => Some(&mut self.qth_city),
            QsoField::RstSent => Some(&mut self.rst_sent),
            QsoField::RstRecv => Some(&mut self.rst_recv),
            QsoField::Content => Some(&mut self.content),
            QsoField::Device => Some(&mut self.device),
            QsoField::Freq | QsoField::Power => None,
        }
    }
}

/// A fully-formed row ready for [`crate::db::Store::insert_batch`]. The batch
/// path trusts these values as-is, including `addtime`.
#[derive(Debug, Clone, PartialEq)]
pub struct QsoCandidate {
    pub qso: NewQso,
    pub addtime: String,
}

/// A stored contact.
#[derive(Debug, Clone, PartialEq)]
pub struct Qso {
    /// Primary key assigned by SQLite. Never reused.
    pub id: i64,
    pub call: String,
    pub mode: String,
    pub freq: Option<f64>,
    pub power: Option<f64>,
    pub datetime: String,
    pub qth_prov: String,
    pub qth_city: String,
    pub rst_sent: String,
    pub rst_recv: String,
    pub content: String,
    pub device: String,
    /// Local time of the insert that created the row.
    pub addtime: String,
}

impl Qso {
    /// Textual value of a field, as shown in listings and edit prompts.
    pub fn value(&self, field: QsoField) -> String {
        match field {
            QsoField::Call => self.call.clone(),
            QsoField::Mode => self.mode.clone(),
            QsoField::Freq => format_number(self.freq),
            QsoField::Power => format_number(self.power),
            QsoField::Datetime => self.datetime.clone(),
            QsoField::QthProv => self.qth_prov.clone(),
            QsoField::QthCity => self.qth_city.clone(),
            QsoField::RstSent => self.rst_sent.clone(),
            QsoField::RstRecv => self.rst_recv.clone(),
            QsoField::Content => self.content.clone(),
            QsoField::Device => self.device.clone(),
        }
    }

    /// Copy of the operator-editable part of the record.
    pub fn to_new(&self) -> NewQso {
        NewQso {
            call: self.call.clone(),
            mode: self.mode.clone(),
            freq: self.freq,
            power: self.power,
            datetime: self.datetime.clone(),
            qth_prov: self.qth_prov.clone(),
            qth_city: self.qth_city.clone(),
            rst_sent: self.rst_sent.clone(),
            rst_recv: self.rst_recv.clone(),
            content: self.content.clone(),
            device: self.device.clone(),
        }
    }
}

/// Stable, language-independent identifiers for the editable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QsoField {
    Call,
    Mode,
    Freq,
    Power,
    Datetime,
    QthProv,
    QthCity,
    RstSent,
    RstRecv,
    Content,
    Device,
}

impl QsoField {
    pub const ALL: [QsoField; 11] = [
        QsoField::Call,
        QsoField::Mode,
        QsoField::Freq,
        QsoField::Power,
        QsoField::Datetime,
        QsoField::QthProv,
        QsoField::QthCity,
        QsoField::RstSent,
        QsoField::RstRecv,
        QsoField::Content,
        QsoField::Device,
    ];

    /// Identifier, which is also the column name.
    pub fn as_str(self) -> &'static str {
        match self {
            QsoField::Call => "call",
            QsoField::Mode => "mode",
            QsoField::Freq => "freq",
            QsoField::Power => "power",
            QsoField::Datetime => "datetime",
            QsoField::QthProv => "qth_prov",
            QsoField::QthCity => "qth_city",
            QsoField::RstSent => "rst_sent",
            QsoField::RstRecv => "rst_recv",
            QsoField::Content => "content",
            QsoField::Device => "device",
        }
    }

    /// Whether writes to this column are upper-cased.
    pub fn is_canonicalized(self) -> bool {
        matches!(
            self,
            QsoField::Call
                | QsoField::Mode
                | QsoField::QthProv
                | QsoField::QthCity
                | QsoField::RstSent
                | QsoField::RstRecv
                | QsoField::Device
        )
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, QsoField::Freq | QsoField::Power)
    }

    /// Apply the column's canonicalization rule to a raw value.
    pub fn canonicalize(self, raw: &str) -> String {
        if self.is_canonicalized() {
            raw.to_uppercase()
        } else {
            raw.to_string()
        }
    }
}

impl fmt::Display for QsoField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QsoField {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        QsoField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| LogError::validation("field", format!("unrecognized field name: {s}")))
    }
}

/// Columns the search screen can filter on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchField {
    #[default]
    Call,
    Freq,
    Power,
    /// Matches against the stored `datetime` text.
    Time,
}

impl SearchField {
    pub fn column(self) -> &'static str {
        match self {
            SearchField::Call => "call",
            SearchField::Freq => "freq",
            SearchField::Power => "power",
            SearchField::Time => "datetime",
        }
    }
}

impl FromStr for SearchField {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" => Ok(SearchField::Call),
            "freq" => Ok(SearchField::Freq),
            "power" => Ok(SearchField::Power),
            "time" | "datetime" => Ok(SearchField::Time),
            _ => Err(LogError::validation(
                "by",
                format!("cannot search by {s}; expected call, freq, power or time"),
            )),
        }
    }
}

/// Parse an optional numeric input. Blank means absent; anything else must be
/// a finite decimal number.
pub fn parse_numeric(field: QsoField, raw: &str) -> Result<Option<f64>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(Some(value)),
        _ => Err(LogError::validation(
            field.as_str(),
            format!("{trimmed:?} is not a number"),
        )),
    }
}

/// Render an optional number without a trailing `.0` for whole values.
pub fn format_number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalized_uppercases_only_the_canonical_set() {
        let qso = NewQso {
            call: "bg5jqn".into(),
            mode: "ssb".into(),
            datetime: "2024-01-01 10:00".into(),
            qth_prov: "bj".into(),
            qth_city: "bj".into(),
            rst_sent: "59".into(),
            rst_recv: "5nn".into(),
            content: "nice contact".into(),
            device: "ft-991".into(),
            ..NewQso::default()
        }
        .canonicalized();

        assert_eq!(qso.call, "BG5JQN");
        assert_eq!(qso.mode, "SSB");
        assert_eq!(qso.rst_recv, "5NN");
        assert_eq!(qso.device, "FT-991");
        assert_eq!(qso.content, "nice contact");
    }

    #[test]
    fn field_names_parse_case_insensitively() {
        assert_eq!("qth_prov".parse::<QsoField>().unwrap(), QsoField::QthProv);
        assert_eq!("RST_RECV".parse::<QsoField>().unwrap(), QsoField::RstRecv);
        assert!("addtime".parse::<QsoField>().unwrap_err().is_validation());
        assert!("id".parse::<QsoField>().is_err());
    }

    #[test]
    fn search_field_accepts_time_alias() {
        assert_eq!("time".parse::<SearchField>().unwrap(), SearchField::Time);
        assert_eq!("datetime".parse::<SearchField>().unwrap().column(), "datetime");
        assert!("mode".parse::<SearchField>().is_err());
    }

    #[test]
    fn numeric_input_rules() {
        assert_eq!(parse_numeric(QsoField::Freq, " 14.250 ").unwrap(), Some(14.25));
        assert_eq!(parse_numeric(QsoField::Power, "").unwrap(), None);
        assert!(parse_numeric(QsoField::Freq, "twenty").is_err());
        assert!(parse_numeric(QsoField::Freq, "NaN").is_err());
    }

    #[test]
    fn set_routes_numeric_fields_through_parser() {
        let mut qso = NewQso::default();
        qso.set(QsoField::Power, "100").unwrap();
        qso.set(QsoField::Content, "Hello").unwrap();
        assert_eq!(qso.power, Some(100.0));
        assert_eq!(qso.content, "Hello");
        assert!(qso.set(QsoField::Freq, "abc").is_err());
    }

    #[test]
    fn whole_numbers_render_without_fraction() {
        assert_eq!(format_number(Some(50.0)), "50");
        assert_eq!(format_number(Some(14.074)), "14.074");
        assert_eq!(format_number(None), "");
    }
}
