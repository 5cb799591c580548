// ADIF (.adi) tokenizer.
// Reference: https://adif.org/

use std::collections::HashMap;
use std::mem;

/// A single ADIF record (one QSO)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AdifRecord {
    /// All fields as key-value pairs (uppercase keys)
    pub fields: HashMap<String, String>,
}

impl AdifRecord {
    /// Get a field value (case-insensitive lookup)
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(&key.to_ascii_uppercase()).map(String::as_str)
    }

    /// Field value with surrounding whitespace removed; blank counts as absent.
    pub fn get_trimmed(&self, key: &str) -> Option<&str> {
        self.get(key).map(str::trim).filter(|v| !v.is_empty())
    }
}

/// Parsed ADIF file
#[derive(Debug, Clone, Default)]
pub struct AdifFile {
    /// Header fields (before <EOH>)
    pub header: HashMap<String, String>,
    /// Every <EOR>-terminated record, in file order
    pub records: Vec<AdifRecord>,
    /// Fields found after the last <EOR> with no terminator of their own
    pub unterminated: Option<AdifRecord>,
}

/// Fields the ADIF standard defines for the header section.
fn is_header_field(name: &str) -> bool {
    matches!(
        name,
        "ADIF_VER" | "CREATED_TIMESTAMP" | "PROGRAMID" | "PROGRAMVERSION"
    ) || name.starts_with("USERDEF")
}

/// Tokenize ADIF text. Never fails: unknown or malformed tags are skipped and
/// a value that runs past the end of the text is cut short.
///
/// Text that opens with anything but `<` has a header. Normally it ends at
/// `<EOH>`; when that tag is missing, the header fields leading the text are
/// still kept apart and the first other field opens the first record.
///
/// Field lengths count characters, not bytes, so multi-byte UTF-8 values are
/// read whole.
pub fn parse_adif(content: &str) -> AdifFile {
    let mut file = AdifFile::default();
    let mut current: HashMap<String, String> = HashMap::new();
    let mut rest = content;
    let mut in_preamble = !content.trim_start().starts_with('<')
        && !content.to_ascii_uppercase().contains("<EOH>");

    while let Some(open) = rest.find('<') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('>') else {
            break;
        };

        let tag = &after_open[..close];
        rest = &after_open[close + 1..];

        // NAME:LENGTH or NAME:LENGTH:TYPE, or a bare NAME for EOH/EOR
        let mut parts = tag.split(':');
        let name = parts.next().unwrap_or("").trim().to_ascii_uppercase();

        match name.as_str() {
            "" => continue,
            "EOH" => {
                file.header.extend(current.drain());
                continue;
            }
            "EOR" => {
                in_preamble = false;
                if !current.is_empty() {
                    file.records.push(AdifRecord {
                        fields: mem::take(&mut current),
                    });
                }
                continue;
            }
            _ => {}
        }

        let Some(length) = parts.next().and_then(|l| l.trim().parse::<usize>().ok()) else {
            continue;
        };

        let split = rest
            .char_indices()
            .nth(length)
            .map_or(rest.len(), |(idx, _)| idx);
        let value = rest[..split].to_string();
        rest = &rest[split..];

        if in_preamble && is_header_field(&name) {
            file.header.insert(name, value);
        } else {
            in_preamble = false;
            current.insert(name, value);
        }
    }

    if !current.is_empty() {
        file.unterminated = Some(AdifRecord { fields: current });
    }

    file
}
