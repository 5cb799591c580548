//! Mode breakdown for the statistics view.

use std::collections::BTreeMap;

use crate::models::Qso;

/// One slice of the mode breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct ModeShare {
    pub mode: String,
    pub count: usize,
    /// Share of all counted contacts, 0.0 to 100.0.
    pub percent: f64,
}

/// Tally mode strings, upper-cased. Blank modes are not counted.
pub fn tally_modes<'a, I>(modes: I) -> BTreeMap<String, usize>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts = BTreeMap::new();
    for mode in modes {
        let mode = mode.trim();
        if mode.is_empty() {
            continue;
        }
        *counts.entry(mode.to_uppercase()).or_insert(0) += 1;
    }
    counts
}

/// Number of contacts per upper-cased mode. Contacts with no mode are left
/// out rather than counted under a blank key.
pub fn count_by_mode(records: &[Qso]) -> BTreeMap<String, usize> {
    tally_modes(records.iter().map(|qso| qso.mode.as_str()))
}

/// Largest slice first; ties are broken alphabetically.
pub fn mode_shares(counts: &BTreeMap<String, usize>) -> Vec<ModeShare> {
    let total: usize = counts.values().sum();
    let mut shares: Vec<ModeShare> = counts
        .iter()
        .map(|(mode, &count)| ModeShare {
            mode: mode.clone(),
            count,
            percent: if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            },
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.mode.cmp(&b.mode)));
    shares
}
