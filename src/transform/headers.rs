use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::emptiness::IsEmpty;
use crate::types::{RawCell, Row};

const QUOTE_CHARS: &[char] = &['"', '\'', '`', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}'];

/// How raw column headers are canonicalized before lookup.
///
/// The same mode is applied to the sheet's headers and to every header the
/// record builder asks for, so a row is never searched with mixed rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderMode {
    /// Lower-case and keep only alphanumerics: `"Driving Licence No.\t"` == `"drivingLicenceNo"`
    #[default]
    Strict,
    /// Trim surrounding quotes and whitespace only
    Loose,
}

impl HeaderMode {
    pub fn normalize(self, raw: &str) -> String {
        match self {
            HeaderMode::Strict => normalize_strict(raw),
            HeaderMode::Loose => normalize_loose(raw),
        }
    }
}

impl FromStr for HeaderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(HeaderMode::Strict),
            "loose" => Ok(HeaderMode::Loose),
            other => Err(format!("unknown header mode '{other}' (expected strict or loose)")),
        }
    }
}

impl fmt::Display for HeaderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderMode::Strict => write!(f, "strict"),
            HeaderMode::Loose => write!(f, "loose"),
        }
    }
}

pub fn normalize_loose(raw: &str) -> String {
    raw.trim_matches(|c: char| c.is_whitespace() || QUOTE_CHARS.contains(&c))
        .to_string()
}

pub fn normalize_strict(raw: &str) -> String {
    // Lower-case first: some lower-case mappings emit combining marks
    raw.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// A row re-keyed by normalized header.
///
/// When two headers collapse onto one key the later cell wins; the key keeps
/// the position where it was first seen.
#[derive(Debug, Clone)]
pub struct NormalizedRow {
    mode: HeaderMode,
    cells: HashMap<String, RawCell>,
    order: Vec<String>,
}

impl NormalizedRow {
    pub fn from_row(row: &Row, mode: HeaderMode) -> Self {
        let mut cells = HashMap::with_capacity(row.len());
        let mut order = Vec::with_capacity(row.len());

        for (header, cell) in row.iter() {
            let key = mode.normalize(header);
            if cells.insert(key.clone(), cell.clone()).is_none() {
                order.push(key);
            }
        }

        Self { mode, cells, order }
    }

    pub fn mode(&self) -> HeaderMode {
        self.mode
    }

    /// Look up a cell by header, normalizing the query the same way as the row
    pub fn get(&self, header: &str) -> Option<&RawCell> {
        self.cells.get(&self.mode.normalize(header))
    }

    /// First non-empty cell among the accepted spellings of a column
    pub fn first_present(&self, headers: &[&str]) -> Option<&RawCell> {
        headers
            .iter()
            .filter_map(|h| self.get(h))
            .find(|cell| !cell.is_empty_value())
    }

    /// Cells in first-seen key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawCell)> {
        self.order
            .iter()
            .filter_map(|k| self.cells.get(k).map(|c| (k.as_str(), c)))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Raw headers grouped by the normalized key they collapse onto, for keys
/// claimed by more than one header
pub fn header_collisions<'a, I>(headers: I, mode: HeaderMode) -> Vec<(String, Vec<String>)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut groups: Vec<(String, Vec<String>)> = Vec::new();
    for header in headers {
        let key = mode.normalize(header);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, raws)) => raws.push(header.to_string()),
            None => groups.push((key, vec![header.to_string()])),
        }
    }
    groups.retain(|(_, raws)| raws.len() > 1);
    groups
}
