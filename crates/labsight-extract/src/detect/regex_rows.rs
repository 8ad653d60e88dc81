//! Default row grammar: `<label> <value>[unit] <low>-<high>`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::{RawRow, RowParser};

// Greedy label of word/space characters, value, optional unit, then the
// reference range written low-high. Labels containing digits before the real
// value can mis-split; that is accepted.
static ROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([\w\s]+)\s+([\d\.]+)\s*([a-zA-Z/%µ]*)\s+([\d\.]+)-([\d\.]+)").unwrap()
});

/// Regex-based row parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexRowParser;

impl RegexRowParser {
    pub fn new() -> Self {
        Self
    }
}

impl RowParser for RegexRowParser {
    fn parse_rows(&self, text: &str) -> Vec<RawRow> {
        ROW_RE
            .captures_iter(text)
            .map(|caps| RawRow {
                label: caps[1].trim().to_string(),
                value: caps[2].to_string(),
                unit: caps[3].to_string(),
                low: caps[4].to_string(),
                high: caps[5].to_string(),
            })
            .collect()
    }

    fn name(&self) -> &str {
        "regex"
    }
}
