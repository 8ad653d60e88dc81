//! Abnormal lab value detection.
//!
//! Row parsing is a pluggable strategy (`RowParser`). The detector runs the
//! primary parser and, only when it yields no rows at all, the optional
//! fallback parser. Rows whose numbers do not parse are dropped individually.

mod header_rows;
mod regex_rows;

pub use header_rows::HeaderColumnParser;
pub use regex_rows::RegexRowParser;

use std::sync::Arc;

use labsight_core::{LabsightConfig, Vocabulary};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::document::ExtractedText;
use crate::finding::{FindingSet, LabFinding};
use crate::fuzzy::FuzzyMatcher;

/// A candidate table row, still as raw captured text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub label: String,
    pub value: String,
    pub unit: String,
    pub low: String,
    pub high: String,
}

impl RawRow {
    /// Parse the numeric cells. `None` when any of them is not a number.
    pub fn to_finding(&self) -> Option<LabFinding> {
        let value = parse_number(&self.value)?;
        let low = parse_number(&self.low)?;
        let high = parse_number(&self.high)?;
        Some(LabFinding::new(
            self.label.trim(),
            value,
            self.unit.as_str(),
            low,
            high,
        ))
    }
}

static DECIMAL_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d$").unwrap());

fn is_decimal_digit(c: char) -> bool {
    let mut buf = [0u8; 4];
    DECIMAL_DIGIT_RE.is_match(c.encode_utf8(&mut buf))
}

/// Value of any Unicode decimal digit. Each script encodes its digits as
/// contiguous runs of ten starting at zero.
fn digit_value(c: char) -> Option<u32> {
    if c.is_ascii_digit() {
        return c.to_digit(10);
    }
    if !is_decimal_digit(c) {
        return None;
    }
    let mut start = c as u32;
    while let Some(prev) = start.checked_sub(1).and_then(char::from_u32) {
        if !is_decimal_digit(prev) {
            break;
        }
        start -= 1;
    }
    Some((c as u32 - start) % 10)
}

/// Float parse that also accepts non-ASCII decimal digits, e.g. `٥٠`.
fn parse_number(raw: &str) -> Option<f64> {
    let ascii: String = raw
        .chars()
        .map(|c| match digit_value(c).and_then(|d| char::from_digit(d, 10)) {
            Some(d) => d,
            None => c,
        })
        .collect();
    ascii.parse::<f64>().ok()
}

/// Strategy that finds "label / value / unit / range" rows in text.
pub trait RowParser: Send + Sync {
    /// Candidate rows in the order they appear in `text`.
    fn parse_rows(&self, text: &str) -> Vec<RawRow>;

    /// Strategy name for logs.
    fn name(&self) -> &str;
}

/// Scans extracted text and keeps the out-of-range measurements.
pub struct AbnormalValueDetector {
    primary: Box<dyn RowParser>,
    fallback: Option<Box<dyn RowParser>>,
}

impl Default for AbnormalValueDetector {
    fn default() -> Self {
        Self::new(Box::new(RegexRowParser::new()))
    }
}

impl AbnormalValueDetector {
    pub fn new(primary: Box<dyn RowParser>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: Box<dyn RowParser>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Regex parser, plus the fuzzy header parser when `header_fallback` is on.
    pub fn from_config(config: &LabsightConfig, vocabulary: Arc<Vocabulary>) -> Self {
        let detector = Self::default();
        if config.header_fallback {
            let matcher = FuzzyMatcher::new(config.fuzzy_threshold);
            detector.with_fallback(Box::new(HeaderColumnParser::new(vocabulary, matcher)))
        } else {
            detector
        }
    }

    /// LOW/HIGH findings in scan order. Never fails; no matches yields an empty list.
    pub fn detect(&self, text: &ExtractedText) -> Vec<LabFinding> {
        let mut rows = self.primary.parse_rows(text.as_str());
        let mut strategy = self.primary.name();

        if rows.is_empty() {
            if let Some(fallback) = &self.fallback {
                rows = fallback.parse_rows(text.as_str());
                strategy = fallback.name();
            }
        }

        let total = rows.len();
        let findings: Vec<LabFinding> = rows
            .iter()
            .filter_map(RawRow::to_finding)
            .filter(|f| f.status.is_abnormal())
            .collect();

        debug!(
            "{} parser: {} rows, {} abnormal",
            strategy,
            total,
            findings.len()
        );
        findings
    }

    /// Detect and bundle the result with its source text.
    pub fn finding_set(&self, text: ExtractedText) -> FindingSet {
        let findings = self.detect(&text);
        FindingSet {
            extracted_text: text,
            findings,
        }
    }
}
