//! Column parser for header-style lab tables.
//!
//! Looks for a header line whose cells fuzzy-match the reference-range and
//! value vocabularies, then reads every later line with the same cell count
//! column by column. The first column is always the test name.

use std::sync::Arc;

use labsight_core::Vocabulary;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::{RawRow, RowParser};
use crate::fuzzy::FuzzyMatcher;

// Cells are separated by tabs or runs of two or more spaces.
static CELL_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\t+| {2,}").unwrap());
static VALUE_CELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([\d\.]+)\s*([a-zA-Z/%µ]*)").unwrap());
static RANGE_CELL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([\d\.]+)\s*-\s*([\d\.]+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Layout {
    cells: usize,
    value: usize,
    range: usize,
    unit: Option<usize>,
}

/// Header-normalizing parser backed by the fuzzy matcher.
pub struct HeaderColumnParser {
    vocabulary: Arc<Vocabulary>,
    matcher: FuzzyMatcher,
}

impl HeaderColumnParser {
    pub fn new(vocabulary: Arc<Vocabulary>, matcher: FuzzyMatcher) -> Self {
        Self {
            vocabulary,
            matcher,
        }
    }

    fn detect_layout(&self, cells: &[&str]) -> Option<Layout> {
        if cells.len() < 3 {
            return None;
        }
        let hits = |idx: usize, labels: &[String]| {
            self.matcher.best_match(cells[idx], labels).is_some()
        };

        let range = (1..cells.len()).find(|&i| hits(i, &self.vocabulary.reference_keywords))?;
        let value = (1..cells.len())
            .filter(|&i| i != range)
            .find(|&i| hits(i, &self.vocabulary.value_keywords))?;
        let unit = (1..cells.len())
            .filter(|&i| i != range && i != value)
            .find(|&i| hits(i, &self.vocabulary.unit_keywords));

        Some(Layout {
            cells: cells.len(),
            value,
            range,
            unit,
        })
    }

    fn read_row(layout: &Layout, cells: &[&str]) -> Option<RawRow> {
        if cells.len() != layout.cells {
            return None;
        }
        let value = VALUE_CELL_RE.captures(cells[layout.value])?;
        let range = RANGE_CELL_RE.captures(cells[layout.range])?;
        let unit = match layout.unit {
            Some(idx) => cells[idx].to_string(),
            None => value[2].to_string(),
        };

        Some(RawRow {
            label: cells[0].to_string(),
            value: value[1].to_string(),
            unit,
            low: range[1].to_string(),
            high: range[2].to_string(),
        })
    }
}

fn split_cells(line: &str) -> Vec<&str> {
    CELL_SPLIT_RE
        .split(line.trim())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect()
}

impl RowParser for HeaderColumnParser {
    fn parse_rows(&self, text: &str) -> Vec<RawRow> {
        let mut layout: Option<Layout> = None;
        let mut rows = Vec::new();

        for line in text.lines() {
            let cells = split_cells(line);
            match layout {
                Some(found) => {
                    if let Some(row) = Self::read_row(&found, &cells) {
                        rows.push(row);
                    }
                }
                None => {
                    layout = self.detect_layout(&cells);
                    if let Some(found) = layout {
                        debug!("Detected table header {:?}: {:?}", cells, found);
                    }
                }
            }
        }

        rows
    }

    fn name(&self) -> &str {
        "header"
    }
}
