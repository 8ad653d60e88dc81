//! Fuzzy label matching for noisy OCR tokens.
//!
//! Scores are partial-similarity percentages. Every matching block between
//! the two strings anchors a window of the longer string as wide as the
//! shorter one, and each window is scored as `2 * matches / total_len` with
//! the matches counted by recursive longest-common-block search. Containment
//! after lowercasing scores 100.

use labsight_core::config::DEFAULT_FUZZY_THRESHOLD;

/// Matches tokens against a canonical label list.
#[derive(Debug, Clone, Copy)]
pub struct FuzzyMatcher {
    threshold: u8,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZY_THRESHOLD)
    }
}

impl FuzzyMatcher {
    /// Scores at or below `threshold` never match.
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold: threshold.min(100),
        }
    }

    /// Best-scoring candidate above the threshold. Ties keep the earliest candidate.
    pub fn best_match<'a, S: AsRef<str>>(&self, token: &str, candidates: &'a [S]) -> Option<&'a str> {
        let mut best: Option<(&'a str, u8)> = None;
        for candidate in candidates {
            let candidate = candidate.as_ref();
            let score = partial_ratio(token, candidate);
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((candidate, score)),
            }
        }

        best.filter(|(_, score)| *score > self.threshold)
            .map(|(candidate, _)| candidate)
    }
}

/// Case-insensitive partial similarity in `0..=100`.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };

    let mut best = 0.0f64;
    for block in matching_blocks(short, long) {
        let start = block.long_start.saturating_sub(block.short_start);
        let end = (start + short.len()).min(long.len());
        let score = ratio(short, &long[start..end]);
        if score > 0.995 {
            return 100;
        }
        best = best.max(score);
    }

    round_half_even(best * 100.0) as u8
}

/// `2 * matches / (len_a + len_b)`.
fn ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matches: usize = matching_blocks(a, b).iter().map(|m| m.size).sum();
    2.0 * matches as f64 / total as f64
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    short_start: usize,
    long_start: usize,
    size: usize,
}

/// Non-overlapping common blocks in ascending order, closed by an empty
/// sentinel block at the end of both strings.
fn matching_blocks(a: &[char], b: &[char]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut pending = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let block = longest_block(a, b, alo, ahi, blo, bhi);
        if block.size == 0 {
            continue;
        }
        blocks.push(block);
        if alo < block.short_start && blo < block.long_start {
            pending.push((alo, block.short_start, blo, block.long_start));
        }
        let (i, j) = (block.short_start + block.size, block.long_start + block.size);
        if i < ahi && j < bhi {
            pending.push((i, ahi, j, bhi));
        }
    }

    blocks.sort_by_key(|m| (m.short_start, m.long_start));
    blocks.push(Block {
        short_start: a.len(),
        long_start: b.len(),
        size: 0,
    });
    blocks
}

/// Longest common run in `a[alo..ahi]` and `b[blo..bhi]`. Ties keep the
/// earliest start in `a`, then in `b`.
fn longest_block(a: &[char], b: &[char], alo: usize, ahi: usize, blo: usize, bhi: usize) -> Block {
    let mut best = Block {
        short_start: alo,
        long_start: blo,
        size: 0,
    };
    // run[j] is the length of the common run ending at a[i - 1], b[j - 1].
    let mut prev = vec![0usize; bhi + 1];
    let mut curr = vec![0usize; bhi + 1];

    for i in alo..ahi {
        for j in blo..bhi {
            curr[j + 1] = if a[i] == b[j] {
                let k = if j > blo { prev[j] + 1 } else { 1 };
                if k > best.size {
                    best = Block {
                        short_start: i + 1 - k,
                        long_start: j + 1 - k,
                        size: k,
                    };
                }
                k
            } else {
                0
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    best
}

fn round_half_even(x: f64) -> f64 {
    let rounded = x.round();
    if (rounded - x).abs() == 0.5 && rounded % 2.0 != 0.0 {
        rounded - 1.0
    } else {
        rounded
    }
}
