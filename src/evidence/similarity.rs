//! Ratcliff/Obershelp matching over character slices, plus a cheap upper bound used to skip
//! windows before the full alignment.

use std::collections::HashMap;

/// Contiguous run where `a[a_start..a_start + len] == b[b_start..b_start + len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub len: usize,
}

/// Best alignment of a quote inside one window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowMatch {
    /// `2·M / (|quote| + |region|)`.
    pub similarity: f64,
    /// Matched region inside the window, `[start, end)` relative to the window.
    pub region_start: usize,
    pub region_end: usize,
}

/// Reusable scratch rows for the longest-match dynamic program.
#[derive(Debug, Default)]
pub struct Matcher {
    prev: Vec<usize>,
    cur: Vec<usize>,
}

impl Matcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Longest common run of `a[alo..ahi]` and `b[blo..bhi]`. Ties keep the earliest start in
    /// `a`, then in `b`.
    pub fn longest_match(
        &mut self,
        a: &[char],
        b: &[char],
        (alo, ahi): (usize, usize),
        (blo, bhi): (usize, usize),
    ) -> MatchBlock {
        let width = bhi.saturating_sub(blo);
        self.prev.clear();
        self.prev.resize(width + 1, 0);
        self.cur.clear();
        self.cur.resize(width + 1, 0);

        let mut best = MatchBlock {
            a_start: alo,
            b_start: blo,
            len: 0,
        };

        for i in alo..ahi {
            for j in 0..width {
                self.cur[j + 1] = if a[i] == b[blo + j] {
                    self.prev[j] + 1
                } else {
                    0
                };
                let k = self.cur[j + 1];
                if k > best.len {
                    best = MatchBlock {
                        a_start: i + 1 - k,
                        b_start: blo + j + 1 - k,
                        len: k,
                    };
                }
            }
            std::mem::swap(&mut self.prev, &mut self.cur);
        }

        best
    }

    /// All matching blocks, ordered by position in `a` (and `b`).
    pub fn matching_blocks(&mut self, a: &[char], b: &[char]) -> Vec<MatchBlock> {
        let mut pending = vec![((0, a.len()), (0, b.len()))];
        let mut blocks = Vec::new();

        while let Some((a_range, b_range)) = pending.pop() {
            let block = self.longest_match(a, b, a_range, b_range);
            if block.len == 0 {
                continue;
            }
            blocks.push(block);
            if a_range.0 < block.a_start && b_range.0 < block.b_start {
                pending.push(((a_range.0, block.a_start), (b_range.0, block.b_start)));
            }
            let a_end = block.a_start + block.len;
            let b_end = block.b_start + block.len;
            if a_end < a_range.1 && b_end < b_range.1 {
                pending.push(((a_end, a_range.1), (b_end, b_range.1)));
            }
        }

        blocks.sort_by_key(|block| (block.a_start, block.b_start));
        blocks
    }

    /// Aligns `quote` inside `window`. The score is measured against the tightest region of
    /// the window that covers every matched character, so trailing window slack is not
    /// penalized.
    pub fn align(&mut self, quote: &[char], window: &[char]) -> Option<WindowMatch> {
        if quote.is_empty() || window.is_empty() {
            return None;
        }

        let blocks = self.matching_blocks(quote, window);
        let matched: usize = blocks.iter().map(|block| block.len).sum();
        if matched == 0 {
            return None;
        }

        let region_start = blocks.iter().map(|block| block.b_start).min()?;
        let region_end = blocks.iter().map(|block| block.b_start + block.len).max()?;
        let region_len = region_end - region_start;

        Some(WindowMatch {
            similarity: (2 * matched) as f64 / (quote.len() + region_len) as f64,
            region_start,
            region_end,
        })
    }
}

/// Upper bound on [`Matcher::align`] similarity for one quote.
///
/// Matching blocks form a common subsequence, so `M <= LCS(quote, window)`, and the matched
/// region is at least `M` long. The similarity is therefore at most `2·L / (|quote| + L)`
/// with `L` the LCS length, computed bit-parallel in `O(|window| · ⌈|quote| / 64⌉)`.
#[derive(Debug, Clone)]
pub struct LcsBound {
    quote_len: usize,
    masks: HashMap<char, Vec<u64>>,
    row: Vec<u64>,
}

impl LcsBound {
    pub fn new(quote: &[char]) -> Self {
        let words = quote.len().div_ceil(64);
        let mut masks: HashMap<char, Vec<u64>> = HashMap::new();
        for (i, c) in quote.iter().enumerate() {
            masks.entry(*c).or_insert_with(|| vec![0; words])[i / 64] |= 1 << (i % 64);
        }
        Self {
            quote_len: quote.len(),
            masks,
            row: vec![0; words],
        }
    }

    /// Length of the longest common subsequence of the quote and `window`.
    pub fn lcs_len(&mut self, window: &[char]) -> usize {
        self.row.iter_mut().for_each(|word| *word = u64::MAX);

        for c in window {
            let Some(mask) = self.masks.get(c) else {
                continue;
            };
            let mut carry = false;
            for (word, m) in self.row.iter_mut().zip(mask) {
                let matched = *word & m;
                let (sum, c1) = word.overflowing_add(matched);
                let (sum, c2) = sum.overflowing_add(carry as u64);
                carry = c1 || c2;
                *word = sum | (*word & !m);
            }
        }

        let mut zeros = 0;
        for (k, word) in self.row.iter().enumerate() {
            let bits = (self.quote_len - k * 64).min(64);
            let valid = if bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
            zeros += (!word & valid).count_ones() as usize;
        }
        zeros
    }

    /// Highest similarity any alignment of the quote inside `window` can reach.
    pub fn ceiling(&mut self, window: &[char]) -> f64 {
        if self.quote_len == 0 {
            return 0.0;
        }
        let lcs = self.lcs_len(window);
        (2 * lcs) as f64 / (self.quote_len + lcs) as f64
    }
}
