// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page range expressions such as `1,3,5-10`.
//
// Parsing is lenient: tokens that are not an integer or an `A-B` pair are
// dropped. Bounds against a concrete document are only applied by
// `PageRange::resolve`, at the point of use.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{PageIndex, PageOrdinal};

/// Ascending, duplicate-free set of page ordinals, held as disjoint inclusive
/// spans. Serialises as its normalised expression.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct PageRange {
    spans: Vec<(u32, u32)>,
}

impl PageRange {
    /// Parse a comma-separated range expression.
    pub fn parse(expression: &str) -> Self {
        let mut spans = Vec::new();

        for token in expression.split(',').map(str::trim) {
            if token.is_empty() {
                continue;
            }
            match parse_token(token) {
                Some(span) => spans.push(span),
                None => debug!(token, "ignoring malformed range token"),
            }
        }

        Self::from_spans(spans)
    }

    /// Build a range from arbitrary ordinals, normalising order and duplicates.
    pub fn from_ordinals(ordinals: impl IntoIterator<Item = PageOrdinal>) -> Self {
        Self::from_spans(ordinals.into_iter().map(|ordinal| (ordinal.0, ordinal.0)).collect())
    }

    /// Sort and merge overlapping or touching spans.
    fn from_spans(mut spans: Vec<(u32, u32)>) -> Self {
        spans.sort_unstable();
        let mut merged: Vec<(u32, u32)> = Vec::with_capacity(spans.len());
        for (low, high) in spans {
            match merged.last_mut() {
                Some(last) if low <= last.1.saturating_add(1) => last.1 = last.1.max(high),
                _ => merged.push((low, high)),
            }
        }
        Self { spans: merged }
    }

    /// Every ordinal in ascending order.
    pub fn ordinals(&self) -> impl Iterator<Item = PageOrdinal> + '_ {
        self.spans
            .iter()
            .flat_map(|&(low, high)| (low..=high).map(PageOrdinal))
    }

    pub fn len(&self) -> usize {
        self.spans.iter().fold(0usize, |total, &(low, high)| {
            total.saturating_add((high - low) as usize).saturating_add(1)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Map to page indices of a document with `page_count` pages, dropping
    /// ordinals outside `[1, page_count]`. Only in-bounds pages are visited.
    pub fn resolve(&self, page_count: usize) -> Vec<PageIndex> {
        self.spans
            .iter()
            .flat_map(|&(low, high)| {
                let first = (low as usize).max(1);
                let last = (high as usize).min(page_count);
                (first..=last).map(|ordinal| PageIndex(ordinal - 1))
            })
            .collect()
    }
}

/// `"7"` -> (7, 7); `"9-4"` -> (4, 9). Anything else is rejected.
fn parse_token(token: &str) -> Option<(u32, u32)> {
    match token.split_once('-') {
        Some((a, b)) => {
            let a: u32 = a.trim().parse().ok()?;
            let b: u32 = b.trim().parse().ok()?;
            Some((a.min(b), a.max(b)))
        }
        None => {
            let n: u32 = token.parse().ok()?;
            Some((n, n))
        }
    }
}

impl FromStr for PageRange {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for PageRange {
    fn from(expression: String) -> Self {
        Self::parse(&expression)
    }
}

impl From<PageRange> for String {
    fn from(range: PageRange) -> Self {
        range.to_string()
    }
}

/// Normalised expression, collapsing consecutive runs: `1,3,5-10`.
impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, &(low, high)) in self.spans.iter().enumerate() {
            if position > 0 {
                f.write_str(",")?;
            }
            if low == high {
                write!(f, "{low}")?;
            } else {
                write!(f, "{low}-{high}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(expression: &str) -> Vec<u32> {
        PageRange::parse(expression).ordinals().map(|o| o.0).collect()
    }

    #[test]
    fn mixed_singles_and_spans() {
        assert_eq!(values("1,3,5-10"), vec![1, 3, 5, 6, 7, 8, 9, 10]);
    }

    #[test]
    fn reversed_span_bounds() {
        assert_eq!(values("5-3"), vec![3, 4, 5]);
    }

    #[test]
    fn empty_and_blank_expressions() {
        assert!(values("").is_empty());
        assert!(values("   ").is_empty());
        assert!(values(" , ,").is_empty());
    }

    #[test]
    fn malformed_tokens_are_dropped() {
        assert_eq!(values("abc,2"), vec![2]);
        assert_eq!(values("1-2-3,4,x-5,-6"), vec![4]);
        assert_eq!(values("2,1-99999999999"), vec![2]);
    }

    #[test]
    fn overlaps_and_whitespace_are_normalised() {
        assert_eq!(values(" 4 , 2-5 ,3, 4 - 6 "), vec![2, 3, 4, 5, 6]);
    }

    #[test]
    fn resolve_drops_out_of_bounds_ordinals() {
        let range = PageRange::parse("0,2,4,9");
        assert_eq!(range.resolve(5), vec![PageIndex(1), PageIndex(3)]);
        assert!(range.resolve(0).is_empty());
    }

    #[test]
    fn huge_spans_resolve_against_page_count() {
        let range = PageRange::parse("3,1-4000000000");
        assert_eq!(range.to_string(), "1-4000000000");
        assert_eq!(
            range.resolve(3),
            vec![PageIndex(0), PageIndex(1), PageIndex(2)]
        );
        assert!(!range.is_empty());
    }

    #[test]
    fn len_counts_ordinals_across_spans() {
        assert_eq!(PageRange::parse("1,3,5-10").len(), 8);
        assert_eq!(PageRange::parse("x").len(), 0);
    }

    #[test]
    fn from_ordinals_merges_neighbours() {
        let range = PageRange::from_ordinals([4, 2, 3, 9, 2].map(PageOrdinal));
        assert_eq!(range, PageRange::parse("2-4,9"));
    }

    #[test]
    fn serialises_as_expression() {
        let range = PageRange::parse("5-3,1");
        let json = serde_json::to_string(&range).expect("serialize");
        assert_eq!(json, "\"1,3-5\"");
        let back: PageRange = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, range);
    }

    #[test]
    fn display_collapses_runs() {
        assert_eq!(PageRange::parse("10,9,8,1,3").to_string(), "1,3,8-10");
        assert_eq!(PageRange::default().to_string(), "");
    }
}
