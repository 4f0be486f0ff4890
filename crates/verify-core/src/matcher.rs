//! Numeric token extraction and record lookup
//!
//! Tokens are matched against the report by exact display text. A number
//! written `1234.5` on the page will not match a record of `"1,234.50"`.

use crate::report::PageEntry;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

lazy_static! {
    /// 1-3 digits, optional comma groups of 3, optional 1-2 decimals.
    /// ASCII word boundaries: letters outside ASCII do not glue to digits.
    static ref NUMBER_PATTERN: Regex =
        Regex::new(r"(?-u:\b)[0-9]{1,3}(?:,[0-9]{3})*(?:\.[0-9]{1,2})?(?-u:\b)").unwrap();
}

/// A numeric substring found in page text (byte offsets)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumericToken<'a> {
    pub start: usize,
    pub end: usize,
    pub text: &'a str,
}

/// Find every numeric token in a text segment
pub fn tokenize(text: &str) -> Vec<NumericToken<'_>> {
    NUMBER_PATTERN
        .find_iter(text)
        .map(|m| NumericToken {
            start: m.start(),
            end: m.end(),
            text: m.as_str(),
        })
        .collect()
}

/// Piece of a text segment after matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Untouched text
    Text(&'a str),
    /// A token with a report record, identified by its index in
    /// `PageEntry::records()` order
    Match { text: &'a str, record: usize },
}

/// Lookup from display value to the first record carrying it
#[derive(Debug, Clone, Default)]
pub struct RecordIndex {
    by_value: HashMap<String, usize>,
}

impl RecordIndex {
    pub fn new(page: &PageEntry) -> Self {
        let mut by_value = HashMap::new();
        for (index, (record, _)) in page.records().enumerate() {
            by_value.entry(record.value.clone()).or_insert(index);
        }
        Self { by_value }
    }

    pub fn lookup(&self, value: &str) -> Option<usize> {
        self.by_value.get(value).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_value.is_empty()
    }

    /// Split a text segment around tokens that have records
    ///
    /// Returns `None` when nothing in the segment matches, so callers can
    /// leave such text nodes alone.
    pub fn segment<'a>(&self, text: &'a str) -> Option<Vec<Segment<'a>>> {
        let mut segments = Vec::new();
        let mut cursor = 0;

        for token in tokenize(text) {
            let Some(record) = self.lookup(token.text) else {
                continue;
            };
            if token.start > cursor {
                segments.push(Segment::Text(&text[cursor..token.start]));
            }
            segments.push(Segment::Match {
                text: token.text,
                record,
            });
            cursor = token.end;
        }

        if segments.is_empty() {
            return None;
        }
        if cursor < text.len() {
            segments.push(Segment::Text(&text[cursor..]));
        }
        Some(segments)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Property: tokenize never panics and offsets always slice back to the token
        #[test]
        fn token_offsets_are_consistent(input in "\\PC{0,200}") {
            for token in tokenize(&input) {
                prop_assert_eq!(&input[token.start..token.end], token.text);
            }
        }

        /// Property: a formatted number between spaces is always found whole
        #[test]
        fn formatted_number_is_found(n in 0u64..10_000_000_000, cents in proptest::option::of(0u32..100)) {
            let mut grouped = String::new();
            let digits = n.to_string();
            for (i, c) in digits.chars().enumerate() {
                if i > 0 && (digits.len() - i) % 3 == 0 {
                    grouped.push(',');
                }
                grouped.push(c);
            }
            if let Some(c) = cents {
                grouped.push_str(&format!(".{:02}", c));
            }
            let text = format!("total {} eur", grouped);
            let tokens = tokenize(&text);
            prop_assert_eq!(tokens.len(), 1);
            prop_assert_eq!(tokens[0].text, grouped.as_str());
        }

        /// Property: segments always concatenate back to the input
        #[test]
        fn segments_reassemble_input(words in prop::collection::vec("[a-z]{1,6}|[0-9]{1,3}|1,234\\.56", 0..20)) {
            let mut page = PageEntry::new("p.html");
            page.unverified.push(crate::report::NumberRecord::new(1, "1,234.56", "currency"));
            page.verified.push(crate::report::NumberRecord::new(2, "42", "integer"));
            let index = RecordIndex::new(&page);
            let text = words.join(" ");
            if let Some(segments) = index.segment(&text) {
                let rebuilt: String = segments
                    .iter()
                    .map(|s| match s {
                        Segment::Text(t) => *t,
                        Segment::Match { text, .. } => *text,
                    })
                    .collect();
                prop_assert_eq!(rebuilt, text);
            }
        }
    }
}
