//! Residual content keywords and result counts.
//!
//! The extractor works in two passes. The first segments the query into
//! quoted phrases, email addresses, temporal phrases and plain tokens. The
//! second drops everything in the exclusion classes and joins what is left
//! in source order, casing preserved.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::temporal::temporal_spans;
use super::vocabulary::{
    in_set, number_word, words, Word, GENERIC_ACTION_WORDS, ITEM_TYPE_WORDS, PRONOUN_WORDS,
    QUANTITY_WORDS, STOP_WORDS, STRUCTURAL_WORDS, TIME_RELATIVE_WORDS,
};

// ============================================================================
// Segmentation
// ============================================================================

/// A span of the query after the first pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Quoted phrase, quotes stripped
    Quoted { text: &'a str, span: Range<usize> },
    Email { text: &'a str, span: Range<usize> },
    Temporal { span: Range<usize> },
    Token(Word<'a>),
}

impl Segment<'_> {
    fn start(&self) -> usize {
        match self {
            Self::Quoted { span, .. } | Self::Email { span, .. } | Self::Temporal { span } => {
                span.start
            }
            Self::Token(w) => w.start,
        }
    }
}

/// Quoted phrases in `text`, with the span of the inner text.
pub fn quoted_phrases(text: &str) -> Vec<(&str, Range<usize>)> {
    QUOTED_PATTERN
        .captures_iter(text)
        .filter_map(|cap| (1..=4).find_map(|i| cap.get(i)))
        .map(|m| (m.as_str().trim(), m.range()))
        .filter(|(s, _)| !s.is_empty())
        .collect()
}

/// First pass: split `text` into segments in source order.
pub fn segment(text: &str) -> Vec<Segment<'_>> {
    let quoted: Vec<(&str, Range<usize>)> = quoted_phrases(text);
    let temporal = temporal_spans(text);

    let mut segments: Vec<Segment<'_>> = quoted
        .iter()
        .map(|(q, span)| Segment::Quoted {
            text: q,
            span: span.clone(),
        })
        .collect();

    for span in &temporal {
        if !quoted.iter().any(|(_, q)| overlaps(q, span)) {
            segments.push(Segment::Temporal { span: span.clone() });
        }
    }

    for word in words(text) {
        let span = word.start..word.end;
        if quoted.iter().any(|(_, q)| overlaps(q, &span)) {
            continue;
        }
        if word.is_email() {
            segments.push(Segment::Email {
                text: word.text,
                span,
            });
        } else if !temporal.iter().any(|t| overlaps(t, &span)) {
            segments.push(Segment::Token(word));
        }
    }

    segments.sort_by_key(Segment::start);
    segments
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}

// ============================================================================
// Filter Query
// ============================================================================

/// Whether a token belongs to one of the exclusion classes.
pub fn is_excluded_word(word: &Word<'_>) -> bool {
    [
        &*GENERIC_ACTION_WORDS,
        &*PRONOUN_WORDS,
        &*TIME_RELATIVE_WORDS,
        &*QUANTITY_WORDS,
        &*STRUCTURAL_WORDS,
        &*STOP_WORDS,
        &*ITEM_TYPE_WORDS,
    ]
    .iter()
    .any(|set| in_set(set, word))
}

/// Residual content keywords, or `None` when nothing remains.
///
/// `excluded` holds extra spans to drop, such as a count phrase or an
/// unsupported-source cue.
pub fn extract_filter_query(text: &str, excluded: &[Range<usize>]) -> Option<String> {
    let kept: Vec<&str> = segment(text)
        .into_iter()
        .filter_map(|seg| match seg {
            Segment::Quoted { text, .. } => Some(text),
            Segment::Email { .. } | Segment::Temporal { .. } => None,
            Segment::Token(word) => {
                let span = word.start..word.end;
                let dropped = is_excluded_word(&word)
                    || excluded.iter().any(|e| overlaps(e, &span))
                    || word.text.chars().all(|c| !c.is_alphanumeric());
                (!dropped).then_some(word.text)
            }
        })
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}

// ============================================================================
// Count
// ============================================================================

/// A result count and the span of its number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountMatch {
    pub count: u32,
    pub span: Range<usize>,
}

/// Extract a result count from quantity phrases ("top 5", "last 3",
/// "5 emails", "first ten"). Period lengths ("last 3 days") are not counts.
pub fn extract_count(text: &str) -> Option<CountMatch> {
    for cap in LEADING_COUNT_PATTERN.captures_iter(text) {
        let Some(number) = cap.get(1) else {
            continue;
        };
        let is_period = cap
            .get(2)
            .is_some_and(|unit| PERIOD_UNITS.contains(&unit.as_str().to_lowercase().as_str()));
        if is_period {
            continue;
        }
        if let Some(count) = parse_count(number.as_str()) {
            return Some(CountMatch {
                count,
                span: number.range(),
            });
        }
    }

    let cap = COUNTED_ITEMS_PATTERN.captures(text)?;
    let number = cap.get(1)?;
    let count = parse_count(number.as_str())?;
    Some(CountMatch {
        count,
        span: number.range(),
    })
}

fn parse_count(text: &str) -> Option<u32> {
    let normalized = text.to_lowercase();
    let first = normalized.split_whitespace().next()?;
    number_word(first).filter(|n| *n > 0)
}

const PERIOD_UNITS: &[&str] = &[
    "day", "days", "week", "weeks", "month", "months", "year", "years", "hour", "hours",
    "minute", "minutes", "quarter", "quarters",
];

const COUNT_NUMBER: &str = r"\d{1,3}|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|fifteen|twenty|thirty|dozen|couple(?:\s+of)?";

const COUNTED_NOUNS: &str = r"emails?|e-mails?|mails?|messages?|dms?|files?|documents?|docs?|meetings?|events?|appointments?|invites?|contacts?|people|pdfs?|sheets?|spreadsheets?|presentations?|slides?|decks?|folders?|attachments?|results?|items?|threads?|conversations?|chats?";

static LEADING_COUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:top|first|last|latest|recent|newest|oldest|earliest|next|previous|past)\s+({COUNT_NUMBER})\b(?:\s+(\w+))?"
    ))
    .expect("Invalid regex")
});

static COUNTED_ITEMS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({COUNT_NUMBER})\s+(?:(?:most\s+)?(?:recent|latest|new|newest|old|oldest|unread|important|upcoming|previous|last)\s+)?(?:{COUNTED_NOUNS})\b"
    ))
    .expect("Invalid regex")
});

static QUOTED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"]+)"|“([^”]+)”|‘([^’]+)’|(?:^|\s)'([^']+)'(?:[^\w]|$)"#)
        .expect("Invalid regex")
});
