//! Discourse analysis: follow-up detection and ambiguity resolution.
//!
//! A query is a follow-up only when it carries explicit referential
//! language and that reference resolves to concrete content in the most
//! recent assistant turn. Topical overlap alone is not enough.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use super::types::ConversationHistory;

// ============================================================================
// Reference Matchers
// ============================================================================

/// Kinds of referential language, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceMatcher {
    /// "the second one", "#2", "the last option"
    OrdinalSelector,
    /// "that document you found", "the one you mentioned"
    BackReference,
    /// "tell me more about X", "what about Y"
    ContinuationMarker,
    /// "open it", "send that to Priya", "this file"
    Anaphora,
}

impl ReferenceMatcher {
    pub const ORDERED: [ReferenceMatcher; 4] = [
        Self::OrdinalSelector,
        Self::BackReference,
        Self::ContinuationMarker,
        Self::Anaphora,
    ];

    /// Detect this kind of reference in `text`.
    pub fn detect(&self, text: &str) -> Option<Reference> {
        match self {
            Self::OrdinalSelector => detect_ordinal(text),
            Self::BackReference => BACK_REFERENCE_PATTERN.find(text).map(|m| Reference {
                matcher: *self,
                span: m.range(),
                target: Target::Primary,
                kind: None,
            }),
            Self::ContinuationMarker => detect_continuation(text),
            Self::Anaphora => detect_anaphora(text),
        }
    }
}

/// What a detected reference points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Zero-based list position
    Nth(usize),
    /// Final list position
    Last,
    /// The single salient item of the turn
    Primary,
    /// A named topic that must appear in the turn
    Topic(String),
    /// The turn's content as a whole
    Gist,
}

/// What kind of thing a noun or a listing is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    File,
    Mail,
    Event,
    Contact,
}

impl ItemKind {
    /// Kind named by a singular or plural noun. Generic nouns ("one",
    /// "option", "result") have none.
    pub fn from_noun(noun: &str) -> Option<Self> {
        let lower = noun.to_lowercase();
        let singular = lower.strip_suffix('s').unwrap_or(&lower);
        let kind = match singular {
            "document" | "doc" | "file" | "sheet" | "spreadsheet" | "report" | "deck"
            | "presentation" | "pdf" => Self::File,
            "email" | "mail" | "message" | "thread" | "inbox" => Self::Mail,
            "meeting" | "event" | "invite" | "calendar" => Self::Event,
            "contact" => Self::Contact,
            _ => return None,
        };
        Some(kind)
    }
}

/// A referential expression found in the query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub matcher: ReferenceMatcher,
    /// Byte span replaced when the reference is substituted
    pub span: Range<usize>,
    pub target: Target,
    /// Set when the reference names a specific kind of item ("the second file")
    pub kind: Option<ItemKind>,
}

/// Run the matchers in order, returning the first hit.
pub fn detect_reference(text: &str) -> Option<Reference> {
    ReferenceMatcher::ORDERED.iter().find_map(|m| m.detect(text))
}

/// Every matcher's hit, in evaluation order.
pub fn detect_references(text: &str) -> Vec<Reference> {
    ReferenceMatcher::ORDERED
        .iter()
        .filter_map(|m| m.detect(text))
        .collect()
}

fn detect_ordinal(text: &str) -> Option<Reference> {
    if let Some(cap) = ORDINAL_PATTERN.captures(text) {
        let whole = cap.get(0)?;
        let kind = ItemKind::from_noun(&cap[2]);
        // "the last meeting with Priya" describes a new search
        let qualified = kind.is_some() && QUALIFIED_TAIL_PATTERN.is_match(&text[whole.end()..]);
        if !qualified {
            let word = cap[1].to_lowercase();
            let target = if word == "last" {
                Target::Last
            } else {
                Target::Nth(ordinal_index(&word)?)
            };
            return Some(Reference {
                matcher: ReferenceMatcher::OrdinalSelector,
                span: whole.range(),
                target,
                kind,
            });
        }
    }

    let cap = NUMBERED_PATTERN.captures(text)?;
    let n: usize = cap.get(1).or_else(|| cap.get(2))?.as_str().parse().ok()?;
    Some(Reference {
        matcher: ReferenceMatcher::OrdinalSelector,
        span: cap.get(0)?.range(),
        target: Target::Nth(n.checked_sub(1)?),
        kind: None,
    })
}

fn detect_continuation(text: &str) -> Option<Reference> {
    let cap = CONTINUATION_PATTERN.captures(text)?;
    let whole = cap.get(0)?;
    let reference = match cap.get(1) {
        Some(topic) if PRONOUN_TOPIC_PATTERN.is_match(topic.as_str()) => Reference {
            matcher: ReferenceMatcher::ContinuationMarker,
            span: topic.range(),
            target: Target::Primary,
            kind: None,
        },
        Some(topic) => Reference {
            matcher: ReferenceMatcher::ContinuationMarker,
            span: topic.range(),
            target: Target::Topic(topic.as_str().to_string()),
            kind: None,
        },
        None => Reference {
            matcher: ReferenceMatcher::ContinuationMarker,
            span: whole.end()..whole.end(),
            target: Target::Gist,
            kind: None,
        },
    };
    Some(reference)
}

fn detect_anaphora(text: &str) -> Option<Reference> {
    if let Some(cap) = DEMONSTRATIVE_PATTERN.captures(text) {
        return Some(Reference {
            matcher: ReferenceMatcher::Anaphora,
            span: cap.get(1)?.range(),
            target: Target::Primary,
            kind: ItemKind::from_noun(&cap[2]),
        });
    }

    let m = PRONOUN_PATTERN.captures(text)?.get(1)?;
    Some(Reference {
        matcher: ReferenceMatcher::Anaphora,
        span: m.range(),
        target: Target::Primary,
        kind: None,
    })
}

fn ordinal_index(word: &str) -> Option<usize> {
    let n = match word {
        "first" | "1st" => 0,
        "second" | "2nd" => 1,
        "third" | "3rd" => 2,
        "fourth" | "4th" => 3,
        "fifth" | "5th" => 4,
        "sixth" | "6th" => 5,
        "seventh" | "7th" => 6,
        "eighth" | "8th" => 7,
        "ninth" | "9th" => 8,
        "tenth" | "10th" => 9,
        _ => return None,
    };
    Some(n)
}

// ============================================================================
// Assistant Turn Content
// ============================================================================

/// Enumerable items of an assistant turn: list entries first, otherwise
/// quoted titles and file names in order of appearance.
pub fn enumerable_items(content: &str) -> Vec<String> {
    let listed: Vec<String> = LIST_ITEM_PATTERN
        .captures_iter(content)
        .filter_map(|cap| cap.get(1))
        .map(|m| clean_item(m.as_str()))
        .filter(|s| !s.is_empty())
        .collect();
    if !listed.is_empty() {
        return listed;
    }

    let mut found: Vec<(usize, String)> = QUOTED_PATTERN
        .captures_iter(content)
        .filter_map(|cap| cap.get(1).or_else(|| cap.get(2)))
        .map(|m| (m.start(), m.as_str().trim().to_string()))
        .collect();
    for m in FILE_NAME_PATTERN.find_iter(content) {
        let inside_quote = found
            .iter()
            .any(|(start, s)| m.start() >= *start && m.start() < start + s.len());
        if !inside_quote {
            found.push((m.start(), m.as_str().to_string()));
        }
    }
    found.sort_by_key(|(start, _)| *start);

    let mut items: Vec<String> = Vec::new();
    for (_, item) in found {
        if !items.iter().any(|i| i.eq_ignore_ascii_case(&item)) {
            items.push(item);
        }
    }
    items
}

/// Whether an assistant turn is small talk or a direct answer rather than
/// search results.
pub fn is_conversational(content: &str) -> bool {
    CONVERSATIONAL_TURN_PATTERN.is_match(content)
}

/// Kind of item an assistant turn lists, from its file names or the first
/// item noun it uses.
pub fn listing_kind(content: &str, items: &[String]) -> Option<ItemKind> {
    if items.iter().any(|item| FILE_NAME_PATTERN.is_match(item)) {
        return Some(ItemKind::File);
    }
    ITEM_NOUN_PATTERN
        .find_iter(content)
        .find_map(|m| ItemKind::from_noun(m.as_str()))
}

/// Capitalized named spans, skipping sentence-leading filler words.
pub fn salient_spans(content: &str) -> Vec<String> {
    CAPITALIZED_SPAN_PATTERN
        .find_iter(content)
        .filter_map(|m| {
            let kept: Vec<&str> = m
                .as_str()
                .split_whitespace()
                .skip_while(|w| FILLER_CAPITALS.contains(w))
                .collect();
            (!kept.is_empty()).then(|| kept.join(" "))
        })
        .collect()
}

/// First sentence of `content`, bounded to `max_words`.
pub fn gist(content: &str, max_words: usize) -> String {
    let first = content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();
    let sentence = SENTENCE_END_PATTERN
        .find(first)
        .map(|m| &first[..m.start()])
        .unwrap_or(first);
    let sentence = sentence.trim_end_matches(|c: char| matches!(c, '.' | '!' | '?' | ':'));
    sentence
        .split_whitespace()
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_item(raw: &str) -> String {
    let text = raw.replace("**", "").replace('`', "");
    let cut = ITEM_DETAIL_PATTERN
        .find(&text)
        .map(|m| m.start())
        .unwrap_or(text.len());
    text[..cut]
        .trim()
        .trim_matches(|c: char| matches!(c, '"' | '“' | '”'))
        .trim_end_matches(|c: char| matches!(c, '.' | ',' | ';' | ':'))
        .trim()
        .to_string()
}

const FILLER_CAPITALS: &[&str] = &[
    "Here", "The", "I", "I'm", "I've", "You", "Your", "This", "That", "These", "Those", "It",
    "A", "An", "Sure", "Yes", "No", "Hi", "Hello", "Let", "We", "My", "There", "What", "Which",
    "When", "Who", "How", "Please", "Okay", "OK", "Found", "Below", "Above", "And", "Or", "But",
    "Of", "In", "On", "For", "Good", "Hey", "Great", "Thanks", "Goodbye", "Sorry",
];

// ============================================================================
// Discourse Analyzer
// ============================================================================

/// Result of discourse analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscourseOutcome {
    pub is_follow_up: bool,
    pub query_rewrite: Option<String>,
    /// Text the rest of the pipeline should read
    pub resolved_text: String,
}

impl DiscourseOutcome {
    fn unchanged(query: &str) -> Self {
        Self {
            is_follow_up: false,
            query_rewrite: None,
            resolved_text: query.to_string(),
        }
    }

    fn rewritten(query: &str, rewrite: Option<String>, is_follow_up: bool) -> Self {
        let rewrite = rewrite.filter(|r| r.trim() != query.trim());
        Self {
            is_follow_up,
            resolved_text: rewrite.clone().unwrap_or_else(|| query.to_string()),
            query_rewrite: rewrite,
        }
    }
}

/// Detects follow-ups and resolves ambiguous references against history.
pub struct DiscourseAnalyzer {
    gist_words: usize,
}

impl DiscourseAnalyzer {
    pub fn new(gist_words: usize) -> Self {
        Self {
            gist_words: gist_words.max(1),
        }
    }

    pub fn analyze(&self, query: &str, history: &ConversationHistory) -> DiscourseOutcome {
        let Some(last) = history.last_assistant() else {
            return DiscourseOutcome::unchanged(query);
        };

        let conversational = is_conversational(&last.content);
        let references = detect_references(query);

        if !conversational {
            for reference in &references {
                if let Some(resolved) = self.resolve(reference, &last.content) {
                    tracing::debug!(
                        matcher = ?reference.matcher,
                        resolved = %resolved,
                        "Reference resolved against last assistant turn"
                    );
                    let rewrite = substitute(query, reference, &resolved);
                    return DiscourseOutcome::rewritten(query, rewrite, true);
                }
            }
        }

        let primary = references
            .iter()
            .find(|r| r.target == Target::Primary && r.kind.is_none());
        if let Some(reference) = primary {
            if let Some(antecedent) = self.antecedent_in_history(history) {
                tracing::debug!(antecedent = %antecedent, "Reference resolved from history");
                let rewrite = substitute(query, reference, &antecedent);
                return DiscourseOutcome::rewritten(query, rewrite, false);
            }
        }

        if conversational {
            return DiscourseOutcome::unchanged(query);
        }

        if let Some(cap) = VAGUE_COMMAND_PATTERN.captures(query) {
            let command = cap.get(1).map(|m| m.as_str()).unwrap_or(query);
            let gist = gist(&last.content, self.gist_words);
            if !gist.is_empty() {
                let rewrite = format!("{}: {}", command.trim(), gist);
                return DiscourseOutcome::rewritten(query, Some(rewrite), false);
            }
        }

        DiscourseOutcome::unchanged(query)
    }

    fn resolve(&self, reference: &Reference, content: &str) -> Option<String> {
        let items = enumerable_items(content);
        if let Some(kind) = reference.kind {
            if listing_kind(content, &items) != Some(kind) {
                return None;
            }
        }
        match &reference.target {
            Target::Nth(n) => items.get(*n).cloned(),
            Target::Last => items.last().cloned(),
            Target::Primary => primary_item(&items, content),
            Target::Topic(topic) => resolve_topic(topic, &items, content),
            Target::Gist => Some(gist(content, self.gist_words)).filter(|g| !g.is_empty()),
        }
    }

    /// Antecedent from earlier turns, most recent first.
    fn antecedent_in_history(&self, history: &ConversationHistory) -> Option<String> {
        let earlier_assistant = history
            .assistant_turns_rev()
            .skip(1)
            .filter(|t| !is_conversational(&t.content))
            .find_map(|t| primary_item(&enumerable_items(&t.content), &t.content));
        earlier_assistant.or_else(|| {
            let turns: Vec<_> = history.user_turns().collect();
            turns.iter().rev().find_map(|t| {
                let items = enumerable_items(&t.content);
                match items.len() {
                    1 => items.into_iter().next(),
                    _ => salient_spans(&t.content).into_iter().next(),
                }
            })
        })
    }
}

impl Default for DiscourseAnalyzer {
    fn default() -> Self {
        Self::new(24)
    }
}

/// A single item, or the first named span when the turn lists nothing.
fn primary_item(items: &[String], content: &str) -> Option<String> {
    match items.len() {
        1 => items.first().cloned(),
        0 => salient_spans(content).into_iter().next(),
        _ => None,
    }
}

fn resolve_topic(topic: &str, items: &[String], content: &str) -> Option<String> {
    let keys = topic_keys(topic);
    if keys.is_empty() {
        return None;
    }

    let matching_item = items.iter().find(|item| {
        let item = item.to_lowercase();
        keys.iter().all(|k| item.contains(k.as_str()))
    });
    if let Some(item) = matching_item {
        return Some(item.clone());
    }

    let lower = content.to_lowercase();
    keys.iter()
        .all(|k| lower.contains(k.as_str()))
        .then(|| topic.to_string())
}

fn topic_keys(topic: &str) -> Vec<String> {
    topic
        .split(|c: char| !c.is_alphanumeric())
        .map(str::to_lowercase)
        .filter(|w| !w.is_empty() && !TOPIC_FILLER.contains(&w.as_str()))
        .collect()
}

const TOPIC_FILLER: &[&str] = &["the", "a", "an", "my", "our", "your", "of", "on", "about"];

/// Replace the reference span with `resolved`. `None` when nothing changes.
fn substitute(query: &str, reference: &Reference, resolved: &str) -> Option<String> {
    let current = query.get(reference.span.clone())?;
    if current.trim().eq_ignore_ascii_case(resolved.trim()) {
        return None;
    }
    if reference.span.is_empty() {
        let head = query[..reference.span.start]
            .trim_end_matches(|c: char| matches!(c, '?' | '.' | '!') || c.is_whitespace());
        return Some(format!("{head} about {resolved}"));
    }
    Some(format!(
        "{}{}{}",
        &query[..reference.span.start],
        resolved,
        &query[reference.span.end..]
    ))
}

// ============================================================================
// Regex Patterns
// ============================================================================

static ORDINAL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bthe\s+(first|second|third|fourth|fifth|sixth|seventh|eighth|ninth|tenth|last|1st|2nd|3rd|4th|5th|6th|7th|8th|9th|10th)\s+(one|option|item|choice|result|entry|link|document|doc|file|email|mail|message|meeting|event|contact|thread)s?\b",
    )
    .expect("Invalid regex")
});

static QUALIFIED_TAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s+(?:with|from|about|regarding|between|by)\b").expect("Invalid regex")
});

static NUMBERED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:#\s*(\d{1,2})\b|\b(?:number|no\.|option|item)\s*#?\s*(\d{1,2})\b)")
        .expect("Invalid regex")
});

static BACK_REFERENCE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:that|the|those|these)\s+(?:[\w\-]+\s+){0,2}?(?:you|u)\s+(?:just\s+)?(?:found|mentioned|listed|shared|showed|shown|sent|gave|suggested|pulled|referenced|described|said|pulled\s+up)\b",
    )
    .expect("Invalid regex")
});

static CONTINUATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:tell\s+me\s+more|more\s+(?:details|detail|info|information)|what\s+about|how\s+about|elaborate|expand|go\s+deeper)(?:\s+(?:about|on|into|regarding|of))?(?:\s+([^?.!]+?))?\s*[?.!]*\s*$",
    )
    .expect("Invalid regex")
});

static PRONOUN_TOPIC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:it|that|this|those|these|them|that\s+one|this\s+one)$")
        .expect("Invalid regex")
});

static DEMONSTRATIVE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b((?:that|this|those|these)\s+(ones?|documents?|docs?|files?|emails?|mails?|messages?|meetings?|events?|links?|sheets?|spreadsheets?|reports?|decks?|presentations?|threads?|contacts?))\b",
    )
    .expect("Invalid regex")
});

static PRONOUN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:open|send|share|summarize|summarise|forward|show|explain|download|read|describe|review|edit|delete|get|about|of|in|from|with|on|is|was|are|were|did|does|sent|wrote|created|attach|attached)\s+(it|that|this|those|these|them)(?:\s*[?.!,]|\s*$|\s+(?:to|with|again|please|in|from|and)\b)",
    )
    .expect("Invalid regex")
});

static VAGUE_COMMAND_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:please\s+)?((?:summarize|summarise|explain|elaborate|expand|clarify|simplify|shorten|rephrase|continue|go\s+on|do\s+it\s+again|try\s+again|again|more\s+details?|give\s+me\s+more)(?:\s+(?:it|that|this))?(?:\s+(?:in\s+)?more\s+detail)?)\s*(?:please)?\s*[.!?]*\s*$",
    )
    .expect("Invalid regex")
});

static LIST_ITEM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:\d{1,2}[.)]|[-*•])\s+(.+?)\s*$").expect("Invalid regex")
});

static ITEM_DETAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[-–—]\s+|:\s|\s\(").expect("Invalid regex"));

static QUOTED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""([^"\n]{2,80})"|“([^”\n]{2,80})”"#).expect("Invalid regex")
});

static FILE_NAME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b[\w\-]+\.(?:pdf|docx?|xlsx?|csv|pptx?|txt|md|key|numbers|pages|zip|png|jpe?g)\b",
    )
    .expect("Invalid regex")
});

static CAPITALIZED_SPAN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][\w&'\-]*(?:\s+[A-Z0-9][\w&'\-]*)*").expect("Invalid regex")
});

static CONVERSATIONAL_TURN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:good\s+(?:morning|afternoon|evening|night)|hello|hi|hey|you're\s+welcome|goodbye|bye|thanks|thank\s+you|i'm\s+\w+,\s+your|you\s+asked|your\s+first\s+question|i\s+said|so\s+far\s+you've|you\s+haven't|i\s+haven't|we\s+haven't|today\s+is|i\s+don't\s+have\s+a\s+fixed\s+time\s+zone|i\s+couldn't\s+work\s+out)\b|great!\s+let\s+me\s+know|it's\s+\d|[\d(.\-][\d\s.+\-*/^%()]*(?:=|can't\s+be\s+calculated))",
    )
    .expect("Invalid regex")
});

static ITEM_NOUN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:documents?|docs?|files?|sheets?|spreadsheets?|reports?|decks?|presentations?|pdfs?|emails?|mails?|messages?|threads?|inbox|meetings?|events?|invites?|calendar|contacts?)\b",
    )
    .expect("Invalid regex")
});

static SENTENCE_END_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?](?:\s|$)").expect("Invalid regex"));
