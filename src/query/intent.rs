//! Strict identifier extraction for gmail/mail lookups.
//!
//! Only syntactically exact identifiers populate the intent: email
//! addresses, plus quoted subject phrases when at least one address is
//! present. Bare names never do.

use std::sync::LazyLock;

use regex::Regex;

use super::types::MailIntent;
use super::vocabulary::Word;

/// Address field a directional cue selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AddressField {
    From,
    To,
    Cc,
    Bcc,
}

impl AddressField {
    fn from_cue(word: &str) -> Option<Self> {
        match word {
            "from" | "by" => Some(Self::From),
            "to" => Some(Self::To),
            "cc" | "cc'd" | "cced" | "copied" => Some(Self::Cc),
            "bcc" | "bcc'd" | "bcced" => Some(Self::Bcc),
            "sender" | "senders" => Some(Self::From),
            "recipient" | "recipients" => Some(Self::To),
            _ => None,
        }
    }

    fn slot<'a>(&self, intent: &'a mut MailIntent) -> &'a mut Vec<String> {
        match self {
            Self::From => &mut intent.from,
            Self::To => &mut intent.to,
            Self::Cc => &mut intent.cc,
            Self::Bcc => &mut intent.bcc,
        }
    }
}

/// Words that end a clause and with it the reach of a cue.
const CLAUSE_BREAKERS: &[&str] = &["but", "while", "whereas", "except", "excluding", "unless"];

/// Extract exact-match identifiers from `text`.
pub fn extract_intent(text: &str, words: &[Word<'_>]) -> MailIntent {
    let mut intent = MailIntent::default();
    let mut cue: Option<AddressField> = None;
    let mut previous_end = 0;

    for word in words {
        let gap = &text[previous_end..word.start];
        if gap.contains(['.', ';', '!', '?']) || CLAUSE_BREAKERS.contains(&word.lower.as_str()) {
            cue = None;
        }

        if word.is_email() {
            let slot = cue.unwrap_or(AddressField::From).slot(&mut intent);
            if !slot.iter().any(|a| a.eq_ignore_ascii_case(word.text)) {
                slot.push(word.text.to_string());
            }
        } else if let Some(field) = AddressField::from_cue(&word.lower) {
            cue = Some(field);
        }

        previous_end = word.end;
    }

    if intent.has_address() {
        intent.subject = subject_phrases(text);
    }

    tracing::trace!(intent = ?intent, "Strict identifiers");
    intent
}

/// Quoted phrases introduced as a subject or title.
pub fn subject_phrases(text: &str) -> Vec<String> {
    let mut subjects: Vec<String> = Vec::new();
    for cap in SUBJECT_PATTERN.captures_iter(text) {
        if let Some(m) = (1..=3).find_map(|i| cap.get(i)) {
            let phrase = m.as_str().trim();
            if !phrase.is_empty() && !subjects.iter().any(|s| s == phrase) {
                subjects.push(phrase.to_string());
            }
        }
    }
    subjects
}

static SUBJECT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)\b(?:subject(?:\s+line)?(?:\s+(?:contains|containing|is|of|like|with|mentioning))?|titled|entitled|called|named|about|regarding|re)\s*[:=]?\s*(?:"([^"]+)"|'([^']+)'|“([^”]+)”)"#,
    )
    .expect("Invalid regex")
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::vocabulary::words;

    fn intent(text: &str) -> MailIntent {
        extract_intent(text, &words(text))
    }

    #[test]
    fn test_default_direction_is_from() {
        let i = intent("emails john@acme.com");
        assert_eq!(i.from, vec!["john@acme.com"]);
    }

    #[test]
    fn test_directional_cues() {
        let i = intent("emails from john@acme.com to priya@acme.com cc ravi@acme.com");
        assert_eq!(i.from, vec!["john@acme.com"]);
        assert_eq!(i.to, vec!["priya@acme.com"]);
        assert_eq!(i.cc, vec!["ravi@acme.com"]);

        let i = intent("mails I sent to ops@acme.com where I bcc'd legal@acme.com");
        assert_eq!(i.to, vec!["ops@acme.com"]);
        assert_eq!(i.bcc, vec!["legal@acme.com"]);

        let i = intent("emails sent by hr@acme.com");
        assert_eq!(i.from, vec!["hr@acme.com"]);
    }

    #[test]
    fn test_coordination_shares_cue() {
        let i = intent("emails from a@x.com and b@y.com");
        assert_eq!(i.from, vec!["a@x.com", "b@y.com"]);

        let i = intent("emails to a@x.com, b@y.com or c@z.io");
        assert_eq!(i.to, vec!["a@x.com", "b@y.com", "c@z.io"]);
    }

    #[test]
    fn test_clause_boundary_resets_cue() {
        let i = intent("emails to a@x.com. Also anything c@z.io wrote");
        assert_eq!(i.to, vec!["a@x.com"]);
        assert_eq!(i.from, vec!["c@z.io"]);
    }

    #[test]
    fn test_bare_names_never_populate() {
        assert!(intent("emails from John about the budget").is_empty());
    }

    #[test]
    fn test_subject_requires_address() {
        let i = intent(r#"emails from john@acme.com with subject "Q3 Planning""#);
        assert_eq!(i.subject, vec!["Q3 Planning"]);

        let i = intent("emails titled 'Q3 Planning'");
        assert!(i.is_empty());
    }
}
