//! Static lexical tables shared by the query components.
//!
//! Every table is built once per process behind a `LazyLock` and only read
//! afterwards, so the engine can be shared across threads freely.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::types::{App, Entity};

// ============================================================================
// Tokenization
// ============================================================================

/// A word of the query with its byte span in the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word<'a> {
    /// Original text (casing preserved, trailing punctuation trimmed)
    pub text: &'a str,
    /// Lowercased form used for table lookups
    pub lower: String,
    pub start: usize,
    pub end: usize,
}

impl Word<'_> {
    /// Whether the word looks like an email address.
    pub fn is_email(&self) -> bool {
        EMAIL_PATTERN.is_match(self.text)
    }

    /// Lowercased form without a possessive `'s`.
    pub fn stem(&self) -> &str {
        self.lower
            .strip_suffix("'s")
            .or_else(|| self.lower.strip_suffix("’s"))
            .unwrap_or(&self.lower)
    }
}

/// Split text into words. Email addresses and contractions stay whole.
pub fn words(text: &str) -> Vec<Word<'_>> {
    WORD_PATTERN
        .find_iter(text)
        .filter_map(|m| {
            let trimmed =
                m.as_str()
                    .trim_end_matches(|c: char| matches!(c, '.' | '\'' | '’' | '-' | '_' | '@'));
            if trimmed.is_empty() {
                return None;
            }
            Some(Word {
                text: trimmed,
                lower: trimmed.to_lowercase(),
                start: m.start(),
                end: m.start() + trimmed.len(),
            })
        })
        .collect()
}

/// Whether `word` is in `set`, ignoring a possessive suffix.
pub fn in_set(set: &HashSet<&'static str>, word: &Word<'_>) -> bool {
    set.contains(word.lower.as_str()) || set.contains(word.stem())
}

static WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{L}\p{N}][\p{L}\p{N}'’@._%+\-]*").expect("Invalid regex")
});

/// `local@domain.tld` shape.
pub static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
        .expect("Invalid regex")
});

// ============================================================================
// Cue Tables
// ============================================================================

/// A cue phrase found in the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueMatch<T> {
    pub value: T,
    /// Index of the first matched word
    pub word_index: usize,
    /// Number of words matched
    pub len: usize,
}

/// Multi-word phrase lookup, longest match first.
pub struct CueTable<T> {
    entries: Vec<(Vec<&'static str>, T)>,
    max_len: usize,
}

impl<T: Copy> CueTable<T> {
    pub fn new(cues: &[(&'static str, T)]) -> Self {
        let entries: Vec<(Vec<&'static str>, T)> = cues
            .iter()
            .map(|(phrase, value)| (phrase.split_whitespace().collect(), *value))
            .collect();
        let max_len = entries.iter().map(|(p, _)| p.len()).max().unwrap_or(0);
        Self { entries, max_len }
    }

    /// Scan `words` left to right, taking the longest cue at each position.
    pub fn matches(&self, words: &[Word<'_>]) -> Vec<CueMatch<T>> {
        let mut found = Vec::new();
        let mut i = 0;
        while i < words.len() {
            match self.longest_at(words, i) {
                Some((value, len)) => {
                    found.push(CueMatch {
                        value,
                        word_index: i,
                        len,
                    });
                    i += len;
                }
                None => i += 1,
            }
        }
        found
    }

    fn longest_at(&self, words: &[Word<'_>], i: usize) -> Option<(T, usize)> {
        let mut best: Option<(T, usize)> = None;
        for (phrase, value) in &self.entries {
            let len = phrase.len();
            if len > self.max_len || i + len > words.len() {
                continue;
            }
            if best.is_some_and(|(_, l)| l >= len) {
                continue;
            }
            let hit = phrase
                .iter()
                .zip(&words[i..i + len])
                .all(|(p, w)| *p == w.lower || *p == w.stem());
            if hit {
                best = Some((*value, len));
            }
        }
        best
    }
}

/// App a cue points to. `MessageOnly` marks the bare word "message", which
/// names Slack unless a Gmail cue is also present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCue {
    App(App),
    MessageOnly,
}

pub static APP_CUES: LazyLock<CueTable<AppCue>> = LazyLock::new(|| {
    use App::*;
    CueTable::new(&[
        ("gmail", AppCue::App(Gmail)),
        ("email", AppCue::App(Gmail)),
        ("emails", AppCue::App(Gmail)),
        ("e-mail", AppCue::App(Gmail)),
        ("e-mails", AppCue::App(Gmail)),
        ("mail", AppCue::App(Gmail)),
        ("mails", AppCue::App(Gmail)),
        ("inbox", AppCue::App(Gmail)),
        ("attachment", AppCue::App(Gmail)),
        ("attachments", AppCue::App(Gmail)),
        ("calendar", AppCue::App(GoogleCalendar)),
        ("google calendar", AppCue::App(GoogleCalendar)),
        ("meeting", AppCue::App(GoogleCalendar)),
        ("meetings", AppCue::App(GoogleCalendar)),
        ("event", AppCue::App(GoogleCalendar)),
        ("events", AppCue::App(GoogleCalendar)),
        ("schedule", AppCue::App(GoogleCalendar)),
        ("appointment", AppCue::App(GoogleCalendar)),
        ("appointments", AppCue::App(GoogleCalendar)),
        ("invite", AppCue::App(GoogleCalendar)),
        ("invites", AppCue::App(GoogleCalendar)),
        ("drive", AppCue::App(GoogleDrive)),
        ("google drive", AppCue::App(GoogleDrive)),
        ("file", AppCue::App(GoogleDrive)),
        ("files", AppCue::App(GoogleDrive)),
        ("document", AppCue::App(GoogleDrive)),
        ("documents", AppCue::App(GoogleDrive)),
        ("doc", AppCue::App(GoogleDrive)),
        ("docs", AppCue::App(GoogleDrive)),
        ("folder", AppCue::App(GoogleDrive)),
        ("folders", AppCue::App(GoogleDrive)),
        ("spreadsheet", AppCue::App(GoogleDrive)),
        ("spreadsheets", AppCue::App(GoogleDrive)),
        ("presentation", AppCue::App(GoogleDrive)),
        ("presentations", AppCue::App(GoogleDrive)),
        ("slides", AppCue::App(GoogleDrive)),
        ("slide deck", AppCue::App(GoogleDrive)),
        ("contact", AppCue::App(GoogleWorkspace)),
        ("contacts", AppCue::App(GoogleWorkspace)),
        ("people", AppCue::App(GoogleWorkspace)),
        ("address book", AppCue::App(GoogleWorkspace)),
        ("other contacts", AppCue::App(GoogleWorkspace)),
        ("slack", AppCue::App(Slack)),
        ("slack message", AppCue::App(Slack)),
        ("slack messages", AppCue::App(Slack)),
        ("text message", AppCue::App(Slack)),
        ("text messages", AppCue::App(Slack)),
        ("dm", AppCue::App(Slack)),
        ("dms", AppCue::App(Slack)),
        ("direct message", AppCue::App(Slack)),
        ("direct messages", AppCue::App(Slack)),
        ("channel", AppCue::App(Slack)),
        ("channels", AppCue::App(Slack)),
        ("message", AppCue::MessageOnly),
        ("messages", AppCue::MessageOnly),
    ])
});

/// Gmail attachment-type cues. Mail is the default when none is named.
pub static GMAIL_ENTITY_CUES: LazyLock<CueTable<Entity>> = LazyLock::new(|| {
    use Entity::*;
    CueTable::new(&[
        ("pdf", Pdf),
        ("pdfs", Pdf),
        ("sheet", Sheets),
        ("sheets", Sheets),
        ("spreadsheet", Sheets),
        ("spreadsheets", Sheets),
        ("excel", Sheets),
        ("csv", Csv),
        ("csvs", Csv),
        ("word document", WordDocument),
        ("word documents", WordDocument),
        ("word doc", WordDocument),
        ("docx", WordDocument),
        ("powerpoint", PowerpointPresentation),
        ("powerpoint presentation", PowerpointPresentation),
        ("ppt", PowerpointPresentation),
        ("pptx", PowerpointPresentation),
        ("text file", Text),
        ("text files", Text),
        ("txt", Text),
        ("image", NotValid),
        ("images", NotValid),
        ("photo", NotValid),
        ("photos", NotValid),
        ("video", NotValid),
        ("videos", NotValid),
        ("zip", NotValid),
    ])
});

pub static DRIVE_ENTITY_CUES: LazyLock<CueTable<Entity>> = LazyLock::new(|| {
    use Entity::*;
    CueTable::new(&[
        ("document", Docs),
        ("documents", Docs),
        ("doc", Docs),
        ("docs", Docs),
        ("google doc", Docs),
        ("google docs", Docs),
        ("spreadsheet", Sheets),
        ("spreadsheets", Sheets),
        ("sheet", Sheets),
        ("sheets", Sheets),
        ("presentation", Slides),
        ("presentations", Slides),
        ("slide", Slides),
        ("slides", Slides),
        ("slide deck", Slides),
        ("pdf", Pdf),
        ("pdfs", Pdf),
        ("folder", Folder),
        ("folders", Folder),
    ])
});

pub static WORKSPACE_ENTITY_CUES: LazyLock<CueTable<Entity>> = LazyLock::new(|| {
    use Entity::*;
    CueTable::new(&[
        ("contact", Contacts),
        ("contacts", Contacts),
        ("person", Contacts),
        ("people", Contacts),
        ("address book", Contacts),
        ("other contacts", OtherContacts),
    ])
});

/// Sources and entity types outside the supported vocabulary.
pub static UNSUPPORTED_CUES: LazyLock<CueTable<()>> = LazyLock::new(|| {
    CueTable::new(&[
        ("jira", ()),
        ("confluence", ()),
        ("notion", ()),
        ("github", ()),
        ("gitlab", ()),
        ("bitbucket", ()),
        ("pull request", ()),
        ("pull requests", ()),
        ("dropbox", ()),
        ("onedrive", ()),
        ("sharepoint", ()),
        ("outlook", ()),
        ("microsoft teams", ()),
        ("teams chat", ()),
        ("teams message", ()),
        ("teams messages", ()),
        ("whatsapp", ()),
        ("telegram", ()),
        ("discord", ()),
        ("trello", ()),
        ("asana", ()),
        ("salesforce", ()),
        ("hubspot", ()),
        ("zendesk", ()),
        ("zoom recording", ()),
        ("zoom recordings", ()),
        ("tweet", ()),
        ("tweets", ()),
        ("ticket", ()),
        ("tickets", ()),
    ])
});

// ============================================================================
// Word Classes
// ============================================================================

fn set(words: &[&'static str]) -> HashSet<&'static str> {
    words.iter().copied().collect()
}

/// Sort cues: newest first.
pub static SORT_DESC_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "latest", "recent", "recently", "newest", "current", "previous",
    ])
});

/// Sort cues: oldest first.
pub static SORT_ASC_WORDS: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| set(&["oldest", "earliest"]));

pub static GENERIC_ACTION_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "find", "show", "get", "search", "give", "list", "fetch", "pull", "display", "look",
        "lookup", "see", "open", "bring", "retrieve", "check", "tell", "need", "want", "locate",
        "grab", "view", "read", "help", "sent", "send", "received", "receive", "shared", "share",
        "created", "made", "written", "wrote", "happening", "happened", "scheduled", "had",
        "have", "has", "got", "going", "go", "am", "let", "lets", "let's",
    ])
});

pub static PRONOUN_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "i", "me", "my", "mine", "myself", "we", "us", "our", "ours", "you", "your", "yours",
        "he", "him", "his", "she", "her", "hers", "they", "them", "their", "theirs", "it", "its",
        "this", "that", "these", "those", "i'm", "i've", "i'd",
    ])
});

pub static TIME_RELATIVE_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "recent", "recently", "latest", "last", "newest", "oldest", "earliest", "old", "new",
        "current", "currently", "previous", "past", "upcoming", "next", "today", "tonight",
        "yesterday", "tomorrow", "now", "day", "days", "week", "weeks", "weekend", "month",
        "months", "year", "years", "ago", "before", "after", "since", "until", "later", "soon",
        "earlier", "morning", "afternoon", "evening", "when", "monday", "tuesday", "wednesday",
        "thursday", "friday", "saturday", "sunday", "future",
    ])
});

pub static QUANTITY_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "all", "some", "few", "most", "many", "any", "every", "each", "several", "top", "first",
        "more", "less", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine",
        "ten", "dozen", "couple", "single", "only",
    ])
});

pub static STRUCTURAL_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "summary", "summaries", "summarize", "details", "detail", "info", "information",
        "content", "contents", "items", "item", "things", "thing", "stuff", "data", "related",
        "overview", "subject", "title", "titled", "named", "called", "list", "results",
    ])
});

pub static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "the", "a", "an", "of", "in", "on", "at", "to", "for", "from", "with", "by", "and", "or",
        "about", "regarding", "concerning", "is", "are", "was", "were", "be", "been", "being",
        "do", "did", "does", "what", "what's", "whats", "where", "which", "who", "whom", "whose",
        "how", "can", "could", "would", "should", "will", "shall", "may", "might", "must",
        "please", "there", "up", "into", "than", "then", "cc", "bcc", "cc'd", "bcc'd", "contains",
        "containing", "between", "during", "within", "as", "if", "so", "but", "not", "no", "via",
        "just", "also", "any", "out", "over", "under", "kindly", "hey", "where's", "when's",
        "who's", "whether", "like", "mentioning", "mention", "mentions", "involving", "around",
        "anything", "something", "everything", "yet", "still", "again", "ever", "really", "very",
        "too", "much", "here", "i'd",
    ])
});

/// Words that are app or entity cues (generic item types).
pub static ITEM_TYPE_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    set(&[
        "gmail", "email", "emails", "e-mail", "e-mails", "mail", "mails", "inbox", "attachment",
        "attachments", "calendar", "google", "meeting", "meetings", "event", "events", "schedule",
        "appointment", "appointments", "invite", "invites", "drive", "file", "files", "document",
        "documents", "doc", "docs", "folder", "folders", "spreadsheet", "spreadsheets", "sheet",
        "sheets", "presentation", "presentations", "slide", "slides", "deck", "pdf", "pdfs",
        "csv", "csvs", "docx", "ppt", "pptx", "txt", "excel", "powerpoint", "contact",
        "contacts", "people", "person", "address", "book", "slack", "message", "messages", "dm",
        "dms", "direct", "channel", "channels", "text", "thread", "threads", "chat", "chats",
        "orders", "order", "notes",
    ])
});

/// Largest numeral accepted as a count or period length.
pub const MAX_NUMBER: u32 = 9999;

/// Textual numbers accepted for counts and period lengths.
pub fn number_word(word: &str) -> Option<u32> {
    let n = match word {
        "a" | "an" | "one" => 1,
        "two" | "couple" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" | "dozen" => 12,
        "fifteen" => 15,
        "twenty" => 20,
        "thirty" => 30,
        _ => return word.parse().ok().filter(|n| *n <= MAX_NUMBER),
    };
    Some(n)
}
