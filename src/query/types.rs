//! Types for the query understanding engine.

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Conversation
// ============================================================================

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A single recorded turn of the surrounding chat session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered conversation turns, most recent last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationHistory {
    turns: Vec<ConversationTurn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Builder-style push.
    pub fn with_turn(mut self, turn: ConversationTurn) -> Self {
        self.turns.push(turn);
        self
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// The most recent assistant turn.
    pub fn last_assistant(&self) -> Option<&ConversationTurn> {
        self.turns.iter().rev().find(|t| t.role == Role::Assistant)
    }

    /// Assistant turns, most recent first.
    pub fn assistant_turns_rev(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter().rev().filter(|t| t.role == Role::Assistant)
    }

    /// User turns in conversation order.
    pub fn user_turns(&self) -> impl Iterator<Item = &ConversationTurn> {
        self.turns.iter().filter(|t| t.role == Role::User)
    }

    pub fn last_user(&self) -> Option<&ConversationTurn> {
        self.turns.iter().rev().find(|t| t.role == Role::User)
    }

    pub fn first_user(&self) -> Option<&ConversationTurn> {
        self.user_turns().next()
    }
}

impl From<Vec<ConversationTurn>> for ConversationHistory {
    fn from(turns: Vec<ConversationTurn>) -> Self {
        Self { turns }
    }
}

// ============================================================================
// Current Context
// ============================================================================

/// Fixed UTC offset every timestamp is expressed in (+05:30).
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// The fixed `+05:30` offset.
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Identity of the user issuing the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub name: String,
    pub email: String,
    pub company: String,
    pub domain: String,
}

impl UserIdentity {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// First name for greetings, if one is known.
    pub fn first_name(&self) -> Option<&str> {
        self.name
            .split_whitespace()
            .next()
            .filter(|n| !n.eq_ignore_ascii_case("user"))
    }
}

/// Per-call context: who is asking and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentContext {
    pub user: UserIdentity,
    now: DateTime<FixedOffset>,
}

impl CurrentContext {
    /// Build a context; the timestamp is normalized to `+05:30`.
    pub fn new<Tz: TimeZone>(user: UserIdentity, now: DateTime<Tz>) -> Self {
        Self {
            user,
            now: now.with_timezone(&ist()),
        }
    }

    /// Context stamped with the current wall-clock time.
    pub fn now(user: UserIdentity) -> Self {
        Self::new(user, Utc::now())
    }

    pub fn timestamp(&self) -> DateTime<FixedOffset> {
        self.now
    }
}

// ============================================================================
// Classification Enums
// ============================================================================

/// Direction of a calendar lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemporalDirection {
    Next,
    Prev,
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

/// Structural routing outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryType {
    /// Open-ended search; only time/sort/count filters apply
    SearchWithoutFilters,
    /// Precise metadata retrieval from one app/entity
    GetItems,
    /// Content search scoped to one app/entity
    SearchWithFilters,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchWithoutFilters => "SearchWithoutFilters",
            Self::GetItems => "GetItems",
            Self::SearchWithFilters => "SearchWithFilters",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported source applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum App {
    Gmail,
    GoogleCalendar,
    GoogleDrive,
    GoogleWorkspace,
    Slack,
}

impl App {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gmail => "gmail",
            Self::GoogleCalendar => "google-calendar",
            Self::GoogleDrive => "google-drive",
            Self::GoogleWorkspace => "google-workspace",
            Self::Slack => "slack",
        }
    }

    /// Entity assumed when the query names the app but no entity type.
    pub fn default_entity(&self) -> Option<Entity> {
        match self {
            Self::Gmail => Some(Entity::Mail),
            Self::GoogleCalendar => Some(Entity::Event),
            Self::GoogleWorkspace => Some(Entity::Contacts),
            Self::Slack => Some(Entity::Message),
            Self::GoogleDrive => None,
        }
    }
}

impl std::fmt::Display for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entity types within an app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    #[serde(rename = "mail")]
    Mail,
    #[serde(rename = "pdf")]
    Pdf,
    #[serde(rename = "sheets")]
    Sheets,
    #[serde(rename = "csv")]
    Csv,
    #[serde(rename = "word_document")]
    WordDocument,
    #[serde(rename = "powerpoint_presentation")]
    PowerpointPresentation,
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "not_valid")]
    NotValid,
    #[serde(rename = "docs")]
    Docs,
    #[serde(rename = "slides")]
    Slides,
    #[serde(rename = "folder")]
    Folder,
    #[serde(rename = "event")]
    Event,
    #[serde(rename = "Contacts")]
    Contacts,
    #[serde(rename = "OtherContacts")]
    OtherContacts,
    #[serde(rename = "message")]
    Message,
}

impl Entity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mail => "mail",
            Self::Pdf => "pdf",
            Self::Sheets => "sheets",
            Self::Csv => "csv",
            Self::WordDocument => "word_document",
            Self::PowerpointPresentation => "powerpoint_presentation",
            Self::Text => "text",
            Self::NotValid => "not_valid",
            Self::Docs => "docs",
            Self::Slides => "slides",
            Self::Folder => "folder",
            Self::Event => "event",
            Self::Contacts => "Contacts",
            Self::OtherContacts => "OtherContacts",
            Self::Message => "message",
        }
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Exact-match metadata for gmail/mail lookups. Empty arrays are omitted,
/// so an empty intent serializes as `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailIntent {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub from: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bcc: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subject: Vec<String>,
}

impl MailIntent {
    pub fn is_empty(&self) -> bool {
        self.addresses().next().is_none() && self.subject.is_empty()
    }

    /// Whether any address field is populated.
    pub fn has_address(&self) -> bool {
        self.addresses().next().is_some()
    }

    /// Every extracted address, in from/to/cc/bcc order.
    pub fn addresses(&self) -> impl Iterator<Item = &String> {
        self.from
            .iter()
            .chain(self.to.iter())
            .chain(self.cc.iter())
            .chain(self.bcc.iter())
    }
}

/// Routing filters. Every field is always serialized (null when unset).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Filters {
    pub app: Option<App>,
    pub entity: Option<Entity>,
    pub count: Option<u32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub sort_direction: Option<SortDirection>,
    pub intent: MailIntent,
}

impl Filters {
    /// True when nothing at all is set.
    pub fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Classification Result
// ============================================================================

/// The structured search directive produced for every query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassificationResult {
    /// Direct reply for conversational and meta queries
    pub answer: Option<String>,
    /// Fully resolved restatement of an ambiguous query
    pub query_rewrite: Option<String>,
    /// Calendar lookup direction
    pub temporal_direction: Option<TemporalDirection>,
    /// Whether the query refers to the previous assistant response
    pub is_follow_up: bool,
    /// Routing outcome (null when answered directly)
    #[serde(rename = "type")]
    pub query_type: Option<QueryType>,
    /// Residual content keywords
    pub filter_query: Option<String>,
    pub filters: Filters,
}

impl ClassificationResult {
    /// A direct conversational answer with all routing cleared.
    pub fn answered(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
            ..Default::default()
        }
    }

    pub fn with_follow_up(mut self, is_follow_up: bool) -> Self {
        self.is_follow_up = is_follow_up;
        self
    }

    pub fn with_rewrite(mut self, rewrite: Option<String>) -> Self {
        self.query_rewrite = rewrite;
        self
    }

    /// Parse a model generation into a result.
    ///
    /// Generations often wrap the record in prose or code fences, so the
    /// outermost `{ ... }` span is extracted before parsing.
    pub fn parse_model_output(text: &str) -> std::result::Result<Self, serde_json::Error> {
        let body = match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if start < end => &text[start..=end],
            _ => text,
        };
        serde_json::from_str(body)
    }
}
