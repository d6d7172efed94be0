//! Conversational intents answered directly instead of routed to search.
//!
//! Covers small talk, closed-form calculations, clock questions and
//! questions about the conversation itself.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Timelike};
use regex::Regex;

use super::calculator;
use super::types::{ConversationHistory, CurrentContext};

// ============================================================================
// Time of Day
// ============================================================================

/// Time of day for greeting personalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOfDay {
    Morning,   // 5-12
    Afternoon, // 12-17
    Evening,   // 17-21
    Night,     // 21-5
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            5..=11 => Self::Morning,
            12..=16 => Self::Afternoon,
            17..=20 => Self::Evening,
            _ => Self::Night,
        }
    }

    pub fn greeting_prefix(&self) -> &'static str {
        match self {
            Self::Morning => "Good morning",
            Self::Afternoon => "Good afternoon",
            Self::Evening => "Good evening",
            Self::Night => "Hello",
        }
    }
}

// ============================================================================
// Conversational Handler
// ============================================================================

/// Kind of conversational intent that produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationalKind {
    Greeting,
    Gratitude,
    Farewell,
    Acknowledgement,
    Identity,
    Calculation,
    Clock,
    Meta,
}

/// A direct answer and the intent it answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationalReply {
    pub kind: ConversationalKind,
    pub answer: String,
}

impl ConversationalReply {
    fn new(kind: ConversationalKind, answer: impl Into<String>) -> Self {
        Self {
            kind,
            answer: answer.into(),
        }
    }
}

/// Detects conversational queries and answers them.
pub struct ConversationalHandler {
    assistant_name: String,
    /// Vocative naming the assistant at either end of the query
    address: Option<Regex>,
}

impl ConversationalHandler {
    pub fn new(assistant_name: impl Into<String>) -> Self {
        let assistant_name = assistant_name.into();
        let address = (!assistant_name.trim().is_empty())
            .then(|| {
                let name = regex::escape(assistant_name.trim());
                Regex::new(&format!(r"(?i)^\s*{name}[,\s]+|[,\s]+{name}\W*$")).ok()
            })
            .flatten();
        Self {
            assistant_name,
            address,
        }
    }

    /// Answer `text` directly, or `None` when it should be routed.
    pub fn respond(
        &self,
        text: &str,
        history: &ConversationHistory,
        ctx: &CurrentContext,
    ) -> Option<ConversationalReply> {
        let text = self.strip_address(text);

        self.meta(&text, history)
            .or_else(|| self.clock(&text, ctx.timestamp()))
            .or_else(|| {
                calculator::detect(&text)
                    .map(|c| ConversationalReply::new(ConversationalKind::Calculation, c.answer()))
            })
            .or_else(|| self.small_talk(&text, ctx))
    }

    /// Drop a leading or trailing vocative naming the assistant.
    fn strip_address(&self, text: &str) -> String {
        match &self.address {
            Some(re) => re.replace_all(text, " ").trim().to_string(),
            None => text.trim().to_string(),
        }
    }

    fn small_talk(&self, text: &str, ctx: &CurrentContext) -> Option<ConversationalReply> {
        let salutation = || {
            let prefix = TimeOfDay::from_hour(ctx.timestamp().hour()).greeting_prefix();
            match ctx.user.first_name() {
                Some(name) => format!("{prefix}, {name}!"),
                None => format!("{prefix}!"),
            }
        };

        if let Some(cap) = GREETING_PATTERN.captures(text) {
            let asked_wellbeing = cap.name("wellbeing").or(cap.name("wellbeing2")).is_some();
            let answer = if asked_wellbeing {
                format!(
                    "{} I'm doing well, thanks for asking. How can I help you today?",
                    salutation()
                )
            } else {
                format!("{} How can I help you today?", salutation())
            };
            return Some(ConversationalReply::new(ConversationalKind::Greeting, answer));
        }

        if GRATITUDE_PATTERN.is_match(text) {
            let answer = match ctx.user.first_name() {
                Some(name) => format!("You're welcome, {name}! Anything else I can find for you?"),
                None => "You're welcome! Anything else I can find for you?".to_string(),
            };
            return Some(ConversationalReply::new(ConversationalKind::Gratitude, answer));
        }

        if FAREWELL_PATTERN.is_match(text) {
            let answer = match ctx.user.first_name() {
                Some(name) => format!("Goodbye, {name}! Have a great day."),
                None => "Goodbye! Have a great day.".to_string(),
            };
            return Some(ConversationalReply::new(ConversationalKind::Farewell, answer));
        }

        if ACKNOWLEDGEMENT_PATTERN.is_match(text) {
            return Some(ConversationalReply::new(
                ConversationalKind::Acknowledgement,
                "Great! Let me know if you need anything else.",
            ));
        }

        if IDENTITY_PATTERN.is_match(text) {
            let answer = format!(
                "I'm {}, your workplace search assistant. I can find your emails, meetings, files, contacts and Slack messages.",
                self.assistant_name
            );
            return Some(ConversationalReply::new(ConversationalKind::Identity, answer));
        }

        None
    }

    fn clock(&self, text: &str, now: DateTime<FixedOffset>) -> Option<ConversationalReply> {
        if let Some(cap) = TIME_PATTERN.captures(text) {
            let answer = match cap.get(1).map(|m| m.as_str().trim()) {
                Some(place) => match zone_offset(place) {
                    Some((label, offset)) => {
                        let there = now.with_timezone(&offset);
                        format!(
                            "It's {} in {} (UTC{}).",
                            there.format("%-I:%M %p"),
                            label,
                            offset
                        )
                    }
                    None => format!(
                        "I don't have a fixed time zone for {}. Here it's {} IST.",
                        place,
                        now.format("%-I:%M %p")
                    ),
                },
                None => format!("It's {} IST.", now.format("%-I:%M %p")),
            };
            return Some(ConversationalReply::new(ConversationalKind::Clock, answer));
        }

        if DATE_PATTERN.is_match(text) {
            let answer = format!("Today is {}.", now.format("%A, %d %B %Y"));
            return Some(ConversationalReply::new(ConversationalKind::Clock, answer));
        }

        None
    }

    fn meta(&self, text: &str, history: &ConversationHistory) -> Option<ConversationalReply> {
        let reply = |answer: String| Some(ConversationalReply::new(ConversationalKind::Meta, answer));

        if LAST_QUESTION_PATTERN.is_match(text) {
            return reply(match history.last_user() {
                Some(turn) => format!("You asked: \"{}\"", turn.content.trim()),
                None => "You haven't asked me anything yet in this conversation.".to_string(),
            });
        }

        if FIRST_QUESTION_PATTERN.is_match(text) {
            return reply(match history.first_user() {
                Some(turn) => format!("Your first question was: \"{}\"", turn.content.trim()),
                None => "You haven't asked me anything yet in this conversation.".to_string(),
            });
        }

        if LAST_ANSWER_PATTERN.is_match(text) {
            return reply(match history.last_assistant() {
                Some(turn) => format!("I said: \"{}\"", turn.content.trim()),
                None => "I haven't said anything yet in this conversation.".to_string(),
            });
        }

        if CONVERSATION_RECAP_PATTERN.is_match(text) {
            let asked: Vec<String> = history
                .user_turns()
                .map(|t| format!("\"{}\"", t.content.trim()))
                .collect();
            return reply(if asked.is_empty() {
                "We haven't talked about anything yet.".to_string()
            } else {
                format!(
                    "So far you've asked me {} question{}: {}.",
                    asked.len(),
                    if asked.len() == 1 { "" } else { "s" },
                    asked.join("; ")
                )
            });
        }

        None
    }
}

impl Default for ConversationalHandler {
    fn default() -> Self {
        Self::new("Scout")
    }
}

/// Fixed offsets for places without daylight saving.
fn zone_offset(place: &str) -> Option<(&'static str, FixedOffset)> {
    let place = place.to_lowercase();
    let place = place.trim_start_matches("the ");
    let (label, hours, minutes) = match place {
        "japan" | "tokyo" | "jst" => ("Japan", 9, 0),
        "korea" | "south korea" | "seoul" | "kst" => ("South Korea", 9, 0),
        "india" | "ist" | "mumbai" | "delhi" | "new delhi" | "bangalore" | "bengaluru"
        | "kolkata" | "chennai" | "hyderabad" | "pune" => ("India", 5, 30),
        "sri lanka" | "colombo" => ("Sri Lanka", 5, 30),
        "nepal" | "kathmandu" => ("Nepal", 5, 45),
        "pakistan" | "karachi" | "lahore" => ("Pakistan", 5, 0),
        "bangladesh" | "dhaka" => ("Bangladesh", 6, 0),
        "thailand" | "bangkok" => ("Thailand", 7, 0),
        "vietnam" | "hanoi" | "ho chi minh city" => ("Vietnam", 7, 0),
        "indonesia" | "jakarta" => ("Jakarta", 7, 0),
        "singapore" | "sgt" => ("Singapore", 8, 0),
        "china" | "beijing" | "shanghai" | "shenzhen" => ("China", 8, 0),
        "hong kong" => ("Hong Kong", 8, 0),
        "taiwan" | "taipei" => ("Taiwan", 8, 0),
        "philippines" | "manila" => ("Philippines", 8, 0),
        "malaysia" | "kuala lumpur" => ("Malaysia", 8, 0),
        "dubai" | "uae" | "abu dhabi" | "united arab emirates" => ("Dubai", 4, 0),
        "saudi arabia" | "riyadh" => ("Saudi Arabia", 3, 0),
        "qatar" | "doha" => ("Qatar", 3, 0),
        "kenya" | "nairobi" => ("Kenya", 3, 0),
        "nigeria" | "lagos" => ("Nigeria", 1, 0),
        "utc" | "gmt" | "iceland" | "reykjavik" => ("UTC", 0, 0),
        _ => return None,
    };
    FixedOffset::east_opt(hours * 3600 + minutes * 60).map(|offset| (label, offset))
}

// ============================================================================
// Regex Patterns
// ============================================================================

const WELLBEING: &str = r"how\s+are\s+you(?:\s+doing)?(?:\s+today)?|how\s+are\s+things|how's\s+it\s+going|how\s+is\s+it\s+going|how\s+have\s+you\s+been|what's\s+up|whats\s+up|sup";
const SALUTATION: &str = r"hi|hello|hey|hiya|howdy|greetings|yo|good\s+(?:morning|afternoon|evening|day)";

static GREETING_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^\s*(?:(?:{SALUTATION})(?:\s+(?:there|all|team|everyone))?(?:[\s,!.]+(?P<wellbeing>{WELLBEING}))?|(?P<wellbeing2>{WELLBEING}))[\s?!.]*$"
    ))
    .expect("Invalid regex")
});

static GRATITUDE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:ok(?:ay)?[,\s]+)?(?:thanks|thank\s+you|thx|ty|cheers|much\s+appreciated|appreciate\s+it)(?:\s+(?:so\s+much|a\s+lot|very\s+much|again))?[\s!.]*$",
    )
    .expect("Invalid regex")
});

static FAREWELL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:bye|goodbye|bye\s+bye|see\s+you(?:\s+later|\s+soon|\s+tomorrow)?|see\s+ya|good\s*night|talk\s+to\s+you\s+later|ttyl|later)[\s!.]*$",
    )
    .expect("Invalid regex")
});

static ACKNOWLEDGEMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:ok|okay|cool|great|nice|awesome|got\s+it|sounds\s+good|perfect|alright|all\s+right)[\s!.]*$",
    )
    .expect("Invalid regex")
});

static IDENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:who\s+are\s+you|what\s+are\s+you|what\s+can\s+you\s+do|what's\s+your\s+name|what\s+is\s+your\s+name|introduce\s+yourself|how\s+can\s+you\s+help(?:\s+me)?)[\s?!.]*$",
    )
    .expect("Invalid regex")
});

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:what(?:'s|\s+is)\s+the\s+(?:current\s+)?time|what\s+time\s+is\s+it|current\s+time|time\s+now|tell\s+me\s+the\s+time)(?:\s+(?:now|right\s+now))?(?:\s+in\s+([a-z][a-z .]*?))?(?:\s+(?:now|right\s+now))?\s*[?.!]*\s*$",
    )
    .expect("Invalid regex")
});

static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:what(?:'s|\s+is)\s+(?:today's|todays|the|the\s+current)\s+date(?:\s+today)?|what(?:'s|\s+is)\s+today(?:'s\s+date)?|what\s+day\s+is\s+(?:it|today)(?:\s+today)?|today's\s+date|what\s+date\s+is\s+it(?:\s+today)?)\s*[?.!]*\s*$",
    )
    .expect("Invalid regex")
});

static LAST_QUESTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:what\s+did\s+i\s+(?:just\s+)?ask(?:\s+you)?(?:\s+(?:before|earlier|last))?|what\s+was\s+my\s+(?:last|previous)\s+(?:question|query)|what\s+was\s+i\s+asking(?:\s+about)?)\s*[?.!]*\s*$",
    )
    .expect("Invalid regex")
});

static FIRST_QUESTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:what\s+was\s+my\s+first\s+(?:question|query)|what\s+did\s+i\s+(?:ask|say)\s+first)\s*[?.!]*\s*$",
    )
    .expect("Invalid regex")
});

static LAST_ANSWER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:what\s+did\s+you\s+(?:just\s+)?say|what\s+was\s+your\s+(?:last\s+)?(?:answer|reply|response))\s*[?.!]*\s*$",
    )
    .expect("Invalid regex")
});

static CONVERSATION_RECAP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^\s*(?:(?:summarize|summarise|recap)\s+(?:our|this|the)\s+(?:conversation|chat|discussion)(?:\s+so\s+far)?|what\s+have\s+we\s+(?:talked|been\s+talking)\s+about(?:\s+so\s+far)?|what\s+did\s+we\s+(?:talk|discuss)\s+(?:about)?(?:\s+so\s+far)?)\s*[?.!]*\s*$",
    )
    .expect("Invalid regex")
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::types::{ConversationTurn, UserIdentity};
    use chrono::TimeZone;

    fn ctx_at(hour: u32) -> CurrentContext {
        let now = crate::query::types::ist()
            .with_ymd_and_hms(2025, 3, 12, hour, 15, 0)
            .unwrap();
        CurrentContext::new(UserIdentity::named("Asha Rao"), now)
    }

    fn answer(q: &str, history: &ConversationHistory, hour: u32) -> Option<String> {
        ConversationalHandler::default()
            .respond(q, history, &ctx_at(hour))
            .map(|r| r.answer)
    }

    #[test]
    fn test_greeting_uses_time_and_name() {
        let empty = ConversationHistory::new();
        let a = answer("Hi there, how are you?", &empty, 9).unwrap();
        assert!(a.starts_with("Good morning, Asha!"));
        assert!(a.contains("doing well"));

        let a = answer("hello", &empty, 15).unwrap();
        assert_eq!(a, "Good afternoon, Asha! How can I help you today?");

        let a = answer("hey Scout", &empty, 23).unwrap();
        assert!(a.starts_with("Hello, Asha!"));
    }

    #[test]
    fn test_greeting_without_known_name() {
        let ctx = CurrentContext::new(UserIdentity::named("User"), ctx_at(18).timestamp());
        let reply = ConversationalHandler::default()
            .respond("hi", &ConversationHistory::new(), &ctx)
            .unwrap();
        assert_eq!(reply.answer, "Good evening! How can I help you today?");
    }

    #[test]
    fn test_small_talk_variants() {
        let empty = ConversationHistory::new();
        assert!(answer("thanks!", &empty, 10).unwrap().starts_with("You're welcome"));
        assert!(answer("bye", &empty, 10).unwrap().starts_with("Goodbye"));
        assert!(answer("who are you?", &empty, 10).unwrap().contains("Scout"));
    }

    #[test]
    fn test_search_queries_are_not_conversational() {
        let empty = ConversationHistory::new();
        assert!(answer("hi, find emails from John", &empty, 10).is_none());
        assert!(answer("show my latest meetings", &empty, 10).is_none());
        assert!(answer("what is the status of the Acme deal", &empty, 10).is_none());
    }

    #[test]
    fn test_clock_questions() {
        let empty = ConversationHistory::new();
        assert_eq!(answer("what time is it?", &empty, 14).unwrap(), "It's 2:15 PM IST.");
        assert_eq!(
            answer("what is the time in Japan", &empty, 14).unwrap(),
            "It's 5:45 PM in Japan (UTC+09:00)."
        );
        assert_eq!(
            answer("what is today's date?", &empty, 14).unwrap(),
            "Today is Wednesday, 12 March 2025."
        );
    }

    #[test]
    fn test_calculation() {
        let empty = ConversationHistory::new();
        assert_eq!(answer("what is 12 * (3 + 4)", &empty, 10).unwrap(), "12 * (3 + 4) = 84");
    }

    #[test]
    fn test_meta_questions() {
        let history = ConversationHistory::new()
            .with_turn(ConversationTurn::user("find the Q3 budget"))
            .with_turn(ConversationTurn::assistant("Here is Q3 Budget.xlsx."))
            .with_turn(ConversationTurn::user("who sent it?"))
            .with_turn(ConversationTurn::assistant("Ravi sent it."));

        assert_eq!(
            answer("what did I just ask?", &history, 10).unwrap(),
            "You asked: \"who sent it?\""
        );
        assert_eq!(
            answer("What was my first question?", &history, 10).unwrap(),
            "Your first question was: \"find the Q3 budget\""
        );
        assert!(answer("summarize our conversation", &history, 10)
            .unwrap()
            .contains("2 questions"));
        assert_eq!(
            answer("what did I just ask?", &ConversationHistory::new(), 10).unwrap(),
            "You haven't asked me anything yet in this conversation."
        );
    }
}
