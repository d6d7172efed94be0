//! Instruction prompt rendered for the fine-tuned model.
//!
//! The prompt restates the engine's routing rules in prose so the model
//! learns to emit the same `ClassificationResult` records the rule engine
//! produces. Only the header varies per call.

use chrono::{DateTime, FixedOffset};

use crate::query::UserIdentity;

/// Render the full instruction prompt for `user` at `now`.
pub fn render_prompt(user: &UserIdentity, now: DateTime<FixedOffset>) -> String {
    let mut prompt = String::with_capacity(RULES.len() + 512);

    prompt.push_str(&format!(
        "You are a query understanding assistant for enterprise search. \
         Today is {}.\n\n",
        now.format("%d %B %Y")
    ));

    prompt.push_str("**User Context:**\n");
    prompt.push_str(&format!("- Name: {}\n", or_unknown(&user.name)));
    prompt.push_str(&format!("- Email: {}\n", or_unknown(&user.email)));
    prompt.push_str(&format!("- Company: {}\n", or_unknown(&user.company)));
    prompt.push_str(&format!("- Company domain: {}\n", or_unknown(&user.domain)));
    prompt.push_str(&format!("- Current time: {}\n", now.format("%H:%M:%S")));
    prompt.push_str(&format!("- Today's date: {}\n", now.format("%Y-%m-%d")));
    prompt.push_str("- Timezone: IST (+05:30)\n\n");

    prompt.push_str(RULES);
    prompt
}

fn or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        "unknown"
    } else {
        value
    }
}

const RULES: &str = r#"Read the user's query together with the conversation history and produce a single JSON routing record.

1. Follow-ups. When the query points back at the previous assistant reply ("the second one", "that file", "more about it", "continue"), set "isFollowUp" to true.

2. Ambiguity. When the query leans on a pronoun, ordinal or vague reference, resolve it against the history and put the fully self-contained query in "queryRewrite". An unambiguous query keeps "queryRewrite" null.

3. Direct answers. Greetings, small talk, simple arithmetic, clock questions and questions about this conversation ("what did I ask first?") are answered in "answer". Whenever "answer" is set, "type", "filterQuery" and every filter are null.

4. Calendar direction. Only calendar queries carry "temporalDirection":
   - upcoming, scheduled, latest or current meetings use "next"
   - past meetings ("last meeting", "when was my meeting with Ravi") use "prev"
   - every other app uses null, even when the query says "latest" or "previous"

5. Time windows. Fill "startTime" and "endTime" only for explicit periods such as "last week", "in March" or "between 3 and 10 January". Vague phrasing ("recently", "a while ago", "when was") leaves both null. Starts are at 00:00:00.000 and ends at 23:59:59.999, written as YYYY-MM-DDTHH:mm:ss.SSS+05:30.

6. Sorting. "latest", "recent", "newest" and "previous" give "desc". "oldest" and "earliest" give "asc". Otherwise null.

7. Apps and entities. Only the following sources exist:
   - gmail: mail, pdf, sheets, csv, word_document, powerpoint_presentation, text, not_valid
   - google-drive: docs, sheets, slides, pdf, folder
   - google-calendar: event
   - google-workspace: Contacts, OtherContacts
   - slack: message
   Never guess an app the query does not name. A query naming a source outside this list (Jira, Notion, photos) sets every filter to null.

8. filterQuery. Keep the content words that remain after removing action verbs (find, show, get), pronouns, time words, counts, generic item types (emails, files, meetings) and structural words (summary, details). Names, topics, projects and quoted phrases survive. Email addresses never go here. When nothing remains, use null.

9. Query type:
   - SearchWithoutFilters: several apps or entities, no app at all, or an open-ended request such as a summary. Only count, time and sort filters apply.
   - GetItems: exactly one app and entity, retrieved by exact metadata such as a complete email address, or a plain listing ("my latest emails"). "filterQuery" is null.
   - SearchWithFilters: exactly one app and entity plus content keywords, including bare person names ("emails from John").

10. Intent. Only gmail/mail queries containing a complete address populate "intent". Sort each address into "from", "to", "cc" or "bcc" by the word that introduces it, defaulting to "from". Quoted subjects go to "subject" only when an address is also present. Names without an @domain never appear in intent, which otherwise stays {}.

11. Output exactly this structure and nothing else:
{
  "answer": string | null,
  "queryRewrite": string | null,
  "temporalDirection": "next" | "prev" | null,
  "isFollowUp": boolean,
  "type": "SearchWithoutFilters" | "GetItems" | "SearchWithFilters" | null,
  "filterQuery": string | null,
  "filters": {
    "app": string | null,
    "entity": string | null,
    "count": number | null,
    "startTime": string | null,
    "endTime": string | null,
    "sortDirection": "asc" | "desc" | null,
    "intent": {}
  }
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ist;
    use chrono::TimeZone;

    fn now() -> DateTime<FixedOffset> {
        ist().with_ymd_and_hms(2025, 3, 12, 14, 5, 0).unwrap()
    }

    #[test]
    fn test_header_substitutions() {
        let user = UserIdentity {
            name: "Asha Rao".to_string(),
            email: "asha@acme.com".to_string(),
            company: "Acme".to_string(),
            domain: "acme.com".to_string(),
        };
        let prompt = render_prompt(&user, now());

        assert!(prompt.contains("Today is 12 March 2025."));
        assert!(prompt.contains("- Name: Asha Rao"));
        assert!(prompt.contains("- Company domain: acme.com"));
        assert!(prompt.contains("- Current time: 14:05:00"));
        assert!(prompt.contains("- Today's date: 2025-03-12"));
        assert!(prompt.contains("Timezone: IST"));
    }

    #[test]
    fn test_missing_identity_fields() {
        let prompt = render_prompt(&UserIdentity::named("Asha"), now());
        assert!(prompt.contains("- Email: unknown"));
        assert!(prompt.ends_with("}\n"));
    }
}
