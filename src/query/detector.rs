//! App/entity detection against the fixed vocabulary.

use std::ops::Range;

use super::types::{App, Entity};
use super::vocabulary::{
    AppCue, CueMatch, Word, APP_CUES, DRIVE_ENTITY_CUES, GMAIL_ENTITY_CUES, UNSUPPORTED_CUES,
    WORKSPACE_ENTITY_CUES,
};

/// Outcome of app/entity detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorOutcome {
    /// No app cue at all
    None,
    /// Exactly one app and at most one entity
    Single { app: App, entity: Option<Entity> },
    /// More than one app, or more than one entity within the app
    Multiple,
    /// A source or entity type outside the vocabulary
    Unsupported,
}

impl DetectorOutcome {
    pub fn is_single(&self) -> bool {
        matches!(self, Self::Single { .. })
    }

    pub fn app(&self) -> Option<App> {
        match self {
            Self::Single { app, .. } => Some(*app),
            _ => None,
        }
    }

    pub fn entity(&self) -> Option<Entity> {
        match self {
            Self::Single { entity, .. } => *entity,
            _ => None,
        }
    }
}

/// Detector outcome plus the byte spans of unsupported cues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub outcome: DetectorOutcome,
    pub unsupported_spans: Vec<Range<usize>>,
}

/// Resolve at most one primary app and entity from `words`.
pub fn detect(words: &[Word<'_>]) -> Detection {
    let unsupported = UNSUPPORTED_CUES.matches(words);
    if !unsupported.is_empty() {
        let unsupported_spans = unsupported.iter().map(|m| span_of(words, m)).collect();
        return Detection {
            outcome: DetectorOutcome::Unsupported,
            unsupported_spans,
        };
    }

    let gmail_entities = GMAIL_ENTITY_CUES.matches(words);
    let outcome = match resolve_app(words, &gmail_entities) {
        AppResolution::None if has_not_valid(&gmail_entities) => DetectorOutcome::Unsupported,
        AppResolution::None => DetectorOutcome::None,
        AppResolution::Multiple => DetectorOutcome::Multiple,
        AppResolution::Single(App::Gmail) => resolve_entity(App::Gmail, &gmail_entities),
        AppResolution::Single(_) if has_not_valid(&gmail_entities) => DetectorOutcome::Unsupported,
        AppResolution::Single(app) => {
            let entities = match app {
                App::GoogleDrive => DRIVE_ENTITY_CUES.matches(words),
                App::GoogleWorkspace => WORKSPACE_ENTITY_CUES.matches(words),
                _ => Vec::new(),
            };
            resolve_entity(app, &entities)
        }
    };

    tracing::trace!(outcome = ?outcome, "App/entity detection");

    Detection {
        outcome,
        unsupported_spans: Vec::new(),
    }
}

enum AppResolution {
    None,
    Single(App),
    Multiple,
}

fn resolve_app(words: &[Word<'_>], gmail_entities: &[CueMatch<Entity>]) -> AppResolution {
    let cues = APP_CUES.matches(words);
    let explicit: Vec<(App, &CueMatch<AppCue>)> = cues
        .iter()
        .filter_map(|m| match m.value {
            AppCue::App(app) => Some((app, m)),
            AppCue::MessageOnly => None,
        })
        .collect();
    let has_gmail = explicit.iter().any(|(app, _)| *app == App::Gmail);

    let mut apps: Vec<App> = Vec::new();
    for (app, cue) in &explicit {
        // Attachment types named alongside a mail cue belong to gmail.
        if has_gmail && *app == App::GoogleDrive && covered_by(cue, gmail_entities) {
            continue;
        }
        if !apps.contains(app) {
            apps.push(*app);
        }
    }

    let has_message = cues.iter().any(|m| m.value == AppCue::MessageOnly);
    if has_message {
        let app = if has_gmail { App::Gmail } else { App::Slack };
        if !apps.contains(&app) {
            apps.push(app);
        }
    }

    match apps.as_slice() {
        [] => AppResolution::None,
        [app] => AppResolution::Single(*app),
        _ => AppResolution::Multiple,
    }
}

fn resolve_entity(app: App, matches: &[CueMatch<Entity>]) -> DetectorOutcome {
    let mut entities: Vec<Entity> = Vec::new();
    for m in matches {
        if !entities.contains(&m.value) {
            entities.push(m.value);
        }
    }

    match entities.as_slice() {
        [] => DetectorOutcome::Single {
            app,
            entity: app.default_entity(),
        },
        [entity] => DetectorOutcome::Single {
            app,
            entity: Some(*entity),
        },
        _ => DetectorOutcome::Multiple,
    }
}

fn has_not_valid(matches: &[CueMatch<Entity>]) -> bool {
    matches.iter().any(|m| m.value == Entity::NotValid)
}

fn covered_by<T, U>(cue: &CueMatch<T>, matches: &[CueMatch<U>]) -> bool {
    matches
        .iter()
        .any(|m| cue.word_index >= m.word_index && cue.word_index < m.word_index + m.len)
}

fn span_of<T>(words: &[Word<'_>], m: &CueMatch<T>) -> Range<usize> {
    let start = words[m.word_index].start;
    let end = words[m.word_index + m.len - 1].end;
    start..end
}
