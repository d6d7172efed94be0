//! Temporal reasoning for queries.
//!
//! Two questions are answered here:
//! - For calendar queries, is the user after the *next* or the *previous*
//!   event?
//! - Does the query carry a literal, resolvable time window ("last 3 days",
//!   "2024-01-15", "between Jan 3 and Jan 9")? Vague phrases such as
//!   "last meeting" or "recent" never produce a window.
//!
//! Windows are inclusive whole days: the start is `00:00:00.000` of the
//! first day and the end is `23:59:59.999` of the last day, rendered with
//! the fixed `+05:30` offset.

use std::ops::Range;
use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Days, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use regex::{Captures, Regex};

use super::types::{ist, TemporalDirection};
use super::vocabulary::number_word;

// ============================================================================
// Types
// ============================================================================

/// An inclusive time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Window covering whole days `first..=last`.
    pub fn days(first: NaiveDate, last: NaiveDate) -> Self {
        let (first, last) = if first <= last {
            (first, last)
        } else {
            (last, first)
        };
        Self {
            start: first.and_time(NaiveTime::default()),
            end: last.and_time(end_of_day()),
        }
    }

    /// Window covering a single day.
    pub fn day(date: NaiveDate) -> Self {
        Self::days(date, date)
    }

    /// Start as `YYYY-MM-DDTHH:mm:ss.SSS+05:30`.
    pub fn start_time(&self) -> String {
        format_ist(self.start)
    }

    /// End as `YYYY-MM-DDTHH:mm:ss.SSS+05:30`.
    pub fn end_time(&self) -> String {
        format_ist(self.end)
    }

    /// Start as local `YYYY-MM-DDTHH:MM:SS`, no offset.
    pub fn start_local(&self) -> String {
        self.start.format(LOCAL_FORMAT).to_string()
    }

    /// End as local `YYYY-MM-DDTHH:MM:SS`, no offset.
    pub fn end_local(&self) -> String {
        self.end.format(LOCAL_FORMAT).to_string()
    }
}

/// Outcome of temporal analysis for one query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemporalOutcome {
    /// Set only for calendar queries
    pub direction: Option<TemporalDirection>,
    pub window: Option<TimeWindow>,
}

const LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

fn end_of_day() -> NaiveTime {
    NaiveTime::default() + Duration::milliseconds(86_399_999)
}

/// Render a local datetime with millisecond precision and the `+05:30` offset.
pub fn format_ist(dt: NaiveDateTime) -> String {
    format!("{}{}", dt.format("%Y-%m-%dT%H:%M:%S%.3f"), ist())
}

// ============================================================================
// Temporal Reasoner
// ============================================================================

/// Resolves direction and windows relative to a fixed "now".
pub struct TemporalReasoner {
    now: DateTime<FixedOffset>,
}

impl TemporalReasoner {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self {
            now: now.with_timezone(&ist()),
        }
    }

    /// Reasoner anchored at local midnight of `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        let local = date.and_time(NaiveTime::default());
        let now = match local.and_local_timezone(ist()).single() {
            Some(dt) => dt,
            None => local.and_utc().with_timezone(&ist()),
        };
        Self { now }
    }

    fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }

    /// Full analysis. `is_calendar` gates the direction.
    pub fn analyze(&self, text: &str, is_calendar: bool) -> TemporalOutcome {
        let window = self.resolve_window(text);
        let direction = is_calendar.then(|| self.direction(text, window.as_ref()));
        TemporalOutcome { direction, window }
    }

    /// Lookup direction for a calendar query.
    ///
    /// The earliest directional cue decides. Without a cue, a window that
    /// ended before now points backwards; everything else points forwards.
    pub fn direction(&self, text: &str, window: Option<&TimeWindow>) -> TemporalDirection {
        let next = NEXT_CUE_PATTERN.find(text).map(|m| m.start());
        let prev = PREV_CUE_PATTERN.find(text).map(|m| m.start());

        match (next, prev) {
            (Some(n), Some(p)) if p < n => TemporalDirection::Prev,
            (Some(_), _) => TemporalDirection::Next,
            (None, Some(_)) => TemporalDirection::Prev,
            (None, None) => match window {
                Some(w) if w.end < self.now.naive_local() => TemporalDirection::Prev,
                _ => TemporalDirection::Next,
            },
        }
    }

    /// Resolve a literal window, if the query states one.
    ///
    /// Precedence: an explicit two-date range, then "since <date>", then a
    /// single absolute date, then the earliest relative period.
    pub fn resolve_window(&self, text: &str) -> Option<TimeWindow> {
        let dates = self.absolute_dates(text);

        for pair in dates.windows(2) {
            let (first, second) = (&pair[0], &pair[1]);
            let between = &text[first.span.end..second.span.start];
            if RANGE_JOINER_PATTERN.is_match(between) {
                return Some(TimeWindow::days(first.window.start.date(), second.window.end.date()));
            }
        }

        if let Some(first) = dates.first() {
            let before = &text[..first.span.start];
            if SINCE_PATTERN.is_match(before) {
                return Some(TimeWindow::days(first.window.start.date(), self.today()));
            }
            return Some(first.window);
        }

        self.relative_periods(text)
            .into_iter()
            .min_by_key(|m| m.span.start)
            .map(|m| m.window)
    }

    fn absolute_dates(&self, text: &str) -> Vec<WindowMatch> {
        let mut found = Vec::new();

        for cap in ISO_DATE_PATTERN.captures_iter(text) {
            if let Some(date) = ymd(&cap[1], &cap[2], &cap[3]) {
                found.push(WindowMatch::new(&cap, TimeWindow::day(date)));
            }
        }

        for cap in MONTH_DAY_PATTERN.captures_iter(text) {
            if let Some(date) = self.month_day(&cap[1], &cap[2], cap.get(3).map(|m| m.as_str())) {
                found.push(WindowMatch::new(&cap, TimeWindow::day(date)));
            }
        }

        for cap in DAY_MONTH_PATTERN.captures_iter(text) {
            if let Some(date) = self.month_day(&cap[2], &cap[1], cap.get(3).map(|m| m.as_str())) {
                found.push(WindowMatch::new(&cap, TimeWindow::day(date)));
            }
        }

        for cap in WHOLE_MONTH_PATTERN.captures_iter(text) {
            let month = month_number(&cap[1]);
            let year = cap
                .get(2)
                .and_then(|m| m.as_str().parse().ok())
                .unwrap_or(self.today().year());
            if let Some(first) = month.and_then(|m| NaiveDate::from_ymd_opt(year, m, 1)) {
                found.push(WindowMatch::new(
                    &cap,
                    TimeWindow::days(first, last_day_of_month(first)),
                ));
            }
        }

        found.sort_by_key(|m| (m.span.start, std::cmp::Reverse(m.span.end)));
        remove_overlaps(&mut found);
        found
    }

    fn month_day(&self, month: &str, day: &str, year: Option<&str>) -> Option<NaiveDate> {
        let month = month_number(month)?;
        let day: u32 = day.parse().ok()?;
        let year = match year {
            Some(y) => y.parse().ok()?,
            None => self.today().year(),
        };
        NaiveDate::from_ymd_opt(year, month, day)
    }

    fn relative_periods(&self, text: &str) -> Vec<WindowMatch> {
        let today = self.today();
        let mut found = Vec::new();

        for cap in DAY_WORD_PATTERN.captures_iter(text) {
            let word = cap[1].to_lowercase();
            let word: String = word.split_whitespace().collect::<Vec<_>>().join(" ");
            let offset = match word.as_str() {
                "yesterday" => -1,
                "tomorrow" => 1,
                "day after tomorrow" => 2,
                "day before yesterday" => -2,
                _ => 0,
            };
            let date = today + Duration::days(offset);
            found.push(WindowMatch::new(&cap, TimeWindow::day(date)));
        }

        for cap in COUNTED_PERIOD_PATTERN.captures_iter(text) {
            let direction = cap[1].to_lowercase();
            let Some(n) = count_of(&cap[2]) else {
                continue;
            };
            let unit = cap[3].to_lowercase();
            let forward = matches!(direction.as_str(), "next" | "coming");
            if let Some(window) = self.counted_window(today, n, &unit, forward) {
                found.push(WindowMatch::new(&cap, window));
            }
        }

        for cap in AGO_PATTERN.captures_iter(text) {
            let Some(n) = count_of(&cap[1]) else {
                continue;
            };
            let unit = cap[2].to_lowercase();
            let window = match unit.as_str() {
                "day" => shift_days(today, -n).map(TimeWindow::day),
                "week" => n
                    .checked_mul(7)
                    .and_then(|days| shift_days(today, -days))
                    .and_then(|start| Some(TimeWindow::days(start, shift_days(start, 6)?))),
                "month" => month_count(n)
                    .and_then(|months| add_months(today, -months))
                    .map(|d| {
                        let first = first_of_month(d);
                        TimeWindow::days(first, last_day_of_month(first))
                    }),
                _ => None,
            };
            if let Some(window) = window {
                found.push(WindowMatch::new(&cap, window));
            }
        }

        for cap in NAMED_PERIOD_PATTERN.captures_iter(text) {
            let which = cap[1].to_lowercase();
            let unit = cap[2].to_lowercase();
            if let Some(window) = self.named_period(today, &which, &unit) {
                found.push(WindowMatch::new(&cap, window));
            }
        }

        for cap in WEEKDAY_PATTERN.captures_iter(text) {
            let which = cap[1].to_lowercase();
            let Some(target) = weekday_index(&cap[2]) else {
                continue;
            };
            let current = today.weekday().num_days_from_monday() as i64;
            let date = match which.as_str() {
                "next" => {
                    let ahead = (target - current).rem_euclid(7);
                    today + Duration::days(if ahead == 0 { 7 } else { ahead })
                }
                "last" | "previous" => {
                    let back = (current - target).rem_euclid(7);
                    today - Duration::days(if back == 0 { 7 } else { back })
                }
                _ => today + Duration::days(target - current),
            };
            found.push(WindowMatch::new(&cap, TimeWindow::day(date)));
        }

        found
    }

    fn counted_window(
        &self,
        today: NaiveDate,
        n: i64,
        unit: &str,
        forward: bool,
    ) -> Option<TimeWindow> {
        let sign = if forward { 1 } else { -1 };
        let other_end = match unit {
            "day" => shift_days(today, sign * n)?,
            "week" => shift_days(today, sign * n.checked_mul(7)?)?,
            "month" => add_months(today, sign as i32 * month_count(n)?)?,
            "year" => add_months(today, sign as i32 * month_count(n)?.checked_mul(12)?)?,
            _ => return None,
        };
        Some(TimeWindow::days(today, other_end))
    }

    fn named_period(&self, today: NaiveDate, which: &str, unit: &str) -> Option<TimeWindow> {
        match (which, unit) {
            ("last" | "past", "week") => Some(TimeWindow::days(today - Duration::days(7), today)),
            ("previous", "week") => {
                let monday = start_of_week(today) - Duration::days(7);
                Some(TimeWindow::days(monday, monday + Duration::days(6)))
            }
            ("this" | "current", "week") => {
                let monday = start_of_week(today);
                Some(TimeWindow::days(monday, monday + Duration::days(6)))
            }
            ("next", "week") => Some(TimeWindow::days(
                today + Duration::days(1),
                today + Duration::days(7),
            )),
            ("past", "month") => Some(TimeWindow::days(add_months(today, -1)?, today)),
            ("last" | "previous", "month") => calendar_month(add_months(today, -1)?),
            ("this" | "current", "month") => calendar_month(today),
            ("next", "month") => calendar_month(add_months(today, 1)?),
            ("past", "quarter") => Some(TimeWindow::days(add_months(today, -3)?, today)),
            ("last" | "previous", "quarter") => calendar_quarter(add_months(today, -3)?),
            ("this" | "current", "quarter") => calendar_quarter(today),
            ("next", "quarter") => calendar_quarter(add_months(today, 3)?),
            ("past", "year") => Some(TimeWindow::days(add_months(today, -12)?, today)),
            ("last" | "previous", "year") => calendar_year(today.year() - 1),
            ("this" | "current", "year") => calendar_year(today.year()),
            ("next", "year") => calendar_year(today.year() + 1),
            _ => None,
        }
    }
}

/// Byte spans of every temporal phrase in `text`, vague ones included.
/// Used to keep time expressions out of content keywords.
pub fn temporal_spans(text: &str) -> Vec<Range<usize>> {
    let patterns: [&Regex; 10] = [
        &ISO_DATE_PATTERN,
        &MONTH_DAY_PATTERN,
        &DAY_MONTH_PATTERN,
        &WHOLE_MONTH_PATTERN,
        &DAY_WORD_PATTERN,
        &COUNTED_PERIOD_PATTERN,
        &AGO_PATTERN,
        &NAMED_PERIOD_PATTERN,
        &WEEKDAY_PATTERN,
        &VAGUE_TIME_PATTERN,
    ];
    let mut spans: Vec<Range<usize>> = patterns
        .iter()
        .flat_map(|p| p.find_iter(text).map(|m| m.range()))
        .collect();
    spans.sort_by_key(|r| r.start);
    spans
}

// ============================================================================
// Helpers
// ============================================================================

struct WindowMatch {
    span: Range<usize>,
    window: TimeWindow,
}

impl WindowMatch {
    fn new(cap: &Captures<'_>, window: TimeWindow) -> Self {
        let span = cap.get(0).map(|m| m.range()).unwrap_or(0..0);
        Self { span, window }
    }
}

/// Drop matches that overlap an earlier (and, at equal start, longer) one.
fn remove_overlaps(matches: &mut Vec<WindowMatch>) {
    let mut last_end = 0;
    matches.retain(|m| {
        if m.span.start < last_end {
            false
        } else {
            last_end = m.span.end;
            true
        }
    });
}

fn ymd(y: &str, m: &str, d: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

fn count_of(text: &str) -> Option<i64> {
    let normalized = text.to_lowercase().replace(" of", "");
    number_word(normalized.trim()).map(i64::from)
}

fn month_number(name: &str) -> Option<u32> {
    let prefix: String = name.to_lowercase().chars().take(3).collect();
    let n = match prefix.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}

fn weekday_index(name: &str) -> Option<i64> {
    let prefix: String = name.to_lowercase().chars().take(3).collect();
    let n = match prefix.as_str() {
        "mon" => 0,
        "tue" => 1,
        "wed" => 2,
        "thu" => 3,
        "fri" => 4,
        "sat" => 5,
        "sun" => 6,
        _ => return None,
    };
    Some(n)
}

fn start_of_week(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let first = first_of_month(date);
    add_months(first, 1)
        .map(|next| next - Duration::days(1))
        .unwrap_or(first)
}

fn calendar_month(date: NaiveDate) -> Option<TimeWindow> {
    let first = first_of_month(date);
    Some(TimeWindow::days(first, last_day_of_month(first)))
}

fn calendar_quarter(date: NaiveDate) -> Option<TimeWindow> {
    let first_month = (date.month0() / 3) * 3 + 1;
    let first = NaiveDate::from_ymd_opt(date.year(), first_month, 1)?;
    let last = last_day_of_month(add_months(first, 2)?);
    Some(TimeWindow::days(first, last))
}

fn calendar_year(year: i32) -> Option<TimeWindow> {
    Some(TimeWindow::days(
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

/// Shift by whole months, clamping the day to the target month's length.
/// `date` moved by `days`, or `None` outside the representable range.
fn shift_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    let magnitude = Days::new(days.unsigned_abs());
    if days < 0 {
        date.checked_sub_days(magnitude)
    } else {
        date.checked_add_days(magnitude)
    }
}

fn month_count(n: i64) -> Option<i32> {
    i32::try_from(n).ok()
}

fn add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let total_months = (date.year() * 12 + date.month() as i32 - 1).checked_add(months)?;
    let year = total_months.div_euclid(12);
    let month = (total_months.rem_euclid(12) + 1) as u32;

    NaiveDate::from_ymd_opt(year, month, date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, month, 30))
        .or_else(|| NaiveDate::from_ymd_opt(year, month, 29))
        .or_else(|| NaiveDate::from_ymd_opt(year, month, 28))
}

// ============================================================================
// Regex Patterns
// ============================================================================

const MONTHS: &str = r"january|february|march|april|may|june|july|august|september|october|november|december|jan|feb|mar|apr|jun|jul|aug|sept|sep|oct|nov|dec";
const NUMBER: &str = r"\d+|a|an|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|fifteen|twenty|thirty|couple\s+of";

static ISO_DATE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{4})-(\d{1,2})-(\d{1,2})\b").expect("Invalid regex"));

static MONTH_DAY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s*(\d{{4}})\b)?"
    ))
    .expect("Invalid regex")
});

static DAY_MONTH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({MONTHS})\b\.?(?:,?\s*(\d{{4}})\b)?"
    ))
    .expect("Invalid regex")
});

static WHOLE_MONTH_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:in|during|for|of)\s+({MONTHS})\b(?:\s+(\d{{4}})\b)?"
    ))
    .expect("Invalid regex")
});

static RANGE_JOINER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:to|and|until|till|through|thru|-|–)\s*$").expect("Invalid regex")
});

static SINCE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:since|after)\s*$").expect("Invalid regex"));

static DAY_WORD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(day\s+after\s+tomorrow|day\s+before\s+yesterday|today|tonight|yesterday|tomorrow|this\s+morning|this\s+afternoon|this\s+evening)\b",
    )
    .expect("Invalid regex")
});

static COUNTED_PERIOD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(last|past|previous|next|coming)\s+({NUMBER})\s+(day|week|month|year)s?\b"
    ))
    .expect("Invalid regex")
});

static AGO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({NUMBER})\s+(day|week|month)s?\s+ago\b"))
        .expect("Invalid regex")
});

static NAMED_PERIOD_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(last|past|previous|this|current|next)\s+(week|month|quarter|year)\b")
        .expect("Invalid regex")
});

static WEEKDAY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(last|previous|this|next|on)\s+(monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    )
    .expect("Invalid regex")
});

static VAGUE_TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:recently|recent|latest|newest|oldest|earliest|lately|right\s+now|so\s+far)\b")
        .expect("Invalid regex")
});

static NEXT_CUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:next|upcoming|coming\s+up|scheduled|latest|current|currently|now|today|tonight|tomorrow|later|soon|future|will)\b",
    )
    .expect("Invalid regex")
});

static PREV_CUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:last|previous|past|recent|recently|earlier|yesterday|ago|when\s+was|when\s+were|when\s+did|did\s+i|did\s+we|did\s+you|happened|attended)\b",
    )
    .expect("Invalid regex")
});

#[cfg(test)]
mod tests {
    use super::*;

    // Wednesday.
    fn reasoner() -> TemporalReasoner {
        TemporalReasoner::at_date(NaiveDate::from_ymd_opt(2025, 3, 12).unwrap())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format() {
        let w = TimeWindow::day(date(2025, 3, 12));
        assert_eq!(w.start_time(), "2025-03-12T00:00:00.000+05:30");
        assert_eq!(w.end_time(), "2025-03-12T23:59:59.999+05:30");
        assert_eq!(w.start_local(), "2025-03-12T00:00:00");
        assert_eq!(w.end_local(), "2025-03-12T23:59:59");
    }

    #[test]
    fn test_direction_cues() {
        let r = reasoner();
        let dir = |q| r.analyze(q, true).direction;
        assert_eq!(dir("when is my next meeting"), Some(TemporalDirection::Next));
        assert_eq!(dir("show my latest meeting"), Some(TemporalDirection::Next));
        assert_eq!(dir("current meetings"), Some(TemporalDirection::Next));
        assert_eq!(dir("scheduled meetings"), Some(TemporalDirection::Next));
        assert_eq!(dir("my last meeting"), Some(TemporalDirection::Prev));
        assert_eq!(
            dir("when was my meeting with John"),
            Some(TemporalDirection::Prev)
        );
        assert_eq!(dir("previous meetings"), Some(TemporalDirection::Prev));
        assert_eq!(dir("meetings with Priya"), Some(TemporalDirection::Next));
    }

    #[test]
    fn test_non_calendar_has_no_direction() {
        let outcome = reasoner().analyze("my latest emails", false);
        assert_eq!(outcome.direction, None);
    }

    #[test]
    fn test_vague_phrases_have_no_window() {
        let r = reasoner();
        assert_eq!(r.resolve_window("my last meeting"), None);
        assert_eq!(r.resolve_window("recent files"), None);
        assert_eq!(r.resolve_window("latest emails from John"), None);
        assert_eq!(r.resolve_window("previous meetings"), None);
    }

    #[test]
    fn test_relative_days() {
        let r = reasoner();
        assert_eq!(r.resolve_window("emails from today"), Some(TimeWindow::day(date(2025, 3, 12))));
        assert_eq!(r.resolve_window("meetings yesterday"), Some(TimeWindow::day(date(2025, 3, 11))));
        assert_eq!(
            r.resolve_window("files from the past 3 days"),
            Some(TimeWindow::days(date(2025, 3, 9), date(2025, 3, 12)))
        );
        assert_eq!(
            r.resolve_window("meetings in the next two weeks"),
            Some(TimeWindow::days(date(2025, 3, 12), date(2025, 3, 26)))
        );
        assert_eq!(
            r.resolve_window("report from 3 weeks ago"),
            Some(TimeWindow::days(date(2025, 2, 19), date(2025, 2, 25)))
        );
    }

    #[test]
    fn test_oversized_counts_have_no_window() {
        let r = reasoner();
        assert_eq!(r.resolve_window("meetings in the last 100000000 days"), None);
        assert_eq!(r.resolve_window("emails from 4000000000 days ago"), None);
        assert_eq!(r.resolve_window("files from 99999999 weeks ago"), None);
        assert_eq!(r.resolve_window("the next 2147483648 months"), None);

        // Largest accepted count still resolves
        assert_eq!(
            r.resolve_window("files from the past 9999 days"),
            Some(TimeWindow::days(date(1997, 10, 26), date(2025, 3, 12)))
        );
        assert!(r.resolve_window("notes from the last 9999 years").is_some());
    }

    #[test]
    fn test_named_periods() {
        let r = reasoner();
        assert_eq!(
            r.resolve_window("emails from the last week"),
            Some(TimeWindow::days(date(2025, 3, 5), date(2025, 3, 12)))
        );
        assert_eq!(
            r.resolve_window("meetings from last month"),
            Some(TimeWindow::days(date(2025, 2, 1), date(2025, 2, 28)))
        );
        assert_eq!(
            r.resolve_window("next week"),
            Some(TimeWindow::days(date(2025, 3, 13), date(2025, 3, 19)))
        );
        assert_eq!(
            r.resolve_window("this week"),
            Some(TimeWindow::days(date(2025, 3, 10), date(2025, 3, 16)))
        );
        assert_eq!(
            r.resolve_window("last quarter"),
            Some(TimeWindow::days(date(2024, 10, 1), date(2024, 12, 31)))
        );
    }

    #[test]
    fn test_absolute_dates_and_ranges() {
        let r = reasoner();
        assert_eq!(
            r.resolve_window("meetings on 2025-01-15"),
            Some(TimeWindow::day(date(2025, 1, 15)))
        );
        assert_eq!(
            r.resolve_window("emails between January 3 and January 9, 2025"),
            Some(TimeWindow::days(date(2025, 1, 3), date(2025, 1, 9)))
        );
        assert_eq!(
            r.resolve_window("files from 2024-12-01 to 2024-12-31"),
            Some(TimeWindow::days(date(2024, 12, 1), date(2024, 12, 31)))
        );
        assert_eq!(
            r.resolve_window("invoices since 1st March"),
            Some(TimeWindow::days(date(2025, 3, 1), date(2025, 3, 12)))
        );
        assert_eq!(
            r.resolve_window("reports in February 2024"),
            Some(TimeWindow::days(date(2024, 2, 1), date(2024, 2, 29)))
        );
    }

    #[test]
    fn test_weekdays() {
        let r = reasoner();
        assert_eq!(r.resolve_window("last friday"), Some(TimeWindow::day(date(2025, 3, 7))));
        assert_eq!(r.resolve_window("next monday"), Some(TimeWindow::day(date(2025, 3, 17))));
        assert_eq!(r.resolve_window("on thursday"), Some(TimeWindow::day(date(2025, 3, 13))));
    }

    #[test]
    fn test_window_direction_without_cue() {
        let r = reasoner();
        let outcome = r.analyze("meetings on 2025-01-15", true);
        assert_eq!(outcome.direction, Some(TemporalDirection::Prev));
        let outcome = r.analyze("meetings on 2025-04-02", true);
        assert_eq!(outcome.direction, Some(TemporalDirection::Next));
    }

    #[test]
    fn test_temporal_spans_cover_phrases() {
        let text = "latest emails from last week about budget";
        let spans = temporal_spans(text);
        let covered: Vec<&str> = spans.iter().map(|r| &text[r.clone()]).collect();
        assert!(covered.contains(&"latest"));
        assert!(covered.contains(&"last week"));
        assert!(!covered.iter().any(|s| s.contains("budget")));
    }
}
