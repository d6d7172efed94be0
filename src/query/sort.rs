//! Sort direction inference.

use super::types::SortDirection;
use super::vocabulary::{in_set, Word, SORT_ASC_WORDS, SORT_DESC_WORDS};

/// Infer result ordering from recency words. The first cue wins.
pub fn infer_sort_direction(words: &[Word<'_>]) -> Option<SortDirection> {
    words.iter().find_map(|w| {
        if in_set(&SORT_DESC_WORDS, w) {
            Some(SortDirection::Desc)
        } else if in_set(&SORT_ASC_WORDS, w) {
            Some(SortDirection::Asc)
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::vocabulary::words;

    fn sort_of(q: &str) -> Option<SortDirection> {
        infer_sort_direction(&words(q))
    }

    #[test]
    fn test_desc_cues() {
        assert_eq!(sort_of("Give me my latest emails"), Some(SortDirection::Desc));
        assert_eq!(sort_of("Recent spreadsheets"), Some(SortDirection::Desc));
        assert_eq!(sort_of("previous emails"), Some(SortDirection::Desc));
        assert_eq!(sort_of("current meetings"), Some(SortDirection::Desc));
    }

    #[test]
    fn test_asc_cues() {
        assert_eq!(sort_of("Show me my oldest files in Drive"), Some(SortDirection::Asc));
        assert_eq!(
            sort_of("Earliest meetings with marketing team"),
            Some(SortDirection::Asc)
        );
    }

    #[test]
    fn test_no_cue() {
        assert_eq!(sort_of("Documents from last month"), None);
        assert_eq!(sort_of("Find my budget documents"), None);
    }
}
