//! Deterministic scene construction for recap videos.
//!
//! A scene is a flat list of timed text cards: an opening card, one card per
//! entry in chronological order, a statistics card, and a closing card. The
//! build is a pure function of the entries and the year, so the same journal
//! always renders the same video.

use crate::models::JournalEntry;
use chrono::Datelike;

/// Display time for each card, in seconds.
pub const SECS_PER_CARD: f64 = 3.0;

/// Longest excerpt drawn on an entry card, in characters.
const EXCERPT_CHARS: usize = 60;

/// One timed text overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TextCard {
    /// Large line.
    pub heading: String,
    /// Smaller line under the heading. May be empty.
    pub body: String,
    /// Seconds from the start of the video.
    pub start: f64,
    /// Seconds the card stays on screen.
    pub duration: f64,
}

/// A fully laid out recap scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSpec {
    /// Calendar year the recap covers.
    pub year: i32,
    /// Cards in display order, each starting when the previous ends.
    pub cards: Vec<TextCard>,
}

impl SceneSpec {
    /// Builds the scene for one year.
    ///
    /// Entries outside the year are ignored. Entries inside it appear in
    /// chronological order, with the entry id breaking timestamp ties. The
    /// statistics card names the longest and shortest entry by content
    /// byte length; when lengths tie, the earlier entry keeps the title.
    #[must_use]
    pub fn build(year: i32, entries: &[JournalEntry]) -> Self {
        let mut selected: Vec<&JournalEntry> = entries
            .iter()
            .filter(|e| e.created_at.year() == year)
            .collect();
        selected.sort_by_key(|e| (e.created_at, e.id.value()));

        let mut cards = Vec::new();
        if selected.is_empty() {
            push_card(
                &mut cards,
                format!("Daybook {year}"),
                "no entries this year".to_string(),
            );
            return Self { year, cards };
        }

        push_card(
            &mut cards,
            format!("Daybook {year}"),
            if selected.len() == 1 {
                "1 entry".to_string()
            } else {
                format!("{} entries", selected.len())
            },
        );

        for entry in &selected {
            let date = entry.created_at.format("%b %e").to_string();
            let excerpt = excerpt(&entry.content);
            let body = if excerpt.is_empty() {
                date
            } else {
                format!("{date} · {excerpt}")
            };
            push_card(&mut cards, entry.title.clone(), body);
        }

        let mut longest = selected[0];
        let mut shortest = selected[0];
        for entry in &selected[1..] {
            if entry.content_len() > longest.content_len() {
                longest = entry;
            }
            if entry.content_len() < shortest.content_len() {
                shortest = entry;
            }
        }
        push_card(
            &mut cards,
            "By the numbers".to_string(),
            format!(
                "longest: {} ({} bytes) · shortest: {} ({} bytes)",
                longest.title,
                longest.content_len(),
                shortest.title,
                shortest.content_len()
            ),
        );

        push_card(
            &mut cards,
            format!("End of {year}"),
            "made with daybook".to_string(),
        );

        Self { year, cards }
    }

    /// Total running time in seconds.
    #[must_use]
    pub fn duration_secs(&self) -> f64 {
        self.cards
            .last()
            .map_or(0.0, |card| card.start + card.duration)
    }

    /// Number of cards in the scene.
    #[must_use]
    pub fn card_count(&self) -> usize {
        self.cards.len()
    }
}

#[allow(clippy::cast_precision_loss)]
fn push_card(cards: &mut Vec<TextCard>, heading: String, body: String) {
    let start = cards.len() as f64 * SECS_PER_CARD;
    cards.push(TextCard {
        heading,
        body,
        start,
        duration: SECS_PER_CARD,
    });
}

/// First line of the content, capped at [`EXCERPT_CHARS`] characters.
fn excerpt(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or_default().trim();
    let mut excerpt: String = first_line.chars().take(EXCERPT_CHARS).collect();
    if first_line.chars().count() > EXCERPT_CHARS {
        excerpt.push_str("...");
    }
    excerpt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntryId;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn entry(id: u64, title: &str, content: &str, year: i32, day_of_year: u32) -> JournalEntry {
        let created_at = Utc
            .with_ymd_and_hms(year, 1, 1, 12, 0, 0)
            .unwrap()
            .checked_add_days(chrono::Days::new(u64::from(day_of_year)))
            .unwrap();
        JournalEntry {
            id: EntryId::new(id),
            title: title.to_string(),
            content: content.to_string(),
            tags: Vec::new(),
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn test_empty_year_is_a_single_card() {
        let scene = SceneSpec::build(2025, &[entry(1, "elsewhere", "x", 2024, 10)]);
        assert_eq!(scene.card_count(), 1);
        assert_eq!(scene.cards[0].heading, "Daybook 2025");
        assert_eq!(scene.cards[0].body, "no entries this year");
        assert!((scene.duration_secs() - SECS_PER_CARD).abs() < f64::EPSILON);
    }

    #[test]
    fn test_cards_follow_chronology_not_input_order() {
        let entries = vec![
            entry(2, "Later", "bb", 2024, 200),
            entry(1, "Earlier", "aaa", 2024, 10),
        ];
        let scene = SceneSpec::build(2024, &entries);

        assert_eq!(scene.card_count(), 5);
        assert_eq!(scene.cards[1].heading, "Earlier");
        assert_eq!(scene.cards[2].heading, "Later");
    }

    #[test]
    fn test_id_breaks_timestamp_ties() {
        let entries = vec![
            entry(9, "Second", "x", 2024, 5),
            entry(3, "First", "x", 2024, 5),
        ];
        let scene = SceneSpec::build(2024, &entries);
        assert_eq!(scene.cards[1].heading, "First");
        assert_eq!(scene.cards[2].heading, "Second");
    }

    #[test]
    fn test_stats_card_names_longest_and_shortest() {
        let entries = vec![
            entry(1, "Short", "ab", 2024, 1),
            entry(2, "Long", "abcdef", 2024, 2),
        ];
        let scene = SceneSpec::build(2024, &entries);
        let stats = &scene.cards[scene.card_count() - 2];

        assert_eq!(stats.heading, "By the numbers");
        assert!(stats.body.contains("longest: Long (6 bytes)"));
        assert!(stats.body.contains("shortest: Short (2 bytes)"));
    }

    #[test]
    fn test_byte_length_tie_keeps_earlier_entry() {
        let entries = vec![
            entry(1, "Alpha", "same", 2024, 1),
            entry(2, "Beta", "same", 2024, 2),
        ];
        let scene = SceneSpec::build(2024, &entries);
        let stats = &scene.cards[scene.card_count() - 2];

        assert!(stats.body.contains("longest: Alpha"));
        assert!(stats.body.contains("shortest: Alpha"));
    }

    #[test]
    fn test_length_is_bytes_not_chars() {
        // "héllo" is five chars but six bytes.
        let entries = vec![
            entry(1, "Ascii", "hello", 2024, 1),
            entry(2, "Accented", "héllo", 2024, 2),
        ];
        let scene = SceneSpec::build(2024, &entries);
        let stats = &scene.cards[scene.card_count() - 2];

        assert!(stats.body.contains("longest: Accented (6 bytes)"));
    }

    #[test]
    fn test_excerpt_is_single_line_and_capped() {
        let long_line = "x".repeat(200);
        let content = format!("{long_line}\nsecond line");
        let entries = vec![entry(1, "Big", &content, 2024, 1)];
        let scene = SceneSpec::build(2024, &entries);

        let body = &scene.cards[1].body;
        assert!(!body.contains("second line"));
        assert!(body.ends_with("..."));
    }

    #[test]
    fn test_cards_tile_the_timeline() {
        let entries = vec![entry(1, "One", "a", 2024, 1), entry(2, "Two", "b", 2024, 2)];
        let scene = SceneSpec::build(2024, &entries);

        for (i, card) in scene.cards.iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let expected = i as f64 * SECS_PER_CARD;
            assert!((card.start - expected).abs() < f64::EPSILON);
        }
        assert!((scene.duration_secs() - 5.0 * SECS_PER_CARD).abs() < f64::EPSILON);
    }

    fn entry_strategy() -> impl Strategy<Value = JournalEntry> {
        ("[A-Za-z ]{1,20}", "[a-z \n]{0,120}", 0u32..365, 1u64..500).prop_map(
            |(title, content, day, id)| entry(id, &title, &content, 2024, day),
        )
    }

    proptest! {
        /// Property: building the same scene twice yields equal output.
        #[test]
        fn prop_build_is_deterministic(entries in prop::collection::vec(entry_strategy(), 0..12)) {
            let a = SceneSpec::build(2024, &entries);
            let b = SceneSpec::build(2024, &entries);
            prop_assert_eq!(a, b);
        }

        /// Property: card count is one for an empty year, entries plus three otherwise.
        #[test]
        fn prop_card_count_tracks_entries(entries in prop::collection::vec(entry_strategy(), 0..12)) {
            let scene = SceneSpec::build(2024, &entries);
            let expected = if entries.is_empty() { 1 } else { entries.len() + 3 };
            prop_assert_eq!(scene.card_count(), expected);
        }

        /// Property: cards are contiguous and the total duration covers them all.
        #[test]
        fn prop_cards_are_contiguous(entries in prop::collection::vec(entry_strategy(), 1..12)) {
            let scene = SceneSpec::build(2024, &entries);
            let mut expected_start = 0.0;
            for card in &scene.cards {
                prop_assert!((card.start - expected_start).abs() < 1e-9);
                expected_start += card.duration;
            }
            prop_assert!((scene.duration_secs() - expected_start).abs() < 1e-9);
        }
    }
}
