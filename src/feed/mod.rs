//! Date/tag filtering over a fetched batch of items.
//!
//! Everything in this module is a pure, total function of its inputs: no
//! I/O, no failure modes. The batch itself is never mutated; filtering only
//! decides which items are visible.

use std::collections::BTreeSet;

use crate::store::NewsItem;

/// Transient filter selection. Created unset, mutated only by user
/// interaction, thrown away on exit. `None` on an axis means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub selected_date: Option<String>,
    pub selected_tag: Option<String>,
}

impl FilterState {
    /// Replace the date constraint. Values are taken as-is; a date no batch
    /// item carries simply matches nothing.
    pub fn set_date_filter(&mut self, date: Option<String>) {
        self.selected_date = date;
    }

    /// Toggle semantics: re-selecting the active tag clears it, any other
    /// tag replaces it. At most one tag is active at a time.
    pub fn toggle_tag_filter(&mut self, tag: &str) {
        if self.selected_tag.as_deref() == Some(tag) {
            self.selected_tag = None;
        } else {
            self.selected_tag = Some(tag.to_string());
        }
    }

    pub fn clear(&mut self) {
        self.selected_date = None;
        self.selected_tag = None;
    }

    pub fn is_active(&self) -> bool {
        self.selected_date.is_some() || self.selected_tag.is_some()
    }

    /// Both axes must hold; an unset axis holds for every item.
    pub fn matches(&self, item: &NewsItem) -> bool {
        let date_ok = self
            .selected_date
            .as_deref()
            .map_or(true, |date| item.published_at == date);
        let tag_ok = self
            .selected_tag
            .as_deref()
            .map_or(true, |tag| item.tags.iter().any(|t| t == tag));
        date_ok && tag_ok
    }
}

/// Union of every tag in the batch, deduplicated and sorted ascending.
/// Recomputed when the batch changes, not on every filter change.
pub fn available_tags(items: &[NewsItem]) -> Vec<String> {
    let unique: BTreeSet<&str> = items
        .iter()
        .flat_map(|item| item.tags.iter().map(String::as_str))
        .collect();
    unique.into_iter().map(str::to_owned).collect()
}

/// Deduplicated publication dates, most recent first. Dates are compared as
/// opaque `YYYY-MM-DD` strings, for which lexicographic order is
/// chronological order.
pub fn available_dates(items: &[NewsItem]) -> Vec<String> {
    let unique: BTreeSet<&str> = items
        .iter()
        .map(|item| item.published_at.as_str())
        .collect();
    unique.into_iter().rev().map(str::to_owned).collect()
}

/// The visible subset: exactly the items matching both predicates, in the
/// batch's original order. No re-sort — ordering was established upstream.
pub fn visible_items<'a>(items: &'a [NewsItem], filter: &FilterState) -> Vec<&'a NewsItem> {
    items.iter().filter(|item| filter.matches(item)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, tags: &[&str], published_at: &str) -> NewsItem {
        NewsItem {
            id: id.to_string(),
            title: format!("Item {id}"),
            summary: vec![format!("summary for {id}")],
            tags: tags.iter().map(|t| t.to_string()).collect(),
            original_url: format!("https://example.com/{id}"),
            importance_score: 5,
            published_at: published_at.to_string(),
            created_at: format!("{published_at}T07:00:00Z"),
        }
    }

    fn ids<'a>(items: &[&'a NewsItem]) -> Vec<&'a str> {
        items.iter().map(|item| item.id.as_str()).collect()
    }

    #[test]
    fn available_tags_is_sorted_union_without_duplicates() {
        let items = vec![
            item("1", &["robotics", "llm"], "2025-01-01"),
            item("2", &["llm", "agents"], "2025-01-02"),
            item("3", &[], "2025-01-02"),
        ];
        assert_eq!(available_tags(&items), vec!["agents", "llm", "robotics"]);
    }

    #[test]
    fn available_dates_is_descending_without_duplicates() {
        let items = vec![
            item("1", &[], "2025-01-01"),
            item("2", &[], "2025-01-03"),
            item("3", &[], "2025-01-01"),
        ];
        assert_eq!(available_dates(&items), vec!["2025-01-03", "2025-01-01"]);
    }

    #[test]
    fn empty_batch_yields_empty_everything() {
        let items: Vec<NewsItem> = Vec::new();
        assert!(available_tags(&items).is_empty());
        assert!(available_dates(&items).is_empty());
        assert!(visible_items(&items, &FilterState::default()).is_empty());
    }

    #[test]
    fn visible_items_is_exactly_the_matching_subset_in_order() {
        let items = vec![
            item("1", &["llm"], "2025-01-02"),
            item("2", &["robotics"], "2025-01-02"),
            item("3", &["llm"], "2025-01-01"),
        ];
        let mut filter = FilterState::default();
        filter.toggle_tag_filter("llm");
        let visible = visible_items(&items, &filter);
        assert_eq!(ids(&visible), vec!["1", "3"]);
        for item in &visible {
            assert!(filter.matches(item));
        }
        for item in &items {
            assert_eq!(
                filter.matches(item),
                visible.iter().any(|v| v.id == item.id)
            );
        }
    }

    #[test]
    fn unset_filter_shows_the_full_batch() {
        let items = vec![
            item("1", &["llm"], "2025-01-01"),
            item("2", &[], "2025-01-02"),
        ];
        let visible = visible_items(&items, &FilterState::default());
        assert_eq!(ids(&visible), vec!["1", "2"]);
    }

    #[test]
    fn toggling_the_same_tag_twice_round_trips_to_unset() {
        let mut filter = FilterState::default();
        filter.toggle_tag_filter("llm");
        assert_eq!(filter.selected_tag.as_deref(), Some("llm"));
        filter.toggle_tag_filter("llm");
        assert_eq!(filter.selected_tag, None);
    }

    #[test]
    fn toggling_a_different_tag_replaces_the_selection() {
        let mut filter = FilterState::default();
        filter.toggle_tag_filter("llm");
        filter.toggle_tag_filter("robotics");
        assert_eq!(filter.selected_tag.as_deref(), Some("robotics"));
    }

    #[test]
    fn clear_restores_the_full_batch() {
        let items = vec![
            item("1", &["llm"], "2025-01-01"),
            item("2", &["robotics"], "2025-01-02"),
        ];
        let mut filter = FilterState::default();
        filter.set_date_filter(Some("2025-01-02".into()));
        filter.toggle_tag_filter("llm");
        filter.clear();
        assert!(!filter.is_active());
        assert_eq!(ids(&visible_items(&items, &filter)), vec!["1", "2"]);
    }

    #[test]
    fn date_then_tag_narrows_with_both_predicates() {
        let items = vec![
            item("1", &["llm"], "2025-01-01"),
            item("2", &["robotics"], "2025-01-02"),
        ];
        let mut filter = FilterState::default();

        filter.set_date_filter(Some("2025-01-02".into()));
        assert_eq!(ids(&visible_items(&items, &filter)), vec!["2"]);

        // Date still set: both predicates must hold, so nothing matches.
        filter.toggle_tag_filter("llm");
        assert!(visible_items(&items, &filter).is_empty());

        filter.clear();
        assert_eq!(ids(&visible_items(&items, &filter)), vec!["1", "2"]);
    }

    #[test]
    fn absent_date_matches_nothing_without_error() {
        let items = vec![item("1", &[], "2025-01-01")];
        let mut filter = FilterState::default();
        filter.set_date_filter(Some("1999-12-31".into()));
        assert!(visible_items(&items, &filter).is_empty());
    }
}
