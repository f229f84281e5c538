use std::collections::HashSet;

use time::OffsetDateTime;

use crate::config::AppConfig;
use crate::feed::{self, FilterState};
use crate::store::{NewsItem, StoreHandle};

/// Centered overlay for picking a publication date. `entries[0]` is always
/// the "all dates" sentinel; the rest mirror `AppState::dates`.
#[derive(Debug, Clone)]
pub struct DatePickerOverlay {
    pub entries: Vec<Option<String>>,
    pub selected: usize,
}

#[derive(Debug, Clone)]
pub enum OverlayState {
    DatePicker(DatePickerOverlay),
}

#[derive(Debug, Clone)]
pub struct AppState {
    /// The fetched batch, in store order. Never mutated between fetches;
    /// filters only decide which of these are drawn.
    pub items: Vec<NewsItem>,
    pub filter: FilterState,
    /// Tag/date option lists, recomputed only when the batch changes.
    pub tags: Vec<String>,
    pub dates: Vec<String>,
    /// Card selection, indexing into the *visible* list.
    pub selected: usize,
    /// Cursor within the tag chip strip.
    pub tag_cursor: usize,
    /// Ids of items whose title is currently expanded. Pruned on every
    /// refetch so an item that leaves the batch comes back collapsed.
    pub expanded: HashSet<String>,
    pub status_message: Option<String>,
    pub overlay: Option<OverlayState>,
    pub last_fetch: Option<OffsetDateTime>,
    pub collapsed_title_lines: usize,
}

impl AppState {
    pub fn load(store: &StoreHandle, config: &AppConfig) -> Self {
        let mut state = Self::empty(config);
        state.refresh(store, config.fetch.limit);
        state
    }

    fn empty(config: &AppConfig) -> Self {
        Self {
            items: Vec::new(),
            filter: FilterState::default(),
            tags: Vec::new(),
            dates: Vec::new(),
            selected: 0,
            tag_cursor: 0,
            expanded: HashSet::new(),
            status_message: None,
            overlay: None,
            last_fetch: None,
            collapsed_title_lines: config.ui.collapsed_title_lines as usize,
        }
    }

    pub fn refresh(&mut self, store: &StoreHandle, limit: usize) {
        let items = store.fetch_recent_items(limit);
        self.apply_batch(items);
        self.last_fetch = Some(OffsetDateTime::now_utc());
    }

    /// Swap in a freshly fetched batch and reconcile everything derived
    /// from it. Filters are kept as-is: a selection the new batch no longer
    /// carries just matches nothing.
    pub(crate) fn apply_batch(&mut self, items: Vec<NewsItem>) {
        self.items = items;
        self.tags = feed::available_tags(&self.items);
        self.dates = feed::available_dates(&self.items);
        let ids: HashSet<&str> = self.items.iter().map(|item| item.id.as_str()).collect();
        self.expanded.retain(|id| ids.contains(id.as_str()));
        self.normalize_tag_cursor();
        self.normalize_selection();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn visible(&self) -> Vec<&NewsItem> {
        feed::visible_items(&self.items, &self.filter)
    }

    pub fn visible_len(&self) -> usize {
        self.items
            .iter()
            .filter(|item| self.filter.matches(item))
            .count()
    }

    pub fn selected_item(&self) -> Option<&NewsItem> {
        self.visible().get(self.selected).copied()
    }

    pub fn move_selection(&mut self, delta: isize) {
        let len = self.visible_len();
        if len == 0 {
            return;
        }
        let current = self.selected as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.selected = next as usize;
    }

    pub fn move_tag_cursor(&mut self, delta: isize) {
        if self.tags.is_empty() {
            return;
        }
        let current = self.tag_cursor as isize;
        let next = (current + delta).clamp(0, self.tags.len() as isize - 1);
        self.tag_cursor = next as usize;
    }

    /// Toggle the tag under the cursor; returns it for status reporting.
    pub fn toggle_tag_under_cursor(&mut self) -> Option<String> {
        let tag = self.tags.get(self.tag_cursor)?.clone();
        self.filter.toggle_tag_filter(&tag);
        self.normalize_selection();
        Some(tag)
    }

    pub fn set_date_filter(&mut self, date: Option<String>) {
        self.filter.set_date_filter(date);
        self.normalize_selection();
    }

    pub fn clear_filters(&mut self) {
        self.filter.clear();
        self.normalize_selection();
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.contains(id)
    }

    /// Flip the selected card's title between clamped and full. Returns the
    /// new expansion state, or `None` when nothing is selected.
    pub fn toggle_selected_expanded(&mut self) -> Option<bool> {
        let id = self.selected_item()?.id.clone();
        if self.expanded.remove(&id) {
            Some(false)
        } else {
            self.expanded.insert(id);
            Some(true)
        }
    }

    pub fn set_status_message<S: Into<String>>(&mut self, message: Option<S>) {
        self.status_message = message.map(Into::into);
    }

    pub fn overlay(&self) -> Option<&OverlayState> {
        self.overlay.as_ref()
    }

    pub fn close_overlay(&mut self) {
        self.overlay = None;
    }

    pub fn open_date_picker(&mut self) {
        let mut entries: Vec<Option<String>> = Vec::with_capacity(self.dates.len() + 1);
        entries.push(None);
        entries.extend(self.dates.iter().cloned().map(Some));
        let selected = match &self.filter.selected_date {
            Some(date) => self
                .dates
                .iter()
                .position(|d| d == date)
                .map(|idx| idx + 1)
                .unwrap_or(0),
            None => 0,
        };
        self.overlay = Some(OverlayState::DatePicker(DatePickerOverlay {
            entries,
            selected,
        }));
    }

    pub fn date_picker(&self) -> Option<&DatePickerOverlay> {
        match self.overlay() {
            Some(OverlayState::DatePicker(ref overlay)) => Some(overlay),
            None => None,
        }
    }

    fn date_picker_mut(&mut self) -> Option<&mut DatePickerOverlay> {
        match self.overlay.as_mut() {
            Some(OverlayState::DatePicker(ref mut overlay)) => Some(overlay),
            None => None,
        }
    }

    pub fn date_picker_move(&mut self, delta: isize) {
        if let Some(picker) = self.date_picker_mut() {
            if picker.entries.is_empty() {
                picker.selected = 0;
                return;
            }
            let current = picker.selected as isize;
            let next = (current + delta).clamp(0, picker.entries.len() as isize - 1);
            picker.selected = next as usize;
        }
    }

    /// Apply the highlighted entry and close the picker. Returns the chosen
    /// constraint (`None` inner value = all dates).
    pub fn date_picker_commit(&mut self) -> Option<Option<String>> {
        let choice = self
            .date_picker()
            .and_then(|picker| picker.entries.get(picker.selected).cloned())?;
        self.overlay = None;
        self.set_date_filter(choice.clone());
        Some(choice)
    }

    fn normalize_selection(&mut self) {
        let len = self.visible_len();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    fn normalize_tag_cursor(&mut self) {
        if self.tags.is_empty() {
            self.tag_cursor = 0;
        } else if self.tag_cursor >= self.tags.len() {
            self.tag_cursor = self.tags.len() - 1;
        }
    }
}
