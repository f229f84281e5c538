use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::Frame;
use time::{macros::format_description, Date, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use crate::app::state::{AppState, OverlayState};
use crate::store::NewsItem;

pub fn draw_app(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(5),
            Constraint::Min(3),
            Constraint::Length(2),
        ])
        .split(frame.size());

    draw_header(frame, vertical[0]);
    draw_filter_bar(frame, state, vertical[1]);
    draw_cards(frame, state, vertical[2], list_state);
    draw_status(frame, state, vertical[3]);

    render_overlay(frame, state);
}

fn draw_header(frame: &mut Frame, area: Rect) {
    let today = OffsetDateTime::now_utc()
        .format(&format_description!(
            "[weekday repr:long], [month repr:long] [day padding:none], [year]"
        ))
        .unwrap_or_default();
    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "Curated briefing",
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  ·  "),
        Span::styled(today, Style::default().fg(Color::Gray)),
    ]))
    .block(Block::default().title("Newsdesk").borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn draw_filter_bar(frame: &mut Frame, state: &AppState, area: Rect) {
    let mut lines = Vec::with_capacity(3);

    let date_label = match &state.filter.selected_date {
        Some(date) => Span::styled(
            format_published(date),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        None => Span::styled("all dates", Style::default().fg(Color::Gray)),
    };
    lines.push(Line::from(vec![
        Span::raw("Date: "),
        date_label,
        Span::styled("   (d to change)", Style::default().fg(Color::DarkGray)),
    ]));

    let mut tag_spans = vec![Span::raw("Tags: ")];
    if state.tags.is_empty() {
        tag_spans.push(Span::styled("(none)", Style::default().fg(Color::DarkGray)));
    } else {
        for (idx, tag) in state.tags.iter().enumerate() {
            let active = state.filter.selected_tag.as_deref() == Some(tag.as_str());
            let mut style = if active {
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::Black)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Green)
            };
            if idx == state.tag_cursor {
                style = style.add_modifier(Modifier::UNDERLINED);
            }
            tag_spans.push(Span::styled(format!("#{tag}"), style));
            if idx + 1 < state.tags.len() {
                tag_spans.push(Span::raw(" "));
            }
        }
    }
    lines.push(Line::from(tag_spans));

    if state.filter.is_active() {
        let mut active_spans = vec![Span::styled(
            "Active:",
            Style::default().fg(Color::Gray),
        )];
        if let Some(date) = &state.filter.selected_date {
            active_spans.push(Span::raw(" "));
            active_spans.push(Span::styled(
                format!("[{}]", format_published(date)),
                Style::default().fg(Color::Cyan),
            ));
        }
        if let Some(tag) = &state.filter.selected_tag {
            active_spans.push(Span::raw(" "));
            active_spans.push(Span::styled(
                format!("[#{tag}]"),
                Style::default().fg(Color::Green),
            ));
        }
        active_spans.push(Span::styled(
            "  — c to clear",
            Style::default().fg(Color::DarkGray),
        ));
        lines.push(Line::from(active_spans));
    } else {
        lines.push(Line::from(Span::styled(
            "No active filters",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let paragraph =
        Paragraph::new(lines).block(Block::default().title("Filters").borders(Borders::ALL));
    frame.render_widget(paragraph, area);
}

fn draw_cards(frame: &mut Frame, state: &AppState, area: Rect, list_state: &mut ListState) {
    // Borders plus the highlight symbol eat four columns of card width.
    let inner_width = (area.width.saturating_sub(4) as usize).max(10);
    let visible = state.visible();

    let mut items = Vec::with_capacity(visible.len());
    for item in &visible {
        items.push(ListItem::new(card_lines(
            item,
            state.is_expanded(&item.id),
            inner_width,
            state.collapsed_title_lines,
        )));
    }
    if items.is_empty() {
        let message = if state.is_empty() {
            "No curated items yet — the feed refreshes on its own."
        } else {
            "No items match the active filters. Press c to clear them."
        };
        items.push(ListItem::new(Text::from(Span::styled(
            message,
            Style::default().fg(Color::Gray),
        ))));
    }

    let title = format!("Briefing ({} of {})", visible.len(), state.items.len());
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::Blue)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▸ ");
    frame.render_stateful_widget(list, area, list_state);
}

/// Project one item into terminal lines: importance badge, clamped or full
/// title, tag labels, checked summary lines, link, publication date.
fn card_lines(
    item: &NewsItem,
    expanded: bool,
    width: usize,
    collapsed_title_lines: usize,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();

    lines.push(Line::from(Span::styled(
        format!(" {}/10 ", item.importance_score),
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )));

    // Collapsing only clamps the display; the cut is marked by the ellipsis
    // the clamp appends, and the underlying title is untouched.
    let wrapped = wrap_text(&item.title, width);
    let (title_lines, _) = if expanded {
        (wrapped, false)
    } else {
        clamp_lines(wrapped, collapsed_title_lines, width)
    };
    for text in title_lines {
        lines.push(Line::from(Span::styled(
            text,
            Style::default().add_modifier(Modifier::BOLD),
        )));
    }

    if let Some(tag_line) = render_tag_line(&item.tags) {
        lines.push(tag_line);
    }

    for entry in &item.summary {
        let mut first = true;
        for text in wrap_text(entry, width.saturating_sub(2).max(1)) {
            if first {
                lines.push(Line::from(vec![
                    Span::styled("✓ ", Style::default().fg(Color::Green)),
                    Span::raw(text),
                ]));
                first = false;
            } else {
                lines.push(Line::from(vec![Span::raw("  "), Span::raw(text)]));
            }
        }
    }

    lines.push(Line::from(vec![
        Span::styled("↗ ", Style::default().fg(Color::Blue)),
        Span::styled(
            item.original_url.clone(),
            Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
        ),
    ]));

    lines.push(Line::from(Span::styled(
        format!("Published {}", format_published(&item.published_at)),
        Style::default().fg(Color::Gray),
    )));
    lines.push(Line::from(""));

    lines
}

fn render_tag_line(tags: &[String]) -> Option<Line<'static>> {
    if tags.is_empty() {
        return None;
    }
    let base_style = Style::default().fg(Color::Green);
    let mut spans = Vec::new();
    for (idx, tag) in tags.iter().enumerate() {
        spans.push(Span::styled(format!("#{tag}"), base_style));
        if idx + 1 < tags.len() {
            spans.push(Span::raw(" "));
        }
    }
    Some(Line::from(spans))
}

fn draw_status(frame: &mut Frame, state: &AppState, area: Rect) {
    let visible_len = state.visible_len();
    let position = if visible_len == 0 {
        "0/0".to_string()
    } else {
        format!("{}/{}", state.selected + 1, visible_len)
    };

    let mut spans = vec![
        Span::raw(format!("Items: {}", state.items.len())),
        Span::raw(" | Visible: "),
        Span::styled(
            visible_len.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | Selected: "),
        Span::styled(position, Style::default().add_modifier(Modifier::BOLD)),
    ];
    if let Some(fetched_at) = state.last_fetch {
        spans.push(Span::raw(" | Fetched "));
        spans.push(Span::styled(
            format_time_short(fetched_at),
            Style::default().fg(Color::Gray),
        ));
    }
    if let Some(message) = &state.status_message {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            message.clone(),
            Style::default().fg(Color::Cyan),
        ));
    }

    let mut lines = Vec::with_capacity(2);
    lines.push(Line::from(spans));
    lines.push(Line::from(Span::styled(
        "Keys: j/k cards • h/l tags • space toggle tag • d date • c clear • Enter title • o open • r refresh • q quit",
        Style::default().fg(Color::DarkGray),
    )));

    let paragraph = Paragraph::new(lines).style(Style::default().fg(Color::Gray));
    frame.render_widget(paragraph, area);
}

fn render_overlay(frame: &mut Frame, state: &AppState) {
    match state.overlay() {
        Some(OverlayState::DatePicker(picker)) => {
            let area = centered_rect(40, 60, frame.size());
            frame.render_widget(Clear, area);

            let layout = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(2), Constraint::Min(3)].as_ref())
                .split(area);

            let header = Paragraph::new(vec![
                Line::from(Span::styled(
                    "Filter by date",
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "j/k move • Enter apply • Esc cancel",
                    Style::default().fg(Color::Gray),
                )),
            ]);
            frame.render_widget(header, layout[0]);

            let items: Vec<ListItem> = picker
                .entries
                .iter()
                .map(|entry| match entry {
                    Some(date) => ListItem::new(format_published(date)),
                    None => ListItem::new(Span::styled(
                        "All dates",
                        Style::default().add_modifier(Modifier::ITALIC),
                    )),
                })
                .collect();

            let mut picker_state = ListState::default();
            if !picker.entries.is_empty() {
                picker_state.select(Some(picker.selected));
            }
            let list = List::new(items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::Cyan)),
                )
                .highlight_style(
                    Style::default()
                        .bg(Color::Blue)
                        .fg(Color::Black)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("▸ ");
            frame.render_stateful_widget(list, layout[1], &mut picker_state);
        }
        None => {}
    }
}

/// Centered rectangle occupying `percent_x` × `percent_y` of `area`.
fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Percentage((100 - percent_y) / 2),
                Constraint::Percentage(percent_y),
                Constraint::Percentage((100 - percent_y) / 2),
            ]
            .as_ref(),
        )
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints(
            [
                Constraint::Percentage((100 - percent_x) / 2),
                Constraint::Percentage(percent_x),
                Constraint::Percentage((100 - percent_x) / 2),
            ]
            .as_ref(),
        )
        .split(vertical[1])[1]
}

/// Greedy display-width-aware word wrap; overlong words are hard-broken at
/// grapheme boundaries. Always returns at least one line.
pub(crate) fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;

    for word in text.split_whitespace() {
        let word_width = UnicodeWidthStr::width(word);
        let needed = if current.is_empty() {
            word_width
        } else {
            word_width + 1
        };
        if !current.is_empty() && current_width + needed > width {
            lines.push(std::mem::take(&mut current));
            current_width = 0;
        }
        if word_width <= width {
            if !current.is_empty() {
                current.push(' ');
                current_width += 1;
            }
            current.push_str(word);
            current_width += word_width;
        } else {
            for grapheme in word.graphemes(true) {
                let grapheme_width = UnicodeWidthStr::width(grapheme);
                if !current.is_empty() && current_width + grapheme_width > width {
                    lines.push(std::mem::take(&mut current));
                    current_width = 0;
                }
                current.push_str(grapheme);
                current_width += grapheme_width;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Keep at most `max` lines, marking a cut with a trailing ellipsis that
/// still fits inside `width`. Returns whether anything was dropped.
pub(crate) fn clamp_lines(mut lines: Vec<String>, max: usize, width: usize) -> (Vec<String>, bool) {
    if max == 0 || lines.len() <= max {
        return (lines, false);
    }
    lines.truncate(max);
    if let Some(last) = lines.last_mut() {
        while !last.is_empty() && UnicodeWidthStr::width(last.as_str()) + 1 > width {
            pop_grapheme(last);
        }
        last.push('…');
    }
    (lines, true)
}

fn pop_grapheme(text: &mut String) {
    if let Some((idx, _)) = text.grapheme_indices(true).last() {
        text.truncate(idx);
    }
}

/// `2025-01-02` → `Jan 2, 2025`; anything unparseable is shown verbatim.
pub(crate) fn format_published(raw: &str) -> String {
    let parse_format = format_description!("[year]-[month]-[day]");
    let display_format = format_description!("[month repr:short] [day padding:none], [year]");
    Date::parse(raw, &parse_format)
        .ok()
        .and_then(|date| date.format(&display_format).ok())
        .unwrap_or_else(|| raw.to_string())
}

fn format_time_short(dt: OffsetDateTime) -> String {
    dt.format(&format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| dt.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_text(line: &Line<'static>) -> String {
        line.spans
            .iter()
            .map(|span| span.content.clone().into_owned())
            .collect()
    }

    fn sample_item() -> NewsItem {
        NewsItem {
            id: "a".into(),
            title: "A fairly long headline about frontier model evaluations and safety".into(),
            summary: vec!["First point".into(), "Second point".into()],
            tags: vec!["llm".into(), "evals".into()],
            original_url: "https://example.com/a".into(),
            importance_score: 7,
            published_at: "2025-01-02".into(),
            created_at: "2025-01-02T07:00:00Z".into(),
        }
    }

    #[test]
    fn wrap_text_respects_width_and_keeps_words() {
        let lines = wrap_text("alpha beta gamma delta", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);
        for line in &lines {
            assert!(UnicodeWidthStr::width(line.as_str()) <= 11);
        }
    }

    #[test]
    fn wrap_text_hard_breaks_overlong_words() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn wrap_text_of_empty_input_is_a_single_blank_line() {
        assert_eq!(wrap_text("", 10), vec![String::new()]);
    }

    #[test]
    fn clamp_lines_passes_short_input_through() {
        let (lines, truncated) = clamp_lines(vec!["one".into()], 2, 20);
        assert_eq!(lines, vec!["one"]);
        assert!(!truncated);
    }

    #[test]
    fn clamp_lines_cuts_and_marks_with_ellipsis() {
        let input = vec!["first line".into(), "second".into(), "third".into()];
        let (lines, truncated) = clamp_lines(input, 2, 10);
        assert!(truncated);
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with('…'));
        assert!(UnicodeWidthStr::width(lines[1].as_str()) <= 10);
    }

    #[test]
    fn collapsed_card_clamps_the_title_to_two_lines() {
        let item = sample_item();
        let collapsed = card_lines(&item, false, 20, 2);
        let expanded = card_lines(&item, true, 20, 2);

        let collapsed_title: Vec<&Line<'static>> = collapsed
            .iter()
            .skip(1)
            .take_while(|line| {
                !line_text(line).starts_with('#') && !line_text(line).is_empty()
            })
            .collect();
        assert_eq!(collapsed_title.len(), 2);
        assert!(line_text(collapsed_title[1]).ends_with('…'));
        // Expanding never loses text, it only adds lines back.
        assert!(expanded.len() > collapsed.len());
    }

    #[test]
    fn card_pairs_each_summary_entry_with_a_check_glyph() {
        let item = sample_item();
        let lines = card_lines(&item, true, 60, 2);
        let glyph_lines = lines
            .iter()
            .filter(|line| line_text(line).starts_with('✓'))
            .count();
        assert_eq!(glyph_lines, item.summary.len());
    }

    #[test]
    fn card_shows_badge_tags_link_and_date() {
        let item = sample_item();
        let lines = card_lines(&item, true, 60, 2);
        let texts: Vec<String> = lines.iter().map(line_text).collect();
        assert!(texts[0].contains("7/10"));
        assert!(texts.iter().any(|t| t.contains("#llm #evals")));
        assert!(texts.iter().any(|t| t.contains("https://example.com/a")));
        assert!(texts.iter().any(|t| t.contains("Published Jan 2, 2025")));
    }

    #[test]
    fn card_without_tags_has_no_tag_line() {
        let mut item = sample_item();
        item.tags.clear();
        let lines = card_lines(&item, true, 60, 2);
        assert!(!lines.iter().any(|line| line_text(line).starts_with('#')));
    }

    #[test]
    fn published_date_formats_and_falls_back() {
        assert_eq!(format_published("2025-01-02"), "Jan 2, 2025");
        assert_eq!(format_published("not-a-date"), "not-a-date");
    }
}
