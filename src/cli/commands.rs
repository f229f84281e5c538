use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::App;
use crate::config::AppConfig;
use crate::feed;
use crate::store::{NewsItem, StoreHandle};
use crate::ui::format_published;

#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Limit the number of rows requested (defaults to the configured limit)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Emit the batch as pretty-printed JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct TagsArgs {
    /// Limit the number of rows requested (defaults to the configured limit)
    #[arg(long)]
    pub limit: Option<usize>,
}

pub fn run_tui(app: &mut App) -> Result<()> {
    app.run()
}

pub fn fetch_items(config: Arc<AppConfig>, store: StoreHandle, args: FetchArgs) -> Result<()> {
    let limit = args.limit.unwrap_or(config.fetch.limit);
    let items = store.fetch_recent_items(limit);
    if args.json {
        let json = serde_json::to_string_pretty(&items).context("serializing batch to JSON")?;
        println!("{json}");
    } else {
        print!("{}", format_items(&items));
    }
    Ok(())
}

pub fn list_tags(config: Arc<AppConfig>, store: StoreHandle, args: TagsArgs) -> Result<()> {
    let limit = args.limit.unwrap_or(config.fetch.limit);
    let items = store.fetch_recent_items(limit);
    let tags = feed::available_tags(&items);
    if tags.is_empty() {
        println!("(no tags)");
        return Ok(());
    }
    for tag in tags {
        println!("- {tag}");
    }
    Ok(())
}

fn format_items(items: &[NewsItem]) -> String {
    if items.is_empty() {
        return "No curated items available.\n".to_string();
    }
    let mut out = String::new();
    for item in items {
        let _ = writeln!(&mut out, "{}/10  {}", item.importance_score, item.title);
        let _ = writeln!(
            &mut out,
            "    published {}",
            format_published(&item.published_at)
        );
        if !item.tags.is_empty() {
            let _ = writeln!(&mut out, "    tags      {}", format_tags(&item.tags));
        }
        for line in &item.summary {
            let _ = writeln!(&mut out, "    ✓ {line}");
        }
        let _ = writeln!(&mut out, "    {}", item.original_url);
        out.push('\n');
    }
    out
}

fn format_tags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, score: i64) -> NewsItem {
        NewsItem {
            id: id.to_string(),
            title: format!("Headline {id}"),
            summary: vec!["one".into(), "two".into()],
            tags: vec!["llm".into()],
            original_url: format!("https://example.com/{id}"),
            importance_score: score,
            published_at: "2025-01-02".into(),
            created_at: "2025-01-02T07:00:00Z".into(),
        }
    }

    #[test]
    fn formatted_batch_lists_every_field_block() {
        let output = format_items(&[item("a", 7)]);
        assert!(output.contains("7/10  Headline a"));
        assert!(output.contains("published Jan 2, 2025"));
        assert!(output.contains("tags      #llm"));
        assert!(output.contains("✓ one"));
        assert!(output.contains("✓ two"));
        assert!(output.contains("https://example.com/a"));
    }

    #[test]
    fn formatted_batch_preserves_item_order() {
        let output = format_items(&[item("first", 9), item("second", 2)]);
        let first = output.find("Headline first").expect("first item present");
        let second = output.find("Headline second").expect("second item present");
        assert!(first < second);
    }

    #[test]
    fn empty_batch_prints_the_empty_state() {
        assert_eq!(format_items(&[]), "No curated items available.\n");
    }
}
