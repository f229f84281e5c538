use anyhow::Result;

fn main() -> Result<()> {
    newsdesk_tui::cli::run()
}
