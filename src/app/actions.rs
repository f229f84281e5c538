use std::process::Command;

use anyhow::{bail, Context, Result};

/// Hand a card's original URL to the system browser. The terminal analog of
/// following a link into a new browsing context; the spawned process is not
/// waited on.
pub fn open_in_browser(url: &str) -> Result<()> {
    let url = url.trim();
    if url.is_empty() {
        bail!("item has no original URL");
    }
    launcher_command(url)
        .spawn()
        .with_context(|| format!("launching browser for {url}"))?;
    Ok(())
}

#[cfg(target_os = "macos")]
fn launcher_command(url: &str) -> Command {
    let mut command = Command::new("open");
    command.arg(url);
    command
}

#[cfg(target_os = "windows")]
fn launcher_command(url: &str) -> Command {
    let mut command = Command::new("cmd");
    command.args(["/C", "start", "", url]);
    command
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn launcher_command(url: &str) -> Command {
    let mut command = Command::new("xdg-open");
    command.arg(url);
    command
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_url_is_rejected() {
        assert!(open_in_browser("   ").is_err());
    }
}
