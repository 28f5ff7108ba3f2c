use anyhow::{Context, Result};

/// Hand a URL to the system's default handler
///
/// `mailto:` links open the mail client, anything else the browser.
///
/// # Errors
/// Returns error if no handler can be launched (e.g., headless session)
pub fn open_url(url: &str) -> Result<()> {
    webbrowser::open(url).with_context(|| {
        let shown = url.split_once('?').map_or(url, |(head, _)| head);
        format!("Failed to open a handler for {}", shown)
    })?;
    Ok(())
}
