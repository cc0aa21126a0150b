//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::debug;

/// Ensure the parent directory of a file-backed SQLite database exists.
///
/// Accepts `sqlite://path/to/file.db?mode=rwc` or `sqlite:path/to/file.db`.
/// In-memory and non-SQLite URLs are left alone.
pub async fn ensure_sqlite_dir(database_url: &str) -> anyhow::Result<()> {
    let Some(path) = sqlite_file_path(database_url) else { return Ok(()) };
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", parent.display()))?;
        debug!(dir = %parent.display(), "sqlite data directory ready");
    }
    Ok(())
}

/// File path part of a SQLite URL, `None` for in-memory or other backends.
pub fn sqlite_file_path(database_url: &str) -> Option<&str> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(path)
}
