//! Snapshot file output.
//!
//! The snapshot is a JSON array of `{"address", "balance"}` objects with
//! 2-space indentation, written to a temporary file next to the target and
//! renamed over it, so a failed run never leaves a half-written file.

use std::path::Path;

use anyhow::{Context, Result};
use cw20_holders::HolderRecord;

/// Render holders as the snapshot JSON text.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn render(holders: &[HolderRecord]) -> Result<String> {
    serde_json::to_string_pretty(holders).context("serializing holders")
}

/// Write holders to `path`, replacing any previous snapshot.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created or the file
/// cannot be written.
pub fn write_json(path: &Path, holders: &[HolderRecord]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = Path::new(&tmp);

    std::fs::write(tmp, render(holders)?.as_bytes())
        .with_context(|| format!("writing {}", tmp.display()))?;
    if let Err(e) = std::fs::rename(tmp, path) {
        if let Err(cleanup) = std::fs::remove_file(tmp) {
            tracing::warn!(path = %tmp.display(), error = %cleanup, "cannot remove temp file");
        }
        return Err(e)
            .with_context(|| format!("renaming {} to {}", tmp.display(), path.display()));
    }

    tracing::info!(path = %path.display(), holders = holders.len(), "snapshot written");
    Ok(())
}

/// Print one line per holder.
#[allow(clippy::print_stdout)]
pub fn print_holders(holders: &[HolderRecord]) {
    for holder in holders {
        println!("Address: {}, Balance: {}", holder.address, holder.balance);
    }
}
