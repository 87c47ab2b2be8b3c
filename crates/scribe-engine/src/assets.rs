//! File loading for fonts and shader sources.

use std::path::Path;

use anyhow::Context;

/// Reads the whole file at `path`. The caller owns the returned buffer.
pub fn load_file_bytes(path: impl AsRef<Path>) -> anyhow::Result<Vec<u8>> {
    let path = path.as_ref();
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    log::debug!("loaded {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes)
}
