use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use log::info;

use crate::types::WritePolicy;

// Merges freshly extracted permalinks into the archive file and returns how
// many lines were written. The new block goes in before any bookmark is
// removed from the account, so an aborted run can only leave extra lines in
// the archive, never lose them.
pub fn merge_into(
    path: &Path,
    urls: &[String],
    policy: WritePolicy,
    dedupe_history: bool,
) -> Result<usize> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => {
            return Err(err).with_context(|| format!("Could not read {}", path.display()))
        }
    };

    let fresh: Vec<&String> = if dedupe_history {
        let archived: HashSet<&str> = existing.lines().collect();
        urls.iter()
            .filter(|url| {
                if archived.contains(url.as_str()) {
                    info!("Already archived, skipping {url}");
                    return false;
                }
                true
            })
            .collect()
    } else {
        urls.iter().collect()
    };

    if fresh.is_empty() {
        return Ok(0);
    }

    let mut block = String::new();
    for url in &fresh {
        block.push_str(url);
        block.push('\n');
    }

    let mut base = existing;
    if !base.is_empty() && !base.ends_with('\n') {
        base.push('\n');
    }

    let merged = match policy {
        WritePolicy::Append => format!("{base}{block}"),
        WritePolicy::Prepend => format!("{block}{base}"),
    };

    atomic_write(path, merged.as_bytes())?;

    Ok(fresh.len())
}

fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("Could not create {}", dir.display()))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Could not create a temporary file in {}", dir.display()))?;
    tmp.write_all(data).context("Could not write the archive")?;
    tmp.flush().context("Could not flush the archive")?;
    tmp.as_file_mut()
        .sync_all()
        .context("Could not sync the archive")?;
    tmp.persist(path)
        .map_err(|e| anyhow!("Could not persist {}: {}", path.display(), e))?;
    Ok(())
}
