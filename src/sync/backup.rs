//! Download the remote site into the local backup snapshot.

use crate::error::{Result, SiteError};
use crate::remote::path::to_local_path;
use crate::remote::{download_file, list_files_recursive, Remote, RemotePath};
use crate::sync::{progress_bar, SyncOptions, SyncStats};
use std::fs;
use std::io;
use std::path::Path;
use tracing::info;

/// Replace `backup_dir` with a copy of every file under `site_root`.
///
/// The remote listing is taken before the local snapshot is cleared, so a
/// failed listing leaves the previous snapshot in place. An empty remote
/// site produces an empty snapshot directory.
pub fn backup_remote_site<R: Remote + ?Sized>(
    remote: &R,
    site_root: &RemotePath,
    backup_dir: &Path,
    options: SyncOptions,
) -> Result<SyncStats> {
    let files = list_files_recursive(remote, site_root)?;

    clear_local_dir(backup_dir)?;

    let mut stats = SyncStats::default();
    if files.is_empty() {
        info!("  Nothing to download");
        return Ok(stats);
    }

    let pb = progress_bar(files.len(), "Downloading", options);
    for file in &files {
        let relative = file
            .relative_to(site_root)
            .ok_or_else(|| SiteError::InvalidPath {
                path: file.to_string(),
                reason: format!("not under site root '{}'", site_root),
            })?;
        let local = to_local_path(backup_dir, relative)?;

        pb.suspend(|| info!("  Downloading {}", file));
        pb.set_message(relative.to_string());
        let bytes = download_file(remote, file, &local)?;
        stats.record(bytes);
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(stats)
}

/// Remove everything at `dir` and recreate it empty.
fn clear_local_dir(dir: &Path) -> Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(SiteError::local_fs("cannot clear directory", dir, e)),
    }
    fs::create_dir_all(dir).map_err(|e| SiteError::local_fs("cannot create directory", dir, e))
}
