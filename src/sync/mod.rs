//! Whole-site synchronization.
//!
//! Backup mirrors the remote site root into a local directory; publish
//! replaces the remote site root with a local tree. Both run file-at-a-time
//! over a single [`Remote`](crate::remote::Remote).

pub mod backup;
pub mod publish;

use indicatif::{ProgressBar, ProgressStyle};

pub use backup::backup_remote_site;
pub use publish::{clear_remote_dir, collect_local_files, publish_site, LocalFile};

/// Options shared by backup and publish
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncOptions {
    /// Draw a progress bar on the terminal
    pub progress: bool,
}

/// Files and bytes moved by one backup or publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub files: usize,
    pub bytes: u64,
}

impl SyncStats {
    pub(crate) fn record(&mut self, bytes: u64) {
        self.files += 1;
        self.bytes += bytes;
    }
}

pub(crate) fn progress_bar(len: usize, prefix: &'static str, options: SyncOptions) -> ProgressBar {
    if !options.progress {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{prefix:>12} [{bar:30}] {pos}/{len} {wide_msg}")
    {
        pb.set_style(style.progress_chars("=> "));
    }
    pb.set_prefix(prefix);
    pb
}
