//! Replace the remote site with a local tree.

use crate::error::{Result, SiteError};
use crate::remote::path::to_remote_relative;
use crate::remote::{exec, upload_file, Remote, RemotePath};
use crate::sync::{progress_bar, SyncOptions, SyncStats};
use ignore::WalkBuilder;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// A regular file found in a local source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    /// Absolute or working-dir-relative path on disk
    pub path: PathBuf,
    /// `/`-separated path below the source root
    pub relative: String,
}

/// Every regular file under `source_dir`, depth-first in walk order.
///
/// Hidden files are included; ignore files are not consulted.
pub fn collect_local_files(source_dir: &Path) -> Result<Vec<LocalFile>> {
    if !source_dir.is_dir() {
        return Err(SiteError::local_fs(
            "source directory does not exist",
            source_dir,
            io::Error::from(io::ErrorKind::NotFound),
        ));
    }

    let walker = WalkBuilder::new(source_dir)
        .standard_filters(false)
        .follow_links(false)
        .build();

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|e| {
            let path = error_path(&e).unwrap_or(source_dir).to_path_buf();
            SiteError::local_fs("failed to read", &path, io::Error::new(io::ErrorKind::Other, e))
        })?;

        let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);
        // Symlinks count when they resolve to a regular file
        if is_dir || !entry.path().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|_| SiteError::InvalidPath {
                path: entry.path().display().to_string(),
                reason: format!("not under '{}'", source_dir.display()),
            })?;
        files.push(LocalFile {
            relative: to_remote_relative(relative)?,
            path: entry.path().to_path_buf(),
        });
    }

    Ok(files)
}

fn error_path(err: &ignore::Error) -> Option<&Path> {
    match err {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::WithDepth { err, .. } => error_path(err),
        _ => None,
    }
}

/// Delete every entry directly under `dir` on the remote host, dot-files
/// included, leaving `dir` itself. An absent `dir` is not an error.
///
/// `dir` may be a symlink to the real site directory; its target is cleared.
pub fn clear_remote_dir<R: Remote + ?Sized>(remote: &R, dir: &RemotePath) -> Result<()> {
    let command = format!(
        "if [ -d {0} ]; then find -H {0} -mindepth 1 -maxdepth 1 -exec rm -rf {{}} +; fi",
        dir.quoted()
    );
    exec::run(remote, &command)?;
    Ok(())
}

/// Make `site_root` hold exactly the files of `source_dir`.
///
/// The local tree is read first; then the remote site root is emptied and
/// every file uploaded in walk order. The first failed upload aborts the
/// rest, leaving the remote site partially published.
pub fn publish_site<R: Remote + ?Sized>(
    remote: &R,
    site_root: &RemotePath,
    source_dir: &Path,
    options: SyncOptions,
) -> Result<SyncStats> {
    let files = collect_local_files(source_dir)?;

    info!("Removing old website from web host");
    clear_remote_dir(remote, site_root)?;

    info!("Uploading website to web host");
    let pb = progress_bar(files.len(), "Uploading", options);
    let mut stats = SyncStats::default();
    for file in &files {
        pb.suspend(|| info!("  Uploading {}", file.path.display()));
        pb.set_message(file.relative.clone());

        let bytes = upload_file(remote, &file.path, &site_root.join(&file.relative))
            .inspect_err(|_| {
                pb.abandon();
                error!(
                    "failed to upload '{}' after deleting the prior remote site",
                    file.path.display()
                );
            })?;
        stats.record(bytes);
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_collect_local_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("css/vendor")).unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();
        fs::write(root.join("index.html"), "a").unwrap();
        fs::write(root.join(".nojekyll"), "").unwrap();
        fs::write(root.join("css/vendor/reset.css"), "b").unwrap();
        // Would normally be honored by ignore-aware walkers
        fs::write(root.join(".gitignore"), "index.html\n").unwrap();

        let files = collect_local_files(root).unwrap();
        let relative: HashSet<_> = files.iter().map(|f| f.relative.as_str()).collect();

        assert_eq!(
            relative,
            HashSet::from(["index.html", ".nojekyll", "css/vendor/reset.css", ".gitignore"])
        );
        for file in &files {
            assert!(file.path.is_file());
        }
    }

    #[test]
    fn test_collect_missing_source() {
        let temp = TempDir::new().unwrap();
        let err = collect_local_files(&temp.path().join("public")).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::LocalFilesystem);
    }

    #[cfg(unix)]
    mod local {
        use super::super::*;
        use crate::remote::LocalRemote;
        use std::fs;
        use tempfile::TempDir;

        fn remote_path(path: &Path) -> RemotePath {
            RemotePath::new(path.to_string_lossy().into_owned())
        }

        /// Loopback remote whose upload of one file name always fails.
        struct FailingSend {
            inner: LocalRemote,
            fail_name: &'static str,
            sends: std::cell::Cell<usize>,
        }

        impl Remote for FailingSend {
            fn exec(&self, command: &str) -> Result<crate::remote::CommandOutput> {
                self.inner.exec(command)
            }

            fn send(
                &self,
                source: &mut dyn io::Read,
                size: u64,
                remote_path: &RemotePath,
                mode: i32,
            ) -> io::Result<u64> {
                self.sends.set(self.sends.get() + 1);
                if remote_path.as_str().ends_with(self.fail_name) {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "channel closed"));
                }
                self.inner.send(source, size, remote_path, mode)
            }

            fn receive(&self, remote_path: &RemotePath, dest: &mut dyn io::Write) -> io::Result<u64> {
                self.inner.receive(remote_path, dest)
            }
        }

        #[test]
        fn test_publish_aborts_on_first_failed_upload() {
            let temp = TempDir::new().unwrap();
            let source = temp.path().join("public");
            fs::create_dir_all(&source).unwrap();
            for name in ["a.html", "b.html", "broken.html", "c.html", "d.html"] {
                fs::write(source.join(name), name).unwrap();
            }
            let site = temp.path().join("site");
            fs::create_dir_all(&site).unwrap();
            fs::write(site.join("old.html"), "prior site").unwrap();

            let remote = FailingSend {
                inner: LocalRemote::new(),
                fail_name: "broken.html",
                sends: std::cell::Cell::new(0),
            };
            let walk_position = collect_local_files(&source)
                .unwrap()
                .iter()
                .position(|f| f.relative == "broken.html")
                .unwrap();

            let err = publish_site(&remote, &remote_path(&site), &source, SyncOptions::default())
                .unwrap_err();

            assert_eq!(err.kind(), crate::error::ErrorKind::Transfer);
            assert!(err.to_string().contains("broken.html"));
            // Prior site was already gone when the upload failed
            assert!(!site.join("old.html").exists());
            assert!(!site.join("broken.html").exists());
            // Nothing after the failed file was attempted
            assert_eq!(remote.sends.get(), walk_position + 1);
            assert_eq!(fs::read_dir(&site).unwrap().count(), walk_position);
        }

        #[test]
        fn test_clear_remote_dir_keeps_root() {
            let temp = TempDir::new().unwrap();
            let site = temp.path().join("site");
            fs::create_dir_all(site.join("a/b")).unwrap();
            fs::write(site.join("a/b/c.txt"), "c").unwrap();
            fs::write(site.join(".htaccess"), "h").unwrap();
            fs::write(site.join("index.html"), "i").unwrap();

            let remote = LocalRemote::new();
            clear_remote_dir(&remote, &remote_path(&site)).unwrap();

            assert!(site.is_dir());
            assert_eq!(fs::read_dir(&site).unwrap().count(), 0);

            // Absent root is fine
            clear_remote_dir(&remote, &remote_path(&temp.path().join("nope"))).unwrap();
        }

        #[test]
        fn test_publish_missing_source_leaves_remote_untouched() {
            let temp = TempDir::new().unwrap();
            let site = temp.path().join("site");
            fs::create_dir_all(&site).unwrap();
            fs::write(site.join("index.html"), "live").unwrap();

            let remote = LocalRemote::new();
            let result = publish_site(
                &remote,
                &remote_path(&site),
                &temp.path().join("missing"),
                SyncOptions::default(),
            );

            assert!(result.is_err());
            assert_eq!(fs::read_to_string(site.join("index.html")).unwrap(), "live");
        }

        #[test]
        fn test_publish_into_missing_site_root() {
            let temp = TempDir::new().unwrap();
            let source = temp.path().join("public");
            fs::create_dir_all(source.join("posts")).unwrap();
            fs::write(source.join("posts/first.html"), "post").unwrap();

            let site = temp.path().join("home/alice/public_html/example.com");
            let remote = LocalRemote::new();
            let stats =
                publish_site(&remote, &remote_path(&site), &source, SyncOptions::default())
                    .unwrap();

            assert_eq!(stats.files, 1);
            assert_eq!(
                fs::read_to_string(site.join("posts/first.html")).unwrap(),
                "post"
            );
        }
    }
}
