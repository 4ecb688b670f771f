//! Existence and listing queries against the remote filesystem.

use crate::error::{Result, SiteError};
use crate::remote::{exec, Remote, RemotePath};

/// Interpret the output of an `... && echo true || echo false` predicate.
///
/// Surrounding whitespace is ignored; anything other than `true` or `false`
/// is an error rather than a silent `false`.
pub fn parse_predicate(command: &str, output: &str) -> Result<bool> {
    match output.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(SiteError::UnexpectedOutput {
            command: command.to_string(),
            output: other.to_string(),
        }),
    }
}

fn predicate<R: Remote + ?Sized>(remote: &R, test_flag: &str, path: &RemotePath) -> Result<bool> {
    let command = format!(
        "test {} {} && echo true || echo false",
        test_flag,
        path.quoted()
    );
    let output = exec::run(remote, &command)?;
    parse_predicate(&command, &output)
}

/// Whether `path` is a regular file on the remote host.
pub fn is_file<R: Remote + ?Sized>(remote: &R, path: &RemotePath) -> Result<bool> {
    predicate(remote, "-f", path)
}

/// Whether `path` is a directory on the remote host.
pub fn is_directory<R: Remote + ?Sized>(remote: &R, path: &RemotePath) -> Result<bool> {
    predicate(remote, "-d", path)
}

/// All regular files under `root`, at any depth, as absolute remote paths in
/// the order `find` reports them.
///
/// An absent or empty directory yields an empty list. A symlinked `root` is
/// followed; symlinks below it are not.
pub fn list_files_recursive<R: Remote + ?Sized>(
    remote: &R,
    root: &RemotePath,
) -> Result<Vec<RemotePath>> {
    let quoted = root.quoted();
    let command = format!("if [ -d {0} ]; then find -H {0} -type f; fi", quoted);
    let output = exec::run(remote, &command)?;

    Ok(parse_listing(&output))
}

fn parse_listing(output: &str) -> Vec<RemotePath> {
    output
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(RemotePath::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_predicate() {
        assert!(parse_predicate("t", "true\n").unwrap());
        assert!(!parse_predicate("t", "  false  ").unwrap());
        assert!(parse_predicate("t", "").is_err());
        assert!(parse_predicate("t", "yes").is_err());
        assert!(parse_predicate("t", "true\ntrue").is_err());
    }

    #[test]
    fn test_parse_listing() {
        assert!(parse_listing("").is_empty());
        assert!(parse_listing("\n\n  \n").is_empty());

        let files = parse_listing("/srv/a.txt\n/srv/b/c.txt\r\n\n");
        assert_eq!(
            files,
            vec![RemotePath::from("/srv/a.txt"), RemotePath::from("/srv/b/c.txt")]
        );
    }

    #[cfg(unix)]
    mod local {
        use super::super::*;
        use crate::remote::LocalRemote;
        use std::collections::HashSet;
        use std::fs;
        use tempfile::TempDir;

        fn remote_path(path: &std::path::Path) -> RemotePath {
            RemotePath::new(path.to_string_lossy().into_owned())
        }

        #[test]
        fn test_is_file_and_is_directory() {
            let temp = TempDir::new().unwrap();
            let file = temp.path().join("index.html");
            fs::write(&file, "<html/>").unwrap();
            let remote = LocalRemote::new();

            assert!(is_file(&remote, &remote_path(&file)).unwrap());
            assert!(!is_directory(&remote, &remote_path(&file)).unwrap());
            assert!(is_directory(&remote, &remote_path(temp.path())).unwrap());
            assert!(!is_file(&remote, &remote_path(temp.path())).unwrap());

            let missing = remote_path(&temp.path().join("missing"));
            assert!(!is_file(&remote, &missing).unwrap());
            assert!(!is_directory(&remote, &missing).unwrap());
        }

        #[test]
        fn test_path_with_spaces() {
            let temp = TempDir::new().unwrap();
            let file = temp.path().join("my page.html");
            fs::write(&file, "x").unwrap();
            let remote = LocalRemote::new();

            assert!(is_file(&remote, &remote_path(&file)).unwrap());
        }

        #[test]
        fn test_list_files_recursive() {
            let temp = TempDir::new().unwrap();
            let root = temp.path().join("site");
            fs::create_dir_all(root.join("css/vendor")).unwrap();
            fs::create_dir_all(root.join("empty")).unwrap();
            fs::write(root.join("index.html"), "a").unwrap();
            fs::write(root.join(".htaccess"), "b").unwrap();
            fs::write(root.join("css/style.css"), "c").unwrap();
            fs::write(root.join("css/vendor/reset.css"), "d").unwrap();

            let remote = LocalRemote::new();
            let root_path = remote_path(&root);
            let files = list_files_recursive(&remote, &root_path).unwrap();

            assert_eq!(files.len(), 4);
            let unique: HashSet<_> = files.iter().collect();
            assert_eq!(unique.len(), 4);
            for file in &files {
                assert!(file.as_str().starts_with(root_path.as_str()));
                assert!(is_file(&remote, file).unwrap());
            }
            let relative: HashSet<_> = files
                .iter()
                .filter_map(|f| f.relative_to(&root_path))
                .collect();
            assert!(relative.contains("css/vendor/reset.css"));
            assert!(relative.contains(".htaccess"));
            assert!(!relative.contains("empty"));
        }

        #[test]
        fn test_list_files_with_non_utf8_name() {
            use std::ffi::OsStr;
            use std::os::unix::ffi::OsStrExt;

            let temp = TempDir::new().unwrap();
            fs::write(temp.path().join("index.html"), "a").unwrap();
            fs::write(temp.path().join(OsStr::from_bytes(b"caf\xe9.html")), "b").unwrap();

            let remote = LocalRemote::new();
            let files = list_files_recursive(&remote, &remote_path(temp.path())).unwrap();

            assert_eq!(files.len(), 2);
            assert!(files
                .iter()
                .any(|f| f.as_str().ends_with("caf\u{FFFD}.html")));
        }

        #[test]
        fn test_list_files_through_symlinked_root() {
            let temp = TempDir::new().unwrap();
            let real = temp.path().join("real/example.com");
            fs::create_dir_all(real.join("css")).unwrap();
            fs::write(real.join("index.html"), "a").unwrap();
            fs::write(real.join("css/style.css"), "b").unwrap();
            let link = temp.path().join("example.com");
            std::os::unix::fs::symlink(&real, &link).unwrap();

            let remote = LocalRemote::new();
            let root = remote_path(&link);
            let files = list_files_recursive(&remote, &root).unwrap();

            let relative: HashSet<_> = files
                .iter()
                .filter_map(|f| f.relative_to(&root))
                .collect();
            assert_eq!(relative, HashSet::from(["index.html", "css/style.css"]));
        }

        #[test]
        fn test_list_files_empty_or_missing() {
            let temp = TempDir::new().unwrap();
            let remote = LocalRemote::new();

            let empty = remote_path(temp.path());
            assert!(list_files_recursive(&remote, &empty).unwrap().is_empty());

            let missing = remote_path(&temp.path().join("nope"));
            assert!(list_files_recursive(&remote, &missing).unwrap().is_empty());
        }
    }
}
