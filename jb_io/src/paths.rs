use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use jb_core::Classpath;

use crate::archive::is_archive;

/// Canonicalize a path, degrading to an absolute non-canonical path when
/// resolution fails (broken symlink, permission error).
fn resolved(path: &Path) -> PathBuf {
    match path.canonicalize() {
        Ok(canonical) => canonical,
        Err(_) if path.is_absolute() => path.to_path_buf(),
        Err(_) => std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf()),
    }
}

/// Recursively enumerate every regular file under `root`, materialized
/// eagerly and sorted so compiler invocations stay reproducible across
/// filesystems with different listing orders. Unreadable entries are
/// skipped rather than aborting the walk.
pub fn collect_sources(root: &Path) -> Vec<PathBuf> {
    let mut sources: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| resolved(entry.path()))
        .collect();
    sources.sort();
    sources
}

/// Assemble the library search path: three base entries (working directory,
/// source root, build output directory) followed by the archives found in
/// the user-global library directory and `<work_dir>/lib`. Both scans are
/// non-recursive and admit only regular files passing [`is_archive`];
/// missing directories yield an empty listing, not an error.
pub fn collect_library_path(
    work_dir: &Path,
    source_root: &Path,
    build_dir: &Path,
    global_lib_dir: &Path,
) -> Classpath {
    let mut classpath = Classpath::new();
    classpath.push(work_dir.to_path_buf());
    classpath.push(resolved(source_root));
    classpath.push(build_dir.to_path_buf());

    let project_lib_dir = work_dir.join("lib");
    for dir in [global_lib_dir, project_lib_dir.as_path()] {
        classpath.extend(list_archives(dir));
    }
    classpath
}

fn list_archives(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };

    let mut archives: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_archive(path))
        .map(|path| resolved(&path))
        .collect();
    archives.sort();
    archives
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path, content: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn collect_sources_finds_every_nested_file() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("Main.java"), b"class Main {}");
        touch(&tmp.path().join("a/Util.java"), b"class Util {}");
        touch(&tmp.path().join("a/b/c/Deep.java"), b"class Deep {}");

        let sources = collect_sources(tmp.path());

        assert_eq!(sources.len(), 3);
        for path in &sources {
            assert!(path.is_absolute());
            assert!(path.is_file());
        }
    }

    #[test]
    fn collect_sources_returns_distinct_paths() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("x/One.java"), b"");
        touch(&tmp.path().join("y/Two.java"), b"");

        let sources = collect_sources(tmp.path());
        let distinct: std::collections::HashSet<_> = sources.iter().collect();

        assert_eq!(distinct.len(), sources.len());
    }

    #[test]
    fn collect_sources_is_sorted() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("z.java"), b"");
        touch(&tmp.path().join("a.java"), b"");
        touch(&tmp.path().join("m/n.java"), b"");

        let sources = collect_sources(tmp.path());
        let mut expected = sources.clone();
        expected.sort();

        assert_eq!(sources, expected);
    }

    #[test]
    fn collect_sources_of_missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let sources = collect_sources(&tmp.path().join("no-such-dir"));
        assert!(sources.is_empty());
    }

    #[test]
    fn library_path_starts_with_base_entries() {
        let tmp = TempDir::new().unwrap();
        let work = tmp.path().join("project");
        let src = work.join("src/java");
        let build = work.join("build");
        fs::create_dir_all(&src).unwrap();

        let cp = collect_library_path(&work, &src, &build, &tmp.path().join("home/.sessx/lib"));

        assert_eq!(cp.entries()[0], work);
        assert_eq!(cp.entries()[1], src.canonicalize().unwrap());
        assert_eq!(cp.entries()[2], build);
    }

    #[test]
    fn library_path_includes_archives_from_both_lib_dirs() {
        let tmp = TempDir::new().unwrap();
        let work = tmp.path().join("project");
        let global_lib = tmp.path().join("home/.sessx/lib");
        touch(&global_lib.join("global.jar"), b"PK\x03\x04");
        touch(&work.join("lib/local.jar"), b"PK\x03\x04");

        let cp = collect_library_path(
            &work,
            &work.join("src"),
            &work.join("build"),
            &global_lib,
        );

        let joined = cp.join_with(':');
        assert!(joined.contains("global.jar"));
        assert!(joined.contains("local.jar"));
    }

    #[test]
    fn library_path_excludes_non_archives() {
        let tmp = TempDir::new().unwrap();
        let work = tmp.path().join("project");
        touch(&work.join("lib/readme.txt"), b"not an archive");
        touch(&work.join("lib/real.jar"), b"PK\x03\x04");

        let cp = collect_library_path(
            &work,
            &work.join("src"),
            &work.join("build"),
            &tmp.path().join("missing"),
        );

        let joined = cp.join_with(':');
        assert!(!joined.contains("readme.txt"));
        assert!(joined.contains("real.jar"));
    }

    #[test]
    fn library_path_skips_subdirectories_of_lib() {
        let tmp = TempDir::new().unwrap();
        let work = tmp.path().join("project");
        touch(&work.join("lib/nested/inner.jar"), b"PK\x03\x04");

        let cp = collect_library_path(
            &work,
            &work.join("src"),
            &work.join("build"),
            &tmp.path().join("missing"),
        );

        assert!(!cp.join_with(':').contains("inner.jar"));
    }

    #[test]
    fn missing_lib_dirs_are_silently_skipped() {
        let tmp = TempDir::new().unwrap();
        let work = tmp.path().join("project");

        let cp = collect_library_path(
            &work,
            &work.join("src"),
            &work.join("build"),
            &tmp.path().join("no-global-lib"),
        );

        // Just the three base entries.
        assert_eq!(cp.len(), 3);
    }
}
