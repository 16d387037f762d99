use std::path::{Path, PathBuf};

/// Immutable per-invocation build configuration. Constructed once from the
/// parsed command line and passed by reference into every component; no
/// component reads ambient global state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildConfig {
    /// Path of the output archive.
    pub jar_path: PathBuf,
    /// Manifest embedded in the archive; skipped when the file is absent.
    pub manifest_path: PathBuf,
    /// Working directory for compiler and packager invocations.
    pub work_dir: PathBuf,
    /// Where compiled output lands.
    pub build_dir: PathBuf,
    /// Root of the source tree.
    pub source_root: PathBuf,
    /// Files copied into the build directory before packaging.
    pub resources: Vec<PathBuf>,
    /// Remote library URLs staged into the global library directory.
    pub remote_libs: Vec<String>,
    /// Extra files copied into the build directory before packaging.
    pub extra_files: Vec<PathBuf>,
}

impl BuildConfig {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        jar_path: PathBuf,
        manifest_path: PathBuf,
        work_dir: PathBuf,
        build_dir: PathBuf,
        source_root: PathBuf,
        resources: Vec<PathBuf>,
        remote_libs: Vec<String>,
        extra_files: Vec<PathBuf>,
    ) -> Self {
        Self {
            jar_path,
            manifest_path,
            work_dir: strip_trailing_separator(work_dir),
            build_dir,
            source_root,
            resources,
            remote_libs,
            extra_files,
        }
    }

    /// User-global library directory scanned for archives.
    pub fn global_lib_dir(&self, home: &Path) -> PathBuf {
        home.join(".sessx").join("lib")
    }

    /// Per-project library directory scanned for archives.
    pub fn project_lib_dir(&self) -> PathBuf {
        self.work_dir.join("lib")
    }
}

fn strip_trailing_separator(path: PathBuf) -> PathBuf {
    let raw = path.to_string_lossy();
    let trimmed = raw.trim_end_matches(['/', '\\']);
    if trimmed.is_empty() || trimmed.len() == raw.len() {
        path
    } else {
        PathBuf::from(trimmed)
    }
}
