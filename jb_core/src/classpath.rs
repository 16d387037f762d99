use std::path::{Path, PathBuf};

/// Entry separator the compiler expects on the host platform.
pub const SEPARATOR: char = if cfg!(windows) { ';' } else { ':' };

/// Ordered, deduplicated set of filesystem locations searched for compiled
/// units and archives. Insertion order is preserved so diagnostics stay
/// reproducible; pushing a path that is already present is a no-op.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classpath {
    entries: Vec<PathBuf>,
}

impl Classpath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: PathBuf) {
        if !self.entries.contains(&path) {
            self.entries.push(path);
        }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|e| e == path)
    }

    /// Join all entries with the host-platform separator. The result carries
    /// no trailing separator.
    pub fn join(&self) -> String {
        self.join_with(SEPARATOR)
    }

    pub fn join_with(&self, separator: char) -> String {
        let mut joined = String::new();
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                joined.push(separator);
            }
            joined.push_str(&entry.to_string_lossy());
        }
        joined
    }
}

impl FromIterator<PathBuf> for Classpath {
    fn from_iter<I: IntoIterator<Item = PathBuf>>(iter: I) -> Self {
        let mut classpath = Classpath::new();
        for path in iter {
            classpath.push(path);
        }
        classpath
    }
}

impl Extend<PathBuf> for Classpath {
    fn extend<I: IntoIterator<Item = PathBuf>>(&mut self, iter: I) {
        for path in iter {
            self.push(path);
        }
    }
}
