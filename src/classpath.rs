use std::path::{Path, PathBuf};
use tracing::debug;

const ARCHIVE_EXTENSIONS: [&str; 2] = ["jar", "zip"];

/// Search roots for class resolution: output directories in precedence order and
/// the library archives consulted after every directory missed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClasspathModel {
    pub output_dirs: Vec<PathBuf>,
    pub archives: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ClasspathIndex {
    test_classes_dir: PathBuf,
    entries: Vec<PathBuf>,
    model: Option<ClasspathModel>,
}

impl ClasspathIndex {
    pub fn new(test_classes_dir: PathBuf, entries: Vec<PathBuf>) -> Self {
        Self {
            test_classes_dir,
            entries,
            model: None,
        }
    }

    pub fn test_classes_dir(&self) -> &Path {
        &self.test_classes_dir
    }

    pub fn is_resolved(&self) -> bool {
        self.model.is_some()
    }

    /// Partitions the classpath on first call; later calls return the same model.
    pub fn resolve(&mut self) -> &ClasspathModel {
        let test_classes_dir = &self.test_classes_dir;
        let entries = &self.entries;
        self.model
            .get_or_insert_with(|| partition(test_classes_dir, entries))
    }
}

fn partition(test_classes_dir: &Path, entries: &[PathBuf]) -> ClasspathModel {
    let mut model = ClasspathModel {
        output_dirs: vec![test_classes_dir.to_path_buf()],
        archives: Vec::new(),
    };

    for entry in entries {
        if entry.is_dir() {
            model.output_dirs.push(entry.clone());
        } else if entry.is_file() && is_archive(entry) {
            if !model.archives.contains(entry) {
                model.archives.push(entry.clone());
            }
        }
    }

    debug!(
        output_dirs = model.output_dirs.len(),
        archives = model.archives.len(),
        ignored = entries.len() + 1 - model.output_dirs.len() - model.archives.len(),
        "resolved test classpath"
    );
    model
}

pub fn is_archive(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ARCHIVE_EXTENSIONS.iter().any(|a| e.eq_ignore_ascii_case(a)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn resolve_partitions_directories_and_archives() {
        let base = tempfile::tempdir().unwrap();
        let classes = base.path().join("classes");
        let main_classes = base.path().join("main");
        let jar = base.path().join("lib.jar");
        let zip = base.path().join("other.ZIP");
        let text = base.path().join("notes.txt");
        fs::create_dir_all(&classes).unwrap();
        fs::create_dir_all(&main_classes).unwrap();
        fs::write(&jar, b"").unwrap();
        fs::write(&zip, b"").unwrap();
        fs::write(&text, b"").unwrap();

        let mut index = ClasspathIndex::new(
            classes.clone(),
            vec![
                jar.clone(),
                main_classes.clone(),
                text,
                base.path().join("missing.jar"),
                zip.clone(),
                jar.clone(),
            ],
        );
        assert!(!index.is_resolved());

        let model = index.resolve().clone();
        assert_eq!(model.output_dirs, vec![classes, main_classes]);
        assert_eq!(model.archives, vec![jar, zip]);
        assert!(index.is_resolved());
    }

    #[test]
    fn resolve_is_computed_once() {
        let base = tempfile::tempdir().unwrap();
        let late = base.path().join("late");

        let mut index = ClasspathIndex::new(base.path().to_path_buf(), vec![late.clone()]);
        let first = index.resolve().clone();
        fs::create_dir_all(&late).unwrap();
        let second = index.resolve().clone();

        assert_eq!(first, second);
        assert_eq!(second.output_dirs, vec![base.path().to_path_buf()]);
    }
}
