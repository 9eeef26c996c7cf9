use ignore::WalkBuilder;
use ignore::overrides::{Override, OverrideBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use tracing::debug;

use crate::archive::LibraryClassSource;
use crate::detector::TestClassDetector;
use crate::error::{DetectError, Result};
use crate::framework::TestFramework;
use crate::sink::TestClassSink;

pub const DEFAULT_INCLUDE: &str = "**/*.class";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Inspect bytecode and publish detected tests.
    Detect,
    /// Declare every top-level class as a test without inspecting it.
    Manual,
}

/// Glob patterns relative to the scanned directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanFilter {
    includes: Vec<String>,
    excludes: Vec<String>,
}

impl Default for ScanFilter {
    fn default() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl ScanFilter {
    pub fn new(includes: Vec<String>, excludes: Vec<String>) -> Self {
        let includes = if includes.is_empty() {
            vec![DEFAULT_INCLUDE.to_string()]
        } else {
            includes
        };
        Self { includes, excludes }
    }

    fn compile(&self, root: &Path) -> Result<(Override, Override)> {
        Ok((
            build_override(root, &self.includes)?,
            build_override(root, &self.excludes)?,
        ))
    }
}

fn build_override(root: &Path, patterns: &[String]) -> Result<Override> {
    let mut builder = OverrideBuilder::new(root);
    for pattern in patterns {
        builder.add(pattern).map_err(|err| {
            DetectError::invalid_argument(format!("invalid pattern {pattern:?}: {err}"))
        })?;
    }
    builder
        .build()
        .map_err(|err| DetectError::invalid_argument(format!("invalid patterns: {err}")))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanSummary {
    pub scanned: usize,
    pub detected: u64,
}

/// Lists the `.class` files under `root` accepted by `filter`, sorted by path.
pub fn scan_class_files(root: &Path, filter: &ScanFilter) -> Result<Vec<PathBuf>> {
    let (includes, excludes) = filter.compile(root)?;
    let (tx, rx) = mpsc::channel();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .ignore(false)
        .parents(false)
        .git_ignore(false)
        .git_global(false)
        .git_exclude(false)
        .build_parallel();

    walker.run(|| {
        let tx = tx.clone();
        Box::new(move |entry| {
            if let Ok(entry) = entry
                && entry.file_type().is_some_and(|t| t.is_file())
                && entry.path().extension().is_some_and(|e| e == "class")
            {
                let _ = tx.send(entry.into_path());
            }
            ignore::WalkState::Continue
        })
    });

    drop(tx);
    let mut files: Vec<PathBuf> = rx
        .iter()
        .filter(|path| {
            let relative = path.strip_prefix(root).unwrap_or(path);
            includes.matched(relative, false).is_whitelist()
                && !excludes.matched(relative, false).is_whitelist()
        })
        .collect();
    files.sort();
    debug!(root = %root.display(), class_files = files.len(), "scanned test classes directory");
    Ok(files)
}

/// Feeds every class file under the detector's test classes directory to it.
pub fn run_scan<F, S, L>(
    detector: &mut TestClassDetector<F, S, L>,
    filter: &ScanFilter,
    mode: ScanMode,
) -> Result<ScanSummary>
where
    F: TestFramework,
    S: TestClassSink,
    L: LibraryClassSource,
{
    let root = detector.test_classes_dir().to_path_buf();
    let files = scan_class_files(&root, filter)?;
    let before = detector.stats();

    for file in &files {
        match mode {
            ScanMode::Detect => {
                detector.process_test_class(file)?;
            }
            ScanMode::Manual => {
                let relative = relative_class_name(&root, file);
                if !relative.contains('$') {
                    detector.manual_test_class(&relative)?;
                }
            }
        }
    }

    let after = detector.stats();
    Ok(ScanSummary {
        scanned: files.len(),
        detected: (after.published + after.manual) - (before.published + before.manual),
    })
}

fn relative_class_name(root: &Path, file: &Path) -> String {
    let relative = file.strip_prefix(root).unwrap_or(file);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
