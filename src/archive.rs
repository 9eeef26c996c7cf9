//! Library archive lookup.
//!
//! Archives are registered up front but only opened when the first class lookup
//! misses every output directory. Each archive is memory-mapped once to build an
//! entry index; extraction reopens the archive and reads a single entry.

use memmap2::Mmap;
use std::collections::HashMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::descriptor::ClassLocation;
use crate::error::{DetectError, Result};

const MAX_PREALLOCATED_ENTRY: u64 = 1 << 20;

/// Source of class files that live inside library archives.
pub trait LibraryClassSource {
    fn register_library_archive(&mut self, archive: &Path);

    /// Finds the archive entry backing `class_name` (internal form, no extension).
    fn library_class_location(&mut self, class_name: &str) -> Result<Option<ClassLocation>>;

    fn extract_library_class(&mut self, location: &ClassLocation) -> Result<Vec<u8>>;
}

#[derive(Debug, Default)]
pub struct JarExtractionManager {
    pending: Vec<PathBuf>,
    registered: Vec<PathBuf>,
    indexed: usize,
    entries: HashMap<String, PathBuf>,
}

impl JarExtractionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archives whose entry table was read successfully.
    pub fn indexed_archives(&self) -> usize {
        self.indexed
    }

    pub fn indexed_classes(&self) -> usize {
        self.entries.len()
    }

    fn index_pending(&mut self) {
        for archive in std::mem::take(&mut self.pending) {
            match list_class_entries(&archive) {
                Ok(names) => {
                    debug!(archive = %archive.display(), classes = names.len(), "indexed library archive");
                    self.indexed += 1;
                    for name in names {
                        // earlier archives shadow later ones
                        self.entries.entry(name).or_insert_with(|| archive.clone());
                    }
                }
                Err(err) => {
                    warn!(archive = %archive.display(), error = %err, "skipping unreadable library archive");
                }
            }
        }
    }
}

impl LibraryClassSource for JarExtractionManager {
    fn register_library_archive(&mut self, archive: &Path) {
        if self.registered.iter().any(|a| a == archive) {
            return;
        }
        self.registered.push(archive.to_path_buf());
        self.pending.push(archive.to_path_buf());
    }

    fn library_class_location(&mut self, class_name: &str) -> Result<Option<ClassLocation>> {
        self.index_pending();
        let entry = format!("{class_name}.class");
        Ok(self
            .entries
            .get(&entry)
            .map(|archive| ClassLocation::archive_entry(archive, &entry)))
    }

    fn extract_library_class(&mut self, location: &ClassLocation) -> Result<Vec<u8>> {
        let ClassLocation::Archive { archive, entry } = location else {
            return Err(DetectError::invalid_argument(format!(
                "{location} is not an archive entry"
            )));
        };
        read_entry(archive, entry)
    }
}

fn open_archive(path: &Path) -> Result<Mmap> {
    let file = File::open(path).map_err(|source| DetectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    // SAFETY: The file is opened read-only and the mapping is dropped before the
    // caller returns; archives are not rewritten during a detection run.
    unsafe { Mmap::map(&file) }.map_err(|source| DetectError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn list_class_entries(path: &Path) -> Result<Vec<String>> {
    let mmap = open_archive(path)?;
    let archive = ZipArchive::new(Cursor::new(&mmap[..])).map_err(|source| DetectError::Archive {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(archive
        .file_names()
        .filter(|name| name.ends_with(".class"))
        .map(str::to_string)
        .collect())
}

fn read_entry(path: &Path, entry: &str) -> Result<Vec<u8>> {
    let mmap = open_archive(path)?;
    let zip_error = |source| DetectError::Archive {
        path: path.to_path_buf(),
        source,
    };
    let mut archive = ZipArchive::new(Cursor::new(&mmap[..])).map_err(zip_error)?;
    let mut file = archive.by_name(entry).map_err(zip_error)?;

    // the declared size comes from the archive and is only a hint
    let mut bytes = Vec::with_capacity(file.size().min(MAX_PREALLOCATED_ENTRY) as usize);
    file.read_to_end(&mut bytes).map_err(|source| DetectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(bytes)
}
