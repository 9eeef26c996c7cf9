use std::collections::HashMap;
use std::path::PathBuf;

use crate::archive::{JarExtractionManager, LibraryClassSource};
use crate::classpath::ClasspathIndex;
use crate::descriptor::ClassLocation;
use crate::error::{DetectError, Result};

/// Resolves internal class names to class files, output directories first.
#[derive(Debug)]
pub struct ClassLocator<L = JarExtractionManager> {
    classpath: ClasspathIndex,
    library: L,
    resolved: HashMap<String, Option<ClassLocation>>,
    lookups: u64,
}

impl ClassLocator<JarExtractionManager> {
    pub fn new(test_classes_dir: PathBuf, classpath: Vec<PathBuf>) -> Self {
        Self::with_library(test_classes_dir, classpath, JarExtractionManager::new())
    }
}

impl<L: LibraryClassSource> ClassLocator<L> {
    pub fn with_library(test_classes_dir: PathBuf, classpath: Vec<PathBuf>, library: L) -> Self {
        Self {
            classpath: ClasspathIndex::new(test_classes_dir, classpath),
            library,
            resolved: HashMap::new(),
            lookups: 0,
        }
    }

    pub fn classpath(&self) -> &ClasspathIndex {
        &self.classpath
    }

    pub fn library(&self) -> &L {
        &self.library
    }

    /// Number of names resolved against the classpath; memoized answers are not
    /// counted.
    pub fn lookups(&self) -> u64 {
        self.lookups
    }

    pub fn locate(&mut self, class_name: &str) -> Result<Option<ClassLocation>> {
        if class_name.trim().is_empty() {
            return Err(DetectError::invalid_argument("class name is empty"));
        }
        if let Some(found) = self.resolved.get(class_name) {
            return Ok(found.clone());
        }

        let first_use = !self.classpath.is_resolved();
        let model = self.classpath.resolve();
        if first_use {
            for archive in &model.archives {
                self.library.register_library_archive(archive);
            }
        }

        self.lookups += 1;
        let file_name = format!("{class_name}.class");
        let in_output_dirs = model
            .output_dirs
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file());

        let found = match in_output_dirs {
            Some(path) => Some(ClassLocation::file(&path)),
            None => self.library.library_class_location(class_name)?,
        };
        self.resolved.insert(class_name.to_string(), found.clone());
        Ok(found)
    }

    /// Reads the complete class file behind `location`.
    pub fn read(&mut self, location: &ClassLocation) -> Result<Vec<u8>> {
        match location {
            ClassLocation::Directory(path) => std::fs::read(path).map_err(|source| DetectError::Io {
                path: path.clone(),
                source,
            }),
            ClassLocation::Archive { .. } => self.library.extract_library_class(location),
        }
    }
}
