use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::classfile::{self, ACC_ABSTRACT, ACC_INTERFACE};
use crate::error::{DetectError, Result};

/// Identity of one compiled class file, used as the superclass verdict cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClassLocation {
    Directory(PathBuf),
    Archive { archive: PathBuf, entry: String },
}

impl ClassLocation {
    /// Canonicalizes the path when it exists so that the same file reached through
    /// different relative paths shares one cache entry.
    pub fn file(path: &Path) -> Self {
        let path = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Self::Directory(path)
    }

    pub fn archive_entry(archive: &Path, entry: &str) -> Self {
        Self::Archive {
            archive: archive.to_path_buf(),
            entry: entry.to_string(),
        }
    }
}

impl fmt::Display for ClassLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Directory(path) => write!(f, "{}", path.display()),
            Self::Archive { archive, entry } => write!(f, "{}!/{entry}", archive.display()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassDescriptor {
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub is_abstract: bool,
    pub is_interface: bool,
    pub annotations: BTreeSet<String>,
    pub method_annotations: BTreeSet<String>,
}

impl ClassDescriptor {
    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.contains(name)
    }

    pub fn has_method_annotation(&self, name: &str) -> bool {
        self.method_annotations.contains(name)
    }
}

pub fn extract(location: &ClassLocation, bytes: &[u8]) -> Result<ClassDescriptor> {
    let structure =
        classfile::read_structure(bytes).map_err(|source| DetectError::MalformedClassFile {
            location: location.clone(),
            source,
        })?;

    Ok(ClassDescriptor {
        name: structure.name,
        super_name: structure.super_name,
        interfaces: structure.interfaces,
        is_abstract: structure.access_flags & ACC_ABSTRACT != 0,
        is_interface: structure.access_flags & ACC_INTERFACE != 0,
        annotations: structure.annotations,
        method_annotations: structure.method_annotations,
    })
}

/// Reads and describes a class file on disk.
pub fn read_descriptor(path: &Path) -> Result<ClassDescriptor> {
    let bytes = std::fs::read(path).map_err(|source| DetectError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    extract(&ClassLocation::file(path), &bytes)
}

pub fn internal_name(name: &str) -> String {
    name.trim().replace('.', "/")
}
