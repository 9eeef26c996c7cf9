//! Module repository capabilities.
//!
//! `LocalAwareModuleVersionRepository` extends the plain repository with a
//! local-only lookup. `LocalModuleVersionRepository` adapts any repository to the
//! plain capability set and deliberately does not implement the local-aware one,
//! so a caller cannot ask it for a local-only resolution.
//!
//! A local-aware repository can be wrapped and still used as a plain one:
//!
//! ```
//! use test_class_finder::repository::{
//!     LocalAwareModuleVersionRepository, LocalModuleVersionRepository, ModuleVersionRepository,
//! };
//!
//! fn local_only<R: LocalAwareModuleVersionRepository>(_: &R) {}
//! fn plain<R: ModuleVersionRepository>(_: &R) {}
//!
//! fn wrap<R: LocalAwareModuleVersionRepository>(repository: R) {
//!     local_only(&repository);
//!     plain(&LocalModuleVersionRepository::new(repository));
//! }
//! ```
//!
//! but the wrapper no longer offers the local-only lookup:
//!
//! ```compile_fail
//! use test_class_finder::repository::{
//!     LocalAwareModuleVersionRepository, LocalModuleVersionRepository,
//! };
//!
//! fn local_only<R: LocalAwareModuleVersionRepository>(_: &R) {}
//!
//! fn wrap<R: LocalAwareModuleVersionRepository>(repository: R) {
//!     local_only(&LocalModuleVersionRepository::new(repository));
//! }
//! ```

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactCoordinates {
    pub group: String,
    pub name: String,
    pub version: String,
    pub extension: String,
}

impl fmt::Display for ArtifactCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}@{}",
            self.group, self.name, self.version, self.extension
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyRequest {
    pub group: String,
    pub name: String,
    pub version_constraint: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleVersionDescriptor {
    pub group: String,
    pub name: String,
    pub version: String,
    pub artifacts: Vec<ArtifactCoordinates>,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("could not resolve {group}:{name}:{version_constraint}")]
    ModuleVersionResolve {
        group: String,
        name: String,
        version_constraint: String,
    },
    #[error("could not download {artifact}: {reason}")]
    ArtifactDownload {
        artifact: ArtifactCoordinates,
        reason: String,
    },
}

/// Outcome slot filled in by [`ModuleVersionRepository::download`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactResolveResult {
    outcome: Option<Result<PathBuf, RepositoryError>>,
}

impl ArtifactResolveResult {
    pub fn resolved(&mut self, file: PathBuf) {
        self.outcome = Some(Ok(file));
    }

    pub fn failed(&mut self, error: RepositoryError) {
        self.outcome = Some(Err(error));
    }

    pub fn has_result(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn file(&self) -> Option<&PathBuf> {
        self.outcome.as_ref().and_then(|o| o.as_ref().ok())
    }

    pub fn failure(&self) -> Option<&RepositoryError> {
        self.outcome.as_ref().and_then(|o| o.as_ref().err())
    }
}

pub trait ModuleVersionRepository {
    fn id(&self) -> &str;

    fn name(&self) -> &str;

    fn is_local(&self) -> bool;

    fn download(&self, artifact: &ArtifactCoordinates, result: &mut ArtifactResolveResult);

    fn get_dependency(
        &self,
        dependency: &DependencyRequest,
    ) -> Result<Option<ModuleVersionDescriptor>, RepositoryError>;
}

pub trait LocalAwareModuleVersionRepository: ModuleVersionRepository {
    /// Resolves using only sources that need no network access.
    fn get_local_dependency(
        &self,
        dependency: &DependencyRequest,
    ) -> Result<Option<ModuleVersionDescriptor>, RepositoryError>;
}

/// Forwards every plain repository operation to the wrapped repository.
#[derive(Debug, Clone)]
pub struct LocalModuleVersionRepository<R> {
    delegate: R,
}

impl<R: ModuleVersionRepository> LocalModuleVersionRepository<R> {
    pub fn new(delegate: R) -> Self {
        Self { delegate }
    }

    pub fn delegate(&self) -> &R {
        &self.delegate
    }
}

impl<R: ModuleVersionRepository> ModuleVersionRepository for LocalModuleVersionRepository<R> {
    fn id(&self) -> &str {
        self.delegate.id()
    }

    fn name(&self) -> &str {
        self.delegate.name()
    }

    fn is_local(&self) -> bool {
        self.delegate.is_local()
    }

    fn download(&self, artifact: &ArtifactCoordinates, result: &mut ArtifactResolveResult) {
        self.delegate.download(artifact, result);
    }

    fn get_dependency(
        &self,
        dependency: &DependencyRequest,
    ) -> Result<Option<ModuleVersionDescriptor>, RepositoryError> {
        self.delegate.get_dependency(dependency)
    }
}
