//! Hierarchy-aware test class detection.
//!
//! A class is a test when its framework predicate says so, or when the predicate
//! defers and one of its ancestors is a test. Ancestors are resolved through the
//! [`ClassLocator`] and their verdicts are memoized per [`ClassLocation`] for the
//! lifetime of the detector, so a base class shared by many tests is read once.
//!
//! Only the class named by the caller can be published: abstract classes
//! and classes visited as someone else's ancestor never reach the sink.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::archive::{JarExtractionManager, LibraryClassSource};
use crate::descriptor::{self, ClassDescriptor, ClassLocation};
use crate::error::{DetectError, Result};
use crate::framework::{KnownTestBases, LocalVerdict, TestFramework};
use crate::locator::ClassLocator;
use crate::sink::TestClassSink;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DetectionStats {
    pub classes_read: u64,
    pub classpath_lookups: u64,
    pub superclass_cache_hits: u64,
    pub published: u64,
    pub manual: u64,
}

/// Counters owned by the detector; classpath lookups are counted by the locator.
#[derive(Debug, Clone, Copy, Default)]
struct Counters {
    classes_read: u64,
    superclass_cache_hits: u64,
    published: u64,
    manual: u64,
}

pub struct TestClassDetector<F, S, L = JarExtractionManager> {
    framework: F,
    sink: S,
    locator: ClassLocator<L>,
    known_test_bases: KnownTestBases,
    superclass_verdicts: HashMap<ClassLocation, bool>,
    in_progress: HashSet<ClassLocation>,
    counters: Counters,
}

impl<F, S> TestClassDetector<F, S>
where
    F: TestFramework,
    S: TestClassSink,
{
    pub fn new(test_classes_dir: PathBuf, classpath: Vec<PathBuf>, framework: F, sink: S) -> Self {
        Self::with_locator(ClassLocator::new(test_classes_dir, classpath), framework, sink)
    }
}

impl<F, S, L> TestClassDetector<F, S, L>
where
    F: TestFramework,
    S: TestClassSink,
    L: LibraryClassSource,
{
    pub fn with_locator(locator: ClassLocator<L>, framework: F, sink: S) -> Self {
        Self {
            framework,
            sink,
            locator,
            known_test_bases: KnownTestBases::default(),
            superclass_verdicts: HashMap::new(),
            in_progress: HashSet::new(),
            counters: Counters::default(),
        }
    }

    pub fn test_classes_dir(&self) -> &Path {
        self.locator.classpath().test_classes_dir()
    }

    pub fn framework(&self) -> &F {
        &self.framework
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    pub fn stats(&self) -> DetectionStats {
        DetectionStats {
            classes_read: self.counters.classes_read,
            classpath_lookups: self.locator.lookups(),
            superclass_cache_hits: self.counters.superclass_cache_hits,
            published: self.counters.published,
            manual: self.counters.manual,
        }
    }

    pub fn add_known_test_bases<I, N>(&mut self, names: I)
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        for name in names {
            self.known_test_bases.add(name.as_ref());
        }
    }

    pub fn is_known_test_base(&self, name: &str) -> bool {
        self.known_test_bases.contains(name)
    }

    pub fn superclass_verdict(&self, location: &ClassLocation) -> Option<bool> {
        self.superclass_verdicts.get(location).copied()
    }

    pub fn cached_verdicts(&self) -> usize {
        self.superclass_verdicts.len()
    }

    /// Classifies one class file and publishes it when it is a runnable test.
    #[tracing::instrument(skip_all, fields(class_file = %class_file.display()))]
    pub fn process_test_class(&mut self, class_file: &Path) -> Result<bool> {
        let location = ClassLocation::file(class_file);
        self.process(&location, false)
    }

    /// Declares a test class without inspecting any bytecode.
    pub fn manual_test_class(&mut self, test_class_name: &str) -> Result<()> {
        if test_class_name.trim().is_empty() {
            return Err(DetectError::invalid_argument("test class name is empty"));
        }
        self.sink.process_test_class(test_class_name);
        self.counters.manual += 1;
        Ok(())
    }

    fn process(&mut self, location: &ClassLocation, ancestor: bool) -> Result<bool> {
        let bytes = self.locator.read(location)?;
        self.counters.classes_read += 1;
        let descriptor = descriptor::extract(location, &bytes)?;

        let is_test = match self.framework.classify(&descriptor) {
            LocalVerdict::Test => true,
            LocalVerdict::NotTest => false,
            LocalVerdict::Inherit => {
                self.known_test_bases.contains(&descriptor.name)
                    || self.inherits_test(&descriptor)?
            }
        };

        self.publish(is_test, &descriptor, ancestor);
        Ok(is_test)
    }

    fn inherits_test(&mut self, descriptor: &ClassDescriptor) -> Result<bool> {
        let Some(super_name) = descriptor.super_name.as_deref() else {
            return Ok(false);
        };
        if self.known_test_bases.contains(super_name) {
            return Ok(true);
        }

        match self.locator.locate(super_name)? {
            Some(super_location) => self.ancestor_verdict(super_location),
            None => {
                debug!(class = %descriptor.name, superclass = super_name, "superclass not on test classpath");
                Ok(false)
            }
        }
    }

    fn ancestor_verdict(&mut self, location: ClassLocation) -> Result<bool> {
        if let Some(&verdict) = self.superclass_verdicts.get(&location) {
            self.counters.superclass_cache_hits += 1;
            return Ok(verdict);
        }
        if !self.in_progress.insert(location.clone()) {
            warn!(class_file = %location, "cyclic class hierarchy, treating as not a test");
            return Ok(false);
        }

        let result = self.process(&location, true);
        self.in_progress.remove(&location);
        let verdict = result?;
        self.superclass_verdicts.insert(location, verdict);
        Ok(verdict)
    }

    fn publish(&mut self, is_test: bool, descriptor: &ClassDescriptor, ancestor: bool) {
        if is_test && !descriptor.is_abstract && !ancestor {
            let name = self.framework.test_class_name(descriptor);
            debug!(test_class = %name, "detected test class");
            self.sink.process_test_class(&name);
            self.counters.published += 1;
        }
    }
}
