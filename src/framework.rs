//! Framework-specific "is this a test" predicates.
//!
//! A predicate only looks at one class. When it cannot decide locally it answers
//! [`LocalVerdict::Inherit`] and the detector walks up to the superclass.

use clap::ValueEnum;
use serde::Serialize;

use crate::descriptor::{ClassDescriptor, internal_name};

pub const TEST_CASE: &str = "junit/framework/TestCase";
pub const GROOVY_TEST_CASE: &str = "groovy/util/GroovyTestCase";

const JUNIT_RUN_WITH: &str = "org/junit/runner/RunWith";
const JUNIT_TEST_METHODS: [&str; 6] = [
    "org/junit/Test",
    "org/junit/jupiter/api/Test",
    "org/junit/jupiter/api/RepeatedTest",
    "org/junit/jupiter/api/TestFactory",
    "org/junit/jupiter/api/TestTemplate",
    "org/junit/jupiter/params/ParameterizedTest",
];

const TESTNG_TEST: &str = "org/testng/annotations/Test";
const TESTNG_METHODS: [&str; 12] = [
    "org/testng/annotations/Test",
    "org/testng/annotations/Factory",
    "org/testng/annotations/BeforeSuite",
    "org/testng/annotations/AfterSuite",
    "org/testng/annotations/BeforeTest",
    "org/testng/annotations/AfterTest",
    "org/testng/annotations/BeforeGroups",
    "org/testng/annotations/AfterGroups",
    "org/testng/annotations/BeforeClass",
    "org/testng/annotations/AfterClass",
    "org/testng/annotations/BeforeMethod",
    "org/testng/annotations/AfterMethod",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalVerdict {
    Test,
    NotTest,
    Inherit,
}

pub trait TestFramework {
    fn name(&self) -> &str;

    fn classify(&self, descriptor: &ClassDescriptor) -> LocalVerdict;

    /// File-style name handed to the sink for a published class.
    fn test_class_name(&self, descriptor: &ClassDescriptor) -> String {
        format!("{}.class", descriptor.name)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JUnitFramework;

impl TestFramework for JUnitFramework {
    fn name(&self) -> &str {
        "junit"
    }

    fn classify(&self, descriptor: &ClassDescriptor) -> LocalVerdict {
        if descriptor.is_interface {
            return LocalVerdict::NotTest;
        }
        let annotated = descriptor.has_annotation(JUNIT_RUN_WITH)
            || JUNIT_TEST_METHODS
                .iter()
                .any(|a| descriptor.has_method_annotation(a));
        if annotated {
            LocalVerdict::Test
        } else {
            LocalVerdict::Inherit
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TestNgFramework;

impl TestFramework for TestNgFramework {
    fn name(&self) -> &str {
        "testng"
    }

    fn classify(&self, descriptor: &ClassDescriptor) -> LocalVerdict {
        if descriptor.is_interface {
            return LocalVerdict::NotTest;
        }
        let annotated = descriptor.has_annotation(TESTNG_TEST)
            || TESTNG_METHODS
                .iter()
                .any(|a| descriptor.has_method_annotation(a));
        if annotated {
            LocalVerdict::Test
        } else {
            LocalVerdict::Inherit
        }
    }
}

/// Test-ness comes only from extending a known test base.
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseClassFramework;

impl TestFramework for BaseClassFramework {
    fn name(&self) -> &str {
        "base-class"
    }

    fn classify(&self, descriptor: &ClassDescriptor) -> LocalVerdict {
        if descriptor.is_interface {
            LocalVerdict::NotTest
        } else {
            LocalVerdict::Inherit
        }
    }
}

pub struct PredicateFramework<F> {
    name: String,
    predicate: F,
}

impl<F> PredicateFramework<F>
where
    F: Fn(&ClassDescriptor) -> LocalVerdict,
{
    pub fn new(name: impl Into<String>, predicate: F) -> Self {
        Self {
            name: name.into(),
            predicate,
        }
    }
}

impl<F> TestFramework for PredicateFramework<F>
where
    F: Fn(&ClassDescriptor) -> LocalVerdict,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn classify(&self, descriptor: &ClassDescriptor) -> LocalVerdict {
        (self.predicate)(descriptor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FrameworkKind {
    Junit,
    Testng,
    BaseClass,
}

impl FrameworkKind {
    pub fn framework(self) -> Box<dyn TestFramework> {
        match self {
            Self::Junit => Box::new(JUnitFramework),
            Self::Testng => Box::new(TestNgFramework),
            Self::BaseClass => Box::new(BaseClassFramework),
        }
    }
}

impl<T: TestFramework + ?Sized> TestFramework for Box<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn classify(&self, descriptor: &ClassDescriptor) -> LocalVerdict {
        (**self).classify(descriptor)
    }

    fn test_class_name(&self, descriptor: &ClassDescriptor) -> String {
        (**self).test_class_name(descriptor)
    }
}

/// Class names treated as test roots regardless of annotations.
#[derive(Debug, Clone)]
pub struct KnownTestBases {
    names: Vec<String>,
}

impl Default for KnownTestBases {
    fn default() -> Self {
        let mut bases = Self { names: Vec::new() };
        bases.add(TEST_CASE);
        bases.add(GROOVY_TEST_CASE);
        bases
    }
}

impl KnownTestBases {
    /// Returns `false` for blank names and names already present.
    pub fn add(&mut self, name: &str) -> bool {
        let name = internal_name(name);
        if name.is_empty() || self.names.contains(&name) {
            return false;
        }
        self.names.push(name);
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        !name.is_empty() && self.names.iter().any(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}
