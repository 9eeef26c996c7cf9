//! # test-class-finder
//!
//! Detects which compiled classes of a build are runnable test classes by reading
//! class-file metadata, without loading or executing any of them.
//!
//! ## Architecture
//!
//! - **classfile**: Structural class-file reader that skips method bodies
//! - **descriptor**: Class descriptors and class-file locations
//! - **classpath**: Lazy partition of the test classpath into directories and archives
//! - **archive**: Library jar indexing and class extraction
//! - **locator**: Class name to class file resolution, directories before archives
//! - **framework**: JUnit, TestNG and base-class predicates, known test bases
//! - **detector**: Superclass-aware detection with memoized ancestor verdicts
//! - **sink**: Receivers of detected test class names
//! - **scan**: Test classes directory walking that drives the detector
//! - **repository**: Module repository capabilities and the delegating adapter

pub mod archive;
pub mod classfile;
pub mod classpath;
pub mod cli;
pub mod config;
pub mod descriptor;
pub mod detector;
pub mod error;
pub mod framework;
pub mod locator;
pub mod repository;
pub mod scan;
pub mod sink;

#[cfg(test)]
mod fixtures;
