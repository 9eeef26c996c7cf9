use anyhow::{Result, bail};
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::cli::{DetectArgs, OutputFormat};
use crate::framework::FrameworkKind;
use crate::scan::{ScanFilter, ScanMode};

pub const CLASSPATH_ENV: &str = "TEST_CLASS_FINDER_CLASSPATH";

#[derive(Debug, Clone)]
pub struct DetectConfig {
    pub test_classes_dir: PathBuf,
    pub classpath: Vec<PathBuf>,
    pub framework: FrameworkKind,
    pub known_bases: Vec<String>,
    pub filter: ScanFilter,
    pub mode: ScanMode,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
}

impl DetectConfig {
    pub fn from_args(args: DetectArgs) -> Result<Self> {
        if !args.test_classes_dir.is_dir() {
            bail!(
                "Test classes directory does not exist: {}",
                args.test_classes_dir.display()
            );
        }

        let classpath = resolve_classpath(args.classpath.or_else(|| env::var_os(CLASSPATH_ENV)));
        let mode = if args.no_scan {
            ScanMode::Manual
        } else {
            ScanMode::Detect
        };

        Ok(Self {
            test_classes_dir: args.test_classes_dir,
            classpath,
            framework: args.framework,
            known_bases: args.known_bases,
            filter: ScanFilter::new(args.include, args.exclude),
            mode,
            format: args.format,
            output: args.output,
        })
    }
}

pub fn resolve_classpath(raw: Option<OsString>) -> Vec<PathBuf> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    env::split_paths(&raw)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

pub fn write_output(content: &str, output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
    } else {
        print!("{content}");
        if !content.ends_with('\n') {
            println!();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(dir: &Path) -> DetectArgs {
        DetectArgs {
            test_classes_dir: dir.to_path_buf(),
            classpath: None,
            framework: FrameworkKind::Testng,
            known_bases: Vec::new(),
            include: Vec::new(),
            exclude: Vec::new(),
            no_scan: false,
            format: OutputFormat::Json,
            output: None,
        }
    }

    #[test]
    fn resolve_classpath_splits_platform_path_list() {
        let joined = env::join_paths(["/a/classes", "/b/lib.jar"]).unwrap();
        assert_eq!(
            resolve_classpath(Some(joined)),
            vec![PathBuf::from("/a/classes"), PathBuf::from("/b/lib.jar")]
        );
        assert!(resolve_classpath(None).is_empty());
    }

    #[test]
    fn from_args_prefers_explicit_classpath_and_maps_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut detect = args(dir.path());
        detect.classpath = Some(OsString::from("/libs/junit.jar"));
        detect.no_scan = true;

        let config = DetectConfig::from_args(detect).unwrap();
        assert_eq!(config.classpath, vec![PathBuf::from("/libs/junit.jar")]);
        assert_eq!(config.mode, ScanMode::Manual);
        assert_eq!(config.framework, FrameworkKind::Testng);
        assert_eq!(config.filter, ScanFilter::default());
    }

    #[test]
    fn from_args_rejects_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let err = DetectConfig::from_args(args(&dir.path().join("missing"))).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn write_output_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("reports").join("tests.json");
        write_output("[]", Some(&target)).unwrap();
        assert_eq!(std::fs::read_to_string(target).unwrap(), "[]");
    }
}
