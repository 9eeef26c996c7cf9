use clap::{Args, Parser, Subcommand, ValueEnum};
use std::ffi::OsString;
use std::path::PathBuf;

use crate::framework::FrameworkKind;

#[derive(Debug, Clone, Parser)]
#[command(name = "test-class-finder")]
#[command(about = "Detect test classes in compiled class output without running them")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Scan a test classes directory and list the runnable test classes.
    Detect(DetectArgs),
    /// Print the structural descriptor of one class file.
    Inspect { class_file: PathBuf },
}

#[derive(Debug, Clone, Args)]
pub struct DetectArgs {
    pub test_classes_dir: PathBuf,

    /// Directories and jars searched for superclasses, in platform path-list syntax.
    #[arg(long, value_name = "PATHS")]
    pub classpath: Option<OsString>,

    #[arg(long, value_enum, default_value_t = FrameworkKind::Junit)]
    pub framework: FrameworkKind,

    /// Extra class treated as a test base (dotted or slash-separated).
    #[arg(long = "known-base", value_name = "CLASS")]
    pub known_bases: Vec<String>,

    #[arg(long, value_name = "GLOB")]
    pub include: Vec<String>,

    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Report every top-level class instead of inspecting bytecode.
    #[arg(long)]
    pub no_scan: bool,

    #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
