use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::time::Instant;
use test_class_finder::cli::{Cli, Commands, OutputFormat};
use test_class_finder::config::{DetectConfig, write_output};
use test_class_finder::descriptor::read_descriptor;
use test_class_finder::detector::{DetectionStats, TestClassDetector};
use test_class_finder::framework::FrameworkKind;
use test_class_finder::scan::{ScanMode, run_scan};

fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Detect(args) => {
            let config = DetectConfig::from_args(args)?;
            let report = detect(&config)?;
            let content = match config.format {
                OutputFormat::Json => serde_json::to_string_pretty(&report)?,
                OutputFormat::Text => render_text(&report),
            };
            write_output(&content, config.output.as_deref())?;
        }
        Commands::Inspect { class_file } => {
            let descriptor = read_descriptor(&class_file)
                .with_context(|| format!("Failed to inspect {}", class_file.display()))?;
            println!("{}", serde_json::to_string_pretty(&descriptor)?);
        }
    }

    Ok(())
}

#[derive(Debug, Serialize)]
struct DetectReport {
    test_classes_dir: String,
    framework: FrameworkKind,
    scan_for_test_classes: bool,
    scanned_class_files: usize,
    test_classes: Vec<String>,
    stats: DetectionStats,
    duration_ms: u64,
}

fn detect(config: &DetectConfig) -> Result<DetectReport> {
    let start = Instant::now();
    let mut detector = TestClassDetector::new(
        config.test_classes_dir.clone(),
        config.classpath.clone(),
        config.framework.framework(),
        Vec::<String>::new(),
    );
    detector.add_known_test_bases(&config.known_bases);

    let summary = run_scan(&mut detector, &config.filter, config.mode).with_context(|| {
        format!(
            "Failed to scan test classes in {}",
            config.test_classes_dir.display()
        )
    })?;
    let stats = detector.stats();

    Ok(DetectReport {
        test_classes_dir: config.test_classes_dir.to_string_lossy().to_string(),
        framework: config.framework,
        scan_for_test_classes: config.mode == ScanMode::Detect,
        scanned_class_files: summary.scanned,
        test_classes: detector.into_sink(),
        stats,
        duration_ms: start.elapsed().as_millis() as u64,
    })
}

fn render_text(report: &DetectReport) -> String {
    let mut out = String::new();
    out.push_str(&format!("test_classes_dir: {}\n", report.test_classes_dir));
    out.push_str(&format!("scanned_class_files: {}\n", report.scanned_class_files));
    out.push_str(&format!("test_classes: {}\n", report.test_classes.len()));
    for name in &report.test_classes {
        out.push_str(&format!("- {name}\n"));
    }
    out
}
