//! MonoLabel CLI - JSON bridge to the label pipeline
//!
//! Commands: validate, generate, defaults
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on validation or generation failure

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use monolabel_core::{
    default_job, ExportFormat, Job, LabelError, LabelPipeline, PrintProfile, RenderConfig,
    Symbology, ValidationResult,
};

#[derive(Parser)]
#[command(name = "monolabel-cli")]
#[command(about = "MonoLabel CLI - Monochrome label raster engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a RenderConfig JSON file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Pre-flight check a job
    Validate {
        /// Job JSON
        #[arg(short, long)]
        job: String,
    },

    /// Render a job to an image
    Generate {
        /// Job JSON
        #[arg(short, long)]
        job: String,

        #[arg(short, long, value_enum, default_value_t = FormatArg::Png)]
        format: FormatArg,

        /// Write the image here instead of printing a manifest
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the default job for a symbology and the printer DPI presets
    Defaults {
        #[arg(short, long, value_enum, default_value_t = SymbologyArg::Qr)]
        symbology: SymbologyArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Png,
    Jpeg,
    Bmp,
}

impl From<FormatArg> for ExportFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Png => ExportFormat::Png,
            FormatArg::Jpeg => ExportFormat::Jpeg,
            FormatArg::Bmp => ExportFormat::Bmp,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SymbologyArg {
    Qr,
    Datamatrix,
    Code128,
}

impl From<SymbologyArg> for Symbology {
    fn from(s: SymbologyArg) -> Self {
        match s {
            SymbologyArg::Qr => Symbology::Qr,
            SymbologyArg::Datamatrix => Symbology::Datamatrix,
            SymbologyArg::Code128 => Symbology::Code128,
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(s) => {
            println!("{}", s);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn failure_json(err: &LabelError) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "code": err.code(),
        "error": err.to_string(),
    })
}

fn failure(err: &LabelError) -> ExitCode {
    println!("{}", failure_json(err));
    ExitCode::from(2)
}

/// Unparseable jobs are reported in the same shape as failed checks.
fn validate_job_json(pipeline: &LabelPipeline, json: &str) -> ValidationResult {
    match Job::from_json_str(json) {
        Ok(job) => pipeline.validate(&job),
        Err(e) => ValidationResult::from(&e),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match RenderConfig::from_json_file(path) {
            Ok(c) => c,
            Err(e) => return failure(&e),
        },
        None => RenderConfig::default(),
    };

    let pipeline = match LabelPipeline::new(config) {
        Ok(p) => p,
        Err(e) => return failure(&e),
    };

    match cli.command {
        Commands::Validate { job } => {
            let result = validate_job_json(&pipeline, &job);
            let code = print_json(&result);
            if result.ok {
                code
            } else {
                ExitCode::from(2)
            }
        }

        Commands::Generate { job, format, out } => {
            let job = match Job::from_json_str(&job) {
                Ok(j) => j,
                Err(e) => return failure(&e),
            };
            if let Err(e) = PrintProfile::for_job(&job) {
                return failure(&e);
            }

            let format = ExportFormat::from(format);
            match out {
                Some(path) => {
                    let written = pipeline.export(&job, format).and_then(|bytes| {
                        fs::write(&path, &bytes)?;
                        Ok(bytes.len())
                    });
                    match written {
                        Ok(bytes) => print_json(&serde_json::json!({
                            "success": true,
                            "path": path,
                            "bytes": bytes,
                        })),
                        Err(e) => failure(&e),
                    }
                }
                None => match pipeline.generate_label(&job, format) {
                    Ok(label) => print_json(&serde_json::json!({
                        "success": true,
                        "label": label,
                    })),
                    Err(e) => failure(&e),
                },
            }
        }

        Commands::Defaults { symbology } => print_json(&serde_json::json!({
            "job": default_job(symbology.into()),
            "printProfiles": PrintProfile::presets(),
        })),
    }
}
