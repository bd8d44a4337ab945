//! Command-line interface.
//!
//! Diagnostics produced during analysis are part of the report, not
//! failures: `analyze` exits 0 even when the report carries errors.
//! Only operational problems (unreadable or invalid snapshot) exit
//! nonzero.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;

use crate::model::{ElementRef, ProgramModel};
use crate::report::{self, build_report};
use crate::session::Session;

pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_ERROR: i32 = 2;

#[derive(Parser)]
#[command(
    name = "antdoc",
    version,
    about = "Extracts reference documentation from Ant task and type classes"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a structural snapshot and emit descriptors and diagnostics
    Analyze(AnalyzeArgs),
    /// Print the parsed ant-family tags of every documented class
    Tags(TagsArgs),
}

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Path to the structural snapshot (JSON)
    pub snapshot: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Pretty)]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct TagsArgs {
    /// Path to the structural snapshot (JSON)
    pub snapshot: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Json,
}

fn load_session(snapshot: &PathBuf) -> anyhow::Result<Session> {
    let model = ProgramModel::load(snapshot)
        .with_context(|| format!("loading snapshot {}", snapshot.display()))?;
    Ok(Session::new(model))
}

pub fn run_analyze(args: &AnalyzeArgs) -> anyhow::Result<i32> {
    let session = load_session(&args.snapshot)?;
    let report = build_report(&session, &args.snapshot.display().to_string());

    match args.format {
        OutputFormat::Pretty => report::write_pretty(&report),
        OutputFormat::Json => match &args.output {
            Some(path) => {
                let file = File::create(path)
                    .with_context(|| format!("creating {}", path.display()))?;
                report::write_json(&report, &mut BufWriter::new(file))?;
            }
            None => report::write_json(&report, &mut io::stdout().lock())?,
        },
    }
    Ok(EXIT_SUCCESS)
}

pub fn run_tags(args: &TagsArgs) -> anyhow::Result<i32> {
    let session = load_session(&args.snapshot)?;
    for id in session.candidates() {
        let data = session.model().class(id);
        println!("{}", data.name.bold());
        let info = session.doc_info(ElementRef::Class(id));
        for tag in info.tags() {
            print!("  @{}", tag.name.cyan());
            for (key, value) in tag.attributes() {
                print!(" {}=\"{}\"", key, value);
            }
            let text = tag.content_text();
            if !text.is_empty() {
                print!("  {}", text);
            }
            println!();
        }
    }
    Ok(EXIT_SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_analyze_defaults() {
        let cli = Cli::parse_from(["antdoc", "analyze", "snapshot.json"]);
        match cli.command {
            Commands::Analyze(args) => {
                assert_eq!(args.format, OutputFormat::Pretty);
                assert!(args.output.is_none());
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn test_analyze_writes_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("snapshot.json");
        std::fs::write(&snapshot, r#"{"classes": []}"#).unwrap();
        let output = dir.path().join("report.json");

        let args = AnalyzeArgs {
            snapshot,
            format: OutputFormat::Json,
            output: Some(output.clone()),
        };
        assert_eq!(run_analyze(&args).unwrap(), EXIT_SUCCESS);

        let written = std::fs::read_to_string(output).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert!(value["entities"].as_array().unwrap().is_empty());
        assert!(value["diagnostics"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_missing_snapshot_is_an_error() {
        let args = AnalyzeArgs {
            snapshot: PathBuf::from("/nonexistent/snapshot.json"),
            format: OutputFormat::Json,
            output: None,
        };
        assert!(run_analyze(&args).is_err());
    }
}
