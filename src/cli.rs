//! Command line: build (generate and write) or check (generate only).
use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use crate::pipeline::{self, BuildConfig, BuildReport};
use crate::spec::catalog;

// ---------------------------------- Types ----------------------------------- //

/// generate a fluent JavaScript builder API and its Markdown reference from a JSON Schema
#[derive(Parser, Debug)]
#[command(version)]
pub struct CommandLineInterface {
    /// debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate and write the API modules and reference pages
    Build(Settings),
    /// generate everything in memory and report, without writing
    Check(Settings),
}

#[derive(Args, Debug, Clone)]
struct Settings {
    /// schema document
    #[arg(long, default_value = "vega-lite-schema.json")]
    schema: PathBuf,

    /// declarative specification table (.json); the built-in catalog when omitted
    #[arg(long)]
    api: Option<PathBuf>,

    /// output directory for generated modules
    #[arg(long, default_value = "src")]
    src: PathBuf,

    /// output directory for reference pages
    #[arg(long, default_value = "docs/api")]
    docs: PathBuf,

    /// prefix printed before every documented method name
    #[arg(long, default_value = catalog::DOC_PREFIX)]
    prefix: String,

    /// heading of the reference index
    #[arg(long, default_value = catalog::TITLE)]
    title: String,
}

// ------------------------------ Implementation ------------------------------ //

impl Settings {
    fn config(&self) -> BuildConfig {
        BuildConfig {
            schema: self.schema.clone(),
            api: self.api.clone(),
            src: self.src.clone(),
            docs: self.docs.clone(),
            prefix: self.prefix.clone(),
            title: self.title.clone(),
        }
    }
}

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }
    pub fn verbose(&self) -> bool {
        self.verbose
    }
    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Build(settings) => {
                let config = settings.config();
                let report = pipeline::build(&config)
                    .with_context(|| format!("build from '{}' failed", config.schema.display()))?;
                summary("built", &report);
            }
            Command::Check(settings) => {
                let config = settings.config();
                let report = pipeline::check(&config)
                    .with_context(|| format!("check of '{}' failed", config.schema.display()))?;
                summary("checked", &report);
            }
        }
        Ok(())
    }
}

fn summary(verb: &str, report: &BuildReport) {
    eprintln!(
        "{} {} entries: {} modules, {} pages",
        verb.green().bold(),
        report.entries,
        report.modules,
        report.pages
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_build_uses_defaults() {
        let cli = CommandLineInterface::try_parse_from(["fluentgen", "build"]).unwrap();
        assert!(!cli.verbose());
        let Command::Build(settings) = &cli.cmd else { panic!("build") };
        let config = settings.config();
        assert_eq!(config.schema, PathBuf::from("vega-lite-schema.json"));
        assert_eq!(config.api, None);
        assert_eq!(config.src, PathBuf::from("src"));
        assert_eq!(config.docs, PathBuf::from("docs/api"));
        assert_eq!(config.prefix, "vl.");
    }

    #[test]
    fn check_accepts_overrides() {
        let cli = CommandLineInterface::try_parse_from([
            "fluentgen", "check", "-v", "--schema", "s.json", "--api", "t.json", "--prefix", "d3.",
        ])
        .unwrap();
        assert!(cli.verbose());
        let Command::Check(settings) = &cli.cmd else { panic!("check") };
        assert_eq!(settings.api, Some(PathBuf::from("t.json")));
        assert_eq!(settings.prefix, "d3.");
    }
}
