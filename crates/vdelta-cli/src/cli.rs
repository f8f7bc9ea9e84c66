use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(
    name = "vdelta",
    about = "vdelta: diff document trees into compact binary patches",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Overrides `[output] format` from the config file.
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Config file (defaults to ./vdelta.toml when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Diff two JSON documents into a patch
    Diff(DiffArgs),
    /// List the instructions in a patch
    Dump(DumpArgs),
    /// Apply a patch to a JSON document and print the result
    Apply(ApplyArgs),
}

#[derive(Args)]
pub struct DiffArgs {
    pub last: PathBuf,
    pub next: PathBuf,
    /// Write the encoded patch here.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct DumpArgs {
    pub patch: PathBuf,
}

#[derive(Args)]
pub struct ApplyArgs {
    pub base: PathBuf,
    pub patch: PathBuf,
    /// Write the resulting document here instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
