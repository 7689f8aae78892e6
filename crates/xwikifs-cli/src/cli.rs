use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "xwikifs",
    about = "Inspect and maintain wiki content stored as XWikiFS directories",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the document directories
    #[arg(short, long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// TOML file overriding the default file layout
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Load every document and report the first error
    Check(CheckArgs),
    /// Show one document with its objects and attachments
    Show(ShowArgs),
    /// Rewrite document, object and class files in canonical form
    Reformat(ReformatArgs),
}

#[derive(Args)]
pub struct CheckArgs {}

#[derive(Args)]
pub struct ShowArgs {
    /// Document as <Space>.<Name>
    pub document: String,
    /// Print referenced content in full instead of a summary line
    #[arg(long)]
    pub content: bool,
}

#[derive(Args)]
pub struct ReformatArgs {
    /// Report files that would change without writing them
    #[arg(long)]
    pub check: bool,
    /// Print a unified diff for each file that would change
    #[arg(long, requires = "check")]
    pub diff: bool,
}
