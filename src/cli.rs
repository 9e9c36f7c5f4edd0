// src/cli.rs

use blameworthy::config::Config;
use blameworthy::registry::{BlameRegistry, RepoIndex};
use blameworthy::renderer::{render_json, render_text};
use blameworthy::{Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::ProgressBar;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file listing the repositories to index
    #[arg(short, long, conflicts_with = "repo", required_unless_present = "repo")]
    pub config: Option<PathBuf>,

    /// Index a single git repository instead of reading a configuration file
    #[arg(short, long)]
    pub repo: Option<PathBuf>,

    /// Hide progress bars
    #[arg(short, long)]
    pub quiet: bool,

    /// Log more; repeat for trace output
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show who introduced each line of a file, and who touches it next
    Blame(ViewArgs),
    /// Show what a commit changed in a file, with the same attribution
    Diff(ViewArgs),
    /// Build the index and report its size
    Index,
}

#[derive(clap::Args, Debug)]
pub struct ViewArgs {
    /// Repository name; may be left out when only one is indexed
    #[arg(short, long)]
    pub name: Option<String>,

    /// Commit to look at (anything git can resolve)
    #[arg(long, default_value = "HEAD")]
    pub commit: String,

    /// Path of the file within the repository
    #[arg(short, long)]
    pub path: String,

    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

#[derive(ValueEnum, Clone, Debug, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

pub fn run(args: Args) -> Result<()> {
    let config = match (&args.config, &args.repo) {
        (Some(path), _) => Config::load(path)?,
        (None, Some(repo)) => Config::single(repo),
        (None, None) => return Err(Error::Config("pass --config or --repo".to_string())),
    };

    let bar = if args.quiet { ProgressBar::hidden() } else { ProgressBar::new(0) };
    let start = Instant::now();
    let registry = BlameRegistry::build(&config, &bar)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());

    match &args.command {
        Command::Index => {
            for repo in registry.repos() {
                writeln!(
                    out,
                    "{}: {} commits, {} files",
                    repo.name(),
                    repo.history().commit_count(),
                    repo.history().file_count()
                )?;
            }
            writeln!(out, "Indexed in {:.2?}", start.elapsed())?;
        }
        Command::Blame(view) => {
            let blame = pick(&registry, view)?.file_view(&view.commit, &view.path)?;
            write_view(&blame, view.format, &mut out)?;
        }
        Command::Diff(view) => {
            let diff = pick(&registry, view)?.diff_view(&view.commit, &view.path)?;
            write_view(&diff, view.format, &mut out)?;
        }
    }
    out.flush()?;
    Ok(())
}

fn pick<'a>(registry: &'a BlameRegistry, view: &ViewArgs) -> Result<&'a RepoIndex> {
    match &view.name {
        Some(name) => registry.repo(name),
        None => registry.sole().ok_or_else(|| {
            Error::Config("several repositories are indexed; choose one with --name".to_string())
        }),
    }
}

fn write_view<W: Write>(view: &blameworthy::BlameView, format: Format, out: &mut W) -> io::Result<()> {
    match format {
        Format::Text => render_text(view, out),
        Format::Json => render_json(view, out),
    }
}
