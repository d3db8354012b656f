//! Headless CLI over the snippet core.
//!
//! Usage:
//!   sniprunner list [--language L]
//!   sniprunner search [QUERY] [--language L]
//!   sniprunner merged [--language L]
//!   sniprunner info <SLUG> [--language L]
//!   sniprunner run <SLUG> [--stdin]
//!   sniprunner config
//!
//! `merged` performs a full two-tier refresh through the catalog and prints
//! the deduplicated, precedence-ordered view. The tool path comes from
//! `--tool`, then `SNIPRUNNER_CLI`, then the bare `snipkit` command.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sniprunner::{Catalog, CliTool, Settings, SnippetTool, snippets_dir};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "sniprunner")]
#[command(about = "Snippet cache and run coordinator for the snipkit CLI")]
struct Cli {
    /// Path to the snipkit executable; overrides SNIPRUNNER_CLI.
    #[arg(long)]
    tool: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List local snippets.
    List {
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Search the public gallery; no query lists everything.
    Search {
        query: Option<String>,
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Print the merged two-tier view, local tier first.
    Merged {
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Show one snippet's detail.
    Info {
        slug: String,
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Run a snippet, optionally piping stdin through to it.
    Run {
        slug: String,
        /// Forward this process's stdin to the snippet.
        #[arg(long)]
        stdin: bool,
    },
    /// Show the tool configuration the core resolves.
    Config,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let settings = match cli.tool {
        Some(path) => Settings::with_tool(path.into_os_string()),
        None => Settings::from_env(),
    };
    let tool = CliTool::new(&settings);

    match cli.command {
        Command::List { language } => {
            let records = tool
                .list(language.as_deref())
                .context("listing local snippets")?;
            print_json(&records)
        }
        Command::Search { query, language } => {
            let records = tool
                .search(query.as_deref(), language.as_deref())
                .context("searching the snippet gallery")?;
            print_json(&records)
        }
        Command::Merged { language } => {
            let catalog = Catalog::new();
            let seq = catalog.begin_refresh();
            let local = tool
                .list(language.as_deref())
                .context("listing local snippets")?;
            let remote = tool
                .search(None, language.as_deref())
                .context("searching the snippet gallery")?;
            catalog.finish_refresh(seq, local, Some(remote));
            print_json(&catalog.merged_view())
        }
        Command::Info { slug, language } => {
            let detail = tool
                .info(&slug, language.as_deref())
                .with_context(|| format!("fetching snippet '{slug}'"))?;
            match detail {
                Some(detail) => print_json(&detail),
                None => anyhow::bail!("no snippet named '{slug}'"),
            }
        }
        Command::Run { slug, stdin } => {
            let input = if stdin {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("reading stdin for snippet input")?;
                Some(buf)
            } else {
                None
            };
            let outcome = tool
                .run(&slug, input.as_deref())
                .with_context(|| format!("running snippet '{slug}'"))?;
            print_json(&outcome)?;
            if !outcome.success {
                std::process::exit(1);
            }
            Ok(())
        }
        Command::Config => {
            let dir = snippets_dir(&tool);
            println!("tool: {}", settings.tool_name());
            println!("snippets dir: {}", dir.display());
            Ok(())
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
