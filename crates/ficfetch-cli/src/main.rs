//! ficfetch CLI - build fan-fiction training corpora from the command line
//!
//! Two invocation shapes drive the same batch logic:
//!
//! ```text
//! ficfetch <input-file-or-id> <output-dir>      positional shape
//! ficfetch --id 12345 --dir out                 flag shape, single work
//! ficfetch -i ids.txt -o corpus.txt --dir out   flag shape, list + merge
//! ficfetch --search <URL> --dir out             listing-page crawl
//! ```

use clap::{Parser, ValueEnum};
use ficfetch::{
    Cleaner, FetchOptions, Pipeline, SearchCrawler, SearchOptions, WorkFetcher,
    DEFAULT_MERGED_NAME,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Report rendering for completed runs
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Human-readable summary lines
    #[default]
    Text,
    /// JSON report
    Json,
}

/// ficfetch - fan-fiction corpus fetching and cleaning tool
#[derive(Parser, Debug)]
#[command(name = "ficfetch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Work id, or path to a list file with one id per line (positional shape)
    #[arg(value_name = "INPUT")]
    target: Option<String>,

    /// Output directory (positional shape)
    #[arg(value_name = "OUTPUT_DIR")]
    target_dir: Option<PathBuf>,

    /// Work id to fetch (flag shape, single-work mode)
    #[arg(long, conflicts_with = "target")]
    id: Option<String>,

    /// List file with work ids to fetch (flag shape)
    #[arg(long, short = 'i', conflicts_with = "target")]
    input: Option<PathBuf>,

    /// Name of the merged corpus file
    #[arg(long, short = 'o', default_value = DEFAULT_MERGED_NAME)]
    output: String,

    /// Output directory
    #[arg(long, conflicts_with = "target_dir")]
    dir: Option<PathBuf>,

    /// Crawl a listing page and append every discovered work to <dir>/search.txt
    #[arg(long, value_name = "URL")]
    search: Option<String>,

    /// Custom User-Agent
    #[arg(long)]
    user_agent: Option<String>,

    /// Report format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

/// What a parsed command line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    /// Fetch and clean one work; no merge
    Single(String),
    /// Process every id in a list file, then merge
    List(PathBuf),
    /// Crawl a listing page
    Search(String),
}

/// Resolve the invocation shape into a mode and output directory
fn resolve_mode(cli: &Cli) -> Result<(Mode, PathBuf), String> {
    let dir = cli
        .target_dir
        .clone()
        .or_else(|| cli.dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));

    if let Some(url) = &cli.search {
        return Ok((Mode::Search(url.clone()), dir));
    }
    if let Some(id) = &cli.id {
        return Ok((Mode::Single(id.clone()), dir));
    }
    if let Some(target) = &cli.target {
        // A list file is recognized by suffix or by existing on disk
        let mode = if target.ends_with(".txt") || Path::new(target).is_file() {
            Mode::List(PathBuf::from(target))
        } else {
            Mode::Single(target.clone())
        };
        return Ok((mode, dir));
    }
    if let Some(list) = &cli.input {
        return Ok((Mode::List(list.clone()), dir));
    }

    Err("nothing to do: pass <INPUT> <OUTPUT_DIR>, or --id/--input, or --search".to_string())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let (mode, dir) = match resolve_mode(&cli) {
        Ok(resolved) => resolved,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(&cli, mode, &dir).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: &Cli, mode: Mode, dir: &Path) -> Result<(), ficfetch::FicError> {
    match mode {
        Mode::Search(url) => {
            let crawler = SearchCrawler::with_options(SearchOptions {
                user_agent: cli.user_agent.clone(),
                ..Default::default()
            })?;
            let output = dir.join("search.txt");
            let found = crawler.search(&url, &output).await?;
            match cli.format {
                OutputFormat::Text => {
                    println!("Found {found} works, appended to '{}'.", output.display())
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::json!({ "works_found": found }))
                }
            }
        }
        Mode::Single(id) => {
            let report = pipeline(cli, dir)?.run_single(&id).await?;
            match cli.format {
                OutputFormat::Text => print_work(&report),
                OutputFormat::Json => print_json(&report),
            }
        }
        Mode::List(list) => {
            let report = pipeline(cli, dir)?.run_list(&list).await?;
            match cli.format {
                OutputFormat::Text => {
                    for work in &report.works {
                        print_work(work);
                    }
                    println!(
                        "Merged {} files into '{}'. Total length={} characters.",
                        report.merge.files,
                        dir.join(&cli.output).display(),
                        report.merge.bytes
                    );
                }
                OutputFormat::Json => print_json(&report),
            }
        }
    }
    Ok(())
}

fn pipeline(cli: &Cli, dir: &Path) -> Result<Pipeline, ficfetch::FicError> {
    let fetcher = WorkFetcher::with_options(FetchOptions {
        user_agent: cli.user_agent.clone(),
        ..Default::default()
    })?;
    Ok(Pipeline::with_parts(
        fetcher,
        Cleaner::new(),
        dir,
        cli.output.clone(),
    ))
}

fn print_work(report: &ficfetch::WorkReport) {
    println!(
        "Retrieved '{}'. Length={} characters.",
        report.cleaned_path.display(),
        report.chars
    );
}

fn print_json<T: serde::Serialize>(report: &T) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            eprintln!("Error serializing report: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ficfetch").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_positional_list_shape() {
        let cli = parse(&["ids.txt", "out"]);
        let (mode, dir) = resolve_mode(&cli).unwrap();
        assert_eq!(mode, Mode::List(PathBuf::from("ids.txt")));
        assert_eq!(dir, PathBuf::from("out"));
    }

    #[test]
    fn test_positional_single_shape() {
        let cli = parse(&["12345", "out"]);
        let (mode, _) = resolve_mode(&cli).unwrap();
        assert_eq!(mode, Mode::Single("12345".to_string()));
    }

    #[test]
    fn test_positional_existing_file_is_list() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("works");
        std::fs::write(&list, "1\n").unwrap();
        let cli = parse(&[list.to_str().unwrap(), "out"]);
        let (mode, _) = resolve_mode(&cli).unwrap();
        assert_eq!(mode, Mode::List(list));
    }

    #[test]
    fn test_flag_single_shape() {
        let cli = parse(&["--id", "12345", "--dir", "out"]);
        let (mode, dir) = resolve_mode(&cli).unwrap();
        assert_eq!(mode, Mode::Single("12345".to_string()));
        assert_eq!(dir, PathBuf::from("out"));
    }

    #[test]
    fn test_flag_list_shape_with_output_name() {
        let cli = parse(&["-i", "ids.txt", "-o", "corpus.txt", "--dir", "out"]);
        let (mode, _) = resolve_mode(&cli).unwrap();
        assert_eq!(mode, Mode::List(PathBuf::from("ids.txt")));
        assert_eq!(cli.output, "corpus.txt");
    }

    #[test]
    fn test_search_shape() {
        let cli = parse(&["--search", "https://example.com/tags/foo/works"]);
        let (mode, dir) = resolve_mode(&cli).unwrap();
        assert_eq!(
            mode,
            Mode::Search("https://example.com/tags/foo/works".to_string())
        );
        assert_eq!(dir, PathBuf::from("."));
    }

    #[test]
    fn test_id_beats_input_flag() {
        let cli = parse(&["--id", "7", "-i", "ids.txt"]);
        let (mode, _) = resolve_mode(&cli).unwrap();
        assert_eq!(mode, Mode::Single("7".to_string()));
    }

    #[test]
    fn test_no_arguments_is_an_error() {
        let cli = parse(&[]);
        assert!(resolve_mode(&cli).is_err());
    }

    #[test]
    fn test_default_merged_name() {
        let cli = parse(&["--id", "7"]);
        assert_eq!(cli.output, DEFAULT_MERGED_NAME);
    }
}
