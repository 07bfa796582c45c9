// cli/scan_stats.rs - `gocursor scan-stats` subcommand
//
// Loads every Go file under a path and reports timing metrics for each
// analysis phase, inspired by rust-analyzer's `analysis-stats` command.
//
// Phases measured:
//   1. scan: discovering Go files
//   2. parse: tree-sitter parsing all files
//   3. resolve: resolving a cursor context at the end of every line

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rayon::prelude::*;
use walkdir::{DirEntry, WalkDir};

use crate::cli::format_bytes;
use crate::perf::{self, TimingGuard};
use crate::resolver::Resolver;
use crate::scope::ScopeSet;

/// Parsed arguments for the `scan-stats` subcommand.
#[derive(Debug)]
pub struct ScanStatsArgs {
    pub path: PathBuf,
    pub csv: bool,
}

/// Result of running a single analysis phase.
#[derive(Debug)]
pub struct PhaseResult {
    pub name: String,
    pub duration: Duration,
    pub peak_rss_bytes: Option<u64>,
    pub detail: String,
}

/// All phase names, in run order.
const PHASES: &[&str] = &["scan", "parse", "resolve"];

/// Parse `scan-stats` arguments from the remaining CLI args.
///
/// Expected usage: `gocursor scan-stats <path> [--csv]`
pub fn parse_args(args: &mut impl Iterator<Item = String>) -> Result<ScanStatsArgs, String> {
    let mut path: Option<PathBuf> = None;
    let mut csv = false;

    for arg in args {
        match arg.as_str() {
            "--csv" => csv = true,
            other if other.starts_with('-') => {
                return Err(format!("Unknown flag: '{}'", other));
            }
            _ => {
                if path.is_some() {
                    return Err("Multiple paths provided; expected exactly one".to_string());
                }
                path = Some(PathBuf::from(arg));
            }
        }
    }

    let path = path.ok_or_else(|| "Missing required <path> argument".to_string())?;
    if !path.exists() {
        return Err(format!("Path does not exist: {}", path.display()));
    }

    Ok(ScanStatsArgs { path, csv })
}

/// Run every phase and return the results.
pub fn run_scan_stats(args: &ScanStatsArgs) -> Vec<PhaseResult> {
    let mut results = Vec::new();
    let resolver = Resolver::new();

    // Phase 1: scan, discover Go files
    let timer = TimingGuard::new("scan-stats:scan");
    let files = discover_go_files(&args.path);
    results.push(PhaseResult {
        name: PHASES[0].to_string(),
        duration: timer.finish(),
        peak_rss_bytes: perf::peak_rss_bytes(),
        detail: format!("{} files", files.len()),
    });

    // Phase 2: parse, tree-sitter parse all files in parallel
    let timer = TimingGuard::new("scan-stats:parse");
    let parses_before = perf::parse_count();
    let with_errors = files
        .par_iter()
        .filter(|(_, content)| !resolver.parse(content).diagnostics().is_empty())
        .count();
    results.push(PhaseResult {
        name: PHASES[1].to_string(),
        duration: timer.finish(),
        peak_rss_bytes: perf::peak_rss_bytes(),
        detail: format!(
            "{} files parsed ({} with syntax errors, {} tree-sitter parses)",
            files.len(),
            with_errors,
            perf::parse_count().saturating_sub(parses_before)
        ),
    });

    // Phase 3: resolve, one context per line end
    let timer = TimingGuard::new("scan-stats:resolve");
    let resolves_before = perf::resolve_count();
    let scopes: Vec<ScopeSet> = files
        .par_iter()
        .flat_map_iter(|(path, content)| {
            let resolver = &resolver;
            line_ends(content).map(move |pos| {
                resolver
                    .resolve(content, pos, Some(path.as_path()))
                    .scope()
            })
        })
        .collect();
    let mut histogram: HashMap<ScopeSet, usize> = HashMap::new();
    for scope in &scopes {
        *histogram.entry(*scope).or_default() += 1;
    }
    results.push(PhaseResult {
        name: PHASES[2].to_string(),
        duration: timer.finish(),
        peak_rss_bytes: perf::peak_rss_bytes(),
        detail: format!(
            "{} contexts, {} distinct scope sets, {} computed",
            scopes.len(),
            histogram.len(),
            perf::resolve_count().saturating_sub(resolves_before)
        ),
    });

    results
}

/// Print phase results in human-readable format.
pub fn print_results(results: &[PhaseResult]) {
    println!("=== gocursor Scan Stats ===\n");
    for result in results {
        let rss_str = match result.peak_rss_bytes {
            Some(bytes) => format_bytes(bytes),
            None => "N/A".to_string(),
        };
        println!(
            "  {:<12} {:>10.2?}   RSS: {:<10}  ({})",
            result.name, result.duration, rss_str, result.detail
        );
    }

    if results.len() > 1 {
        let total: Duration = results.iter().map(|r| r.duration).sum();
        println!("\n  {:<12} {:>10.2?}", "TOTAL", total);
    }
    println!();
}

/// Print phase results in CSV format.
pub fn print_results_csv(results: &[PhaseResult]) {
    println!("phase,duration_ms,peak_rss_bytes,detail");
    for result in results {
        let rss = result
            .peak_rss_bytes
            .map_or(String::new(), |b| b.to_string());
        println!(
            "{},{:.3},{},\"{}\"",
            result.name,
            result.duration.as_secs_f64() * 1000.0,
            rss,
            result.detail.replace('"', "\"\"")
        );
    }
}

/// Byte offsets of every line end (the newline itself, or EOF).
fn line_ends(content: &[u8]) -> impl Iterator<Item = usize> + '_ {
    content
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == b'\n')
        .map(|(i, _)| i)
        .chain(std::iter::once(content.len()))
}

/// Recursively discover all `.go` files under `root` and read their contents.
fn discover_go_files(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    let mut files: Vec<(PathBuf, Vec<u8>)> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_skipped_dir(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "go"))
        .filter_map(|e| {
            let content = std::fs::read(e.path()).ok()?;
            Some((e.into_path(), content))
        })
        .collect();
    // Sort for deterministic ordering
    files.sort_by(|a, b| a.0.cmp(&b.0));
    files
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(should_skip_directory)
}

/// Directories never scanned.
fn should_skip_directory(name: &str) -> bool {
    matches!(
        name,
        ".git" | ".svn" | ".hg" | "node_modules" | "vendor" | "testdata" | ".idea" | ".vscode"
    )
}
